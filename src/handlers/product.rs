// src/handlers/product.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::Error as SqlxError;
use tracing::{error, instrument};

use crate::dtos::product::{CreateProductRequest, ProductResponse, UpdateProductRequest};
use crate::error::AppError;
use crate::models::product::Product;
use crate::state::AppState;

fn map_unique_violation(err: SqlxError, message: &str) -> AppError {
    match err {
        SqlxError::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            AppError::conflict(message)
        }
        other => other.into(),
    }
}

// GET /products - List all products
#[instrument(skip(state))]
pub async fn get_products(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProductResponse>>, AppError> {
    match sqlx::query_as::<_, Product>(
        "SELECT id, name, code, unit_price, stock, created_at
         FROM products ORDER BY name",
    )
    .fetch_all(&state.db_pool)
    .await
    {
        Ok(products) => {
            let response = products.into_iter().map(ProductResponse::from).collect();
            Ok(Json(response))
        }
        Err(e) => {
            error!(?e, "Failed to fetch products");
            Err(e.into())
        }
    }
}

// GET /products/:id - Get single product
#[instrument(skip(state), fields(id))]
pub async fn get_product(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, code, unit_price, stock, created_at
         FROM products WHERE id = $1",
    )
    .bind(&id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(Json(ProductResponse::from(product)))
}

// GET /products/code/:code - Look a product up by its unique scan code
#[instrument(skip(state), fields(code))]
pub async fn get_product_by_code(
    Path(code): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<ProductResponse>, AppError> {
    let product = sqlx::query_as::<_, Product>(
        "SELECT id, name, code, unit_price, stock, created_at
         FROM products WHERE code = $1",
    )
    .bind(&code)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(Json(ProductResponse::from(product)))
}

// POST /products - Create new product
#[instrument(skip(state, payload))]
pub async fn create_product(
    State(state): State<AppState>,
    Json(payload): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ProductResponse>), AppError> {
    let stock = payload.stock.unwrap_or(0);
    if stock < 0 {
        return Err(AppError::validation("Stock cannot be negative"));
    }
    if payload.unit_price < 0.0 {
        return Err(AppError::validation("Unit price cannot be negative"));
    }

    let product = sqlx::query_as::<_, Product>(
        "INSERT INTO products (name, code, unit_price, stock)
         VALUES ($1, $2, $3, $4)
         RETURNING id, name, code, unit_price, stock, created_at",
    )
    .bind(&payload.name)
    .bind(&payload.code)
    .bind(payload.unit_price)
    .bind(stock)
    .fetch_one(&state.db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "Product code already exists"))?;

    Ok((StatusCode::CREATED, Json(ProductResponse::from(product))))
}

// PUT /products/:id - Update product (stock is deliberately not updatable
// here; every stock change goes through a workflow operation)
#[instrument(skip(state, payload), fields(id))]
pub async fn update_product(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<UpdateProductRequest>,
) -> Result<Json<ProductResponse>, AppError> {
    if let Some(price) = payload.unit_price {
        if price < 0.0 {
            return Err(AppError::validation("Unit price cannot be negative"));
        }
    }

    let product = sqlx::query_as::<_, Product>(
        "UPDATE products SET
         name = COALESCE($1, name),
         code = COALESCE($2, code),
         unit_price = COALESCE($3, unit_price)
         WHERE id = $4
         RETURNING id, name, code, unit_price, stock, created_at",
    )
    .bind(payload.name)
    .bind(payload.code)
    .bind(payload.unit_price)
    .bind(&id)
    .fetch_optional(&state.db_pool)
    .await
    .map_err(|e| map_unique_violation(e, "Product code already exists"))?
    .ok_or_else(|| AppError::not_found("Product not found"))?;

    Ok(Json(ProductResponse::from(product)))
}

// DELETE /products/:id - Delete product
#[instrument(skip(state), fields(id))]
pub async fn delete_product(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(&id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| match e {
            SqlxError::Database(db_err) if db_err.code().as_deref() == Some("23503") => {
                AppError::conflict("Product is referenced by purchases, loans or sales")
            }
            other => other.into(),
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Product not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
