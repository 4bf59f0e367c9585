// src/handlers/customer.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::Error as SqlxError;
use tracing::instrument;

use crate::dtos::party::{CreatePartyRequest, PartyResponse, UpdatePartyRequest};
use crate::error::AppError;
use crate::models::party::Party;
use crate::state::AppState;

// GET /customers
pub async fn get_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<PartyResponse>>, AppError> {
    let customers = sqlx::query_as::<_, Party>(
        "SELECT id, name, created_at FROM customers ORDER BY name",
    )
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(customers.into_iter().map(PartyResponse::from).collect()))
}

// GET /customers/:id
pub async fn get_customer(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PartyResponse>, AppError> {
    let customer = sqlx::query_as::<_, Party>(
        "SELECT id, name, created_at FROM customers WHERE id = $1",
    )
    .bind(&id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Customer not found"))?;

    Ok(Json(PartyResponse::from(customer)))
}

// POST /customers
#[instrument(skip(state, payload))]
pub async fn create_customer(
    State(state): State<AppState>,
    Json(payload): Json<CreatePartyRequest>,
) -> Result<(StatusCode, Json<PartyResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Name is required"));
    }

    let customer = sqlx::query_as::<_, Party>(
        "INSERT INTO customers (name) VALUES ($1) RETURNING id, name, created_at",
    )
    .bind(payload.name.trim())
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(PartyResponse::from(customer))))
}

// PUT /customers/:id
pub async fn update_customer(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<UpdatePartyRequest>,
) -> Result<Json<PartyResponse>, AppError> {
    let customer = sqlx::query_as::<_, Party>(
        "UPDATE customers SET name = COALESCE($1, name)
         WHERE id = $2 RETURNING id, name, created_at",
    )
    .bind(payload.name)
    .bind(&id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Customer not found"))?;

    Ok(Json(PartyResponse::from(customer)))
}

// DELETE /customers/:id
pub async fn delete_customer(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM customers WHERE id = $1")
        .bind(&id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| match e {
            SqlxError::Database(db_err) if db_err.code().as_deref() == Some("23503") => {
                AppError::conflict("Customer has loans or sales")
            }
            other => other.into(),
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Customer not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
