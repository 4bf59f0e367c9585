// src/handlers/supplier.rs
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use sqlx::Error as SqlxError;

use crate::dtos::party::{CreatePartyRequest, PartyResponse, UpdatePartyRequest};
use crate::error::AppError;
use crate::models::party::Party;
use crate::state::AppState;

// GET /suppliers
pub async fn get_suppliers(
    State(state): State<AppState>,
) -> Result<Json<Vec<PartyResponse>>, AppError> {
    let suppliers = sqlx::query_as::<_, Party>(
        "SELECT id, name, created_at FROM suppliers ORDER BY name",
    )
    .fetch_all(&state.db_pool)
    .await?;

    Ok(Json(suppliers.into_iter().map(PartyResponse::from).collect()))
}

// GET /suppliers/:id
pub async fn get_supplier(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<PartyResponse>, AppError> {
    let supplier = sqlx::query_as::<_, Party>(
        "SELECT id, name, created_at FROM suppliers WHERE id = $1",
    )
    .bind(&id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Supplier not found"))?;

    Ok(Json(PartyResponse::from(supplier)))
}

// POST /suppliers
pub async fn create_supplier(
    State(state): State<AppState>,
    Json(payload): Json<CreatePartyRequest>,
) -> Result<(StatusCode, Json<PartyResponse>), AppError> {
    if payload.name.trim().is_empty() {
        return Err(AppError::validation("Name is required"));
    }

    let supplier = sqlx::query_as::<_, Party>(
        "INSERT INTO suppliers (name) VALUES ($1) RETURNING id, name, created_at",
    )
    .bind(payload.name.trim())
    .fetch_one(&state.db_pool)
    .await?;

    Ok((StatusCode::CREATED, Json(PartyResponse::from(supplier))))
}

// PUT /suppliers/:id
pub async fn update_supplier(
    Path(id): Path<String>,
    State(state): State<AppState>,
    Json(payload): Json<UpdatePartyRequest>,
) -> Result<Json<PartyResponse>, AppError> {
    let supplier = sqlx::query_as::<_, Party>(
        "UPDATE suppliers SET name = COALESCE($1, name)
         WHERE id = $2 RETURNING id, name, created_at",
    )
    .bind(payload.name)
    .bind(&id)
    .fetch_optional(&state.db_pool)
    .await?
    .ok_or_else(|| AppError::not_found("Supplier not found"))?;

    Ok(Json(PartyResponse::from(supplier)))
}

// DELETE /suppliers/:id
pub async fn delete_supplier(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<StatusCode, AppError> {
    let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
        .bind(&id)
        .execute(&state.db_pool)
        .await
        .map_err(|e| match e {
            SqlxError::Database(db_err) if db_err.code().as_deref() == Some("23503") => {
                AppError::conflict("Supplier has purchases")
            }
            other => other.into(),
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::not_found("Supplier not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}
