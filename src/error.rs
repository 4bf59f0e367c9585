// src/error.rs
use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    DatabaseError(sqlx::Error),
    NotFound(String),
    ValidationError(String),
    Conflict(String),
    /// Debit would take the product's stock below zero.
    OutOfStock { product_id: String, available: i32, requested: i32 },
    /// Receive/return quantity exceeds the line's outstanding amount.
    ExceedsRemaining { remaining: i32, requested: i32 },
    /// The loan is already linked to a sale and is terminal.
    ConvertedToSale,
    HasReceivedItems,
    HasReturnedItems,
    HasPaidInstallments,
    AlreadyPaid,
}

impl AppError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::ValidationError(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(msg.into())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Database error occurred".to_string(),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            AppError::OutOfStock { product_id, available, requested } => (
                StatusCode::CONFLICT,
                format!(
                    "Not enough stock for product {}: available {}, requested {}",
                    product_id, available, requested
                ),
            ),
            AppError::ExceedsRemaining { remaining, requested } => (
                StatusCode::CONFLICT,
                format!(
                    "Quantity exceeds the outstanding amount: remaining {}, requested {}",
                    remaining, requested
                ),
            ),
            AppError::ConvertedToSale => (
                StatusCode::CONFLICT,
                "Loan is closed: a sale was already created from it".to_string(),
            ),
            AppError::HasReceivedItems => (
                StatusCode::CONFLICT,
                "Cannot delete: this record has received items".to_string(),
            ),
            AppError::HasReturnedItems => (
                StatusCode::CONFLICT,
                "Cannot delete: this record has returned items".to_string(),
            ),
            AppError::HasPaidInstallments => (
                StatusCode::CONFLICT,
                "Cannot delete: this record has paid installments".to_string(),
            ),
            AppError::AlreadyPaid => (
                StatusCode::CONFLICT,
                "Installment is already paid".to_string(),
            ),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::DatabaseError(err)
    }
}
