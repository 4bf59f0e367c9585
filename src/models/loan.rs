// src/models/loan.rs
use sqlx::FromRow;

/// Loan line joined with the product name for detail views.
#[derive(Debug, FromRow)]
pub struct LoanItem {
    pub product_id: String,
    pub product_name: String,
    pub lent_qty: i32,
    pub returned_qty: i32,
    pub unit_price: f64,
}
