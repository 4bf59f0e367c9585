// src/dtos/loan.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::status::LoanStatus;

#[derive(Debug, Deserialize)]
pub struct CreateLoanRequest {
    pub customer_id: String,
    pub due_date: NaiveDate,
    pub items: Vec<LoanLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct LoanLineRequest {
    pub product_id: String,
    pub quantity: i32,
    pub unit_price: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLoanRequest {
    pub customer_id: String,
    pub due_date: NaiveDate,
}

#[derive(Debug, Deserialize)]
pub struct ReturnItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct LoanResponse {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub due_date: NaiveDate,
    /// Set once a sale was created from this loan; terminal for returns.
    pub sale_id: Option<String>,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<LoanItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct LoanItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub lent_qty: i32,
    pub returned_qty: i32,
    pub remaining_qty: i32,
    pub unit_price: f64,
}

#[derive(Debug, Serialize)]
pub struct LoanListItem {
    pub id: String,
    pub customer_name: String,
    pub due_date: NaiveDate,
    pub status: LoanStatus,
    pub created_at: DateTime<Utc>,
}
