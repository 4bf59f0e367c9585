// src/dtos/sale.rs
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::status::SaleStatus;

#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub customer_id: String,
    pub installment_count: i32,
    pub first_due_date: NaiveDate,
    pub items: Vec<SaleLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct SaleLineRequest {
    pub product_id: String,
    pub quantity: i32,
    pub unit_price: f64,
}

/// Creates a sale from a loan's outstanding remainders. Quantities come
/// from the loan itself; the caller only prices each product.
#[derive(Debug, Deserialize)]
pub struct CreateSaleFromLoanRequest {
    pub installment_count: i32,
    pub first_due_date: NaiveDate,
    pub unit_prices: Vec<LoanSalePrice>,
}

#[derive(Debug, Deserialize)]
pub struct LoanSalePrice {
    pub product_id: String,
    pub unit_price: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSaleRequest {
    pub customer_id: String,
}

#[derive(Debug, Deserialize)]
pub struct PayInstallmentRequest {
    pub payment_date: NaiveDate,
}

#[derive(Debug, Serialize)]
pub struct SaleResponse {
    pub id: String,
    pub customer_name: String,
    /// Present when this sale was created from a loan.
    pub loan_id: Option<String>,
    pub status: SaleStatus,
    pub total: f64,
    pub created_at: DateTime<Utc>,
    pub items: Vec<SaleItemResponse>,
    pub installments: Vec<InstallmentResponse>,
}

#[derive(Debug, Serialize)]
pub struct SaleItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: f64,
    pub line_total: f64,
}

#[derive(Debug, Serialize)]
pub struct InstallmentResponse {
    pub id: String,
    pub due_date: NaiveDate,
    pub value: f64,
    pub status: String,
    pub payment_date: Option<NaiveDate>,
}

impl From<crate::models::sale::Installment> for InstallmentResponse {
    fn from(installment: crate::models::sale::Installment) -> Self {
        Self {
            id: installment.id,
            due_date: installment.due_date,
            value: installment.value,
            status: installment.status,
            payment_date: installment.payment_date,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SaleListItem {
    pub id: String,
    pub customer_name: String,
    pub status: SaleStatus,
    pub pending_installments: i64,
    pub late_installments: i64,
    pub created_at: DateTime<Utc>,
}
