// src/models/sale.rs
use chrono::NaiveDate;
use sqlx::FromRow;

use crate::domain::installments;

#[derive(Debug, FromRow)]
pub struct SaleItem {
    pub product_id: String,
    pub product_name: String,
    pub qty: i32,
    pub unit_price: f64,
}

#[derive(Debug, FromRow)]
pub struct Installment {
    pub id: String,
    pub due_date: NaiveDate,
    pub value: f64,
    pub status: String,
    pub payment_date: Option<NaiveDate>,
}

impl Installment {
    pub fn is_paid(&self) -> bool {
        self.status == installments::PAID
    }
}
