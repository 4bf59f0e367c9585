// src/models/product.rs
use chrono::{DateTime, Utc};
use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub code: String,
    pub unit_price: f64,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}
