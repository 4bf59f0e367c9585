// src/models/purchase.rs
use sqlx::FromRow;

/// Purchase line joined with the product name for detail views.
#[derive(Debug, FromRow)]
pub struct PurchaseItem {
    pub product_id: String,
    pub product_name: String,
    pub ordered_qty: i32,
    pub received_qty: i32,
    pub unit_price: f64,
}
