// src/dtos/purchase.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::status::PurchaseStatus;

#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    pub supplier_id: String,
    pub items: Vec<PurchaseLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct PurchaseLineRequest {
    pub product_id: String,
    pub quantity: i32,
    pub unit_price: f64,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePurchaseRequest {
    pub supplier_id: String,
}

#[derive(Debug, Deserialize)]
pub struct ReceiveItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct PurchaseResponse {
    pub id: String,
    pub supplier_id: String,
    pub supplier_name: String,
    pub status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
    pub items: Vec<PurchaseItemResponse>,
}

#[derive(Debug, Serialize)]
pub struct PurchaseItemResponse {
    pub product_id: String,
    pub product_name: String,
    pub ordered_qty: i32,
    pub received_qty: i32,
    pub remaining_qty: i32,
    pub unit_price: f64,
}

#[derive(Debug, Serialize)]
pub struct PurchaseListItem {
    pub id: String,
    pub supplier_name: String,
    pub status: PurchaseStatus,
    pub created_at: DateTime<Utc>,
}
