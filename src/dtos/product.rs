// src/dtos/product.rs
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    pub code: String,
    pub unit_price: f64,
    /// Opening quantity on hand. After creation, stock only moves through
    /// receiving, lending, selling and their reversals.
    pub stock: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProductRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub unit_price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub struct ProductResponse {
    pub id: String,
    pub name: String,
    pub code: String,
    pub unit_price: f64,
    pub stock: i32,
    pub created_at: String,
}

// Convert from Model to Response DTO
impl From<crate::models::product::Product> for ProductResponse {
    fn from(product: crate::models::product::Product) -> Self {
        Self {
            id: product.id,
            name: product.name,
            code: product.code,
            unit_price: product.unit_price,
            stock: product.stock,
            created_at: product.created_at.to_rfc3339(),
        }
    }
}
