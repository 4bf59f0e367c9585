// src/routes/products.rs
use axum::{
    routing::{get, put},
    Router,
};

use crate::handlers::product::{
    create_product, delete_product, get_product, get_product_by_code, get_products,
    update_product,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(get_products).post(create_product))
        .route("/products/code/{code}", get(get_product_by_code))
        .route(
            "/products/{id}",
            put(update_product).get(get_product).delete(delete_product),
        )
}
