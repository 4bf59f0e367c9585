// src/routes/purchases.rs
use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::handlers::purchase;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(
            "/purchases",
            get(purchase::list_purchases).post(purchase::create_purchase),
        )
        .route(
            "/purchases/{id}",
            get(purchase::get_purchase)
                .put(purchase::update_purchase)
                .delete(purchase::delete_purchase),
        )
        .route(
            "/purchases/{id}/items/{product_id}",
            delete(purchase::delete_item),
        )
        .route(
            "/purchases/{id}/items/{product_id}/receive",
            post(purchase::receive_item),
        )
}
