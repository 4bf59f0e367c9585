// src/routes/suppliers.rs
use axum::{routing::get, Router};

use crate::handlers::supplier::{
    create_supplier, delete_supplier, get_supplier, get_suppliers, update_supplier,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/suppliers", get(get_suppliers).post(create_supplier))
        .route(
            "/suppliers/{id}",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}
