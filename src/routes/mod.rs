// src/routes/mod.rs
pub mod customers;
pub mod loans;
pub mod products;
pub mod purchases;
pub mod sales;
pub mod suppliers;

use axum::Router;

use crate::state::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .merge(products::routes())
        .merge(customers::routes())
        .merge(suppliers::routes())
        .merge(purchases::routes())
        .merge(loans::routes())
        .merge(sales::routes())
}
