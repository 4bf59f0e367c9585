// src/routes/customers.rs
use axum::{routing::get, Router};

use crate::handlers::customer::{
    create_customer, delete_customer, get_customer, get_customers, update_customer,
};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/customers", get(get_customers).post(create_customer))
        .route(
            "/customers/{id}",
            get(get_customer).put(update_customer).delete(delete_customer),
        )
}
