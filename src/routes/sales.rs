// src/routes/sales.rs
use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::sale;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sales", get(sale::list_sales).post(sale::create_sale))
        .route(
            "/sales/{id}",
            get(sale::get_sale)
                .put(sale::update_sale)
                .delete(sale::delete_sale),
        )
        .route(
            "/sales/{id}/installments/{installment_id}/payment",
            post(sale::pay_installment),
        )
}
