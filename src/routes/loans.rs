// src/routes/loans.rs
use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::{loan, sale};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/loans", get(loan::list_loans).post(loan::create_loan))
        .route(
            "/loans/{id}",
            get(loan::get_loan)
                .put(loan::update_loan)
                .delete(loan::delete_loan),
        )
        .route(
            "/loans/{id}/items/{product_id}/return",
            post(loan::return_item),
        )
        .route("/loans/{id}/return-all", post(loan::return_all))
        // Converting a loan closes it and creates the sale in one step.
        .route("/loans/{id}/sale", post(sale::create_sale_from_loan))
}
