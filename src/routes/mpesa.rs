use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers::mpesa_handlers;
use crate::state::AppState;

pub fn mpesa_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(mpesa_handlers::health))
        .route("/initiate-payment/", post(mpesa_handlers::initiate_payment))
        .route("/callback/", post(mpesa_handlers::payment_callback))
}
