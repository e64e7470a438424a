// handlers/mpesa_handlers.rs
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::errors::{AppError, Result};
use crate::models::mpesa_callback::{CallbackData, CallbackResponse};
use crate::models::payment::{PaymentRequest, PaymentRequestPayload};
use crate::services::callback_service::process_stk_callback;
use crate::state::AppState;

fn rejection_to_error(rejection: JsonRejection) -> AppError {
    AppError::invalid_data(rejection.body_text())
}

pub async fn initiate_payment(
    State(state): State<AppState>,
    payload: std::result::Result<Json<PaymentRequestPayload>, JsonRejection>,
) -> Result<Json<Value>> {
    let Json(payload) = payload.map_err(rejection_to_error)?;
    let payment = PaymentRequest::try_from(payload)?;

    let acknowledgement = state.mpesa_service.initiate_stk_push(&payment).await?;
    Ok(Json(acknowledgement))
}

pub async fn payment_callback(
    payload: std::result::Result<Json<CallbackData>, JsonRejection>,
) -> Result<Json<CallbackResponse>> {
    let Json(payload) = payload.map_err(rejection_to_error)?;
    info!("Received M-Pesa callback: {:?}", payload.body.stk_callback);

    let response = process_stk_callback(&payload.body.stk_callback)?;
    Ok(Json(response))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "mpesa",
        "config": state.config().get_config_info(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
