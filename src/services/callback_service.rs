// services/callback_service.rs
use tracing::{info, warn};

use crate::errors::{AppError, Result};
use crate::models::mpesa_callback::{CallbackResponse, CallbackStatus, StkCallback};

/// Turns a gateway STK callback into the normalized result.
///
/// Only `ResultCode == 0` is a success, and a success must name the checkout
/// request and the amount paid. Every other code is a failed payment, reported
/// with the gateway's own description.
pub fn process_stk_callback(callback: &StkCallback) -> Result<CallbackResponse> {
    if callback.result_code != 0 {
        warn!(
            "STK payment failed: code={} desc={} checkout={:?}",
            callback.result_code, callback.result_desc, callback.checkout_request_id
        );
        return Ok(CallbackResponse {
            status: CallbackStatus::Failed,
            message: callback.result_desc.clone(),
            checkout_request_id: None,
        });
    }

    let checkout_request_id = callback
        .checkout_request_id
        .as_deref()
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| AppError::invalid_data("Successful callback is missing CheckoutRequestID"))?
        .to_string();

    let amount = callback
        .metadata_value("Amount")
        .ok_or_else(|| AppError::invalid_data("Successful callback is missing the Amount metadata item"))?;

    info!(
        "STK payment succeeded: checkout={} amount={} receipt={:?} phone={:?}",
        checkout_request_id,
        amount,
        callback.metadata_value("MpesaReceiptNumber"),
        callback.metadata_value("PhoneNumber"),
    );

    Ok(CallbackResponse {
        status: CallbackStatus::Success,
        message: format!("Payment of {} received", amount),
        checkout_request_id: Some(checkout_request_id),
    })
}
