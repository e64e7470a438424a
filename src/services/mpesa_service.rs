// services/mpesa_service.rs
use base64::{Engine as _, engine::general_purpose::STANDARD as base64};
use reqwest::{Client, Response, header};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::errors::{AppError, AuthFailure, Result};
use crate::models::payment::PaymentRequest;
use crate::services::password::{gateway_now, generate_password_at};

pub const TRANSACTION_TYPE: &str = "CustomerPayBillOnline";

#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StkPushRequest {
    #[serde(rename = "BusinessShortCode")]
    pub business_short_code: String,
    #[serde(rename = "Password")]
    pub password: String,
    #[serde(rename = "Timestamp")]
    pub timestamp: String,
    #[serde(rename = "TransactionType")]
    pub transaction_type: String,
    #[serde(rename = "Amount")]
    pub amount: String,
    #[serde(rename = "PartyA")]
    pub party_a: String,
    #[serde(rename = "PartyB")]
    pub party_b: String,
    #[serde(rename = "PhoneNumber")]
    pub phone_number: String,
    #[serde(rename = "CallBackURL")]
    pub callback_url: String,
    #[serde(rename = "AccountReference")]
    pub account_reference: String,
    #[serde(rename = "TransactionDesc")]
    pub transaction_desc: String,
}

/// Error body the gateway sends with non-2xx replies.
#[derive(Debug, Deserialize)]
struct GatewayError {
    #[serde(rename = "errorMessage")]
    error_message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MpesaService {
    config: AppConfig,
    client: Client,
}

impl MpesaService {
    pub fn new(config: AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(MpesaService { config, client })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Fetches a fresh OAuth bearer token. Nothing is cached.
    pub async fn get_access_token(&self) -> Result<String> {
        info!("Requesting new access token");
        let auth_string = format!("{}:{}",
                                  self.config.mpesa_consumer_key,
                                  self.config.mpesa_consumer_secret
        );
        let encoded_auth = base64.encode(auth_string);

        let response = self.client
            .get(&self.config.mpesa_urls.auth_url)
            .header(header::AUTHORIZATION, format!("Basic {}", encoded_auth))
            .send()
            .await
            .map_err(auth_transport_failure)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Failed to get access token: {} - {}", status, body);
            return Err(AppError::UpstreamAuth(AuthFailure::Rejected(status.as_u16())));
        }

        let body = response.text().await.map_err(auth_transport_failure)?;
        let auth_response: AuthResponse = serde_json::from_str(&body).map_err(|e| {
            error!("Unparseable token response: {}", e);
            AppError::UpstreamAuth(AuthFailure::Malformed(e.to_string()))
        })?;

        let token = auth_response
            .access_token
            .filter(|token| !token.trim().is_empty())
            .ok_or(AppError::UpstreamAuth(AuthFailure::MissingToken))?;

        debug!("Access token obtained, expires_in={:?}", auth_response.expires_in);
        Ok(token)
    }

    /// The envelope for one push, signed with the password for `timestamp`.
    pub fn build_stk_push_request(
        &self,
        payment: &PaymentRequest,
        password: String,
        timestamp: String,
    ) -> StkPushRequest {
        StkPushRequest {
            business_short_code: self.config.mpesa_short_code.clone(),
            password,
            timestamp,
            transaction_type: TRANSACTION_TYPE.to_string(),
            amount: payment.amount_for_gateway(),
            party_a: payment.phone_number().to_string(),
            party_b: self.config.mpesa_short_code.clone(),
            phone_number: payment.phone_number().to_string(),
            callback_url: self.config.mpesa_callback_url.clone(),
            account_reference: payment.account_reference().to_string(),
            transaction_desc: payment.transaction_desc(),
        }
    }

    /// C2B: sends one STK push and returns the gateway acknowledgement as-is.
    pub async fn initiate_stk_push(&self, payment: &PaymentRequest) -> Result<serde_json::Value> {
        info!(
            "C2B: STK push for {} - KSh {} ({})",
            payment.phone_number(),
            payment.amount_for_gateway(),
            payment.account_reference()
        );

        let access_token = self.get_access_token().await?;
        let (password, timestamp) = generate_password_at(
            &self.config.mpesa_short_code,
            &self.config.mpesa_passkey,
            gateway_now(),
        );
        let stk_request = self.build_stk_push_request(payment, password, timestamp);

        let response = self.client
            .post(&self.config.mpesa_urls.stk_push_url)
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token))
            .header(header::CONTENT_TYPE, "application/json")
            .json(&stk_request)
            .send()
            .await?;

        let response = ensure_accepted(response).await?;
        let body = response.text().await?;
        let acknowledgement: serde_json::Value = serde_json::from_str(&body).map_err(|e| {
            error!("C2B acknowledgement is not JSON: {} - {}", e, body);
            AppError::bad_gateway("Gateway returned an unreadable acknowledgement")
        })?;

        info!(
            "C2B initiated: checkout={}",
            acknowledgement
                .get("CheckoutRequestID")
                .and_then(|v| v.as_str())
                .unwrap_or("<none>")
        );
        Ok(acknowledgement)
    }
}

fn auth_transport_failure(err: reqwest::Error) -> AppError {
    error!("Token request failed: {}", err);
    if err.is_timeout() {
        AppError::UpstreamAuth(AuthFailure::Timeout)
    } else {
        AppError::UpstreamAuth(AuthFailure::Network(err.to_string()))
    }
}

/// Passes 2xx replies through; anything else becomes `UpstreamRejected`
/// carrying the gateway's `errorMessage` when it sent one.
async fn ensure_accepted(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    error!("C2B failed: {} - {}", status, body);

    Err(AppError::UpstreamRejected {
        status: status.as_u16(),
        message: gateway_error_message(&body)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string()),
    })
}

fn gateway_error_message(body: &str) -> Option<String> {
    let parsed = serde_json::from_str::<GatewayError>(body)
        .ok()
        .and_then(|e| e.error_message)
        .filter(|m| !m.trim().is_empty());

    match parsed {
        Some(message) => Some(message),
        None if !body.trim().is_empty() => Some(body.trim().to_string()),
        None => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MpesaEnvironment, MpesaUrls};
    use std::time::Duration;

    fn config() -> AppConfig {
        AppConfig {
            mpesa_consumer_key: "key".to_string(),
            mpesa_consumer_secret: "secret".to_string(),
            mpesa_short_code: "174379".to_string(),
            mpesa_passkey: "passkey".to_string(),
            mpesa_callback_url: "https://example.com/callback/".to_string(),
            mpesa_environment: MpesaEnvironment::Sandbox,
            mpesa_urls: MpesaUrls::from_base("https://sandbox.safaricom.co.ke"),
            http_timeout: Duration::from_secs(5),
            port: 3000,
            host: "127.0.0.1".to_string(),
        }
    }

    #[test]
    fn envelope_has_the_gateway_field_names() {
        let service = MpesaService::new(config()).unwrap();
        let payment = PaymentRequest::new("254712345678", 99.5, "Order123").unwrap();
        let request = service.build_stk_push_request(&payment, "pw".to_string(), "20230101000000".to_string());

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({
                "BusinessShortCode": "174379",
                "Password": "pw",
                "Timestamp": "20230101000000",
                "TransactionType": "CustomerPayBillOnline",
                "Amount": "100",
                "PartyA": "254712345678",
                "PartyB": "174379",
                "PhoneNumber": "254712345678",
                "CallBackURL": "https://example.com/callback/",
                "AccountReference": "Order123",
                "TransactionDesc": "Payment for Order123"
            })
        );
    }

    #[test]
    fn error_message_prefers_gateway_field() {
        let body = r#"{"requestId":"1","errorCode":"400.002.02","errorMessage":"Bad Request - Invalid Amount"}"#;

        assert_eq!(gateway_error_message(body).as_deref(), Some("Bad Request - Invalid Amount"));
        assert_eq!(gateway_error_message("upstream exploded").as_deref(), Some("upstream exploded"));
        assert_eq!(gateway_error_message("   "), None);
    }
}
