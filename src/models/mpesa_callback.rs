use serde::{Deserialize, Serialize};

/// Envelope the gateway POSTs to the callback URL.
#[derive(Debug, Clone, Deserialize)]
pub struct CallbackData {
    #[serde(rename = "Body")]
    pub body: CallbackBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: Option<String>,
    #[serde(rename = "CheckoutRequestID", default)]
    pub checkout_request_id: Option<String>,
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
    #[serde(rename = "CallbackMetadata", default)]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    pub items: Vec<MetadataItem>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetadataItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default)]
    pub value: Option<serde_json::Value>,
}

impl StkCallback {
    /// Metadata value for `name`, rendered as text. Null, empty and
    /// non-scalar values count as absent.
    pub fn metadata_value(&self, name: &str) -> Option<String> {
        let item = self
            .callback_metadata
            .as_ref()?
            .items
            .iter()
            .find(|item| item.name == name)?;

        match item.value.as_ref()? {
            serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CallbackStatus {
    Success,
    Failed,
}

/// What `POST /callback/` answers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackResponse {
    pub status: CallbackStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checkout_request_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_gateway_success_payload() {
        let raw = r#"{
            "Body": {
                "stkCallback": {
                    "MerchantRequestID": "29115-34620561-1",
                    "CheckoutRequestID": "ws_CO_191220191020363925",
                    "ResultCode": 0,
                    "ResultDesc": "The service request is processed successfully.",
                    "CallbackMetadata": {
                        "Item": [
                            {"Name": "Amount", "Value": 1.00},
                            {"Name": "MpesaReceiptNumber", "Value": "NLJ7RT61SV"},
                            {"Name": "Balance"},
                            {"Name": "TransactionDate", "Value": 20191219102115},
                            {"Name": "PhoneNumber", "Value": 254708374149}
                        ]
                    }
                }
            }
        }"#;
        let data: CallbackData = serde_json::from_str(raw).unwrap();
        let callback = data.body.stk_callback;

        assert_eq!(callback.result_code, 0);
        assert_eq!(callback.checkout_request_id.as_deref(), Some("ws_CO_191220191020363925"));
        assert_eq!(callback.metadata_value("Amount").as_deref(), Some("1.0"));
        assert_eq!(callback.metadata_value("MpesaReceiptNumber").as_deref(), Some("NLJ7RT61SV"));
        assert_eq!(callback.metadata_value("PhoneNumber").as_deref(), Some("254708374149"));
        assert_eq!(callback.metadata_value("Balance"), None);
        assert_eq!(callback.metadata_value("Missing"), None);
    }

    #[test]
    fn failure_payload_needs_no_metadata() {
        let raw = r#"{"Body":{"stkCallback":{
            "MerchantRequestID":"m-1","CheckoutRequestID":"ws_2",
            "ResultCode":1032,"ResultDesc":"Request cancelled by user"}}}"#;
        let data: CallbackData = serde_json::from_str(raw).unwrap();

        assert_eq!(data.body.stk_callback.result_code, 1032);
        assert!(data.body.stk_callback.callback_metadata.is_none());
    }

    #[test]
    fn missing_envelope_is_a_parse_error() {
        assert!(serde_json::from_str::<CallbackData>(r#"{"stkCallback":{}}"#).is_err());
        assert!(serde_json::from_str::<CallbackData>(r#"{"Body":{"stkCallback":{"ResultDesc":"x"}}}"#).is_err());
    }

    #[test]
    fn response_omits_absent_checkout_id() {
        let response = CallbackResponse {
            status: CallbackStatus::Failed,
            message: "Insufficient funds".to_string(),
            checkout_request_id: None,
        };

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            serde_json::json!({"status": "failed", "message": "Insufficient funds"})
        );
    }
}
