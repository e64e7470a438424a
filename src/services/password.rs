// services/password.rs
use base64::{Engine as _, engine::general_purpose::STANDARD as base64};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};

/// The gateway reads STK timestamps as East Africa Time (UTC+03:00, no DST).
const EAT_OFFSET_SECS: i32 = 3 * 3600;

/// `YYYYMMDDHHMMSS`, the only timestamp layout the STK endpoint accepts.
pub fn stk_timestamp(now: NaiveDateTime) -> String {
    now.format("%Y%m%d%H%M%S").to_string()
}

/// base64(shortcode + passkey + timestamp)
pub fn generate_password(short_code: &str, passkey: &str, timestamp: &str) -> String {
    base64.encode(format!("{}{}{}", short_code, passkey, timestamp))
}

/// Password and timestamp for a push sent at `now`.
pub fn generate_password_at(short_code: &str, passkey: &str, now: NaiveDateTime) -> (String, String) {
    let timestamp = stk_timestamp(now);
    let password = generate_password(short_code, passkey, &timestamp);
    (password, timestamp)
}

/// Current wall-clock time in the gateway's timezone.
pub fn gateway_now() -> NaiveDateTime {
    let now = Utc::now();
    match FixedOffset::east_opt(EAT_OFFSET_SECS) {
        Some(eat) => to_gateway_time(now, &eat),
        None => now.naive_utc(),
    }
}

fn to_gateway_time(now: DateTime<Utc>, offset: &FixedOffset) -> NaiveDateTime {
    now.with_timezone(offset).naive_local()
}
