use std::time::Duration;

use reqwest::StatusCode;

use crate::request::ApiResponse;

pub const DEFAULT_NOTIFICATION_DURATION: Duration = Duration::from_secs(5);
pub const FALLBACK_MESSAGE: &str = "An unexpected error occurred";

/// Fixed message for a status, if the status has one.
pub fn status_message(status: StatusCode) -> Option<&'static str> {
    match status.as_u16() {
        400 => Some("Bad request"),
        401 => Some("Authentication failed"),
        403 => Some("Forbidden"),
        404 => Some("Not found"),
        422 => Some("Validation failed"),
        429 => Some("Too many requests"),
        500..=599 => Some("Server error"),
        _ => None,
    }
}

/// Body message first, then the status mapping, then the generic fallback.
pub fn classify_response(response: &ApiResponse) -> String {
    response
        .error_body()
        .and_then(|body| body.best_message())
        .or_else(|| status_message(response.status()).map(str::to_string))
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}

/// 401s stay on screen since a logout may follow.
pub fn duration_for(status: Option<StatusCode>) -> Option<Duration> {
    match status {
        Some(StatusCode::UNAUTHORIZED) => None,
        _ => Some(DEFAULT_NOTIFICATION_DURATION),
    }
}
