use h10cm_core::ServiceError;

/// Client-side API error.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP {status}: {message}")]
    Server { status: u16, message: String },

    #[error("network: {0}")]
    Network(#[from] reqwest::Error),

    #[error("auth: {0}")]
    Auth(String),

    #[error("decode: {0}")]
    Decode(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Server { status, .. } => Some(*status),
            ApiError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<ApiError> for ServiceError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::Server { status, message } => ServiceError::from_status(status, message),
            ApiError::Network(e) => ServiceError::Unavailable(e.to_string()),
            ApiError::Auth(msg) => ServiceError::Unauthorized(msg),
            ApiError::Decode(msg) => ServiceError::Internal(format!("malformed response: {msg}")),
        }
    }
}

/// Pull a human-readable message out of an error body.
///
/// The backend answers failures with `{"error": "..."}` or
/// `{"message": "..."}`; anything else is passed through as text.
pub(crate) fn error_message(body: &str) -> String {
    let parsed: Option<serde_json::Value> = serde_json::from_str(body).ok();
    parsed
        .as_ref()
        .and_then(|v| v.get("error").or_else(|| v.get("message")))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .unwrap_or_else(|| body.trim().to_string())
}
