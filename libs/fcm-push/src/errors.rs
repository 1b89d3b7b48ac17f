use thiserror::Error;

/// FCM Client Error Types
#[derive(Error, Debug)]
pub enum FCMError {
    #[error("Malformed service account credential: {0}")]
    MalformedCredential(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to parse private key: {0}")]
    KeyParseError(String),

    #[error("Failed to encode JWT: {0}")]
    JwtEncodeError(String),

    #[error("Token exchange failed with status {status}: {body}")]
    TokenExchangeFailed { status: u16, body: String },

    #[error("Failed to parse token response: {0}")]
    TokenParseError(String),

    #[error("FCM API error {status}: {body}")]
    DispatchFailed { status: u16, body: String },

    #[error("Failed to parse FCM response: {0}")]
    ResponseParseError(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid FCM client configuration: {0}")]
    Config(String),
}

impl FCMError {
    /// Upstream response body for remote API failures
    pub fn upstream_body(&self) -> Option<&str> {
        match self {
            FCMError::TokenExchangeFailed { body, .. } | FCMError::DispatchFailed { body, .. } => {
                Some(body.as_str())
            }
            _ => None,
        }
    }
}

impl From<FCMError> for String {
    fn from(err: FCMError) -> Self {
        err.to_string()
    }
}

pub type Result<T> = std::result::Result<T, FCMError>;
