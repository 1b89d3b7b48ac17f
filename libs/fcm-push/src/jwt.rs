use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::credentials::ServiceAccountKey;
use crate::errors::{FCMError, Result};

/// OAuth2 scope granting access to the FCM send API
pub const FCM_SCOPE: &str = "https://www.googleapis.com/auth/firebase.messaging";

/// Grant type for exchanging a signed assertion for an access token
pub const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";

/// JWT Claims for Google OAuth2
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct JwtClaims {
    pub iss: String,
    pub scope: String,
    pub aud: String,
    pub iat: i64,
    pub exp: i64,
}

impl JwtClaims {
    pub fn for_service_account(key: &ServiceAccountKey, issued_at: i64, lifetime_secs: i64) -> Self {
        Self {
            iss: key.client_email.clone(),
            scope: FCM_SCOPE.to_string(),
            aud: key.token_endpoint().to_string(),
            iat: issued_at,
            exp: issued_at + lifetime_secs,
        }
    }
}

/// Signs JWT-bearer assertions with a service account's RSA key
///
/// The PEM key is parsed once up front; a key that cannot be parsed
/// surfaces as `KeyParseError` on the first token request.
pub struct AssertionSigner {
    encoding_key: std::result::Result<EncodingKey, String>,
}

impl std::fmt::Debug for AssertionSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssertionSigner")
            .field("algorithm", &Algorithm::RS256)
            .field("encoding_key", &"<redacted>")
            .finish()
    }
}

impl AssertionSigner {
    pub fn new(private_key_pem: &str) -> Self {
        let encoding_key =
            EncodingKey::from_rsa_pem(private_key_pem.as_bytes()).map_err(|e| e.to_string());
        Self { encoding_key }
    }

    /// Produce `base64url(header).base64url(claims).base64url(signature)`
    pub fn sign(&self, claims: &JwtClaims) -> Result<String> {
        let key = self
            .encoding_key
            .as_ref()
            .map_err(|e| FCMError::KeyParseError(e.clone()))?;

        encode(&Header::new(Algorithm::RS256), claims, key)
            .map_err(|e| FCMError::JwtEncodeError(e.to_string()))
    }
}
