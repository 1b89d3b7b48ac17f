use serde::{Deserialize, Deserializer, Serialize};
use std::path::Path;

use crate::errors::{FCMError, Result};

/// Google OAuth2 token endpoint used when a credential does not name one
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Firebase Service Account Key
///
/// Mirrors the JSON credential file issued by the Google Cloud console.
/// Only `private_key`, `client_email` and `project_id` are required; the
/// remaining fields are carried through untouched.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceAccountKey {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub account_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub project_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub private_key_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub private_key: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client_email: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri", deserialize_with = "null_as_default")]
    pub token_uri: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub auth_provider_x509_cert_url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub client_x509_cert_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub universe_domain: Option<String>,
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

// Credential files exported by some tools carry `null` for unused fields
fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl std::fmt::Debug for ServiceAccountKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceAccountKey")
            .field("type", &self.account_type)
            .field("project_id", &self.project_id)
            .field("private_key_id", &self.private_key_id)
            .field("private_key", &"<redacted>")
            .field("client_email", &self.client_email)
            .field("client_id", &self.client_id)
            .field("token_uri", &self.token_uri)
            .finish()
    }
}

impl ServiceAccountKey {
    /// Parse and validate a service account from its JSON text
    pub fn from_json_str(json: &str) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_str(json).map_err(|e| {
            FCMError::MalformedCredential(format!("Failed to parse service account JSON: {}", e))
        })?;
        key.validate()?;
        Ok(key)
    }

    /// Build a service account from an already parsed JSON value
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let key: ServiceAccountKey = serde_json::from_value(value).map_err(|e| {
            FCMError::MalformedCredential(format!("Invalid service account object: {}", e))
        })?;
        key.validate()?;
        Ok(key)
    }

    /// Load a service account from a credential file on disk
    ///
    /// Typically the path held in `GOOGLE_APPLICATION_CREDENTIALS`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| {
            FCMError::MalformedCredential(format!(
                "Failed to read service account file {}: {}",
                path.display(),
                e
            ))
        })?;
        Self::from_json_str(&json)
    }

    /// Check that every field needed for signing and dispatch is present
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("private_key", &self.private_key),
            ("client_email", &self.client_email),
            ("project_id", &self.project_id),
        ];

        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(FCMError::MalformedCredential(format!(
                    "missing required field `{}`",
                    field
                )));
            }
        }

        Ok(())
    }

    /// Token endpoint used both as JWT audience and exchange URL
    ///
    /// Taken from the credential's `token_uri`, falling back to
    /// [`DEFAULT_TOKEN_URI`]. The signed assertion is posted to this host,
    /// so only load credentials from trusted sources.
    pub fn token_endpoint(&self) -> &str {
        if self.token_uri.trim().is_empty() {
            DEFAULT_TOKEN_URI
        } else {
            &self.token_uri
        }
    }
}
