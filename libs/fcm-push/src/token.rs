use chrono::Utc;
use serde::Deserialize;

/// Source of wall-clock time in epoch seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Clock backed by the system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// OAuth2 Token Cache
#[derive(Debug, Clone)]
pub struct TokenCache {
    pub access_token: String,
    pub expires_at: i64,
}

impl TokenCache {
    pub fn new(access_token: String, issued_at: i64, expires_in: i64) -> Self {
        Self {
            access_token,
            expires_at: issued_at.saturating_add(expires_in),
        }
    }

    /// True while `now` is outside the refresh margin before expiry
    pub fn is_fresh(&self, now: i64, margin_secs: i64) -> bool {
        now.saturating_add(margin_secs) < self.expires_at
    }
}

/// Google OAuth2 Token Response
#[derive(Debug, Deserialize)]
pub struct GoogleTokenResponse {
    pub access_token: String,
    pub expires_in: i64,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_outside_margin() {
        let cache = TokenCache::new("abc".to_string(), 1_000, 400);
        assert_eq!(cache.expires_at, 1_400);

        assert!(cache.is_fresh(1_000, 300));
        assert!(cache.is_fresh(1_099, 300));
    }

    #[test]
    fn test_stale_inside_margin() {
        let cache = TokenCache::new("abc".to_string(), 1_000, 400);

        // exactly at the margin boundary counts as stale
        assert!(!cache.is_fresh(1_100, 300));
        assert!(!cache.is_fresh(1_500, 300));
    }

    #[test]
    fn test_huge_expires_in_saturates() {
        let cache = TokenCache::new("abc".to_string(), 1_700_000_000, i64::MAX);

        assert_eq!(cache.expires_at, i64::MAX);
        assert!(cache.is_fresh(1_700_000_000, 300));
    }

    #[test]
    fn test_token_response_without_type() {
        let response: GoogleTokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":3599}"#).unwrap();

        assert_eq!(response.access_token, "abc");
        assert_eq!(response.expires_in, 3599);
        assert!(response.token_type.is_none());
    }

    #[test]
    fn test_system_clock_is_current() {
        let now = SystemClock.now();
        assert!((now - Utc::now().timestamp()).abs() <= 1);
    }
}
