use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Access/refresh token pair for one Xero login.
///
/// Stored server-side in the session. `Debug` never prints the secrets.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    access_token: String,
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

impl TokenPair {
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_at,
        }
    }

    /// Build a pair from a token endpoint response received at `now`.
    pub fn issued_at(
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in_secs: i64,
        now: DateTime<Utc>,
    ) -> Self {
        Self::new(
            access_token,
            refresh_token,
            now + Duration::seconds(expires_in_secs),
        )
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Expired at or after the recorded expiry instant.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn pair_expiring_at(expires_at: DateTime<Utc>) -> TokenPair {
        TokenPair::new("access", "refresh", expires_at)
    }

    #[test]
    fn expired_exactly_at_expiry() {
        let expiry = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let pair = pair_expiring_at(expiry);

        assert!(!pair.is_expired_at(expiry - Duration::seconds(1)));
        assert!(pair.is_expired_at(expiry));
        assert!(pair.is_expired_at(expiry + Duration::seconds(1)));
    }

    #[test]
    fn issued_at_adds_expires_in() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let pair = TokenPair::issued_at("a", "r", 1800, now);
        assert_eq!(pair.expires_at(), now + Duration::minutes(30));
        assert!(!pair.is_expired_at(now));
    }

    #[test]
    fn debug_redacts_secrets() {
        let pair = TokenPair::new("very-secret-access", "very-secret-refresh", Utc::now());
        let printed = format!("{:?}", pair);
        assert!(!printed.contains("very-secret"));
        assert!(printed.contains("[REDACTED]"));
    }
}
