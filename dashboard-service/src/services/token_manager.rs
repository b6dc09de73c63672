//! Session-scoped holder of the Xero token pair.
//!
//! Refreshes are single-flight: callers serialize on `refresh_lock`, and a
//! generation counter tells a waiting caller whether the pair was already
//! rotated while it waited. Xero refresh tokens are single-use, so spending
//! the same one twice would log the user out.

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};

use crate::error::XeroError;
use crate::models::TokenPair;
use crate::services::identity::IdentityClient;
use crate::services::metrics;

struct TokenState {
    /// `None` once the provider rejected the refresh grant.
    pair: Option<TokenPair>,
    generation: u64,
}

/// Access token handed to a caller, tagged with the generation it came from.
#[derive(Debug, Clone)]
pub struct AccessToken {
    pub value: String,
    pub generation: u64,
}

pub struct TokenManager {
    identity: Arc<IdentityClient>,
    state: RwLock<TokenState>,
    refresh_lock: Mutex<()>,
}

impl TokenManager {
    pub fn new(identity: Arc<IdentityClient>, pair: TokenPair) -> Self {
        Self {
            identity,
            state: RwLock::new(TokenState {
                pair: Some(pair),
                generation: 0,
            }),
            refresh_lock: Mutex::new(()),
        }
    }

    /// Expired when now is at or past the expiry. A revoked session is always expired.
    pub async fn is_expired(&self) -> bool {
        let state = self.state.read().await;
        state
            .pair
            .as_ref()
            .map_or(true, |pair| pair.is_expired_at(Utc::now()))
    }

    /// Whether the provider rejected the refresh grant for this session.
    pub async fn is_revoked(&self) -> bool {
        self.state.read().await.pair.is_none()
    }

    pub async fn snapshot(&self) -> Option<TokenPair> {
        self.state.read().await.pair.clone()
    }

    /// Current access token, refreshed first if it has expired.
    pub async fn access_token(&self) -> Result<AccessToken, XeroError> {
        let generation = {
            let state = self.state.read().await;
            let pair = state
                .pair
                .as_ref()
                .ok_or(XeroError::AuthenticationRequired)?;
            if !pair.is_expired_at(Utc::now()) {
                return Ok(AccessToken {
                    value: pair.access_token().to_string(),
                    generation: state.generation,
                });
            }
            state.generation
        };

        tracing::debug!("Xero access token expired, refreshing before use");
        self.refresh_after(generation).await?;

        let state = self.state.read().await;
        let pair = state
            .pair
            .as_ref()
            .ok_or(XeroError::AuthenticationRequired)?;
        Ok(AccessToken {
            value: pair.access_token().to_string(),
            generation: state.generation,
        })
    }

    /// Exchange the refresh token for a new pair.
    ///
    /// Concurrent calls share a single grant: whoever gets the lock first
    /// talks to Xero, the rest return the pair it produced.
    pub async fn refresh(&self) -> Result<TokenPair, XeroError> {
        let observed = self.state.read().await.generation;
        self.refresh_after(observed).await
    }

    /// Refresh unless the pair has moved past `observed` already.
    pub async fn refresh_after(&self, observed: u64) -> Result<TokenPair, XeroError> {
        let _guard = self.refresh_lock.lock().await;

        let refresh_token = {
            let state = self.state.read().await;
            let pair = state
                .pair
                .as_ref()
                .ok_or(XeroError::AuthenticationRequired)?;
            if state.generation != observed {
                tracing::debug!(
                    generation = state.generation,
                    "Xero token already refreshed by a concurrent request"
                );
                return Ok(pair.clone());
            }
            pair.refresh_token().to_string()
        };

        match self.identity.refresh(&refresh_token).await {
            Ok(pair) => {
                let mut state = self.state.write().await;
                state.pair = Some(pair.clone());
                state.generation += 1;
                metrics::record_token_refresh("success");
                tracing::info!(
                    generation = state.generation,
                    expires_at = %pair.expires_at(),
                    "Xero access token refreshed"
                );
                Ok(pair)
            }
            Err(err @ XeroError::TokenRefreshFailed(_)) => {
                let mut state = self.state.write().await;
                state.pair = None;
                state.generation += 1;
                metrics::record_token_refresh("rejected");
                tracing::warn!(error = %err, "Xero rejected refresh grant; session needs re-authentication");
                Err(err)
            }
            Err(err) => {
                metrics::record_token_refresh("error");
                tracing::error!(error = %err, "Xero token refresh failed");
                Err(err)
            }
        }
    }
}
