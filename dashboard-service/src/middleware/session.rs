//! Session-backed extractors for signed-in users.

use std::sync::Arc;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use service_core::error::AppError;
use tower_sessions::Session;

use crate::error::XeroError;
use crate::models::{SessionUser, TokenPair};
use crate::services::{TokenManager, XeroClient};
use crate::AppState;

pub const USER_KEY: &str = "user";
pub const TOKENS_KEY: &str = "xero_tokens";
/// Registry key for the session's token manager. Regenerated on every login.
pub const SESSION_KEY: &str = "session_key";
pub const OAUTH_STATE_KEY: &str = "oauth_state";
pub const PKCE_VERIFIER_KEY: &str = "pkce_verifier";

pub(crate) fn session_error(err: tower_sessions::session::Error) -> AppError {
    AppError::InternalError(anyhow::anyhow!("Session store error: {}", err))
}

async fn session_from_parts(parts: &mut Parts, state: &AppState) -> Result<Session, AppError> {
    Session::from_request_parts(parts, state)
        .await
        .map_err(|(_, msg)| AppError::InternalError(anyhow::anyhow!(msg)))
}

/// The signed-in user, or `401`.
pub struct AuthUser(pub SessionUser);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts, state).await?;
        let user: Option<SessionUser> = session.get(USER_KEY).await.map_err(session_error)?;
        let tokens: Option<TokenPair> = session.get(TOKENS_KEY).await.map_err(session_error)?;

        match (user, tokens) {
            (Some(user), Some(_)) => Ok(AuthUser(user)),
            _ => Err(XeroError::AuthenticationRequired.into()),
        }
    }
}

/// A signed-in session with Xero tokens.
///
/// Handlers build a [`XeroClient`] from it and pass the outcome through
/// [`XeroSession::finish`] so refreshed tokens reach the session store.
pub struct XeroSession {
    session: Session,
    key: String,
    stored: TokenPair,
    manager: Arc<TokenManager>,
}

#[async_trait]
impl FromRequestParts<AppState> for XeroSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let session = session_from_parts(parts, state).await?;

        let tokens: Option<TokenPair> = session.get(TOKENS_KEY).await.map_err(session_error)?;
        let key: Option<String> = session.get(SESSION_KEY).await.map_err(session_error)?;

        let (Some(stored), Some(key)) = (tokens, key) else {
            return Err(XeroError::AuthenticationRequired.into());
        };

        let manager = state.sessions.manager(&key, stored.clone());

        Ok(Self {
            session,
            key,
            stored,
            manager,
        })
    }
}

impl XeroSession {
    pub fn client(&self, state: &AppState) -> XeroClient {
        XeroClient::new(state.http.clone(), state.xero.clone(), self.manager.clone())
    }

    /// Persist the manager's current pair, then map the outcome for the response.
    ///
    /// A rejected refresh grant drops the stored pair, so the next request
    /// is answered with `401` without calling Xero.
    pub async fn finish<T>(
        &self,
        state: &AppState,
        result: Result<T, XeroError>,
    ) -> Result<T, AppError> {
        match self.manager.snapshot().await {
            Some(pair) if pair != self.stored => {
                self.session
                    .insert(TOKENS_KEY, &pair)
                    .await
                    .map_err(session_error)?;
            }
            Some(_) => {}
            None => {
                tracing::info!("Clearing revoked Xero tokens from session");
                self.session
                    .remove::<TokenPair>(TOKENS_KEY)
                    .await
                    .map_err(session_error)?;
                state.sessions.remove(&self.key);
            }
        }

        result.map_err(AppError::from)
    }
}
