//! Xero sign-in: authorization code flow with PKCE.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use service_core::error::AppError;
use tower_sessions::Session;
use uuid::Uuid;

use crate::middleware::session::{
    session_error, OAUTH_STATE_KEY, PKCE_VERIFIER_KEY, SESSION_KEY, TOKENS_KEY, USER_KEY,
};
use crate::models::{SessionUser, TokenPair};
use crate::utils::jwt::decode_id_token;
use crate::utils::pkce::Pkce;
use crate::AppState;

/// Where the browser lands after a successful sign-in.
pub const DASHBOARD_PATH: &str = "/dashboard";

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

fn error_redirect(code: &str) -> Response {
    let query = serde_urlencoded::to_string([("error", code)]).unwrap_or_default();
    Redirect::to(&format!("/auth/error?{}", query)).into_response()
}

/// Start the Xero login: remember state and PKCE verifier, then redirect.
pub async fn login(State(state): State<AppState>, session: Session) -> Result<Redirect, AppError> {
    let pkce = Pkce::generate();
    let csrf_state = Uuid::new_v4().simple().to_string();

    session
        .insert(OAUTH_STATE_KEY, &csrf_state)
        .await
        .map_err(session_error)?;
    session
        .insert(PKCE_VERIFIER_KEY, &pkce.verifier)
        .await
        .map_err(session_error)?;

    let url = state
        .identity
        .authorize_url(&csrf_state, &pkce.challenge)
        .map_err(AppError::ConfigError)?;

    tracing::info!("Redirecting to Xero login");
    Ok(Redirect::to(&url))
}

/// Finish the Xero login and establish the session.
pub async fn callback(
    State(state): State<AppState>,
    session: Session,
    Query(params): Query<CallbackParams>,
) -> Result<Response, AppError> {
    // Single use, whatever the outcome
    let expected_state: Option<String> = session
        .remove(OAUTH_STATE_KEY)
        .await
        .map_err(session_error)?;
    let verifier: Option<String> = session
        .remove(PKCE_VERIFIER_KEY)
        .await
        .map_err(session_error)?;

    if let Some(error) = params.error.as_deref() {
        tracing::warn!(error = %error, "Xero login was not completed");
        return Ok(error_redirect(error));
    }

    let (Some(expected), Some(received)) = (expected_state, params.state.as_deref()) else {
        tracing::warn!("Xero callback without a pending login");
        return Ok(error_redirect("invalid_state"));
    };
    if expected != received {
        tracing::warn!("Xero callback state mismatch");
        return Ok(error_redirect("invalid_state"));
    }

    let (Some(code), Some(verifier)) = (params.code.as_deref(), verifier) else {
        return Ok(error_redirect("missing_code"));
    };

    let exchange = match state.identity.exchange_code(code, &verifier).await {
        Ok(exchange) => exchange,
        Err(e) => {
            tracing::error!(error = %e, "Xero code exchange failed");
            return Ok(error_redirect("token_exchange_failed"));
        }
    };

    let user = match exchange.id_token.as_deref().map(decode_id_token) {
        Some(Ok(claims)) => SessionUser::from(claims),
        Some(Err(e)) => {
            tracing::error!(error = %e, "Failed to decode Xero ID token");
            return Ok(error_redirect("invalid_id_token"));
        }
        None => {
            tracing::error!("Xero token response had no ID token");
            return Ok(error_redirect("invalid_id_token"));
        }
    };

    session.cycle_id().await.map_err(session_error)?;
    session.insert(USER_KEY, &user).await.map_err(session_error)?;
    session
        .insert(TOKENS_KEY, &exchange.tokens)
        .await
        .map_err(session_error)?;
    session
        .insert(SESSION_KEY, Uuid::new_v4().to_string())
        .await
        .map_err(session_error)?;

    tracing::info!(
        user_id = %user.id,
        expires_at = %exchange.tokens.expires_at(),
        "User signed in with Xero"
    );

    Ok(Redirect::to(DASHBOARD_PATH).into_response())
}

/// Revoke the refresh token (best effort) and drop the session.
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<StatusCode, AppError> {
    let tokens: Option<TokenPair> = session.get(TOKENS_KEY).await.map_err(session_error)?;
    let key: Option<String> = session.get(SESSION_KEY).await.map_err(session_error)?;

    if let Some(key) = key {
        // The live manager may hold a newer refresh token than the session
        let tokens = match state.sessions.remove(&key) {
            Some(manager) => manager.snapshot().await.or(tokens),
            None => tokens,
        };

        if let Some(tokens) = tokens {
            match state.identity.revoke(tokens.refresh_token()).await {
                Ok(()) => tracing::info!("Xero refresh token revoked"),
                Err(e) => tracing::warn!(error = %e, "Failed to revoke Xero token during logout"),
            }
        }
    }

    session.flush().await.map_err(session_error)?;

    Ok(StatusCode::NO_CONTENT)
}
