//! Errors raised while talking to Xero on behalf of a session.

use service_core::error::AppError;
use thiserror::Error;

/// Message shown whenever the user has to sign in with Xero again.
pub const TOKEN_EXPIRED_MESSAGE: &str = "Token expired. Please sign in again.";

#[derive(Debug, Error)]
pub enum XeroError {
    /// No usable session or token pair.
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Organization-scoped call without an organization id. Never sent.
    #[error("Organization ID is required")]
    MissingOrganization,

    /// The identity server rejected the refresh grant; the session is revoked.
    #[error("Failed to refresh Xero token: {0}")]
    TokenRefreshFailed(String),

    /// Xero answered with a non-success status.
    #[error("Xero API error ({status}): {body}")]
    ProviderRequestFailed { status: u16, body: String },

    #[error("Invalid filter input: {0}")]
    MalformedFilterInput(String),

    #[error("Organization ID must be a Xero tenant GUID")]
    InvalidOrganizationId,

    #[error("Invalid identifier: {0}")]
    InvalidEntityId(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("Xero request timed out")]
    Timeout,

    #[error("Xero request failed: {0}")]
    Transport(reqwest::Error),

    #[error("Failed to decode Xero response: {0}")]
    Decode(String),
}

impl XeroError {
    /// Whether the user has to go back through the Xero login.
    pub fn requires_reauthentication(&self) -> bool {
        match self {
            XeroError::AuthenticationRequired | XeroError::TokenRefreshFailed(_) => true,
            XeroError::ProviderRequestFailed { status, .. } => *status == 401,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for XeroError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            XeroError::Timeout
        } else {
            XeroError::Transport(err)
        }
    }
}

impl From<XeroError> for AppError {
    fn from(err: XeroError) -> Self {
        match err {
            XeroError::AuthenticationRequired => {
                AppError::Unauthorized(anyhow::anyhow!("Authentication required"))
            }
            e if e.requires_reauthentication() => {
                AppError::Unauthorized(anyhow::anyhow!(TOKEN_EXPIRED_MESSAGE))
            }
            XeroError::ProviderRequestFailed { status: 404, body } => {
                AppError::NotFound(anyhow::anyhow!("Xero API error: {}", body))
            }
            XeroError::ProviderRequestFailed { body, .. } => {
                AppError::Upstream(format!("Xero API error: {}", body))
            }
            e @ (XeroError::MissingOrganization
            | XeroError::InvalidOrganizationId
            | XeroError::MalformedFilterInput(_)
            | XeroError::InvalidEntityId(_)) => AppError::BadRequest(anyhow::anyhow!(e.to_string())),
            e @ XeroError::NotFound(_) => AppError::NotFound(anyhow::anyhow!(e.to_string())),
            e @ XeroError::Timeout => AppError::Upstream(e.to_string()),
            e => AppError::InternalError(anyhow::Error::new(e)),
        }
    }
}
