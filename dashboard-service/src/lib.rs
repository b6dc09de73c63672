pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod startup;
pub mod utils;

use std::sync::Arc;

use crate::config::XeroSettings;
use crate::services::{IdentityClient, SessionRegistry};

/// Shared application state. Holds no per-user credentials.
#[derive(Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    pub xero: Arc<XeroSettings>,
    pub identity: Arc<IdentityClient>,
    pub sessions: Arc<SessionRegistry>,
}
