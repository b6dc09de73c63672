use secrecy::Secret;
use serde::Deserialize;
use std::time::Duration;

#[derive(Deserialize, Clone, Debug)]
pub struct Settings {
    pub server: ServerSettings,
    pub xero: XeroSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    /// Mark the session cookie `Secure`. Must be true behind HTTPS.
    #[serde(default = "default_cookie_secure")]
    pub cookie_secure: bool,
    /// Idle time after which a login session expires.
    #[serde(default = "default_session_inactivity_hours")]
    pub session_inactivity_hours: i64,
}

fn default_cookie_secure() -> bool {
    true
}

fn default_session_inactivity_hours() -> i64 {
    24
}

/// Xero OAuth application and API endpoints.
#[derive(Deserialize, Clone, Debug)]
pub struct XeroSettings {
    pub client_id: String,
    pub client_secret: Secret<String>,
    /// Must match a redirect URI registered on the Xero app.
    pub redirect_uri: String,
    /// Identity server hosting `/connect/authorize`, `/connect/token` and `/connect/revocation`.
    #[serde(default = "default_identity_url")]
    pub identity_url: String,
    /// Accounting API root (`Invoices`, `Contacts`).
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    /// Tenant connection listing for the current token.
    #[serde(default = "default_connections_url")]
    pub connections_url: String,
    #[serde(default = "default_scopes")]
    pub scopes: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_identity_url() -> String {
    "https://identity.xero.com".to_string()
}

fn default_api_base_url() -> String {
    "https://api.xero.com/api.xro/2.0".to_string()
}

fn default_connections_url() -> String {
    "https://api.xero.com/connections".to_string()
}

fn default_scopes() -> String {
    "openid profile email accounting.transactions accounting.contacts accounting.settings offline_access"
        .to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl XeroSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn authorize_endpoint(&self) -> String {
        format!("{}/connect/authorize", self.identity_url.trim_end_matches('/'))
    }

    pub fn token_endpoint(&self) -> String {
        format!("{}/connect/token", self.identity_url.trim_end_matches('/'))
    }

    pub fn revocation_endpoint(&self) -> String {
        format!("{}/connect/revocation", self.identity_url.trim_end_matches('/'))
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP/gRPC collector; span export is off when unset.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path =
        std::env::current_dir().map_err(|e| config::ConfigError::Foreign(Box::new(e)))?;

    // Support running from the workspace root or from the crate directory
    let configuration_directory = if base_path.ends_with("dashboard-service") {
        base_path.join("config")
    } else {
        base_path.join("dashboard-service").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
