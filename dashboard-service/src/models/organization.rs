use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A Xero organization (tenant) the current token is connected to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// Connection id, used when disconnecting a tenant.
    #[serde(default)]
    pub id: Option<String>,
    pub tenant_id: String,
    #[serde(default)]
    pub tenant_name: Option<String>,
    pub tenant_type: String,
    #[serde(default, deserialize_with = "super::xero_date::deserialize_option")]
    pub created_date_utc: Option<DateTime<Utc>>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
