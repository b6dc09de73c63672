pub mod app;
pub mod auth;
pub mod contacts;
pub mod invoices;
pub mod metrics;
pub mod organizations;
pub mod session;

use uuid::Uuid;

use crate::error::XeroError;

/// The organization every tenant-scoped route needs. Blank counts as missing.
///
/// Tenant ids are GUIDs and end up in a request header, so anything else is
/// rejected here.
pub(crate) fn organization_id(raw: Option<&str>) -> Result<&str, XeroError> {
    let id = raw
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(XeroError::MissingOrganization)?;
    Uuid::parse_str(id).map_err(|_| XeroError::InvalidOrganizationId)?;
    Ok(id)
}

/// Positive page number or size, `default` when absent.
pub(crate) fn parse_page(raw: Option<&str>, name: &str, default: u32) -> Result<u32, XeroError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(default),
        Some(value) => value.parse::<u32>().map_err(|_| {
            XeroError::MalformedFilterInput(format!("{} must be a positive integer", name))
        }),
    }
}
