use serde::{Deserialize, Serialize};

use crate::utils::jwt::IdTokenClaims;

/// Signed-in Xero user, stored in the session at login.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionUser {
    /// OIDC subject.
    pub id: String,
    pub xero_user_id: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
}

impl From<IdTokenClaims> for SessionUser {
    fn from(claims: IdTokenClaims) -> Self {
        let name = match (claims.given_name, claims.family_name) {
            (Some(given), Some(family)) => Some(format!("{} {}", given, family)),
            (Some(given), None) => Some(given),
            (None, Some(family)) => Some(family),
            (None, None) => claims.preferred_username,
        };

        Self {
            id: claims.sub,
            xero_user_id: claims.xero_userid,
            email: claims.email,
            name,
        }
    }
}
