use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::xero_date;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "PascalCase"))]
pub struct ContactPerson {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub include_in_emails: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "PascalCase"))]
pub struct Address {
    pub address_type: String,
    #[serde(default)]
    pub address_line1: Option<String>,
    #[serde(default)]
    pub address_line2: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub postal_code: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
}

/// A Xero contact (the counterparty of an invoice).
///
/// Invoice payloads embed a reduced contact with only the id and name.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "PascalCase"))]
pub struct Contact {
    #[serde(rename(deserialize = "ContactID"))]
    pub contact_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub contact_persons: Vec<ContactPerson>,
    #[serde(default)]
    pub addresses: Vec<Address>,
    #[serde(
        default,
        rename(deserialize = "UpdatedDateUTC"),
        deserialize_with = "xero_date::deserialize_option"
    )]
    pub updated_date_utc: Option<DateTime<Utc>>,
}

/// Body for creating or updating a contact.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"))]
pub struct ContactDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}

/// `{"Contacts": [...]}` envelope used by every contact endpoint.
#[derive(Debug, Deserialize)]
pub struct ContactsEnvelope {
    #[serde(rename = "Contacts", default)]
    pub contacts: Vec<Contact>,
}
