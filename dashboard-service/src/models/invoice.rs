//! Read-only mirror of Xero invoices.
//!
//! Deserialized from Xero's PascalCase payloads, serialized to the browser in
//! camelCase.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::contact::Contact;
use super::xero_date;

/// Invoice status as enumerated by Xero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InvoiceStatus {
    Draft,
    Submitted,
    Authorised,
    Paid,
    Voided,
    Deleted,
    #[serde(other)]
    Unknown,
}

impl InvoiceStatus {
    /// Statuses of invoices that have not been paid or voided yet.
    pub const UNSENT: [InvoiceStatus; 3] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Submitted,
        InvoiceStatus::Authorised,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "DRAFT",
            InvoiceStatus::Submitted => "SUBMITTED",
            InvoiceStatus::Authorised => "AUTHORISED",
            InvoiceStatus::Paid => "PAID",
            InvoiceStatus::Voided => "VOIDED",
            InvoiceStatus::Deleted => "DELETED",
            InvoiceStatus::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InvoiceStatus {
    type Err = String;

    /// Case-insensitive; `Unknown` is never produced.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Ok(InvoiceStatus::Draft),
            "SUBMITTED" => Ok(InvoiceStatus::Submitted),
            "AUTHORISED" => Ok(InvoiceStatus::Authorised),
            "PAID" => Ok(InvoiceStatus::Paid),
            "VOIDED" => Ok(InvoiceStatus::Voided),
            "DELETED" => Ok(InvoiceStatus::Deleted),
            other => Err(format!("unknown invoice status '{}'", other.to_lowercase())),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "PascalCase"))]
pub struct LineItem {
    #[serde(default, rename(deserialize = "LineItemID"))]
    pub line_item_id: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Option<Decimal>,
    #[serde(default)]
    pub unit_amount: Option<Decimal>,
    #[serde(default)]
    pub account_code: Option<String>,
    #[serde(default)]
    pub tax_type: Option<String>,
    #[serde(default)]
    pub line_amount: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all(serialize = "camelCase", deserialize = "PascalCase"))]
pub struct Invoice {
    #[serde(rename(deserialize = "InvoiceID"))]
    pub invoice_id: String,
    /// `ACCREC` (sales) or `ACCPAY` (bills).
    #[serde(default, rename(serialize = "type", deserialize = "Type"))]
    pub invoice_type: Option<String>,
    #[serde(default)]
    pub invoice_number: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub contact: Option<Contact>,
    #[serde(default, deserialize_with = "xero_date::deserialize_option")]
    pub date: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "xero_date::deserialize_option")]
    pub due_date: Option<DateTime<Utc>>,
    pub status: InvoiceStatus,
    #[serde(default)]
    pub line_amount_types: Option<String>,
    #[serde(default)]
    pub line_items: Vec<LineItem>,
    #[serde(default)]
    pub sub_total: Decimal,
    #[serde(default)]
    pub total_tax: Decimal,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub amount_due: Decimal,
    #[serde(default)]
    pub amount_paid: Decimal,
    #[serde(default)]
    pub currency_code: Option<String>,
    #[serde(
        default,
        rename(deserialize = "UpdatedDateUTC"),
        deserialize_with = "xero_date::deserialize_option"
    )]
    pub updated_date_utc: Option<DateTime<Utc>>,
}

/// Fields that may be changed on an existing invoice.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all(serialize = "PascalCase", deserialize = "camelCase"))]
pub struct InvoiceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InvoiceStatus>,
}

/// `{"Invoices": [...]}` envelope used by every invoice endpoint.
#[derive(Debug, Deserialize)]
pub struct InvoicesEnvelope {
    #[serde(rename = "Invoices", default)]
    pub invoices: Vec<Invoice>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample() -> serde_json::Value {
        json!({
            "Type": "ACCREC",
            "InvoiceID": "243216c5-369e-4056-ac67-05388f86dc81",
            "InvoiceNumber": "INV-0001",
            "Reference": "Ref MK815",
            "Contact": {
                "ContactID": "025867f1-d741-4d6b-b1af-9ac774b59ba7",
                "Name": "City Agency"
            },
            "Date": "/Date(1518685950940+0000)/",
            "DueDate": "/Date(1518685950940+0000)/",
            "Status": "AUTHORISED",
            "LineAmountTypes": "Exclusive",
            "LineItems": [{
                "Description": "Onsite project management",
                "Quantity": 1.0,
                "UnitAmount": 100.0,
                "TaxType": "OUTPUT",
                "LineAmount": 100.0,
                "AccountCode": "200"
            }],
            "SubTotal": 100.0,
            "TotalTax": 15.5,
            "Total": 115.5,
            "AmountDue": 115.5,
            "AmountPaid": 0,
            "CurrencyCode": "NZD",
            "UpdatedDateUTC": "/Date(1518685950940+0000)/"
        })
    }

    #[test]
    fn parses_xero_invoice() {
        let invoice: Invoice = serde_json::from_value(sample()).unwrap();

        assert_eq!(invoice.invoice_number.as_deref(), Some("INV-0001"));
        assert_eq!(invoice.status, InvoiceStatus::Authorised);
        assert_eq!(invoice.total, Decimal::new(1155, 1));
        assert_eq!(invoice.line_items.len(), 1);
        assert_eq!(
            invoice.contact.as_ref().map(|c| c.name.as_str()),
            Some("City Agency")
        );
        assert!(invoice.updated_date_utc.is_some());
    }

    #[test]
    fn serializes_camel_case_for_browser() {
        let invoice: Invoice = serde_json::from_value(sample()).unwrap();
        let out = serde_json::to_value(&invoice).unwrap();

        assert_eq!(out["invoiceId"], "243216c5-369e-4056-ac67-05388f86dc81");
        assert_eq!(out["invoiceNumber"], "INV-0001");
        assert_eq!(out["type"], "ACCREC");
        assert_eq!(out["status"], "AUTHORISED");
        assert_eq!(out["total"], 115.5);
        assert_eq!(out["contact"]["name"], "City Agency");
    }

    #[test]
    fn unknown_status_does_not_break_listing() {
        let mut raw = sample();
        raw["Status"] = json!("SOMETHING_NEW");
        let invoice: Invoice = serde_json::from_value(raw).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Unknown);
    }

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!("paid".parse::<InvoiceStatus>(), Ok(InvoiceStatus::Paid));
        assert_eq!(
            "Authorised".parse::<InvoiceStatus>(),
            Ok(InvoiceStatus::Authorised)
        );
        assert!("unknown".parse::<InvoiceStatus>().is_err());
        assert!("authorized".parse::<InvoiceStatus>().is_err());
    }

    #[test]
    fn update_serializes_only_set_fields() {
        let update = InvoiceUpdate {
            reference: Some("PO-77".into()),
            ..Default::default()
        };
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            json!({ "Reference": "PO-77" })
        );
    }
}
