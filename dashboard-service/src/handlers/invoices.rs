use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use service_core::error::AppError;

use crate::error::XeroError;
use crate::handlers::{organization_id, parse_page};
use crate::middleware::XeroSession;
use crate::models::{InvoiceStatus, InvoiceUpdate};
use crate::services::filter::{
    InvoiceQuery, SearchText, StatusFilter, DEFAULT_PAGE, DEFAULT_PAGE_SIZE,
};
use crate::AppState;

/// Raw query string; parsed by hand so bad input is a `400` with a useful message.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceListParams {
    #[serde(alias = "tenantId")]
    pub organization_id: Option<String>,
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

impl InvoiceListParams {
    fn to_query(&self) -> Result<InvoiceQuery, XeroError> {
        let status = match self.status.as_deref() {
            Some(raw) => raw.parse::<StatusFilter>()?,
            None => StatusFilter::All,
        };
        let search = match self.search.as_deref() {
            Some(raw) => SearchText::parse(raw)?,
            None => None,
        };

        InvoiceQuery::new(
            status,
            search,
            parse_page(self.page.as_deref(), "page", DEFAULT_PAGE)?,
            parse_page(self.page_size.as_deref(), "pageSize", DEFAULT_PAGE_SIZE)?,
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationParams {
    #[serde(alias = "tenantId")]
    pub organization_id: Option<String>,
}

/// Unsent invoices by default, newest first.
pub async fn list_invoices(
    State(state): State<AppState>,
    xero: XeroSession,
    Query(params): Query<InvoiceListParams>,
) -> Result<Json<Value>, AppError> {
    let tenant_id = organization_id(params.organization_id.as_deref())?;
    let query = params.to_query()?;

    tracing::debug!(
        tenant_id = %tenant_id,
        status = ?query.status,
        page = query.page,
        page_size = query.page_size,
        "Listing Xero invoices"
    );

    let result = xero.client(&state).list_invoices(tenant_id, &query).await;
    let invoices = xero.finish(&state, result).await?;

    Ok(Json(json!({
        "invoices": invoices,
        "page": query.page,
        "pageSize": query.page_size,
    })))
}

pub async fn get_invoice(
    State(state): State<AppState>,
    xero: XeroSession,
    Path(invoice_id): Path<String>,
    Query(params): Query<OrganizationParams>,
) -> Result<Json<Value>, AppError> {
    let tenant_id = organization_id(params.organization_id.as_deref())?;

    let result = xero.client(&state).get_invoice(tenant_id, &invoice_id).await;
    let invoice = xero.finish(&state, result).await?;

    Ok(Json(json!({ "invoice": invoice })))
}

pub async fn update_invoice(
    State(state): State<AppState>,
    xero: XeroSession,
    Path(invoice_id): Path<String>,
    Query(params): Query<OrganizationParams>,
    Json(update): Json<InvoiceUpdate>,
) -> Result<Json<Value>, AppError> {
    let tenant_id = organization_id(params.organization_id.as_deref())?;
    if update.status == Some(InvoiceStatus::Unknown) {
        return Err(AppError::BadRequest(anyhow::anyhow!("Unknown invoice status")));
    }

    let result = xero
        .client(&state)
        .update_invoice(tenant_id, &invoice_id, &update)
        .await;
    let invoice = xero.finish(&state, result).await?;

    tracing::info!(tenant_id = %tenant_id, invoice_id = %invoice.invoice_id, "Updated Xero invoice");

    Ok(Json(json!({ "invoice": invoice })))
}
