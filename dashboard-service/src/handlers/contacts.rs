use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use service_core::error::AppError;

use crate::handlers::invoices::OrganizationParams;
use crate::handlers::{organization_id, parse_page};
use crate::middleware::XeroSession;
use crate::models::ContactDraft;
use crate::services::filter::{ContactQuery, SearchText, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use crate::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactListParams {
    #[serde(alias = "tenantId")]
    pub organization_id: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

pub async fn list_contacts(
    State(state): State<AppState>,
    xero: XeroSession,
    Query(params): Query<ContactListParams>,
) -> Result<Json<Value>, AppError> {
    let tenant_id = organization_id(params.organization_id.as_deref())?;
    let search = match params.search.as_deref() {
        Some(raw) => SearchText::parse(raw)?,
        None => None,
    };
    let query = ContactQuery::new(
        search,
        parse_page(params.page.as_deref(), "page", DEFAULT_PAGE)?,
        parse_page(params.page_size.as_deref(), "pageSize", DEFAULT_PAGE_SIZE)?,
    )?;

    let result = xero.client(&state).list_contacts(tenant_id, &query).await;
    let contacts = xero.finish(&state, result).await?;

    Ok(Json(json!({
        "contacts": contacts,
        "page": query.page,
        "pageSize": query.page_size,
    })))
}

pub async fn get_contact(
    State(state): State<AppState>,
    xero: XeroSession,
    Path(contact_id): Path<String>,
    Query(params): Query<OrganizationParams>,
) -> Result<Json<Value>, AppError> {
    let tenant_id = organization_id(params.organization_id.as_deref())?;

    let result = xero.client(&state).get_contact(tenant_id, &contact_id).await;
    let contact = xero.finish(&state, result).await?;

    Ok(Json(json!({ "contact": contact })))
}

pub async fn create_contact(
    State(state): State<AppState>,
    xero: XeroSession,
    Query(params): Query<OrganizationParams>,
    Json(draft): Json<ContactDraft>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let tenant_id = organization_id(params.organization_id.as_deref())?;
    if draft.name.as_deref().map_or(true, |n| n.trim().is_empty()) {
        return Err(AppError::BadRequest(anyhow::anyhow!("Contact name is required")));
    }

    let result = xero.client(&state).create_contact(tenant_id, &draft).await;
    let contact = xero.finish(&state, result).await?;

    tracing::info!(tenant_id = %tenant_id, contact_id = %contact.contact_id, "Created Xero contact");

    Ok((StatusCode::CREATED, Json(json!({ "contact": contact }))))
}

pub async fn update_contact(
    State(state): State<AppState>,
    xero: XeroSession,
    Path(contact_id): Path<String>,
    Query(params): Query<OrganizationParams>,
    Json(draft): Json<ContactDraft>,
) -> Result<Json<Value>, AppError> {
    let tenant_id = organization_id(params.organization_id.as_deref())?;

    let result = xero
        .client(&state)
        .update_contact(tenant_id, &contact_id, &draft)
        .await;
    let contact = xero.finish(&state, result).await?;

    tracing::info!(tenant_id = %tenant_id, contact_id = %contact.contact_id, "Updated Xero contact");

    Ok(Json(json!({ "contact": contact })))
}
