//! Router assembly and server lifecycle.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use service_core::middleware::{
    http_request_span, request_id_middleware, security_headers_middleware,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tower_sessions::{cookie::SameSite, Expiry, MemoryStore, SessionManagerLayer};

use crate::config::Settings;
use crate::handlers::{
    app::health_check,
    auth::{callback, login, logout},
    contacts::{create_contact, get_contact, list_contacts, update_contact},
    invoices::{get_invoice, list_invoices, update_invoice},
    metrics::metrics,
    organizations::list_organizations,
    session::current_session,
};
use crate::middleware::metrics_middleware;
use crate::services::{IdentityClient, SessionRegistry};
use crate::AppState;

pub const SESSION_COOKIE_NAME: &str = "dashboard_session";

pub fn build_state(settings: &Settings) -> anyhow::Result<AppState> {
    let http = reqwest::Client::builder()
        .user_agent(concat!("dashboard-service/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build HTTP client: {}", e))?;

    let identity = Arc::new(IdentityClient::new(http.clone(), settings.xero.clone()));
    let idle = std::time::Duration::from_secs(
        settings.server.session_inactivity_hours.max(1) as u64 * 3600,
    );

    Ok(AppState {
        http,
        xero: Arc::new(settings.xero.clone()),
        identity: identity.clone(),
        sessions: Arc::new(SessionRegistry::new(identity, idle)),
    })
}

pub fn build_router(state: AppState, settings: &Settings) -> Router {
    let session_layer = SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_secure(settings.server.cookie_secure)
        .with_http_only(true)
        // Lax so the session survives the top-level redirect back from Xero
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::hours(
            settings.server.session_inactivity_hours,
        )));

    let api = Router::new()
        .route("/session", get(current_session))
        .route("/xero/organizations", get(list_organizations))
        .route("/xero/invoices", get(list_invoices))
        .route(
            "/xero/invoices/:invoice_id",
            get(get_invoice).patch(update_invoice),
        )
        .route("/xero/contacts", get(list_contacts).post(create_contact))
        .route(
            "/xero/contacts/:contact_id",
            get(get_contact).patch(update_contact),
        );

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics))
        .route("/auth/xero/login", get(login))
        .route("/auth/xero/callback", get(callback))
        .route("/auth/logout", post(logout))
        .nest("/api", api)
        .layer(session_layer)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(http_request_span::<axum::body::Body>))
        .layer(from_fn(request_id_middleware))
        .with_state(state)
}

/// Bound listener plus router, ready to serve.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
}

impl Application {
    /// Port `0` binds a random port, which is what the tests use.
    pub async fn build(settings: Settings) -> anyhow::Result<Self> {
        let state = build_state(&settings)?;
        let router = build_router(state, &settings);

        let address = format!("{}:{}", settings.server.host, settings.server.port);
        let addr: SocketAddr = address
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid listen address {}: {}", address, e))?;
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind TCP listener to {}: {}", address, e);
            anyhow::anyhow!("Failed to bind to address {}: {}", address, e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("dashboard-service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }
}
