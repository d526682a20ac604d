use axum::{
    Router,
    extract::DefaultBodyLimit,
    middleware,
    routing::get,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tower_sessions::{
    Expiry, MemoryStore, SessionManagerLayer, SessionStore, cookie::SameSite,
    session_store::ExpiredDeletion,
};
use tower_sessions_sqlx_store::SqliteStore;

use crate::config::{Config, SessionStoreKind};
use crate::models::Role;
use crate::services::AuthService;
use crate::state::SharedState;

pub mod auth;
mod error;
pub mod flash;
mod observability;
mod pages;
pub mod session;
pub mod templates;

pub use error::{FormPage, PageError};

/// Where session records live. Memory sessions vanish on restart.
#[derive(Clone)]
pub enum SessionBackend {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub sessions: SessionBackend,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn auth(&self) -> &Arc<dyn AuthService> {
        &self.shared.auth_service
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let sessions = match shared.config.session.store {
        SessionStoreKind::Memory => SessionBackend::Memory(MemoryStore::default()),
        SessionStoreKind::Sqlite => {
            let pool = shared.store.conn.get_sqlite_connection_pool().clone();
            let store = SqliteStore::new(pool);
            store
                .migrate()
                .await
                .map_err(|e| anyhow::anyhow!("Failed to migrate session table: {e}"))?;

            let deletion = store.clone();
            tokio::spawn(async move {
                if let Err(e) = deletion
                    .continuously_delete_expired(tokio::time::Duration::from_secs(300))
                    .await
                {
                    tracing::warn!("Expired session cleanup stopped: {e}");
                }
            });

            SessionBackend::Sqlite(store)
        }
    };

    Ok(Arc::new(AppState {
        shared,
        sessions,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

fn session_layer<S>(store: S, config: &Config) -> SessionManagerLayer<S>
where
    S: SessionStore + Clone,
{
    SessionManagerLayer::new(store)
        .with_secure(config.server.secure_cookies)
        .with_http_only(true)
        .with_same_site(SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            config.session.inactivity_minutes,
        )))
}

fn guarded(state: &Arc<AppState>, role: Role) -> axum::routing::MethodRouter<Arc<AppState>> {
    get(pages::dashboard).route_layer(middleware::from_fn_with_state(
        auth::RoleGuard {
            state: state.clone(),
            role,
        },
        auth::require_role,
    ))
}

pub fn router(state: Arc<AppState>) -> Router {
    let config = state.config();
    let max_body_bytes = config.server.max_body_bytes;

    let routes = Router::new()
        .route("/", get(auth::login_page))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/tourist", get(pages::tourist_home))
        .route(Role::Admin.dashboard_path(), guarded(&state, Role::Admin))
        .route(Role::Mto.dashboard_path(), guarded(&state, Role::Mto))
        .route(Role::Ptcao.dashboard_path(), guarded(&state, Role::Ptcao))
        .route("/health", get(pages::health))
        .route("/metrics", get(observability::get_metrics))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state.clone());

    let routes = match &state.sessions {
        SessionBackend::Memory(store) => routes.layer(session_layer(store.clone(), config)),
        SessionBackend::Sqlite(store) => routes.layer(session_layer(store.clone(), config)),
    };

    routes
        .layer(middleware::from_fn(observability::logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(
            observability::security_headers_middleware,
        ))
}
