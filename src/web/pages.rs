use axum::{
    Extension, Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::AppState;
use super::flash;
use super::session::SessionUser;
use super::templates::{self, Page};

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: &'static str,
    pub uptime_seconds: u64,
    pub version: &'static str,
}

/// GET /tourist
pub async fn tourist_home(session: Session) -> Page {
    Page::new(templates::TOURIST).flashes(flash::take(&session).await)
}

/// GET /{role}/dashboard, behind the role guard.
pub async fn dashboard(Extension(user): Extension<SessionUser>, session: Session) -> Page {
    let municipality = user
        .municipality
        .as_deref()
        .map(|m| format!("({m})"))
        .unwrap_or_default();

    Page::new(templates::DASHBOARD)
        .var("role_name", user.role.display_name())
        .var("user_id", user.user_id)
        .var("municipality", municipality)
        .flashes(flash::take(&session).await)
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime_seconds = state.start_time.elapsed().as_secs();

    let (status, database) = match state.store().ping().await {
        Ok(()) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::warn!("Health check database ping failed: {e:#}");
            (StatusCode::SERVICE_UNAVAILABLE, "unreachable")
        }
    };

    (
        status,
        Json(HealthResponse {
            status: if status == StatusCode::OK { "ok" } else { "degraded" },
            database,
            uptime_seconds,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}
