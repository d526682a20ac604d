use axum::{
    Form,
    extract::{Request, State},
    http::{HeaderMap, StatusCode, header},
    middleware::Next,
    response::{AppendHeaders, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::{
    Session,
    cookie::{Cookie, SameSite},
};

use super::flash::{self, Flash};
use super::session;
use super::templates::{self, Page};
use super::{AppState, PageError};
use crate::config::Config;
use crate::models::Role;
use crate::services::RegistrationForm;

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

// ============================================================================
// Token cookie
// ============================================================================

/// Session-scoped cookie carrying the signed token. No Max-Age is set.
fn token_cookie(config: &Config, token: String) -> Cookie<'static> {
    Cookie::build((config.token.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.server.secure_cookies)
        .same_site(SameSite::Lax)
        .build()
}

/// Empty value with epoch expiry so browsers drop the token.
fn expired_token_cookie(config: &Config) -> Cookie<'static> {
    Cookie::build((config.token.cookie_name.clone(), ""))
        .path("/")
        .http_only(true)
        .secure(config.server.secure_cookies)
        .same_site(SameSite::Lax)
        .expires(time::OffsetDateTime::UNIX_EPOCH)
        .max_age(time::Duration::ZERO)
        .build()
}

/// Read a cookie value from the request `Cookie` headers.
pub fn read_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .find(|cookie| cookie.name() == name)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
}

// ============================================================================
// Middleware
// ============================================================================

/// Dashboard guard state: which role the wrapped route belongs to.
#[derive(Clone)]
pub struct RoleGuard {
    pub state: Arc<AppState>,
    pub role: Role,
}

/// Requires a logged-in session with the guard's role. When the token cookie
/// is present it must verify and belong to the session user; otherwise the
/// session is dropped and the user is sent back to the login page.
pub async fn require_role(
    State(guard): State<RoleGuard>,
    session: Session,
    mut request: Request,
    next: Next,
) -> Response {
    let user = match session::current(&session).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            flash::push(&session, Flash::info("Please log in to continue")).await;
            return Redirect::to("/").into_response();
        }
        Err(e) => {
            tracing::error!("Failed to read session: {e}");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Session error").into_response();
        }
    };

    let config = guard.state.config();
    if let Some(token) = read_cookie(request.headers(), &config.token.cookie_name) {
        let valid = guard
            .state
            .auth()
            .verify_token(&token)
            .is_ok_and(|claims| claims.sub == user.user_id);

        if !valid {
            tracing::info!(user_id = %user.user_id, "Rejected stale or foreign token");
            if let Err(e) = session::clear(&session).await {
                tracing::warn!("Failed to clear session: {e}");
            }
            flash::push(
                &session,
                Flash::error("Your session has expired. Please log in again."),
            )
            .await;
            return (
                AppendHeaders([(header::SET_COOKIE, expired_token_cookie(config).to_string())]),
                Redirect::to("/"),
            )
                .into_response();
        }
    }

    if user.role != guard.role {
        tracing::info!(
            user_id = %user.user_id,
            role = %user.role,
            required = %guard.role,
            "Dashboard access denied"
        );
        return (StatusCode::FORBIDDEN, "Forbidden").into_response();
    }

    tracing::Span::current().record("user_id", user.user_id.as_str());
    request.extensions_mut().insert(user);
    next.run(request).await
}

// ============================================================================
// Handlers
// ============================================================================

/// GET / and GET /login
pub async fn login_page(session: Session) -> Page {
    Page::new(templates::LOGIN).flashes(flash::take(&session).await)
}

/// POST /login
/// Verify credentials, establish the session, set the token cookie and
/// redirect to the role's dashboard.
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Result<Response, PageError> {
    let outcome = match state.auth().login(&form.email, &form.password).await {
        Ok(outcome) => outcome,
        Err(e) => {
            metrics::counter!("portal_login_attempts_total", "outcome" => e.outcome())
                .increment(1);
            return Err(PageError::login(e));
        }
    };

    session::establish(&session, &outcome.identity)
        .await
        .map_err(PageError::login)?;

    metrics::counter!("portal_login_attempts_total", "outcome" => "success").increment(1);
    tracing::Span::current().record("user_id", outcome.identity.user_id.as_str());

    let redirect_to = outcome.redirect_path();
    let cookie = token_cookie(state.config(), outcome.token);

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie.to_string())]),
        Redirect::to(redirect_to),
    )
        .into_response())
}

/// GET /logout
/// Always succeeds, with or without a session.
pub async fn logout(State(state): State<Arc<AppState>>, session: Session) -> Response {
    if let Err(e) = session::clear(&session).await {
        tracing::warn!("Failed to clear session on logout: {e}");
    }

    flash::push(&session, Flash::success("You have been logged out successfully")).await;

    (
        AppendHeaders([(
            header::SET_COOKIE,
            expired_token_cookie(state.config()).to_string(),
        )]),
        Redirect::to("/"),
    )
        .into_response()
}

/// GET /register
pub async fn register_page(session: Session) -> Page {
    Page::new(templates::REGISTER).flashes(flash::take(&session).await)
}

/// POST /register
/// Create an inactive account; the user logs in after an administrator
/// approves it.
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Form(form): Form<RegistrationForm>,
) -> Result<Response, PageError> {
    match state.auth().register(form).await {
        Ok(_) => {
            metrics::counter!("portal_registrations_total", "outcome" => "success").increment(1);
            flash::push(
                &session,
                Flash::success("Registration successful! Please wait for admin approval."),
            )
            .await;
            Ok(Redirect::to("/").into_response())
        }
        Err(e) => {
            metrics::counter!("portal_registrations_total", "outcome" => e.outcome())
                .increment(1);
            Err(PageError::register(e))
        }
    }
}
