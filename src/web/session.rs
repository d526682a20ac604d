//! Session fields shared with the rest of the portal.
//!
//! Other modules read `user_id`, `user_role`, `is_logged_in` and
//! `municipality` directly, so the key names are part of the contract.

use tower_sessions::Session;

use crate::models::Role;
use crate::services::{AuthError, Identity};

pub const USER_ID: &str = "user_id";
pub const USER_ROLE: &str = "user_role";
pub const IS_LOGGED_IN: &str = "is_logged_in";
pub const MUNICIPALITY: &str = "municipality";

/// The logged-in user as seen by guarded handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub user_id: String,
    pub role: Role,
    pub municipality: Option<String>,
}

fn session_error(e: tower_sessions::session::Error) -> AuthError {
    AuthError::Session(e.to_string())
}

/// Record a successful login. The session id is rotated first.
pub async fn establish(session: &Session, identity: &Identity) -> Result<(), AuthError> {
    session.cycle_id().await.map_err(session_error)?;

    session
        .insert(USER_ID, &identity.user_id)
        .await
        .map_err(session_error)?;
    session
        .insert(USER_ROLE, identity.role.as_str())
        .await
        .map_err(session_error)?;
    session
        .insert(IS_LOGGED_IN, true)
        .await
        .map_err(session_error)?;

    match &identity.municipality {
        Some(municipality) => session
            .insert(MUNICIPALITY, municipality)
            .await
            .map_err(session_error)?,
        None => {
            session
                .remove::<String>(MUNICIPALITY)
                .await
                .map_err(session_error)?;
        }
    }

    Ok(())
}

/// Returns the logged-in user, or `None` for anonymous or half-populated sessions.
pub async fn current(session: &Session) -> Result<Option<SessionUser>, AuthError> {
    let logged_in = session
        .get::<bool>(IS_LOGGED_IN)
        .await
        .map_err(session_error)?
        .unwrap_or(false);
    if !logged_in {
        return Ok(None);
    }

    let Some(user_id) = session
        .get::<String>(USER_ID)
        .await
        .map_err(session_error)?
    else {
        return Ok(None);
    };

    let Some(role) = session
        .get::<String>(USER_ROLE)
        .await
        .map_err(session_error)?
        .and_then(|label| label.parse::<Role>().ok())
    else {
        return Ok(None);
    };

    let municipality = session
        .get::<String>(MUNICIPALITY)
        .await
        .map_err(session_error)?;

    Ok(Some(SessionUser {
        user_id,
        role,
        municipality,
    }))
}

/// Drop all session state. Safe on an empty session.
pub async fn clear(session: &Session) -> Result<(), AuthError> {
    session.flush().await.map_err(session_error)
}
