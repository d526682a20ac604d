use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::flash::Flash;
use super::templates::{self, Page};
use crate::services::AuthError;

/// Which form gets re-rendered with the notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormPage {
    Login,
    Register,
}

impl FormPage {
    const fn template(self) -> &'static str {
        match self {
            Self::Login => templates::LOGIN,
            Self::Register => templates::REGISTER,
        }
    }
}

/// An auth failure surfaced as the originating form plus an error notice.
#[derive(Debug)]
pub struct PageError {
    pub form: FormPage,
    pub status: StatusCode,
    pub message: String,
}

impl PageError {
    pub fn login(err: AuthError) -> Self {
        Self::from_auth(FormPage::Login, err)
    }

    pub fn register(err: AuthError) -> Self {
        Self::from_auth(FormPage::Register, err)
    }

    fn from_auth(form: FormPage, err: AuthError) -> Self {
        let (status, message) = match &err {
            AuthError::MissingFields => (
                StatusCode::UNPROCESSABLE_ENTITY,
                match form {
                    FormPage::Login => "Email and password are required",
                    FormPage::Register => "All fields are required",
                },
            ),
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password")
            }
            AuthError::AccountInactive => (
                StatusCode::FORBIDDEN,
                "Your account is not active. Please contact an administrator.",
            ),
            AuthError::UnknownRole(_) => (
                StatusCode::UNAUTHORIZED,
                "Your account has no dashboard assigned. Please contact an administrator.",
            ),
            AuthError::DuplicateEmail => (StatusCode::CONFLICT, "Email already registered"),
            AuthError::DuplicateUsername => (StatusCode::CONFLICT, "Username already taken"),
            AuthError::InvalidDate => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "Birthday must be a valid date (YYYY-MM-DD)",
            ),
            AuthError::PersistenceFailure(detail) => {
                tracing::error!("Registration failed: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Registration failed. Please try again.",
                )
            }
            AuthError::Session(detail) | AuthError::Token(detail) | AuthError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong. Please try again.",
                )
            }
        };

        Self {
            form,
            status,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for PageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} form error ({}): {}", self.form, self.status, self.message)
    }
}

impl std::error::Error for PageError {}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let page = Page::new(self.form.template()).flash(Flash::error(self.message));
        (self.status, page).into_response()
    }
}
