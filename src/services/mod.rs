pub mod auth_service;
pub use auth_service::{AuthError, AuthService, Identity, LoginOutcome, RegistrationForm};

pub mod auth_service_impl;
pub use auth_service_impl::PortalAuthService;

pub mod credentials;
pub use credentials::{BuiltinAccounts, CredentialStore};

pub mod password;

pub mod token;
pub use token::{TokenClaims, TokenIssuer};
