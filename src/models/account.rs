use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Operator role carried by an account's designation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Mto,
    Ptcao,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Mto => "mto",
            Self::Ptcao => "ptcao",
        }
    }

    /// Landing page a freshly authenticated user is sent to.
    #[must_use]
    pub const fn dashboard_path(self) -> &'static str {
        match self {
            Self::Admin => "/admin/dashboard",
            Self::Mto => "/mto/dashboard",
            Self::Ptcao => "/ptcao/dashboard",
        }
    }

    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Admin => "Administrator",
            Self::Mto => "Municipal Tourism Office",
            Self::Ptcao => "Provincial Tourism, Culture, and Arts Office",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown role: {0}")]
pub struct UnknownRole(pub String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "mto" => Ok(Self::Mto),
            "ptcao" => Ok(Self::Ptcao),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

/// A login-capable account, whether it lives in the database or in config.
#[derive(Debug, Clone)]
pub struct Account {
    pub user_id: String,
    pub email: String,
    pub username: String,
    pub designation: String,
    pub municipality: Option<String>,
    pub password_hash: String,
    pub is_active: bool,
}

/// Validated registration data ready to be persisted.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub full_name: String,
    pub municipality: String,
    pub id_number: String,
    pub designation: String,
    pub email: String,
    pub gender: String,
    pub birthday: chrono::NaiveDate,
    pub username: String,
    pub password_hash: String,
}
