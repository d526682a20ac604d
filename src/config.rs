use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::models::account::Role;

/// Secret used when neither the config file nor the environment provides one.
pub const DEV_SECRET_KEY: &str = "dev-secret-key-change-in-production";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub session: SessionConfig,

    pub token: TokenConfig,

    pub security: SecurityConfig,

    pub accounts: AccountsConfig,

    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_url: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_url: "sqlite:data/portal.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,

    /// Whether to set the Secure flag on the session and token cookies.
    /// Set to false for local development without HTTPS.
    pub secure_cookies: bool,

    /// Upper bound for request bodies (default: 16 MiB)
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            secure_cookies: true,
            max_body_bytes: 16 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStoreKind {
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Where server-side session records live.
    pub store: SessionStoreKind,

    /// Sessions expire after this many minutes without a request.
    pub inactivity_minutes: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            store: SessionStoreKind::Memory,
            inactivity_minutes: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// HMAC key for signing access tokens.
    pub secret_key: String,

    /// Token lifetime in minutes. `0` issues tokens without an `exp` claim.
    pub expiry_minutes: u64,

    pub cookie_name: String,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret_key: DEV_SECRET_KEY.to_string(),
            expiry_minutes: 24 * 60,
            cookie_name: "access_token_cookie".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

/// An operator account that exists only in configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuiltinAccountConfig {
    pub user_id: String,

    pub email: String,

    pub password: String,

    pub role: String,

    #[serde(default)]
    pub municipality: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountsConfig {
    pub builtin: Vec<BuiltinAccountConfig>,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            builtin: vec![
                BuiltinAccountConfig {
                    user_id: "admin".to_string(),
                    email: "admin@ptcao.gov.ph".to_string(),
                    password: "Admin@1234".to_string(),
                    role: "admin".to_string(),
                    municipality: None,
                },
                BuiltinAccountConfig {
                    user_id: "ptcao".to_string(),
                    email: "ptcao@ptcao.gov.ph".to_string(),
                    password: "Ptcao@1234".to_string(),
                    role: "ptcao".to_string(),
                    municipality: None,
                },
            ],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            session: SessionConfig::default(),
            token: TokenConfig::default(),
            security: SecurityConfig::default(),
            accounts: AccountsConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl Config {
    /// Loads the first config file found and applies environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = Self::load_file()?;
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        Self::source_path().map_or_else(|| Ok(Self::default()), |path| Self::load_from_path(&path))
    }

    /// The config file `load` reads, if any exists.
    #[must_use]
    pub fn source_path() -> Option<PathBuf> {
        first_existing(Self::config_paths())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// `DATABASE_URL`, `SECRET_KEY`, `JWT_SECRET_KEY` and `PORT` win over the file.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup("DATABASE_URL").filter(|v| !v.is_empty()) {
            self.general.database_url = url;
        }

        let secret = lookup("SECRET_KEY").filter(|v| !v.is_empty());
        if let Some(key) = lookup("JWT_SECRET_KEY")
            .filter(|v| !v.is_empty())
            .or(secret)
        {
            self.token.secret_key = key;
        }

        if let Some(port) = lookup("PORT").filter(|v| !v.is_empty()) {
            self.server.port = port
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {port}"))?;
        }

        Ok(())
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("ptcao-portal").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".ptcao-portal").join("config.toml"));
        }

        paths
    }

    pub fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn validate(&self) -> Result<()> {
        if self.token.secret_key.is_empty() {
            anyhow::bail!("token.secret_key cannot be empty");
        }

        if self.token.secret_key == DEV_SECRET_KEY {
            warn!("Using the development token secret; set SECRET_KEY in production");
        }

        if self.token.expiry_minutes == 0 {
            warn!("token.expiry_minutes = 0: access tokens never expire");
        }

        if self.token.cookie_name.is_empty() {
            anyhow::bail!("token.cookie_name cannot be empty");
        }

        if self.session.inactivity_minutes <= 0 {
            anyhow::bail!("session.inactivity_minutes must be > 0");
        }

        let mut emails = HashSet::new();
        for account in &self.accounts.builtin {
            account.role.parse::<Role>().with_context(|| {
                format!("Built-in account '{}' has an invalid role", account.user_id)
            })?;

            if !emails.insert(account.email.trim().to_lowercase()) {
                anyhow::bail!("Duplicate built-in account email: {}", account.email);
            }
        }

        Ok(())
    }
}

fn first_existing(paths: Vec<PathBuf>) -> Option<PathBuf> {
    paths.into_iter().find(|path| path.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.token.cookie_name, "access_token_cookie");
        assert_eq!(config.token.expiry_minutes, 1440);
        assert_eq!(config.session.store, SessionStoreKind::Memory);
        assert_eq!(config.accounts.builtin.len(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [session]
            store = "sqlite"

            [token]
            secret_key = "from-file"
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.session.store, SessionStoreKind::Sqlite);
        assert_eq!(config.token.secret_key, "from-file");

        assert_eq!(config.server.port, 5000);
        assert_eq!(config.accounts.builtin[0].email, "admin@ptcao.gov.ph");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "sqlite:/tmp/other.db"),
            ("SECRET_KEY", "app-secret"),
            ("PORT", "8080"),
        ]);

        let mut config = Config::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.general.database_url, "sqlite:/tmp/other.db");
        assert_eq!(config.token.secret_key, "app-secret");
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn test_jwt_secret_takes_precedence() {
        let mut config = Config::default();
        config
            .apply_env_overrides(|key| match key {
                "SECRET_KEY" => Some("app-secret".to_string()),
                "JWT_SECRET_KEY" => Some("jwt-secret".to_string()),
                _ => None,
            })
            .unwrap();

        assert_eq!(config.token.secret_key, "jwt-secret");
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let mut config = Config::default();
        let result = config.apply_env_overrides(|key| {
            (key == "PORT").then(|| "not-a-port".to_string())
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.token.cookie_name = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.accounts.builtin[1].email = "ADMIN@ptcao.gov.ph".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.accounts.builtin[0].role = "tourist".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_expiry_disables_token_expiry() {
        let config: Config = toml::from_str("[token]\nsecret_key = \"k\"").unwrap();
        assert_eq!(config.token.expiry_minutes, 1440);

        let config: Config =
            toml::from_str("[token]\nsecret_key = \"k\"\nexpiry_minutes = 0").unwrap();
        assert_eq!(config.token.expiry_minutes, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_expiring_setting_survives_save_and_load() {
        let dir = std::env::temp_dir().join(format!("ptcao-config-{}", uuid::Uuid::new_v4()));
        let path = dir.join("config.toml");

        let mut config = Config::default();
        config.token.expiry_minutes = 0;
        config.save_to_path(&path).unwrap();

        let back = Config::load_from_path(&path).unwrap();
        assert_eq!(back.token.expiry_minutes, 0);

        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_first_existing_config_path_wins() {
        let dir = std::env::temp_dir().join(format!("ptcao-paths-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let missing = dir.join("missing.toml");
        let present = dir.join("config.toml");
        let later = dir.join("later.toml");
        std::fs::write(&present, "").unwrap();
        std::fs::write(&later, "").unwrap();

        assert_eq!(
            first_existing(vec![missing.clone(), present.clone(), later]),
            Some(present)
        );
        assert_eq!(first_existing(vec![missing]), None);

        std::fs::remove_dir_all(&dir).ok();
    }
}
