use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, BuiltinAccounts, CredentialStore, PortalAuthService, TokenIssuer};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_url,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store).await
    }

    pub async fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let database: Arc<dyn CredentialStore> = Arc::new(store.clone());
        let credentials = BuiltinAccounts::from_config(
            &config.accounts.builtin,
            &config.security,
            database,
        )
        .await?;

        tracing::info!("Loaded {} built-in operator account(s)", credentials.len());

        let auth_service = Arc::new(PortalAuthService::new(
            Arc::new(credentials),
            TokenIssuer::from_config(&config.token),
            config.security.clone(),
        )) as Arc<dyn AuthService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            auth_service,
        })
    }
}
