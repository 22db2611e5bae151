pub mod config;
pub mod proxy;
pub mod sessions;
pub mod shift_session;
pub mod upstream;

use aws_sdk_dynamodb::Client as DynamoClient;
use carelog_atoms::shifts::{DynamoShiftStore, MemoryShiftStore, ShiftStore};
use config::{Config, StoreBackend};
use sessions::SessionRegistry;
use std::sync::Arc;
use upstream::UpstreamClient;

/// Everything a request handler needs, built once per Lambda instance
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ShiftStore>,
    pub upstream: UpstreamClient,
    pub sessions: SessionRegistry,
}

impl AppState {
    pub async fn from_env() -> Self {
        let config = Config::from_env();

        let store: Arc<dyn ShiftStore> = match config.store_backend {
            StoreBackend::DynamoDb => {
                let aws_config = aws_config::load_from_env().await;
                Arc::new(DynamoShiftStore::new(
                    DynamoClient::new(&aws_config),
                    config.table_name.clone(),
                ))
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory shift store; records will not survive this instance");
                Arc::new(MemoryShiftStore::new())
            }
        };

        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Arc<dyn ShiftStore>) -> Self {
        tracing::info!(
            table = %config.table_name,
            upstream = %config.upstream_base_url,
            "App state ready"
        );
        Self {
            upstream: UpstreamClient::new(config.upstream_base_url.clone()),
            sessions: SessionRegistry::with_idle_ttl(config.session_idle_ttl),
            config,
            store,
        }
    }
}
