//! Shared server state
//!
//! Owns the fulfillment manager and the collaborator implementations it
//! is wired with. Cloneable and cheap to pass into axum handlers.

use std::sync::Arc;

use crate::core::config::Config;
use crate::fulfillment::manager::{EngineConfig, FulfillmentManager};
use crate::fulfillment::storage::LedgerStore;
use crate::services::{
    LoggingNotifier, RecordingPaymentRail, RoleBasedPolicy, StaticFarmDirectory,
};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub manager: Arc<FulfillmentManager>,
}

impl ServerState {
    /// Open the ledger and wire the manager with the default
    /// collaborator implementations
    pub fn initialize(config: &Config) -> anyhow::Result<Self> {
        std::fs::create_dir_all(&config.work_dir)?;
        let store = LedgerStore::open(config.ledger_path())?;

        let directory = match &config.farm_directory_seed {
            Some(path) => Arc::new(StaticFarmDirectory::from_seed_file(path)?),
            None => {
                tracing::warn!(
                    "FARM_DIRECTORY_SEED not set; farm directory starts empty"
                );
                Arc::new(StaticFarmDirectory::default())
            }
        };

        let manager = Arc::new(FulfillmentManager::new(
            store,
            config.engine(),
            directory,
            Arc::new(RoleBasedPolicy),
            Arc::new(RecordingPaymentRail::new()),
            Arc::new(LoggingNotifier),
        ));

        Ok(Self {
            config: config.clone(),
            manager,
        })
    }

    /// Build state around an existing manager (tests, embedding)
    pub fn with_manager(config: Config, manager: Arc<FulfillmentManager>) -> Self {
        Self { config, manager }
    }
}

impl Config {
    /// Engine-level view of the server configuration
    pub fn engine(&self) -> EngineConfig {
        EngineConfig {
            lock_wait: self.lock_wait,
            lock_ttl: self.lock_ttl,
            deduction_rates: self.deduction_rates,
            recommendation: self.recommendation.clone(),
            enforce_separation_of_duties: self.enforce_separation_of_duties,
            idempotency_retention: self.idempotency_retention,
        }
    }
}
