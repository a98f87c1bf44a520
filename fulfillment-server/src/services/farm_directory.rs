//! Farm directory collaborator
//!
//! The directory owns farm registration and approval; the engine only
//! reads eligible farms and distress scores from it.

use async_trait::async_trait;
use parking_lot::RwLock;
use shared::farm::{DistressSignals, FarmProfile};
use shared::fulfillment::ProductType;
use std::collections::HashMap;

use crate::recommendation::composite_distress;

/// Read-side interface to the farm directory service
#[async_trait]
pub trait FarmDirectory: Send + Sync {
    /// Farms eligible to supply the given product type. The engine
    /// re-applies the hard filters (production type, approval status)
    /// regardless of what the directory returns.
    async fn eligible_farms(&self, product_type: ProductType) -> Vec<FarmProfile>;

    /// Composite distress score (0-100) for a farm, if the directory
    /// tracks one
    async fn distress_score(&self, farm_id: &str) -> Option<u8>;
}

/// In-process directory seeded from configuration or tests.
///
/// Deployments without a live directory service point
/// `FARM_DIRECTORY_SEED` at a JSON array of profiles.
#[derive(Default)]
pub struct StaticFarmDirectory {
    farms: RwLock<Vec<FarmProfile>>,
    distress: RwLock<HashMap<String, u8>>,
}

impl StaticFarmDirectory {
    pub fn new(farms: Vec<FarmProfile>) -> Self {
        Self {
            farms: RwLock::new(farms),
            distress: RwLock::new(HashMap::new()),
        }
    }

    /// Load profiles from a JSON seed file
    pub fn from_seed_file(path: &str) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let farms: Vec<FarmProfile> = serde_json::from_str(&raw)?;
        tracing::info!(count = farms.len(), path, "Loaded farm directory seed");
        Ok(Self::new(farms))
    }

    pub fn set_distress(&self, farm_id: impl Into<String>, score: u8) {
        self.distress.write().insert(farm_id.into(), score.min(100));
    }

    /// Derive the composite 0-100 score from raw distress signals
    pub fn set_distress_signals(&self, farm_id: impl Into<String>, signals: &DistressSignals) {
        self.distress
            .write()
            .insert(farm_id.into(), composite_distress(signals));
    }

    pub fn upsert_farm(&self, farm: FarmProfile) {
        let mut farms = self.farms.write();
        if let Some(existing) = farms.iter_mut().find(|f| f.farm_id == farm.farm_id) {
            *existing = farm;
        } else {
            farms.push(farm);
        }
    }
}

#[async_trait]
impl FarmDirectory for StaticFarmDirectory {
    async fn eligible_farms(&self, product_type: ProductType) -> Vec<FarmProfile> {
        self.farms
            .read()
            .iter()
            .filter(|f| f.produces(product_type))
            .cloned()
            .collect()
    }

    async fn distress_score(&self, farm_id: &str) -> Option<u8> {
        self.distress.read().get(farm_id).copied()
    }
}
