//! Farm directory types
//!
//! Profiles returned by the external farm directory and the distress
//! signals used to compute purchasing-priority bonuses. The directory
//! service itself (registration, approval workflow) is external; these
//! are the read-side types the fulfillment engine consumes.

use serde::{Deserialize, Serialize};

use crate::fulfillment::ProductType;

/// Farm approval status in the directory
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Suspended,
}

/// Farm profile as published by the farm directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FarmProfile {
    pub farm_id: String,
    pub farm_name: String,
    pub region: String,
    pub approval_status: ApprovalStatus,
    /// Product types this farm produces
    pub production_types: Vec<ProductType>,
    /// Whether the farm has a business registration certificate on file
    pub business_registered: bool,
    /// Settlement account for payouts, if one is on file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settlement_account: Option<String>,
    /// Currently held sellable inventory of the queried product type
    pub current_inventory: u32,
}

impl FarmProfile {
    pub fn has_settlement_account(&self) -> bool {
        self.settlement_account.is_some()
    }

    pub fn produces(&self, product_type: ProductType) -> bool {
        self.production_types.contains(&product_type)
    }
}

/// Raw distress signals for a farm, each normalized to `0.0..=1.0`
/// (0 = healthy, 1 = maximally distressed).
///
/// The composite 0-100 score is computed by the recommendation engine;
/// directories that already aggregate a score can supply it directly.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct DistressSignals {
    /// Inventory sitting unsold past its optimal sale window
    pub inventory_aging: f64,
    /// No recorded sales in the recent window
    pub sales_inactivity: f64,
    /// Elevated mortality in recent flocks
    pub mortality: f64,
    /// No marketplace listings or logins recently
    pub marketplace_inactivity: f64,
    /// Capacity under- or over-utilization
    pub capacity_imbalance: f64,
    /// Outstanding unpaid invoices owed to the farm
    pub payment_backlog: f64,
}

/// One farm's position in a recommendation result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FarmAllocation {
    pub farm_id: String,
    pub farm_name: String,
    pub score: f64,
    /// Distress bonus included in `score` (0 when disabled or unavailable)
    pub distress_bonus: f64,
    pub available_inventory: u32,
    /// Quantity the allocator proposes this farm supplies (0 beyond the
    /// point where the order is satisfied)
    pub quantity_allocated: u32,
}

/// Full recommendation outcome for an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecommendationOutcome {
    pub order_id: String,
    /// Ranked farms, best score first
    pub allocations: Vec<FarmAllocation>,
    pub quantity_requested: u32,
    pub quantity_allocated: u32,
    /// False when the eligible pool could not cover the requested quantity
    pub fully_satisfied: bool,
}
