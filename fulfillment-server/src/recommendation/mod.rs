//! Farm recommendation engine
//!
//! Given an order and the pool of eligible farms, produces a ranked,
//! quantity-allocated list of candidates:
//!
//! - **scoring**: hard eligibility filters and the additive scoring
//!   function (registration, settlement account, inventory, distress)
//! - **allocator**: greedy quantity allocation over the ranked list
//!
//! The result is advisory for manual assignment and consumed directly by
//! auto-assignment. All weights and caps come from a
//! `RecommendationConfig` supplied at construction.

pub mod allocator;
pub mod scoring;

pub use allocator::recommend;
pub use scoring::{composite_distress, score_farm};

/// Scoring weights and allocation caps
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendationConfig {
    /// Points for a business registration certificate on file
    pub business_registration_points: f64,
    /// Points for a settlement account on file
    pub settlement_account_points: f64,
    /// Maximum points from held inventory; actual points scale with
    /// available quantity relative to the order's remaining need
    pub inventory_points_cap: f64,
    /// Bias allocation toward distressed farms (0-100 bonus)
    pub distress_bonus_enabled: bool,
    /// Maximum number of farms allocated per order
    pub max_farms: usize,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            business_registration_points: 100.0,
            settlement_account_points: 50.0,
            inventory_points_cap: 100.0,
            distress_bonus_enabled: true,
            max_farms: 10,
        }
    }
}
