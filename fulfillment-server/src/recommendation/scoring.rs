//! Farm eligibility and scoring
//!
//! Hard filters exclude ineligible farms outright; everything else is
//! additive scoring. No randomness anywhere: identical inputs always
//! produce identical scores.

use shared::farm::{ApprovalStatus, DistressSignals, FarmProfile};
use shared::fulfillment::ProductType;

use super::RecommendationConfig;

/// Distress composite weights (sum to 100)
const W_INVENTORY_AGING: f64 = 25.0;
const W_SALES_INACTIVITY: f64 = 25.0;
const W_MORTALITY: f64 = 15.0;
const W_MARKETPLACE_INACTIVITY: f64 = 15.0;
const W_CAPACITY_IMBALANCE: f64 = 10.0;
const W_PAYMENT_BACKLOG: f64 = 10.0;

/// Hard eligibility filter: production type and approval status.
/// Farms failing either are excluded, not merely down-weighted.
pub fn is_eligible(farm: &FarmProfile, product_type: ProductType) -> bool {
    farm.approval_status == ApprovalStatus::Approved && farm.produces(product_type)
}

/// Additive score for an eligible farm.
///
/// - business registration on file: configured points
/// - settlement account on file: configured points
/// - held inventory: proportional to available quantity relative to the
///   remaining need, capped at the configured maximum
/// - distress bonus: 0-100, when enabled and available
pub fn score_farm(
    farm: &FarmProfile,
    quantity_needed: u32,
    distress: Option<u8>,
    config: &RecommendationConfig,
) -> f64 {
    let mut score = 0.0;

    if farm.business_registered {
        score += config.business_registration_points;
    }
    if farm.has_settlement_account() {
        score += config.settlement_account_points;
    }

    if quantity_needed > 0 && farm.current_inventory > 0 {
        let coverage =
            (farm.current_inventory.min(quantity_needed) as f64) / (quantity_needed as f64);
        score += coverage * config.inventory_points_cap;
    }

    if config.distress_bonus_enabled
        && let Some(distress) = distress
    {
        score += distress.min(100) as f64;
    }

    score
}

/// Composite 0-100 distress score from normalized signals.
///
/// Weights: inventory aging 25, sales inactivity 25, mortality 15,
/// marketplace inactivity 15, capacity imbalance 10, payment backlog 10.
pub fn composite_distress(signals: &DistressSignals) -> u8 {
    let clamp = |v: f64| v.clamp(0.0, 1.0);
    let score = clamp(signals.inventory_aging) * W_INVENTORY_AGING
        + clamp(signals.sales_inactivity) * W_SALES_INACTIVITY
        + clamp(signals.mortality) * W_MORTALITY
        + clamp(signals.marketplace_inactivity) * W_MARKETPLACE_INACTIVITY
        + clamp(signals.capacity_imbalance) * W_CAPACITY_IMBALANCE
        + clamp(signals.payment_backlog) * W_PAYMENT_BACKLOG;
    score.round().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn farm(inventory: u32) -> FarmProfile {
        FarmProfile {
            farm_id: "farm-1".to_string(),
            farm_name: "Sunrise Farm".to_string(),
            region: "Ashanti".to_string(),
            approval_status: ApprovalStatus::Approved,
            production_types: vec![ProductType::Broiler],
            business_registered: true,
            settlement_account: Some("MM-0244-000-111".to_string()),
            current_inventory: inventory,
        }
    }

    #[test]
    fn unapproved_or_wrong_product_is_excluded() {
        let mut f = farm(1000);
        assert!(is_eligible(&f, ProductType::Broiler));
        assert!(!is_eligible(&f, ProductType::TableEgg));
        f.approval_status = ApprovalStatus::Pending;
        assert!(!is_eligible(&f, ProductType::Broiler));
        f.approval_status = ApprovalStatus::Suspended;
        assert!(!is_eligible(&f, ProductType::Broiler));
    }

    #[test]
    fn base_points_for_registration_and_account() {
        let config = RecommendationConfig::default();
        let mut f = farm(0);
        assert_eq!(score_farm(&f, 1000, None, &config), 150.0);
        f.settlement_account = None;
        assert_eq!(score_farm(&f, 1000, None, &config), 100.0);
        f.business_registered = false;
        assert_eq!(score_farm(&f, 1000, None, &config), 0.0);
    }

    #[test]
    fn inventory_points_scale_and_cap() {
        let config = RecommendationConfig::default();
        // Half coverage → half of the cap
        assert_eq!(score_farm(&farm(500), 1000, None, &config), 200.0);
        // Full coverage → full cap
        assert_eq!(score_farm(&farm(1000), 1000, None, &config), 250.0);
        // Excess inventory does not score beyond the cap
        assert_eq!(score_farm(&farm(9000), 1000, None, &config), 250.0);
    }

    #[test]
    fn distress_bonus_respects_toggle() {
        let mut config = RecommendationConfig::default();
        let f = farm(0);
        assert_eq!(score_farm(&f, 1000, Some(60), &config), 210.0);
        config.distress_bonus_enabled = false;
        assert_eq!(score_farm(&f, 1000, Some(60), &config), 150.0);
    }

    #[test]
    fn composite_distress_weighting() {
        // Fully distressed on every signal → 100
        let all = DistressSignals {
            inventory_aging: 1.0,
            sales_inactivity: 1.0,
            mortality: 1.0,
            marketplace_inactivity: 1.0,
            capacity_imbalance: 1.0,
            payment_backlog: 1.0,
        };
        assert_eq!(composite_distress(&all), 100);

        // Only the two 25-point signals
        let top_two = DistressSignals {
            inventory_aging: 1.0,
            sales_inactivity: 1.0,
            ..Default::default()
        };
        assert_eq!(composite_distress(&top_two), 50);

        // Half of everything → 50
        let half = DistressSignals {
            inventory_aging: 0.5,
            sales_inactivity: 0.5,
            mortality: 0.5,
            marketplace_inactivity: 0.5,
            capacity_imbalance: 0.5,
            payment_backlog: 0.5,
        };
        assert_eq!(composite_distress(&half), 50);
    }

    #[test]
    fn composite_distress_clamps_out_of_range_signals() {
        let wild = DistressSignals {
            inventory_aging: 7.0,
            sales_inactivity: -3.0,
            ..Default::default()
        };
        assert_eq!(composite_distress(&wild), 25);
    }
}
