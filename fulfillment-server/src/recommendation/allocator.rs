//! Greedy quantity allocation over the ranked farm pool
//!
//! Farms are sorted by descending score (lower farm id wins ties, so
//! repeated runs over the same pool are reproducible) and quantity is
//! allocated greedily up to each farm's available inventory or the
//! configured farm cap, whichever binds first. Partial fulfillment is
//! legal and surfaced in the outcome.

use std::collections::HashMap;

use shared::farm::{FarmAllocation, FarmProfile, RecommendationOutcome};
use shared::fulfillment::OrderSnapshot;

use super::scoring::{is_eligible, score_farm};
use super::RecommendationConfig;

/// Produce a ranked, quantity-allocated recommendation for an order.
///
/// `distress` maps farm id → 0-100 distress score; farms absent from the
/// map simply get no bonus. Allocation targets the order's *remaining*
/// quantity so re-running against a partially assigned order never
/// over-allocates.
pub fn recommend(
    order: &OrderSnapshot,
    pool: &[FarmProfile],
    distress: &HashMap<String, u8>,
    config: &RecommendationConfig,
) -> RecommendationOutcome {
    let needed = order.quantity_remaining();

    let mut ranked: Vec<(f64, &FarmProfile)> = pool
        .iter()
        .filter(|farm| is_eligible(farm, order.product_type))
        .map(|farm| {
            let score = score_farm(
                farm,
                needed,
                distress.get(&farm.farm_id).copied(),
                config,
            );
            (score, farm)
        })
        .collect();

    // Descending score; lower farm id wins ties for determinism
    ranked.sort_by(|(score_a, farm_a), (score_b, farm_b)| {
        score_b
            .partial_cmp(score_a)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| farm_a.farm_id.cmp(&farm_b.farm_id))
    });

    let mut remaining = needed;
    let mut farms_used = 0usize;
    let mut allocations = Vec::with_capacity(ranked.len());

    for (score, farm) in ranked {
        let quantity = if remaining == 0 || farms_used >= config.max_farms {
            0
        } else {
            farm.current_inventory.min(remaining)
        };
        if quantity > 0 {
            remaining -= quantity;
            farms_used += 1;
        }
        let distress_bonus = if config.distress_bonus_enabled {
            distress.get(&farm.farm_id).map(|d| *d as f64).unwrap_or(0.0)
        } else {
            0.0
        };
        allocations.push(FarmAllocation {
            farm_id: farm.farm_id.clone(),
            farm_name: farm.farm_name.clone(),
            score,
            distress_bonus,
            available_inventory: farm.current_inventory,
            quantity_allocated: quantity,
        });
    }

    RecommendationOutcome {
        order_id: order.order_id.clone(),
        allocations,
        quantity_requested: needed,
        quantity_allocated: needed - remaining,
        fully_satisfied: remaining == 0,
    }
}
