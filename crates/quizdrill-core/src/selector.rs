//! Weighted-random question selection.
//!
//! Roulette selection over the items that are not yet mastered: draw a value
//! in `[0, total_weight)`, walk the pool in order subtracting each weight, and
//! take the first item where the remainder drops to zero or below.

use rand::Rng;

use crate::tracker::{DrillItem, ItemTracker};

/// Pick an index from `weights` for a unit draw in `[0, 1)`.
///
/// Returns `None` only for an empty slice.
pub fn pick_weighted(weights: &[u32], draw: f64) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: u64 = weights.iter().map(|w| u64::from(*w)).sum();
    let mut remaining = draw * total as f64;
    for (i, weight) in weights.iter().enumerate() {
        remaining -= f64::from(*weight);
        if remaining <= 0.0 {
            return Some(i);
        }
    }
    // Only reachable if `draw` was outside [0, 1).
    Some(0)
}

/// Select the next item to present, or `None` when every item is mastered.
///
/// Missing item state is initialized first. Items are considered in the
/// order given.
pub fn select<'a, T, R>(tracker: &mut ItemTracker, items: &'a [T], rng: &mut R) -> Option<&'a T>
where
    T: DrillItem,
    R: Rng + ?Sized,
{
    tracker.initialize(items);

    let pool: Vec<&'a T> = items
        .iter()
        .filter(|item| !tracker.is_mastered(item.item_id()))
        .collect();
    if pool.is_empty() {
        return None;
    }

    let default_weight = tracker.policy().default_weight;
    let weights: Vec<u32> = pool
        .iter()
        .map(|item| tracker.weight(item.item_id()).unwrap_or(default_weight))
        .collect();

    let draw: f64 = rng.gen();
    let index = pick_weighted(&weights, draw)?;
    tracing::trace!(
        pool = pool.len(),
        draw,
        picked = pool[index].item_id(),
        "selected item"
    );
    Some(pool[index])
}
