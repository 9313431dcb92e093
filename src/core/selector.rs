use std::collections::BTreeSet;

use crate::{
    core::slot::{PerSlot, SLOT_WIDTH, SLOTS_PER_DAY},
    prelude::*,
    quantity::{Quantity, energy::KilowattHours, power::Kilowatts, rate::KilowattHourRate},
};

/// Deficits below this are not worth a grid-charging plan.
const MIN_ENERGY_NEEDED: KilowattHours = Quantity(0.5);

/// How far ahead a selected slot may lie (8 hours).
const MAX_WAIT_SLOTS: usize = 32;

/// Pick the slots where grid charging should happen.
///
/// Greedy selection of the cheapest upcoming slots, with two twists:
/// when the sampled prices still look like a falling trend, the selection
/// shifts to the middle of the price-sorted candidates instead of grabbing
/// the in-sample minimum, and slots further than eight hours out are dropped
/// unless that would leave no plan at all.
///
/// Never fails: with no usable price data the result is simply empty.
pub fn select_optimal_slots(
    prices: &PerSlot<Option<KilowattHourRate>>,
    current_slot: usize,
    energy_needed: KilowattHours,
    max_charge_power: Kilowatts,
    charge_efficiency: f64,
) -> BTreeSet<usize> {
    if energy_needed < MIN_ENERGY_NEEDED {
        return BTreeSet::new();
    }

    let max_energy_per_slot = max_charge_power * SLOT_WIDTH * charge_efficiency;
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let slots_needed = (energy_needed.0 / max_energy_per_slot.0 + 0.5) as usize;
    if slots_needed == 0 {
        return BTreeSet::new();
    }

    // Candidates from now to the end of the day, cheapest first.
    // The sort is stable, so equally priced slots keep their time order:
    let mut candidates: Vec<(usize, KilowattHourRate)> = (current_slot..SLOTS_PER_DAY)
        .filter_map(|slot| prices[slot].map(|price| (slot, price)))
        .collect();
    if candidates.is_empty() {
        return BTreeSet::new();
    }
    candidates.sort_by_key(|(_, price)| *price);

    let cheapest: Vec<usize> = if candidates.len() >= 4 && is_decreasing_trend(&candidates) {
        debug!("decreasing price trend, waiting for the minimum");
        let midpoint = candidates.len() / 2;
        candidates.iter().skip(midpoint).take(slots_needed).map(|(slot, _)| *slot).collect()
    } else {
        candidates.iter().take(slots_needed).map(|(slot, _)| *slot).collect()
    };

    // Prefer slots within the next eight hours:
    let mut selected: BTreeSet<usize> =
        cheapest.iter().copied().filter(|slot| *slot <= current_slot + MAX_WAIT_SLOTS).collect();
    if selected.is_empty() {
        // Everything worthwhile is too far out; settle for the closest of the cheap slots
        // rather than producing no plan:
        let mut closest = cheapest;
        closest.sort_unstable();
        selected = closest.into_iter().take((slots_needed / 2).max(1)).collect();
    }
    selected
}

/// Compare the mean of the first price quartile against the last one.
fn is_decreasing_trend(candidates: &[(usize, KilowattHourRate)]) -> bool {
    let quarter = candidates.len() / 4;
    #[expect(clippy::cast_precision_loss)]
    let n = quarter as f64;
    let early = candidates[..quarter].iter().map(|(_, price)| price.0).sum::<f64>() / n;
    let late =
        candidates[candidates.len() - quarter..].iter().map(|(_, price)| price.0).sum::<f64>() / n;
    late < early * 0.95
}
