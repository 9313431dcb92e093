use serde_json::Value;

use crate::{
    api::home_assistant::EntityState,
    core::slot::{PerSlot, SLOTS_PER_DAY},
    normalize::as_number,
    quantity::rate::KilowattHourRate,
};

/// Normalize a spot price sensor into per-slot rates.
///
/// The sensor exposes hourly prices for tomorrow (preferred, the schedule is
/// a day-ahead plan) or today; each hourly price fills its four slots.
/// Prices that are missing or not strictly positive become `None` — a missing
/// price must read as "do not grid-charge", never as free energy.
#[must_use]
pub fn normalize(state: &EntityState) -> PerSlot<Option<KilowattHourRate>> {
    let mut slots = [None; SLOTS_PER_DAY];
    let Some(hourly) = hourly_prices(state) else {
        return slots;
    };
    for (hour, value) in hourly.iter().take(24).enumerate() {
        let price = as_number(value)
            .filter(|price| *price > 0.0)
            .map(KilowattHourRate::from);
        for quarter in 0..4 {
            slots[hour * 4 + quarter] = price;
        }
    }
    slots
}

/// The first hourly price list with a full day of values.
fn hourly_prices(state: &EntityState) -> Option<&Vec<Value>> {
    ["tomorrow_hourly_prices", "today_hourly_prices"].iter().find_map(|key| {
        match state.attributes.get(*key) {
            Some(Value::Array(values)) if values.len() >= 24 => Some(values),
            _ => None,
        }
    })
}
