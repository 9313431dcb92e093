use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;

use crate::{
    api::home_assistant::EntityState,
    core::slot::{self, PerSlot, SLOTS_PER_DAY},
    normalize::as_number,
    quantity::power::Kilowatts,
};

/// Source grading of the PV forecast, reported alongside the normalized series.
#[derive(Clone, Copy, Debug)]
pub struct Confidence {
    pub score: f64,
    pub source: &'static str,
    pub n_slots: usize,
}

impl Confidence {
    pub const NONE: Self = Self { score: 0.0, source: "none", n_slots: 0 };
}

/// Normalize a PV production forecast sensor into per-slot power values.
///
/// Two upstream shapes are understood: a `watts` attribute mapping timestamps
/// to instantaneous production in watts (the 15-minute forecast), and an
/// hourly `wh_period` energy attribute which fills all four slots of its hour.
#[must_use]
pub fn normalize(state: &EntityState) -> (PerSlot<Kilowatts>, Confidence) {
    if let Some(Value::Object(watts)) = state.attributes.get("watts")
        && !watts.is_empty()
    {
        let mut slots = [Kilowatts::ZERO; SLOTS_PER_DAY];
        for (timestamp, value) in watts {
            let Some(slot) = slot_of_timestamp(timestamp) else { continue };
            let Some(watts) = as_number(value) else { continue };
            slots[slot] = Kilowatts::from(watts / 1000.0);
        }
        let confidence = Confidence {
            score: match watts.len() {
                SLOTS_PER_DAY.. => 0.95,
                48.. => 0.9,
                _ => 0.8,
            },
            source: "watts_map",
            n_slots: watts.len(),
        };
        return (slots, confidence);
    }

    if let Some(Value::Object(wh_period)) = state.attributes.get("wh_period")
        && !wh_period.is_empty()
    {
        let mut slots = [Kilowatts::ZERO; SLOTS_PER_DAY];
        for (timestamp, value) in wh_period {
            let Some(slot) = slot_of_timestamp(timestamp) else { continue };
            let Some(watt_hours) = as_number(value) else { continue };
            // Hourly energy spread evenly over the hour's four slots:
            let power = Kilowatts::from(watt_hours / 1000.0);
            let hour_start = slot / 4 * 4;
            for slot in hour_start..hour_start + 4 {
                slots[slot] = power;
            }
        }
        let confidence =
            Confidence { score: 0.85, source: "hourly_energy", n_slots: wh_period.len() };
        return (slots, confidence);
    }

    ([Kilowatts::ZERO; SLOTS_PER_DAY], Confidence::NONE)
}

/// Slot index of an ISO-ish timestamp, ignoring its date part.
fn slot_of_timestamp(raw: &str) -> Option<usize> {
    let time = DateTime::parse_from_rfc3339(raw)
        .map(|timestamp| timestamp.time())
        .or_else(|_| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .map(|timestamp| timestamp.time())
        })
        .ok()?;
    Some(slot::of_time(time))
}
