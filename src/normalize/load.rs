use chrono::TimeDelta;

use crate::{
    core::slot::{PerSlot, SLOTS_PER_DAY},
    quantity::{energy::KilowattHours, power::Kilowatts},
};

/// Shape a daily consumption total into a per-slot power profile.
///
/// Daytime hours (06:00–22:00) run 20 % above the daily average, night hours
/// at half of it.
#[must_use]
pub fn from_daily_total(total: KilowattHours) -> PerSlot<Kilowatts> {
    let mut slots = [Kilowatts::ZERO; SLOTS_PER_DAY];
    for hour in 0..24_usize {
        let factor = if (6..22).contains(&hour) { 1.2 } else { 0.5 };
        let power = total / 24.0 * factor / TimeDelta::hours(1);
        for quarter in 0..4 {
            slots[hour * 4 + quarter] = power;
        }
    }
    slots
}

/// Flat profile from the momentary consumption reading, in watts.
#[must_use]
pub fn from_current_power(watts: f64) -> PerSlot<Kilowatts> {
    [Kilowatts::from(watts / 1000.0); SLOTS_PER_DAY]
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    #[test]
    fn test_from_daily_total() {
        let slots = from_daily_total(KilowattHours::from(24.0));
        // Average hour carries 1 kWh, so daytime power is 1.2 kW, night 0.5 kW:
        assert_abs_diff_eq!(slots[0].0, 0.5);
        assert_abs_diff_eq!(slots[6 * 4].0, 1.2);
        assert_abs_diff_eq!(slots[21 * 4 + 3].0, 1.2);
        assert_abs_diff_eq!(slots[22 * 4].0, 0.5);
    }

    #[test]
    fn test_from_current_power() {
        let slots = from_current_power(1500.0);
        assert!(slots.iter().all(|power| *power == Kilowatts::from(1.5)));
    }
}
