use chrono::NaiveTime;
use serde::Serialize;

use crate::{
    core::{mode::Mode, slot::SLOT_WIDTH},
    quantity::{
        cost::Cost,
        energy::KilowattHours,
        power::Kilowatts,
        rate::KilowattHourRate,
    },
};

/// One 15-minute step of the day-ahead plan.
///
/// The numeric fields are rounded for reporting (power to 3 decimals, price
/// to 4, SOC percent to 2); the simulator carries its own unrounded running
/// state between slots.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct ScheduleEntry {
    pub slot: usize,
    pub time: NaiveTime,
    pub mode: Mode,
    pub pv_power: Kilowatts,
    pub load: Kilowatts,
    pub net_pv: Kilowatts,
    pub price: Option<KilowattHourRate>,

    /// Positive charges the battery, negative discharges it.
    pub planned_charge: Kilowatts,

    pub soc_end: KilowattHours,
    pub soc_pct_end: f64,

    /// Whether the grid-charging scripts should be on during this slot.
    pub should_charge: bool,

    pub is_critical_hour: bool,
}

/// The complete day-ahead plan, one entry per slot.
#[derive(Debug, Serialize, derive_more::Index, derive_more::IntoIterator)]
pub struct Schedule(pub Vec<ScheduleEntry>);

impl Schedule {
    #[must_use]
    pub fn entries(&self) -> &[ScheduleEntry] {
        &self.0
    }

    /// Whether the plan wants grid charging during the given slot.
    #[must_use]
    pub fn should_charge_at(&self, slot: usize) -> bool {
        self.0.get(slot).is_some_and(|entry| entry.should_charge)
    }

    #[must_use]
    pub fn summary(&self) -> Summary {
        let mut summary = Summary {
            charging_slots: 0,
            grid_energy: KilowattHours::ZERO,
            solar_energy: KilowattHours::ZERO,
            estimated_grid_cost: Cost::ZERO,
        };
        for entry in &self.0 {
            if entry.mode.is_grid_charge() {
                let energy = entry.planned_charge * SLOT_WIDTH;
                summary.charging_slots += 1;
                summary.grid_energy += energy;
                summary.estimated_grid_cost += energy * entry.price.unwrap_or(KilowattHourRate::ZERO);
            } else if entry.mode == Mode::SolarCharge {
                summary.solar_energy += entry.planned_charge * SLOT_WIDTH;
            }
        }
        summary
    }
}

/// Aggregates of the plan, for logging and display.
#[derive(Debug)]
pub struct Summary {
    pub charging_slots: usize,
    pub grid_energy: KilowattHours,
    pub solar_energy: KilowattHours,
    pub estimated_grid_cost: Cost,
}
