use bon::Builder;

use crate::{
    cli::{BatteryArgs, PolicyArgs},
    core::{
        bands::PriceBands,
        mode::Mode,
        schedule::{Schedule, ScheduleEntry},
        selector,
        slot::{self, PerSlot, SLOT_WIDTH, SLOTS_PER_DAY},
    },
    prelude::*,
    quantity::{
        Quantity,
        energy::KilowattHours,
        power::Kilowatts,
        rate::KilowattHourRate,
    },
};

/// PV surplus below this dead-band counts as noise.
const SURPLUS_DEAD_BAND: Kilowatts = Quantity(0.05);

/// Headroom below which the battery counts as full.
const MIN_HEADROOM: KilowattHours = Quantity(0.01);

#[derive(Builder)]
pub struct Simulator<'a> {
    pv_forecast: &'a PerSlot<Kilowatts>,
    prices: &'a PerSlot<Option<KilowattHourRate>>,
    load_forecast: &'a PerSlot<Kilowatts>,
    battery: BatteryArgs,
    policy: PolicyArgs,
    initial_soc: KilowattHours,
    current_slot: usize,
    was_charging: bool,
}

impl Simulator<'_> {
    /// Walk all the slots in time order and produce the day-ahead plan.
    ///
    /// Each slot's decision depends on the state of charge carried over from
    /// the previous slot, so the walk is strictly sequential. Returns the plan
    /// together with the hysteresis flag to feed into the next run.
    #[instrument(skip_all, fields(initial_soc = %self.initial_soc, current_slot = self.current_slot))]
    pub fn run(self) -> (Schedule, bool) {
        let capacity = self.battery.capacity;
        let min_soc = capacity * self.policy.min_soc.to_proportion();
        let max_soc = capacity * self.policy.max_soc.to_proportion();
        let target_soc = capacity * self.policy.target_soc.to_proportion();
        let critical_soc = capacity * self.policy.critical_hours_soc.to_proportion();
        let critical_hours = self.policy.critical_hours();

        let bands = PriceBands::of(&self.policy, self.was_charging);
        let optimal_slots = selector::select_optimal_slots(
            self.prices,
            self.current_slot,
            (target_soc - self.initial_soc).max(KilowattHours::ZERO),
            self.battery.max_charge_power,
            self.battery.charge_efficiency,
        );
        debug!(?optimal_slots, "selected the candidate charging slots");

        let mut soc = self.initial_soc;
        let mut entries = Vec::with_capacity(SLOTS_PER_DAY);

        for slot_index in 0..SLOTS_PER_DAY {
            let pv = self.pv_forecast[slot_index];
            let load = self.load_forecast[slot_index];
            let price = self.prices[slot_index];
            let net_pv = pv - load;

            let is_critical_hour = critical_hours.contains(slot::hour_of(slot_index));
            let effective_target = if is_critical_hour { critical_soc } else { target_soc };

            let mut mode = Mode::Idle;
            let mut planned_charge = Kilowatts::ZERO;
            let mut should_charge = false;

            // Surplus PV goes into the battery first:
            if net_pv > SURPLUS_DEAD_BAND {
                let headroom = max_soc - soc;
                if headroom > MIN_HEADROOM {
                    let charged =
                        (net_pv.min(self.battery.max_charge_power) * SLOT_WIDTH).min(headroom);
                    soc += charged * self.battery.charge_efficiency;
                    planned_charge = charged / SLOT_WIDTH;
                    mode = Mode::SolarCharge;
                }
            } else if load > pv && soc > min_soc {
                // Cover the household deficit from the battery:
                let discharged = ((load - pv).min(self.battery.max_charge_power) * SLOT_WIDTH)
                    .min(soc - min_soc);
                soc -= discharged / self.battery.charge_efficiency;
                planned_charge = -(discharged / SLOT_WIDTH);
                mode = Mode::BatteryDischarge;
            }

            // Grid charging is decided on top of the branches above, so the battery
            // may take PV surplus and grid energy within the same slot:
            if soc < effective_target
                && let Some(price) = price
            {
                if price <= bands.always_charge {
                    if let Some(charge_power) = self.charge_from_grid(&mut soc, max_soc) {
                        planned_charge = charge_power;
                        mode = Mode::GridChargeCheap;
                        should_charge = true;
                    }
                } else if price < bands.never_charge && optimal_slots.contains(&slot_index) {
                    if let Some(charge_power) = self.charge_from_grid(&mut soc, max_soc) {
                        planned_charge = charge_power;
                        mode = if is_critical_hour {
                            Mode::GridChargeCritical
                        } else {
                            Mode::GridChargeOptimal
                        };
                        should_charge = true;
                    }
                }
            }

            // Defensive clamp against cumulative drift:
            soc = soc.clamp(min_soc, max_soc);

            entries.push(ScheduleEntry {
                slot: slot_index,
                time: slot::start_of(slot_index),
                mode,
                pv_power: pv.round(3),
                load: load.round(3),
                net_pv: net_pv.round(3),
                price: price.map(|price| price.round(4)),
                planned_charge: planned_charge.round(3),
                soc_end: soc.round(3),
                soc_pct_end: round_percent(soc.0 / capacity.0 * 100.0),
                should_charge,
                is_critical_hour,
            });
        }

        let next_hysteresis = entries.last().is_some_and(|entry| entry.should_charge);
        (Schedule(entries), next_hysteresis)
    }

    /// Charge from the grid towards the SOC ceiling, returning the applied power.
    fn charge_from_grid(&self, soc: &mut KilowattHours, max_soc: KilowattHours) -> Option<Kilowatts> {
        let headroom = max_soc - *soc;
        if headroom <= MIN_HEADROOM {
            return None;
        }
        let charge_power = self.battery.max_charge_power.min(headroom / SLOT_WIDTH);
        *soc += charge_power * SLOT_WIDTH * self.battery.charge_efficiency;
        Some(charge_power)
    }
}

fn round_percent(percent: f64) -> f64 {
    (percent * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    const ZERO_POWER: PerSlot<Kilowatts> = [Kilowatts::ZERO; SLOTS_PER_DAY];
    const NO_PRICES: PerSlot<Option<KilowattHourRate>> = [None; SLOTS_PER_DAY];

    fn flat_prices(price: f64) -> PerSlot<Option<KilowattHourRate>> {
        [Some(KilowattHourRate::from(price)); SLOTS_PER_DAY]
    }

    fn assert_invariants(schedule: &Schedule, battery: BatteryArgs, policy: PolicyArgs) {
        let min_soc = battery.capacity * policy.min_soc.to_proportion();
        let max_soc = battery.capacity * policy.max_soc.to_proportion();
        for entry in schedule.entries() {
            assert!(
                entry.soc_end >= min_soc.round(3) && entry.soc_end <= max_soc.round(3),
                "slot {}: SOC {} out of [{}, {}]",
                entry.slot,
                entry.soc_end,
                min_soc,
                max_soc,
            );
            match entry.mode {
                Mode::Idle => assert_eq!(entry.planned_charge, Kilowatts::ZERO),
                Mode::SolarCharge => assert!(entry.planned_charge > Kilowatts::ZERO),
                Mode::BatteryDischarge => assert!(entry.planned_charge < Kilowatts::ZERO),
                Mode::GridChargeCheap | Mode::GridChargeOptimal | Mode::GridChargeCritical => {
                    assert!(entry.planned_charge > Kilowatts::ZERO);
                }
            }
            assert_eq!(entry.should_charge, entry.mode.is_grid_charge());
        }
    }

    /// The worked reference scenario: 17 kWh battery at 50%, flat 2.0 CZK/kWh,
    /// no PV and no load. Eight near slots get selected and grid-charged.
    #[test]
    fn test_flat_price_day() {
        let battery = BatteryArgs::default();
        let policy = PolicyArgs::default();
        let prices = flat_prices(2.0);
        let (schedule, was_charging) = Simulator::builder()
            .pv_forecast(&ZERO_POWER)
            .prices(&prices)
            .load_forecast(&ZERO_POWER)
            .battery(battery)
            .policy(policy)
            .initial_soc(KilowattHours::from(8.5))
            .current_slot(0)
            .was_charging(false)
            .build()
            .run();

        let charging: Vec<usize> = schedule
            .entries()
            .iter()
            .filter(|entry| entry.should_charge)
            .map(|entry| entry.slot)
            .collect();
        assert_eq!(charging, [0, 1, 2, 3, 4, 5, 6, 7]);
        for slot in &charging {
            assert_eq!(schedule.entries()[*slot].mode, Mode::GridChargeOptimal);
        }

        // 8 slots × 3.7 kW × 0.25 h × 0.95 on top of the initial 8.5 kWh:
        assert_abs_diff_eq!(schedule.entries()[95].soc_end.0, 15.53, epsilon = 0.01);
        // The day ends idle:
        assert!(!was_charging);
        assert_invariants(&schedule, battery, policy);
    }

    #[test]
    fn test_solar_surplus_is_stored_until_full() {
        let battery = BatteryArgs::default();
        let policy = PolicyArgs::default();
        let sunny = [Kilowatts::from(2.0); SLOTS_PER_DAY];
        let (schedule, _) = Simulator::builder()
            .pv_forecast(&sunny)
            .prices(&NO_PRICES)
            .load_forecast(&ZERO_POWER)
            .battery(battery)
            .policy(policy)
            .initial_soc(KilowattHours::from(8.5))
            .current_slot(0)
            .was_charging(false)
            .build()
            .run();

        let max_soc = battery.capacity * policy.max_soc.to_proportion();
        let mut previous = KilowattHours::from(8.5);
        for entry in schedule.entries() {
            assert!(entry.soc_end >= previous, "SOC must not decrease on surplus");
            previous = entry.soc_end;
        }
        assert_abs_diff_eq!(schedule.entries()[95].soc_end.0, max_soc.0, epsilon = 0.01);

        // Full battery turns the remaining surplus slots idle:
        let last = schedule.entries().last().unwrap();
        assert_eq!(last.mode, Mode::Idle);
        assert_invariants(&schedule, battery, policy);
    }

    #[test]
    fn test_deficit_discharges_down_to_the_floor() {
        let battery = BatteryArgs::default();
        let policy = PolicyArgs::default();
        let load = [Kilowatts::from(1.0); SLOTS_PER_DAY];
        let (schedule, _) = Simulator::builder()
            .pv_forecast(&ZERO_POWER)
            .prices(&NO_PRICES)
            .load_forecast(&load)
            .battery(battery)
            .policy(policy)
            .initial_soc(KilowattHours::from(8.5))
            .current_slot(0)
            .was_charging(false)
            .build()
            .run();

        assert_eq!(schedule.entries()[0].mode, Mode::BatteryDischarge);
        assert_abs_diff_eq!(schedule.entries()[0].planned_charge.0, -1.0);

        let min_soc = battery.capacity * policy.min_soc.to_proportion();
        assert_abs_diff_eq!(schedule.entries()[95].soc_end.0, min_soc.0, epsilon = 0.001);
        // Once at the floor the battery stops supplying the house:
        assert_eq!(schedule.entries()[95].mode, Mode::Idle);
        assert_invariants(&schedule, battery, policy);
    }

    #[test]
    fn test_missing_prices_never_grid_charge() {
        let (schedule, was_charging) = Simulator::builder()
            .pv_forecast(&ZERO_POWER)
            .prices(&NO_PRICES)
            .load_forecast(&ZERO_POWER)
            .battery(BatteryArgs::default())
            .policy(PolicyArgs::default())
            .initial_soc(KilowattHours::from(2.0))
            .current_slot(0)
            .was_charging(false)
            .build()
            .run();

        assert!(schedule.entries().iter().all(|entry| !entry.should_charge));
        assert!(!was_charging);
    }

    #[test]
    fn test_very_cheap_price_charges_everywhere() {
        let battery = BatteryArgs::default();
        let policy = PolicyArgs::default();
        let prices = flat_prices(1.0);
        let (schedule, _) = Simulator::builder()
            .pv_forecast(&ZERO_POWER)
            .prices(&prices)
            .load_forecast(&ZERO_POWER)
            .battery(battery)
            .policy(policy)
            .initial_soc(KilowattHours::from(8.5))
            .current_slot(0)
            .was_charging(false)
            .build()
            .run();

        // 1.0 CZK/kWh sits below the narrowed always-charge threshold (1.425),
        // so the cheap branch fires regardless of the selected slots:
        assert_eq!(schedule.entries()[0].mode, Mode::GridChargeCheap);
        // Charging runs at full power while SOC is below the target and stops
        // right after crossing it:
        let target_soc = battery.capacity * policy.target_soc.to_proportion();
        let final_soc = schedule.entries()[95].soc_end;
        assert!(final_soc >= target_soc);
        assert_abs_diff_eq!(final_soc.0, 15.53, epsilon = 0.01);
        assert_invariants(&schedule, battery, policy);
    }

    #[test]
    fn test_hysteresis_never_reduces_charging() {
        // 1.5 CZK/kWh falls between the narrowed (1.425) and the widened (1.575)
        // always-charge thresholds, so only the "was charging" run takes it:
        let prices = flat_prices(1.5);
        let run = |was_charging| {
            let (schedule, _) = Simulator::builder()
                .pv_forecast(&ZERO_POWER)
                .prices(&prices)
                .load_forecast(&ZERO_POWER)
                .battery(BatteryArgs::default())
                .policy(PolicyArgs::default())
                .initial_soc(KilowattHours::from(8.5))
                .current_slot(0)
                .was_charging(was_charging)
                .build()
                .run();
            schedule.summary().charging_slots
        };
        let after_charging = run(true);
        let after_idling = run(false);
        assert!(after_charging >= after_idling);
        assert!(after_charging > 0);
        assert_eq!(schedule_mode_of(&prices, true), Mode::GridChargeCheap);
    }

    fn schedule_mode_of(
        prices: &PerSlot<Option<KilowattHourRate>>,
        was_charging: bool,
    ) -> Mode {
        let (schedule, _) = Simulator::builder()
            .pv_forecast(&ZERO_POWER)
            .prices(prices)
            .load_forecast(&ZERO_POWER)
            .battery(BatteryArgs::default())
            .policy(PolicyArgs::default())
            .initial_soc(KilowattHours::from(8.5))
            .current_slot(0)
            .was_charging(was_charging)
            .build()
            .run();
        schedule.entries()[0].mode
    }

    #[test]
    fn test_critical_hours_keep_charging_past_the_normal_target() {
        let battery = BatteryArgs::default();
        let policy = PolicyArgs::default();
        // Prices exist only during the critical window, 17:00 to 21:00:
        let mut prices = NO_PRICES;
        for slot in 68..84 {
            prices[slot] = Some(KilowattHourRate::from(2.0));
        }
        let (schedule, _) = Simulator::builder()
            .pv_forecast(&ZERO_POWER)
            .prices(&prices)
            .load_forecast(&ZERO_POWER)
            .battery(battery)
            .policy(policy)
            .initial_soc(KilowattHours::from(8.5))
            .current_slot(64)
            .was_charging(false)
            .build()
            .run();

        let charging: Vec<&ScheduleEntry> =
            schedule.entries().iter().filter(|entry| entry.should_charge).collect();
        assert!(!charging.is_empty());
        for entry in &charging {
            assert!(entry.is_critical_hour);
            assert_eq!(entry.mode, Mode::GridChargeCritical);
        }

        // Charging stops once the critical floor (80% of 17 kWh) is secured:
        let critical_soc = battery.capacity * policy.critical_hours_soc.to_proportion();
        let last_charging = charging.last().unwrap();
        assert!(last_charging.soc_end >= critical_soc.round(3));
        assert_invariants(&schedule, battery, policy);
    }

    #[test]
    fn test_grid_charge_tops_up_a_solar_slot() {
        let battery = BatteryArgs::default();
        let policy = PolicyArgs::default();
        // Modest surplus and a very cheap price in the same slots — the grid
        // branch runs after the solar branch and overrides the slot's mode:
        let sunny = [Kilowatts::from(0.5); SLOTS_PER_DAY];
        let prices = flat_prices(1.0);
        let (schedule, _) = Simulator::builder()
            .pv_forecast(&sunny)
            .prices(&prices)
            .load_forecast(&ZERO_POWER)
            .battery(battery)
            .policy(policy)
            .initial_soc(KilowattHours::from(8.5))
            .current_slot(0)
            .was_charging(false)
            .build()
            .run();

        let first = &schedule.entries()[0];
        assert_eq!(first.mode, Mode::GridChargeCheap);
        assert!(first.should_charge);
        // The slot stores both the surplus and the grid energy:
        let stored_solar = Kilowatts::from(0.5) * SLOT_WIDTH * battery.charge_efficiency;
        let stored_grid = Kilowatts::from(3.7) * SLOT_WIDTH * battery.charge_efficiency;
        assert_abs_diff_eq!(
            first.soc_end.0,
            8.5 + stored_solar.0 + stored_grid.0,
            epsilon = 0.001
        );
        assert_invariants(&schedule, battery, policy);
    }
}
