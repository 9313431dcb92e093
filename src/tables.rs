use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};
use itertools::Itertools;

use crate::{
    cli::PolicyArgs,
    core::{
        mode::Mode,
        schedule::Schedule,
    },
    quantity::rate::KilowattHourRate,
};

#[must_use]
pub fn build_schedule_table(schedule: &Schedule, policy: &PolicyArgs) -> Table {
    let prices = schedule.entries().iter().filter_map(|entry| entry.price).sorted().collect_vec();
    let median_price = prices.get(prices.len() / 2).copied().unwrap_or(KilowattHourRate::ZERO);

    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table.set_header(vec!["Time", "Mode", "PV", "Load", "Price", "Planned", "SOC", ""]);
    for entry in schedule.entries() {
        let price_cell = entry.price.map_or_else(
            || Cell::new("—").add_attribute(Attribute::Dim),
            |price| {
                Cell::new(price).fg(if price >= median_price { Color::Red } else { Color::Green })
            },
        );
        table.add_row(vec![
            Cell::new(entry.time.format("%H:%M")),
            Cell::new(format!("{:?}", entry.mode)).fg(match entry.mode {
                Mode::SolarCharge => Color::DarkYellow,
                Mode::BatteryDischarge => Color::Red,
                Mode::GridChargeCheap | Mode::GridChargeOptimal => Color::Green,
                Mode::GridChargeCritical => Color::Magenta,
                Mode::Idle => Color::Reset,
            }),
            Cell::new(entry.pv_power).set_alignment(CellAlignment::Right),
            Cell::new(entry.load).set_alignment(CellAlignment::Right),
            price_cell,
            Cell::new(entry.planned_charge).set_alignment(CellAlignment::Right),
            Cell::new(format!("{:.2} %", entry.soc_pct_end))
                .set_alignment(CellAlignment::Right)
                .fg(if entry.soc_pct_end <= policy.min_soc.0 {
                    Color::Red
                } else if entry.soc_pct_end < policy.critical_hours_soc.0 {
                    Color::DarkYellow
                } else {
                    Color::Reset
                }),
            Cell::new(if entry.is_critical_hour { "•" } else { "" })
                .add_attribute(Attribute::Dim),
        ]);
    }
    table
}
