mod forage;
mod peek;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::Url;

pub use self::{forage::forage, peek::peek};
use crate::{
    api::home_assistant,
    core::slot::CriticalHours,
    prelude::*,
    quantity::{
        energy::KilowattHours,
        percent::Percent,
        power::Kilowatts,
        rate::KilowattHourRate,
    },
};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: read the sensors, optimize the schedule, and drive the charging scripts.
    Forage(Box<ForageArgs>),

    /// Development tools.
    Peek(Box<PeekArgs>),
}

#[derive(Parser)]
pub struct ForageArgs {
    /// Do not drive the charging scripts (dry run).
    #[clap(long)]
    pub scout: bool,

    /// File carrying the hysteresis flag and consumption history between runs.
    #[clap(long, env = "STATE_PATH", default_value = "magpie-state.toml")]
    pub state_path: PathBuf,

    #[clap(flatten)]
    pub home_assistant: HomeAssistantConnectionArgs,

    #[clap(flatten)]
    pub sensors: SensorArgs,

    #[clap(flatten)]
    pub scripts: ScriptArgs,

    #[clap(flatten)]
    pub battery: BatteryArgs,

    #[clap(flatten)]
    pub policy: PolicyArgs,
}

#[derive(Parser)]
pub struct HomeAssistantConnectionArgs {
    /// Home Assistant API access token.
    #[clap(long = "home-assistant-access-token", env = "HOME_ASSISTANT_ACCESS_TOKEN")]
    pub access_token: String,

    /// Home Assistant API base URL. For example: `http://localhost:8123/api`.
    #[clap(long = "home-assistant-api-base-url", env = "HOME_ASSISTANT_API_BASE_URL")]
    pub base_url: Url,
}

impl HomeAssistantConnectionArgs {
    pub fn try_new_client(&self) -> Result<home_assistant::Api> {
        home_assistant::Api::try_new(&self.access_token, &self.base_url)
    }
}

#[derive(Parser)]
pub struct SensorArgs {
    /// PV production forecast sensor.
    #[clap(long = "forecast-sensor", env = "FORECAST_SENSOR")]
    pub forecast: String,

    /// Spot price sensor carrying hourly price attributes.
    #[clap(long = "price-sensor", env = "PRICE_SENSOR")]
    pub price: String,

    /// Momentary house consumption sensor, in watts.
    #[clap(long = "load-sensor", env = "LOAD_SENSOR")]
    pub load: Option<String>,

    /// Daily house consumption sensor, in kilowatt-hours.
    #[clap(long = "daily-load-sensor", env = "DAILY_LOAD_SENSOR")]
    pub daily_load: Option<String>,

    /// Battery state-of-charge sensor, in percent.
    #[clap(long = "soc-sensor", env = "SOC_SENSOR")]
    pub soc: Option<String>,

    /// Predict the load profile from the stored history instead of the daily shape.
    #[clap(long = "enable-load-prediction", env = "ENABLE_LOAD_PREDICTION")]
    pub enable_load_prediction: bool,
}

#[derive(Parser)]
pub struct ScriptArgs {
    /// Script that switches grid charging on.
    #[clap(long = "charging-on-script", env = "CHARGING_ON_SCRIPT")]
    pub charging_on: String,

    /// Script that switches grid charging off.
    #[clap(long = "charging-off-script", env = "CHARGING_OFF_SCRIPT")]
    pub charging_off: String,
}

#[derive(Copy, Clone, Parser)]
pub struct BatteryArgs {
    /// Usable battery capacity.
    #[clap(long = "battery-capacity-kwh", default_value = "17.0", env = "BATTERY_CAPACITY_KWH")]
    pub capacity: KilowattHours,

    /// Maximal charging (and discharging) power.
    #[clap(long = "max-charge-power-kw", default_value = "3.7", env = "MAX_CHARGE_POWER_KW")]
    pub max_charge_power: Kilowatts,

    /// One-way charging efficiency.
    #[clap(long = "charge-efficiency", default_value = "0.95", env = "CHARGE_EFFICIENCY")]
    pub charge_efficiency: f64,
}

impl Default for BatteryArgs {
    fn default() -> Self {
        Self {
            capacity: KilowattHours::from(17.0),
            max_charge_power: Kilowatts::from(3.7),
            charge_efficiency: 0.95,
        }
    }
}

#[derive(Copy, Clone, Parser)]
pub struct PolicyArgs {
    /// Never discharge below this state of charge.
    #[clap(long = "min-soc-percent", default_value = "10", env = "MIN_SOC_PERCENT")]
    pub min_soc: Percent,

    /// Never charge above this state of charge.
    #[clap(long = "max-soc-percent", default_value = "95", env = "MAX_SOC_PERCENT")]
    pub max_soc: Percent,

    /// Grid charging stops once this state of charge is reached.
    #[clap(long = "target-soc-percent", default_value = "90", env = "TARGET_SOC_PERCENT")]
    pub target_soc: Percent,

    /// Below this price, grid charging is unconditionally allowed.
    #[clap(long = "always-charge-price", default_value = "1.5", env = "ALWAYS_CHARGE_PRICE")]
    pub always_charge_price: KilowattHourRate,

    /// At or above this price, grid charging is forbidden.
    #[clap(long = "never-charge-price", default_value = "4.0", env = "NEVER_CHARGE_PRICE")]
    pub never_charge_price: KilowattHourRate,

    /// Threshold band preventing rapid switching when the price oscillates.
    #[clap(
        long = "price-hysteresis-percent",
        default_value = "5",
        env = "PRICE_HYSTERESIS_PERCENT"
    )]
    pub price_hysteresis: Percent,

    /// First hour of the daily window with a raised SOC floor.
    #[clap(long = "critical-hours-start", default_value = "17", env = "CRITICAL_HOURS_START")]
    pub critical_hours_start: u32,

    /// First hour after the window (exclusive, may wrap past midnight).
    #[clap(long = "critical-hours-end", default_value = "21", env = "CRITICAL_HOURS_END")]
    pub critical_hours_end: u32,

    /// State of charge to secure before the critical hours.
    #[clap(
        long = "critical-hours-soc-percent",
        default_value = "80",
        env = "CRITICAL_HOURS_SOC_PERCENT"
    )]
    pub critical_hours_soc: Percent,
}

impl PolicyArgs {
    #[must_use]
    pub const fn critical_hours(&self) -> CriticalHours {
        CriticalHours { start: self.critical_hours_start, end: self.critical_hours_end }
    }

    /// Reject out-of-order configuration before it reaches the simulator.
    ///
    /// The simulator itself stays total and never validates; a nonsensical
    /// policy must not get past the boundary.
    pub fn validate(&self) -> Result {
        ensure!(
            self.min_soc.0 <= self.target_soc.0 && self.target_soc.0 <= self.max_soc.0,
            "SOC limits must be ordered: min ({}) ≤ target ({}) ≤ max ({})",
            self.min_soc,
            self.target_soc,
            self.max_soc,
        );
        ensure!(
            self.always_charge_price < self.never_charge_price,
            "the always-charge price ({}) must be below the never-charge price ({})",
            self.always_charge_price,
            self.never_charge_price,
        );
        Ok(())
    }
}

impl Default for PolicyArgs {
    fn default() -> Self {
        Self {
            min_soc: Percent(10.0),
            max_soc: Percent(95.0),
            target_soc: Percent(90.0),
            always_charge_price: KilowattHourRate::from(1.5),
            never_charge_price: KilowattHourRate::from(4.0),
            price_hysteresis: Percent(5.0),
            critical_hours_start: 17,
            critical_hours_end: 21,
            critical_hours_soc: Percent(80.0),
        }
    }
}

#[derive(Parser)]
pub struct PeekArgs {
    #[clap(flatten)]
    pub home_assistant: HomeAssistantConnectionArgs,

    #[command(subcommand)]
    pub command: PeekCommand,
}

#[derive(Subcommand)]
pub enum PeekCommand {
    /// Print the raw state and attributes of an entity.
    State { entity_id: String },

    /// Fetch a forecast sensor and print the normalized per-slot series.
    Forecast { entity_id: String },
}
