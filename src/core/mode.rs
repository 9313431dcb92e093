use serde::Serialize;

/// Battery operation decided for a single slot.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// No battery action.
    #[default]
    Idle,

    /// Store the PV surplus.
    SolarCharge,

    /// Cover the household deficit from the battery.
    BatteryDischarge,

    /// Grid charging below the always-charge price.
    GridChargeCheap,

    /// Grid charging in one of the selected cheapest slots.
    GridChargeOptimal,

    /// Grid charging in a selected slot that falls into the critical hours.
    GridChargeCritical,
}

impl Mode {
    /// Whether the slot draws power from the grid.
    #[must_use]
    pub const fn is_grid_charge(self) -> bool {
        matches!(self, Self::GridChargeCheap | Self::GridChargeOptimal | Self::GridChargeCritical)
    }
}
