use crate::{cli::PolicyArgs, quantity::rate::KilowattHourRate};

/// Price thresholds adjusted for hysteresis.
///
/// Computed once per optimization run, not per slot: after a run that ended
/// charging both thresholds move up (stopping gets harder), after an idle run
/// both move down (starting gets harder).
#[derive(Copy, Clone, Debug)]
pub struct PriceBands {
    pub always_charge: KilowattHourRate,
    pub never_charge: KilowattHourRate,
}

impl PriceBands {
    #[must_use]
    pub fn of(policy: &PolicyArgs, was_charging: bool) -> Self {
        let factor = if was_charging {
            1.0 + policy.price_hysteresis.to_proportion()
        } else {
            1.0 - policy.price_hysteresis.to_proportion()
        };
        Self {
            always_charge: policy.always_charge_price * factor,
            never_charge: policy.never_charge_price * factor,
        }
    }
}
