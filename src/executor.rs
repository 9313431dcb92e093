use crate::{api::home_assistant::Api, cli::ScriptArgs, core::schedule::Schedule, prelude::*};

/// Actuation decided for the current slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Action {
    None,
    TurnOn,
    TurnOff,
}

/// Decide whether the charging scripts must be driven.
///
/// Edge-triggered: an action fires only when the wanted state differs from
/// the last applied one, so periodic re-runs with an unchanged plan do not
/// keep calling the scripts.
#[must_use]
pub fn plan_action(
    schedule: &Schedule,
    current_slot: usize,
    last_applied: Option<bool>,
) -> (Action, Option<bool>) {
    let wanted = schedule.should_charge_at(current_slot);
    if last_applied == Some(wanted) {
        (Action::None, last_applied)
    } else if wanted {
        (Action::TurnOn, Some(true))
    } else {
        (Action::TurnOff, Some(false))
    }
}

/// Drive the configured Home Assistant scripts.
pub async fn apply(api: &Api, scripts: &ScriptArgs, action: Action) -> Result {
    match action {
        Action::None => {
            debug!("charging state unchanged, not touching the scripts");
        }
        Action::TurnOn => {
            info!(entity_id = %scripts.charging_on, "turning charging on");
            api.turn_on_script(&scripts.charging_on).await?;
        }
        Action::TurnOff => {
            info!(entity_id = %scripts.charging_off, "turning charging off");
            api.turn_on_script(&scripts.charging_off).await?;
        }
    }
    Ok(())
}
