use crate::{
    cli::{PeekArgs, PeekCommand},
    core::slot,
    prelude::*,
    quantity::power::Kilowatts,
};

#[instrument(skip_all)]
pub async fn peek(args: &PeekArgs) -> Result {
    let api = args.home_assistant.try_new_client()?;

    match &args.command {
        PeekCommand::State { entity_id } => {
            let state = api.get_state(entity_id).await?;
            info!(entity_id = %state.entity_id, state = %state.state, "gotcha");
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::Value::Object(state.attributes))?
            );
        }

        PeekCommand::Forecast { entity_id } => {
            let state = api.get_state(entity_id).await?;
            let (slots, confidence) = crate::normalize::forecast::normalize(&state);
            info!(
                score = confidence.score,
                source = confidence.source,
                n_slots = confidence.n_slots,
                "gotcha"
            );
            for (index, power) in slots.iter().enumerate() {
                if *power != Kilowatts::ZERO {
                    println!("{} {power}", slot::start_of(index).format("%H:%M"));
                }
            }
        }
    }

    Ok(())
}
