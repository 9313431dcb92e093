use chrono::Local;

use crate::{
    api::home_assistant::Api,
    cli::{ForageArgs, SensorArgs},
    core::{
        simulator::Simulator,
        slot::{self, PerSlot, SLOTS_PER_DAY},
    },
    executor,
    normalize,
    predictor::LoadPredictor,
    prelude::*,
    quantity::{energy::KilowattHours, power::Kilowatts, rate::KilowattHourRate},
    state::RunState,
    tables::build_schedule_table,
};

#[instrument(skip_all)]
pub async fn forage(args: &ForageArgs) -> Result {
    args.policy.validate()?;

    let api = args.home_assistant.try_new_client()?;
    let mut run_state = RunState::read_from(&args.state_path);

    let (pv_forecast, confidence) = match api.try_get_state(&args.sensors.forecast).await {
        Some(state) => normalize::forecast::normalize(&state),
        None => ([Kilowatts::ZERO; SLOTS_PER_DAY], normalize::forecast::Confidence::NONE),
    };
    info!(
        score = confidence.score,
        source = confidence.source,
        n_slots = confidence.n_slots,
        "normalized the PV forecast"
    );

    let prices: PerSlot<Option<KilowattHourRate>> =
        match api.try_get_state(&args.sensors.price).await {
            Some(state) => normalize::price::normalize(&state),
            None => [None; SLOTS_PER_DAY],
        };

    let load_forecast = fetch_load(&api, &args.sensors, &mut run_state).await;

    let initial_soc = fetch_initial_soc(&api, &args.sensors, args.battery.capacity).await;
    let now = Local::now();
    let current_slot = slot::of_time(now.time());

    let (schedule, was_charging) = Simulator::builder()
        .pv_forecast(&pv_forecast)
        .prices(&prices)
        .load_forecast(&load_forecast)
        .battery(args.battery)
        .policy(args.policy)
        .initial_soc(initial_soc)
        .current_slot(current_slot)
        .was_charging(run_state.last_charging_state)
        .build()
        .run();

    println!("{}", build_schedule_table(&schedule, &args.policy));
    let summary = schedule.summary();
    info!(
        charging_slots = summary.charging_slots,
        grid_energy = %summary.grid_energy,
        solar_energy = %summary.solar_energy,
        estimated_grid_cost = %summary.estimated_grid_cost,
        "optimized"
    );

    let (action, applied_state) =
        executor::plan_action(&schedule, current_slot, run_state.last_applied_state);
    if args.scout {
        info!(?action, "scouting, not touching the scripts");
    } else {
        executor::apply(&api, &args.scripts, action).await?;
        run_state.last_applied_state = applied_state;
    }

    run_state.last_charging_state = was_charging;
    run_state.write_to(&args.state_path);
    Ok(())
}

/// Build the load forecast: the daily consumption shape (optionally refined by
/// the predictor), falling back to a flat profile from the momentary reading.
async fn fetch_load(
    api: &Api,
    sensors: &SensorArgs,
    run_state: &mut RunState,
) -> PerSlot<Kilowatts> {
    let mut load = [Kilowatts::ZERO; SLOTS_PER_DAY];

    if let Some(entity_id) = &sensors.daily_load
        && let Some(state) = api.try_get_state(entity_id).await
        && let Some(total) = state.numeric_state()
    {
        let pattern = normalize::load::from_daily_total(KilowattHours::from(total));
        load = if sensors.enable_load_prediction {
            let mut predictor = LoadPredictor::new(std::mem::take(&mut run_state.load_history));
            let predicted = predictor.predict(&pattern);
            predictor.observe(&pattern);
            run_state.load_history = predictor.into_history();
            predicted
        } else {
            pattern
        };
    }

    if load.iter().all(|power| *power == Kilowatts::ZERO)
        && let Some(entity_id) = &sensors.load
        && let Some(state) = api.try_get_state(entity_id).await
        && let Some(watts) = state.numeric_state()
    {
        load = normalize::load::from_current_power(watts);
    }

    load
}

/// Read the live state of charge, defaulting to 50 % of the capacity.
async fn fetch_initial_soc(
    api: &Api,
    sensors: &SensorArgs,
    capacity: KilowattHours,
) -> KilowattHours {
    let mut fraction = 0.5;
    if let Some(entity_id) = &sensors.soc
        && let Some(state) = api.try_get_state(entity_id).await
        && let Some(percent) = state.numeric_state()
    {
        fraction = (percent / 100.0).clamp(0.0, 1.0);
    }
    capacity * fraction
}
