mod api;
mod cli;
mod core;
mod executor;
mod normalize;
mod predictor;
mod prelude;
mod quantity;
mod state;
mod tables;

use clap::{Parser, crate_version};

use crate::{
    cli::{Args, Command, forage, peek},
    prelude::*,
};

#[tokio::main]
async fn main() -> Result {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt().without_time().compact().init();
    info!(version = crate_version!(), "starting…");

    match Args::parse().command {
        Command::Forage(args) => forage(&args).await?,
        Command::Peek(args) => peek(&args).await?,
    }

    info!("done!");
    Ok(())
}
