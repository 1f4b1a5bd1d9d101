use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use mars_drone::cli;
use mars_drone::config::CONFIG;
use mars_drone::DroneController;

#[tokio::main]
async fn main() -> Result<()> {
    setup_logging(&CONFIG.general.log_level)?;
    info!("Drone {} starting...", CONFIG.general.drone_id);

    let shutdown = cli::spawn_signal_listener();
    let input = cli::spawn_stdin_reader()?;
    let drone = DroneController::new(CONFIG.clone());

    match cli::run_command_loop(&drone, input, tokio::io::stdout(), shutdown).await {
        Ok(exit) => info!("Command loop finished: {:?}", exit),
        Err(e) => error!("Command interface error: {:#}", e),
    }

    drone.shutdown().await;
    info!("Shutdown complete");
    Ok(())
}

fn setup_logging(level: &str) -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_names(true)
                .with_target(true)
                .with_line_number(true),
        )
        .with(EnvFilter::from_default_env().add_directive(level.parse()?))
        .try_init()?;
    Ok(())
}
