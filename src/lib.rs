pub mod delivery;
pub mod error;
pub mod models;
pub mod monitor;
pub mod sensor;
pub mod settings;
pub mod stats;
pub mod tracker;
mod utils;

use anyhow::{Context, Result};
use clap::Parser;
use std::{path::PathBuf, sync::Arc, time::Duration};

use delivery::HttpDelivery;
use monitor::MonitorController;
use sensor::{SignalSource, SimulatedWheel};
use settings::MonitorSettings;

pub use error::MonitorError;
pub use models::RunRecord;

#[derive(Debug, Parser)]
#[command(name = "ham-counter", version, about = "Counts wheel revolutions and reports each run")]
pub struct Cli {
    /// Settings file; defaults are used when it does not exist.
    #[arg(long, default_value = "ham-counter.json")]
    pub config: PathBuf,

    /// Collector URL, overriding the settings file and environment.
    #[arg(long)]
    pub endpoint: Option<String>,

    /// Use a simulated wheel instead of the GPIO sensor.
    #[arg(long)]
    pub simulate: bool,

    /// Revolution period of the simulated wheel.
    #[arg(long, default_value_t = 500)]
    pub simulate_period_ms: u64,
}

pub fn run() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    let cli = Cli::parse();

    let settings = resolve_settings(&cli)?;

    log::info!("ham-counter starting up, reporting to {}", settings.endpoint);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    runtime.block_on(serve(settings, &cli))
}

/// Settings file (plus env override), then `--endpoint` on top.
fn resolve_settings(cli: &Cli) -> Result<MonitorSettings> {
    let mut settings = MonitorSettings::load(&cli.config)?;
    if let Some(endpoint) = cli.endpoint.clone() {
        settings.endpoint = endpoint;
        settings.validate()?;
    }
    Ok(settings)
}

async fn serve(settings: MonitorSettings, cli: &Cli) -> Result<()> {
    let sensor = build_sensor(&settings, cli)?;
    let deliverer = Arc::new(HttpDelivery::new(
        settings.endpoint.clone(),
        settings.delivery_timeout(),
    )?);

    let mut controller = MonitorController::new();
    controller.start(&settings, sensor, deliverer)?;
    log::info!("Monitoring sensor... Press Ctrl+C to stop.");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    let snapshot = controller.shutdown().await?;
    log::info!(
        "Shut down: {} runs completed, {} interrupted, {} degenerate, {} delivered, {} failed, {} dropped, {} sensor errors",
        snapshot.runs_completed,
        snapshot.runs_interrupted,
        snapshot.degenerate_runs,
        snapshot.deliveries_ok,
        snapshot.deliveries_failed,
        snapshot.deliveries_dropped,
        snapshot.sensor_failures
    );
    Ok(())
}

fn build_sensor(settings: &MonitorSettings, cli: &Cli) -> Result<Box<dyn SignalSource>> {
    if cli.simulate {
        log::info!("Using simulated wheel ({}ms per revolution)", cli.simulate_period_ms);
        return Ok(Box::new(SimulatedWheel::new(Duration::from_millis(
            cli.simulate_period_ms.max(1),
        ))));
    }

    #[cfg(feature = "gpio")]
    {
        Ok(Box::new(sensor::GpioSensor::new(settings.gpio_pin)?))
    }

    #[cfg(not(feature = "gpio"))]
    {
        anyhow::bail!(
            "GPIO{} requested but this build has no `gpio` feature; rebuild with it or pass --simulate",
            settings.gpio_pin
        )
    }
}
