//! # talkcal-sim
//!
//! Headless driver for the meeting-sync engine.
//!
//! Replays a JSON scenario (a scripted calendar page plus user actions)
//! through the mutation watcher and prints the end state as JSON:
//! - **Scenario** from `TALKCAL_SCENARIO`, or a built-in add-meeting run
//! - **Room provisioning** POSTed to `TALKCAL_PROVISION_ENDPOINT` when set,
//!   otherwise only logged
//! - **Engine settings** from the `TALKCAL_*` variables read by `SyncConfig`

mod config;
mod error;
mod http;
mod scenario;

use tokio::runtime::Handle;
use tracing::info;
use tracing_subscriber::EnvFilter;

use talkcal_shared::roomname::WordlistGenerator;

use crate::config::SimConfig;
use crate::http::{HttpProvisioner, SimProvisioner};
use crate::scenario::{Scenario, ScenarioRunner, BUILTIN_SCENARIO};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var), on stderr so the
    //    report stays clean on stdout
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,talkcal_sync=debug")),
        )
        .init();

    info!("Starting talkcal-sim v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration and scenario
    // -----------------------------------------------------------------------
    let config = SimConfig::from_env();
    info!(?config, "Loaded configuration");

    let scenario = match &config.scenario {
        Some(path) => {
            info!(path = %path.display(), "Loading scenario");
            Scenario::load(path).await?
        }
        None => {
            info!("No TALKCAL_SCENARIO set, running the built-in scenario");
            Scenario::parse(BUILTIN_SCENARIO)?
        }
    };

    // -----------------------------------------------------------------------
    // 3. Wire the engine
    // -----------------------------------------------------------------------
    let provisioner = match &config.provision_endpoint {
        Some(endpoint) => {
            info!(%endpoint, "Provisioning rooms over HTTP");
            SimProvisioner::with_http(HttpProvisioner::new(endpoint.clone(), Handle::current())?)
        }
        None => SimProvisioner::log_only(),
    };

    let mut runner = ScenarioRunner::new(
        &scenario,
        config.sync.clone(),
        WordlistGenerator::new(),
        provisioner,
    );

    // -----------------------------------------------------------------------
    // 4. Replay, then wait for outstanding room requests
    // -----------------------------------------------------------------------
    runner.run(&scenario.steps)?;
    runner.provisioner().drain().await;

    let report = runner.report();
    println!("{}", serde_json::to_string_pretty(&report)?);

    info!(
        provisioned = report.provisioned.len(),
        opened = report.opened_windows.len(),
        "Done"
    );
    Ok(())
}
