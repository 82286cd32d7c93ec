//! ---
//! wiresim_section: "05-daemon"
//! wiresim_subsection: "binary"
//! wiresim_type: "source"
//! wiresim_scope: "code"
//! wiresim_description: "Binary entrypoint for the WireSim daemon."
//! wiresim_version: "v0.0.0-prealpha"
//! wiresim_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};

use wiresim_card::NetworkCard;
use wiresim_common::config::AppConfig;
use wiresim_common::logging::init_tracing;
use wiresim_frame::{ChannelSink, DataFrame};
use wiresim_medium::{NoiseSource, TwistedWirePair, WirePair};

#[derive(Debug, Parser)]
#[command(author, version, about = "WireSim daemon", long_about = None)]
struct Cli {
    #[arg(long, value_name = "FILE", help = "Path to configuration file")]
    config: Option<PathBuf>,

    #[arg(
        long,
        value_name = "HEX",
        help = "Override the scenario payload (lowercase hex digits)"
    )]
    payload: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Run the reference two-card scenario")]
    Run,
    #[command(about = "Load, validate, and print the effective configuration")]
    CheckConfig,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut candidates = Vec::new();
    if let Some(path) = &cli.config {
        candidates.push(path.clone());
    }
    candidates.push(PathBuf::from("configs/example.dev.toml"));
    candidates.push(PathBuf::from("configs/example.prod.toml"));

    let loaded = AppConfig::load_with_source(&candidates)?;
    let config = loaded.config;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            init_tracing("wiresimd", &config.logging)?;
            info!(config_path = %loaded.source.display(), "configuration loaded");
            run_scenario(config, cli.payload).await
        }
        Commands::CheckConfig => {
            let rendered =
                toml::to_string_pretty(&config).with_context(|| "failed to render configuration")?;
            println!("# effective configuration from {}", loaded.source.display());
            print!("{rendered}");
            Ok(())
        }
    }
}

/// Wire up the reference scenario: one shared pair, a listening card, an
/// optional thermal-noise contributor, and a transmitting card sending a
/// single frame.
async fn run_scenario(config: AppConfig, payload_override: Option<String>) -> Result<()> {
    let payload = match payload_override {
        Some(digits) => hex::decode(digits.trim())
            .with_context(|| "payload override is not valid hex")?,
        None => config.scenario.payload_bytes()?,
    };
    let frame = DataFrame::new(payload);

    let wire: Arc<dyn WirePair> = Arc::new(TwistedWirePair::new());

    let (sink, mut deliveries) = ChannelSink::channel();
    let mut listener_card = NetworkCard::new(
        config.scenario.listener.clone(),
        wire.clone(),
        config.line.clone(),
    )
    .with_sink(Arc::new(sink));
    listener_card.start()?;

    let noise = if config.noise.enabled {
        Some(NoiseSource::new(wire.clone(), config.noise.clone()).spawn())
    } else {
        None
    };

    let transmitter = NetworkCard::new(
        config.scenario.transmitter.clone(),
        wire.clone(),
        config.line.clone(),
    );
    info!(
        transmitter = %transmitter.device_name(),
        listener = %config.scenario.listener,
        payload = %frame,
        noise = config.noise.enabled,
        "scenario starting"
    );

    let send_frame = frame.clone();
    let send = tokio::spawn(async move {
        transmitter.transmit(&send_frame).await;
    });

    let deadline = scenario_deadline(&config, frame.len());
    let mut aborted = false;
    tokio::select! {
        received = deliveries.recv() => {
            match received {
                Some(received) => {
                    info!(payload = %received, bytes = received.len(), "scenario frame delivered");
                    println!("received frame: {received}");
                }
                None => warn!("delivery channel closed without a frame"),
            }
        }
        _ = tokio::time::sleep(deadline) => {
            warn!(deadline_ms = deadline.as_millis() as u64, "no frame delivered before the scenario deadline");
        }
        _ = signal::ctrl_c() => {
            warn!("ctrl-c received; aborting scenario");
            aborted = true;
        }
    }

    if aborted {
        send.abort();
        warn!("transmit aborted");
    } else if let Err(err) = send.await {
        warn!(error = %err, "transmit task join error");
    }

    if let Some(handle) = noise {
        handle.shutdown().await;
    }
    if let Some(listener) = listener_card.take_listener() {
        listener.shutdown().await;
    }

    info!("scenario complete");
    Ok(())
}

/// Upper bound on how long the scenario waits for the listener: the alert
/// pulse plus one bit cell per payload and trailer byte bit, plus decode
/// slack.
fn scenario_deadline(config: &AppConfig, payload_len: usize) -> Duration {
    let cells = (payload_len + 2) * 8 + 2;
    config.line.pulse_width * cells as u32 + Duration::from_secs(2)
}
