//! ---
//! wiresim_section: "02-physical-medium"
//! wiresim_subsection: "module"
//! wiresim_type: "source"
//! wiresim_scope: "code"
//! wiresim_description: "Shared wire-pair voltage model and noise sources."
//! wiresim_version: "v0.0.0-prealpha"
//! wiresim_owner: "tbd"
//! ---
use std::sync::Arc;

use rand::prelude::*;
use rand_distr::Normal;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use wiresim_common::NoiseConfig;

use crate::pair::WirePair;

/// Thermal-noise contributor for a wire pair.
///
/// Asserts a fresh Gaussian voltage sample under its own device identity on
/// every interval tick, so data cards on the same wire decode against a
/// realistically jittering baseline. The sample stream is seeded and
/// deterministic.
pub struct NoiseSource {
    wire: Arc<dyn WirePair>,
    config: NoiseConfig,
}

impl NoiseSource {
    pub fn new(wire: Arc<dyn WirePair>, config: NoiseConfig) -> Self {
        Self { wire, config }
    }

    /// Start the contributor task and return its lifecycle handle.
    pub fn spawn(self) -> NoiseHandle {
        let (shutdown_tx, mut shutdown_rx) = broadcast::channel(1);
        let NoiseSource { wire, config } = self;
        let device_name = config.device_name.clone();
        let task_device = device_name.clone();
        let task = tokio::spawn(async move {
            let mut rng = StdRng::seed_from_u64(config.seed);
            let noise = Normal::new(0.0, config.sigma_volts).expect("sigma must be non-negative");
            let mut interval = tokio::time::interval(config.interval);
            debug!(device = %task_device, sigma = config.sigma_volts, "noise source running");
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => break,
                    _ = interval.tick() => {
                        let sample = noise.sample(&mut rng);
                        wire.set_voltage(&task_device, sample);
                    }
                }
            }
            // Leave the wire clean for whoever keeps using it.
            wire.set_voltage(&task_device, 0.0);
            debug!(device = %task_device, "noise source stopped");
        });
        NoiseHandle {
            device_name,
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Handle owning the background noise task.
#[derive(Debug)]
pub struct NoiseHandle {
    device_name: String,
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl NoiseHandle {
    /// Identity the noise source contributes under.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Stop the contributor and wait for its contribution to be zeroed.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        if let Err(err) = self.task.await {
            error!(device = %self.device_name, error = %err, "noise task join error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pair::TwistedWirePair;
    use std::time::Duration;

    fn fast_noise() -> NoiseConfig {
        NoiseConfig {
            enabled: true,
            device_name: "thermal-noise".to_owned(),
            sigma_volts: 0.3,
            interval: Duration::from_millis(2),
            seed: 7,
        }
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn contributes_nonzero_samples_while_running() {
        let wire: Arc<dyn WirePair> = Arc::new(TwistedWirePair::new());
        let handle = NoiseSource::new(wire.clone(), fast_noise()).spawn();

        let mut saw_noise = false;
        for _ in 0..50 {
            if wire.voltage("observer") != 0.0 {
                saw_noise = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(saw_noise, "expected a nonzero noise contribution");
        handle.shutdown().await;
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn shutdown_resets_contribution_to_zero() {
        let wire: Arc<dyn WirePair> = Arc::new(TwistedWirePair::new());
        let handle = NoiseSource::new(wire.clone(), fast_noise()).spawn();
        tokio::time::sleep(Duration::from_millis(10)).await;
        handle.shutdown().await;
        assert_eq!(wire.voltage("observer"), 0.0);
    }
}
