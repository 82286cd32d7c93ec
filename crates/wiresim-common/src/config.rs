//! ---
//! wiresim_section: "01-core-functionality"
//! wiresim_subsection: "module"
//! wiresim_type: "source"
//! wiresim_scope: "code"
//! wiresim_description: "Shared primitives and utilities for the simulator runtime."
//! wiresim_version: "v0.0.0-prealpha"
//! wiresim_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds};
use tracing::debug;

use crate::logging::LogFormat;
use crate::time::scale;

fn default_high_volts() -> f64 {
    2.5
}

fn default_low_volts() -> f64 {
    -2.5
}

fn default_pulse_width() -> Duration {
    Duration::from_millis(450)
}

fn default_max_payload() -> usize {
    1500
}

fn default_escape_byte() -> u8 {
    0x5C
}

fn default_end_byte() -> u8 {
    0x7E
}

fn default_alert_fraction() -> f64 {
    0.8
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(10)
}

fn default_noise_device() -> String {
    "thermal-noise".to_owned()
}

fn default_noise_sigma() -> f64 {
    0.4
}

fn default_noise_interval() -> Duration {
    Duration::from_millis(20)
}

fn default_noise_seed() -> u64 {
    0xA11CEu64
}

fn default_transmitter() -> String {
    "card-a".to_owned()
}

fn default_listener() -> String {
    "card-b".to_owned()
}

fn default_payload() -> String {
    "48454c4c4f".to_owned()
}

fn default_logging_directory() -> PathBuf {
    PathBuf::from("target/logs")
}

/// Primary configuration object for the WireSim runtime.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub line: LineConfig,
    #[serde(default)]
    pub noise: NoiseConfig,
    #[serde(default)]
    pub scenario: ScenarioConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Metadata describing where an [`AppConfig`] was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedAppConfig {
    pub config: AppConfig,
    pub source: PathBuf,
}

impl AppConfig {
    pub const ENV_CONFIG_PATH: &str = "WIRESIM_CONFIG";

    /// Load configuration from disk, respecting the `WIRESIM_CONFIG` override.
    pub fn load<P: AsRef<Path>>(candidates: &[P]) -> Result<Self> {
        Ok(Self::load_with_source(candidates)?.config)
    }

    /// Load configuration from disk together with the effective source path.
    pub fn load_with_source<P: AsRef<Path>>(candidates: &[P]) -> Result<LoadedAppConfig> {
        if let Ok(env_path) = std::env::var(Self::ENV_CONFIG_PATH) {
            if !env_path.trim().is_empty() {
                let path = PathBuf::from(env_path);
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        for candidate in candidates {
            if candidate.as_ref().exists() {
                let path = candidate.as_ref().to_path_buf();
                let config = Self::from_path(path.clone())?;
                return Ok(LoadedAppConfig {
                    config,
                    source: path,
                });
            }
        }

        Err(anyhow!(
            "no configuration files found. inspected: {}",
            candidates
                .iter()
                .map(|p| p.as_ref().display().to_string())
                .collect::<Vec<_>>()
                .join(", ")
        ))
    }

    fn from_path(path: PathBuf) -> Result<Self> {
        debug!(config_path = %path.display(), "loading configuration");
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("unable to read config file {}", path.display()))?;
        let config = toml::from_str::<AppConfig>(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate structural invariants across all sections.
    pub fn validate(&self) -> Result<()> {
        self.line.validate()?;
        self.noise.validate()?;
        self.scenario.validate()?;
        if self.noise.enabled {
            if self.noise.device_name == self.scenario.transmitter
                || self.noise.device_name == self.scenario.listener
            {
                return Err(anyhow!(
                    "noise device '{}' collides with a scenario card identity",
                    self.noise.device_name
                ));
            }
        }
        Ok(())
    }
}

impl std::str::FromStr for AppConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: AppConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

/// Signalling parameters shared by the transmit and sense paths.
///
/// Defaults mirror the reference wire: symmetric ±2.5 V levels, a 450 ms
/// bit cell, and the `0x5C`/`0x7E` trailer pair.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineConfig {
    /// Voltage driven for a logical HIGH half-period.
    #[serde(default = "default_high_volts")]
    pub high_volts: f64,
    /// Voltage driven for a logical LOW half-period.
    #[serde(default = "default_low_volts")]
    pub low_volts: f64,
    /// Duration of one full bit cell (two half-period holds).
    #[serde(default = "default_pulse_width")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub pulse_width: Duration,
    /// Decoder byte cap; frames are truncated here if no terminator arrives.
    #[serde(default = "default_max_payload")]
    pub max_payload: usize,
    /// Escape byte prefixing the end-of-frame sentinel.
    #[serde(default = "default_escape_byte")]
    pub escape_byte: u8,
    /// End-of-frame sentinel byte.
    #[serde(default = "default_end_byte")]
    pub end_byte: u8,
    /// Fraction of `high_volts` a reading must strictly exceed to arm the
    /// listener.
    #[serde(default = "default_alert_fraction")]
    pub alert_fraction: f64,
    /// Cadence of the idle and decode voltage polls.
    #[serde(default = "default_poll_interval")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub poll_interval: Duration,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            high_volts: default_high_volts(),
            low_volts: default_low_volts(),
            pulse_width: default_pulse_width(),
            max_payload: default_max_payload(),
            escape_byte: default_escape_byte(),
            end_byte: default_end_byte(),
            alert_fraction: default_alert_fraction(),
            poll_interval: default_poll_interval(),
        }
    }
}

impl LineConfig {
    /// Hold time for one voltage level; half of the bit cell.
    pub fn half_period(&self) -> Duration {
        scale(self.pulse_width, 1, 2)
    }

    /// Wait applied after the alert pulse before bit recovery starts.
    pub fn armed_delay(&self) -> Duration {
        scale(self.pulse_width, 3, 4)
    }

    /// Offset from a detected transition to the clock-recovery sample.
    pub fn recovery_delay(&self) -> Duration {
        scale(self.pulse_width, 7, 10)
    }

    /// Absolute voltage a reading must strictly exceed to count as an alert
    /// pulse.
    pub fn alert_threshold(&self) -> f64 {
        self.alert_fraction * self.high_volts
    }

    pub fn validate(&self) -> Result<()> {
        if self.high_volts <= 0.0 {
            return Err(anyhow!("line.high_volts must be positive"));
        }
        if self.low_volts >= 0.0 {
            return Err(anyhow!("line.low_volts must be negative"));
        }
        if self.pulse_width.is_zero() {
            return Err(anyhow!("line.pulse_width must be non-zero"));
        }
        if self.poll_interval >= self.half_period() {
            return Err(anyhow!(
                "line.poll_interval must be shorter than the half-period"
            ));
        }
        if self.max_payload == 0 {
            return Err(anyhow!("line.max_payload must be at least one byte"));
        }
        if self.escape_byte == self.end_byte {
            return Err(anyhow!(
                "line.escape_byte and line.end_byte must be distinct"
            ));
        }
        if !(self.alert_fraction > 0.0 && self.alert_fraction < 1.0) {
            return Err(anyhow!("line.alert_fraction must lie in (0, 1)"));
        }
        Ok(())
    }
}

/// Thermal-noise contributor settings.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Identity the noise source asserts its contribution under.
    #[serde(default = "default_noise_device")]
    pub device_name: String,
    /// Standard deviation of the Gaussian voltage samples.
    #[serde(default = "default_noise_sigma")]
    pub sigma_volts: f64,
    /// Interval between voltage updates.
    #[serde(default = "default_noise_interval")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub interval: Duration,
    /// Seed for the deterministic sample stream.
    #[serde(default = "default_noise_seed")]
    pub seed: u64,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            device_name: default_noise_device(),
            sigma_volts: default_noise_sigma(),
            interval: default_noise_interval(),
            seed: default_noise_seed(),
        }
    }
}

impl NoiseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.device_name.trim().is_empty() {
            return Err(anyhow!("noise.device_name must not be empty"));
        }
        if self.sigma_volts < 0.0 {
            return Err(anyhow!("noise.sigma_volts must not be negative"));
        }
        if self.interval.is_zero() {
            return Err(anyhow!("noise.interval must be non-zero"));
        }
        Ok(())
    }
}

/// Reference scenario wiring for the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Identity of the transmitting card.
    #[serde(default = "default_transmitter")]
    pub transmitter: String,
    /// Identity of the listening card.
    #[serde(default = "default_listener")]
    pub listener: String,
    /// Default payload, as lowercase hex digits.
    #[serde(default = "default_payload")]
    pub payload: String,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            transmitter: default_transmitter(),
            listener: default_listener(),
            payload: default_payload(),
        }
    }
}

impl ScenarioConfig {
    /// Decode the configured payload hex string.
    pub fn payload_bytes(&self) -> Result<Vec<u8>> {
        hex::decode(self.payload.trim())
            .with_context(|| format!("scenario.payload is not valid hex: '{}'", self.payload))
    }

    pub fn validate(&self) -> Result<()> {
        if self.transmitter.trim().is_empty() || self.listener.trim().is_empty() {
            return Err(anyhow!("scenario card identities must not be empty"));
        }
        if self.transmitter == self.listener {
            return Err(anyhow!(
                "scenario.transmitter and scenario.listener must be distinct"
            ));
        }
        self.payload_bytes().map(|_| ())
    }
}

/// Logging section consumed by [`crate::logging::init_tracing`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Directory receiving the rolling daily log file.
    #[serde(default = "default_logging_directory")]
    pub directory: PathBuf,
    /// Optional file prefix; the service name is used when unset.
    #[serde(default)]
    pub file_prefix: Option<String>,
    /// Stdout formatting.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: default_logging_directory(),
            file_prefix: None,
            format: LogFormat::default(),
        }
    }
}
