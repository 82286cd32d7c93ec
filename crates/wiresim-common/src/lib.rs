//! ---
//! wiresim_section: "01-core-functionality"
//! wiresim_subsection: "module"
//! wiresim_type: "source"
//! wiresim_scope: "code"
//! wiresim_description: "Shared primitives and utilities for the simulator runtime."
//! wiresim_version: "v0.0.0-prealpha"
//! wiresim_owner: "tbd"
//! ---
//! Core shared primitives for the WireSim workspace.
//! This crate exposes configuration loading, the tracing bootstrap, and the
//! pulse-timing helpers consumed across the workspace.

pub mod config;
pub mod logging;
pub mod time;

pub use config::{AppConfig, LineConfig, LoggingConfig, NoiseConfig, ScenarioConfig};
pub use logging::{init_tracing, LogFormat};
