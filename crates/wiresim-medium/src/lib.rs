//! ---
//! wiresim_section: "02-physical-medium"
//! wiresim_subsection: "module"
//! wiresim_type: "source"
//! wiresim_scope: "code"
//! wiresim_description: "Shared wire-pair voltage model and noise sources."
//! wiresim_version: "v0.0.0-prealpha"
//! wiresim_owner: "tbd"
//! ---
//! The shared physical medium of the simulator.
//!
//! A [`TwistedWirePair`] aggregates the voltage contributions of every
//! attached device into one observable value; [`NoiseSource`] is the
//! background contributor used by the reference scenario to model thermal
//! noise on the same wire.

pub mod noise;
pub mod pair;

pub use noise::{NoiseHandle, NoiseSource};
pub use pair::{TwistedWirePair, WirePair};
