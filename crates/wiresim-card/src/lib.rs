//! ---
//! wiresim_section: "04-network-card"
//! wiresim_subsection: "module"
//! wiresim_type: "source"
//! wiresim_scope: "code"
//! wiresim_description: "Network card encode/transmit and sense/decode paths."
//! wiresim_version: "v0.0.0-prealpha"
//! wiresim_owner: "tbd"
//! ---
//! The network card attached to a shared wire pair.
//!
//! A [`NetworkCard`] drives Manchester-coded voltage waveforms onto its
//! [`wiresim_medium::WirePair`] when transmitting. When built with a
//! receive sink it runs a single-shot background listener that senses the
//! wire, recovers one frame, and delivers it exactly once.

pub mod assembler;
pub mod card;
mod listener;

pub use assembler::{AssemblerStatus, FrameAssembler};
pub use card::{CardError, ListenerHandle, NetworkCard};
