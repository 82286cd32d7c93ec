//! ---
//! wiresim_section: "03-frame-data-model"
//! wiresim_subsection: "module"
//! wiresim_type: "source"
//! wiresim_scope: "code"
//! wiresim_description: "Frame payload carrier and receive sink contracts."
//! wiresim_version: "v0.0.0-prealpha"
//! wiresim_owner: "tbd"
//! ---
#![warn(missing_docs)]

//! Inert data types passed between network cards and their collaborators.
//!
//! A [`DataFrame`] is the immutable payload carrier handed into the encoder
//! and produced by the decoder; a [`FrameSink`] is the single-method
//! capability a listening card invokes exactly once per recovered frame.

pub mod frame;
pub mod sink;

pub use frame::DataFrame;
pub use sink::{ChannelSink, CountingSink, FrameSink, LogSink};
