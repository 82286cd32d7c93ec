//! ---
//! wiresim_section: "03-frame-data-model"
//! wiresim_subsection: "module"
//! wiresim_type: "source"
//! wiresim_scope: "code"
//! wiresim_description: "Frame payload carrier and receive sink contracts."
//! wiresim_version: "v0.0.0-prealpha"
//! wiresim_owner: "tbd"
//! ---
use std::sync::Mutex;

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::frame::DataFrame;

/// Receive notification capability.
///
/// A listening card invokes this synchronously, from its own monitoring
/// task, exactly once per successfully decoded frame.
pub trait FrameSink: Send + Sync {
    /// Accept one decoded frame.
    fn receive(&self, frame: DataFrame);
}

/// Sink forwarding frames over an unbounded channel.
///
/// The send side never blocks, so it is safe to call from the listener's
/// decode path; the receive side is whatever part of the host wants to await
/// the delivery.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<DataFrame>,
}

impl ChannelSink {
    /// Build a sink together with the receiver that observes deliveries.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DataFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl FrameSink for ChannelSink {
    fn receive(&self, frame: DataFrame) {
        if self.tx.send(frame).is_err() {
            warn!("frame delivery dropped: receiver side is gone");
        }
    }
}

/// Sink that logs deliveries and discards the frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl FrameSink for LogSink {
    fn receive(&self, frame: DataFrame) {
        info!(payload = %frame, bytes = frame.len(), "frame received");
    }
}

/// Test-support sink recording every delivery.
#[derive(Debug, Default)]
pub struct CountingSink {
    frames: Mutex<Vec<DataFrame>>,
}

impl CountingSink {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of deliveries observed so far.
    pub fn deliveries(&self) -> usize {
        self.frames.lock().expect("sink poisoned").len()
    }

    /// Snapshot of the delivered frames, in order.
    pub fn frames(&self) -> Vec<DataFrame> {
        self.frames.lock().expect("sink poisoned").clone()
    }
}

impl FrameSink for CountingSink {
    fn receive(&self, frame: DataFrame) {
        self.frames.lock().expect("sink poisoned").push(frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_sink_forwards_frames() {
        let (sink, mut rx) = ChannelSink::channel();
        sink.receive(DataFrame::new(vec![0x01]));
        let frame = rx.try_recv().expect("frame queued");
        assert_eq!(frame.payload(), &[0x01]);
    }

    #[test]
    fn channel_sink_survives_dropped_receiver() {
        let (sink, rx) = ChannelSink::channel();
        drop(rx);
        sink.receive(DataFrame::empty());
    }

    #[test]
    fn counting_sink_records_order() {
        let sink = CountingSink::new();
        sink.receive(DataFrame::new(vec![0x01]));
        sink.receive(DataFrame::new(vec![0x02]));
        assert_eq!(sink.deliveries(), 2);
        assert_eq!(sink.frames()[1].payload(), &[0x02]);
    }
}
