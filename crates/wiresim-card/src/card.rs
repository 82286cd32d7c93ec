//! ---
//! wiresim_section: "04-network-card"
//! wiresim_subsection: "module"
//! wiresim_type: "source"
//! wiresim_scope: "code"
//! wiresim_description: "Network card encode/transmit and sense/decode paths."
//! wiresim_version: "v0.0.0-prealpha"
//! wiresim_owner: "tbd"
//! ---
use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use wiresim_common::time::duration_to_micros;
use wiresim_common::LineConfig;
use wiresim_frame::{DataFrame, FrameSink};
use wiresim_medium::WirePair;

use crate::listener::run_listener;

/// Errors surfaced by card lifecycle operations.
///
/// The signal paths themselves are infallible: cancellation is a task
/// abort, and the line code has no notion of truncation or collision
/// failures to report.
#[derive(Debug, thiserror::Error)]
pub enum CardError {
    /// The card was built without a receive sink, so it cannot listen.
    #[error("card '{0}' has no receive sink configured")]
    NoSink(String),
    /// The single-shot listener was already started.
    #[error("card '{0}' is already listening")]
    AlreadyListening(String),
}

/// A network card attached to one shared wire pair under a unique identity.
///
/// Transmission is blocking from the caller's point of view: `transmit`
/// returns only after the full waveform, trailer included, has been driven
/// and the contribution reset to idle. Run it on its own task to transmit
/// concurrently with other cards; contributions simply sum on the wire, and
/// collisions are neither detected nor arbitrated.
pub struct NetworkCard {
    device_name: String,
    wire: Arc<dyn WirePair>,
    line: LineConfig,
    sink: Option<Arc<dyn FrameSink>>,
    listener: Option<ListenerHandle>,
}

impl NetworkCard {
    /// Build a transmit-only card.
    pub fn new(
        device_name: impl Into<String>,
        wire: Arc<dyn WirePair>,
        line: LineConfig,
    ) -> Self {
        Self {
            device_name: device_name.into(),
            wire,
            line,
            sink: None,
            listener: None,
        }
    }

    /// Attach the receive sink invoked for the card's single decoded frame.
    pub fn with_sink(mut self, sink: Arc<dyn FrameSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Identity used as the key into the medium's contribution set.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Spawn the autonomous listener task.
    ///
    /// The listener monitors the wire, decodes one frame, delivers it to the
    /// sink exactly once, and ends permanently; it never re-arms. The card
    /// owns the handle, so dropping the card (and with it the shutdown
    /// channel) also aborts an unfinished listener.
    pub fn start(&mut self) -> Result<(), CardError> {
        if self.listener.is_some() {
            return Err(CardError::AlreadyListening(self.device_name.clone()));
        }
        let sink = self
            .sink
            .clone()
            .ok_or_else(|| CardError::NoSink(self.device_name.clone()))?;
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        let task = tokio::spawn(run_listener(
            self.device_name.clone(),
            self.wire.clone(),
            self.line.clone(),
            sink,
            shutdown_rx,
        ));
        info!(device = %self.device_name, "listener started");
        self.listener = Some(ListenerHandle {
            device_name: self.device_name.clone(),
            shutdown: shutdown_tx,
            task,
        });
        Ok(())
    }

    /// Handle to the running listener, if any.
    pub fn listener(&self) -> Option<&ListenerHandle> {
        self.listener.as_ref()
    }

    /// Take ownership of the listener handle, e.g. to join it on shutdown.
    pub fn take_listener(&mut self) -> Option<ListenerHandle> {
        self.listener.take()
    }

    /// Encode the frame with Manchester coding and drive it onto the wire.
    ///
    /// Waveform: one half-period of idle, one half-period of HIGH (the alert
    /// pulse, distinguishable from thermal jitter by amplitude), then each
    /// payload byte and the two trailer bytes MSB-first with one clock
    /// transition per bit cell, and finally the contribution is returned to
    /// zero.
    pub async fn transmit(&self, frame: &DataFrame) {
        debug!(
            device = %self.device_name,
            bytes = frame.len(),
            half_period_us = duration_to_micros(self.line.half_period()),
            "transmit start"
        );
        let half = self.line.half_period();

        self.wire.set_voltage(&self.device_name, 0.0);
        sleep(half).await;
        self.wire.set_voltage(&self.device_name, self.line.high_volts);
        sleep(half).await;

        // The clock lives for exactly one transmit call; every byte toggles
        // it an even number of times, so each cell starts from false.
        let mut clock = false;
        let trailer = [self.line.escape_byte, self.line.end_byte];
        for byte in frame.payload().iter().copied().chain(trailer) {
            self.send_byte(byte, &mut clock).await;
        }

        self.wire.set_voltage(&self.device_name, 0.0);
        info!(device = %self.device_name, payload = %frame, "transmit complete");
    }

    async fn send_byte(&self, byte: u8, clock: &mut bool) {
        for bit_index in (0..8).rev() {
            let bit = (byte >> bit_index) & 1 == 1;
            for _ in 0..2 {
                *clock = !*clock;
                self.drive(bit ^ *clock).await;
            }
        }
    }

    async fn drive(&self, high: bool) {
        let volts = if high {
            self.line.high_volts
        } else {
            self.line.low_volts
        };
        self.wire.set_voltage(&self.device_name, volts);
        sleep(self.line.half_period()).await;
    }
}

/// Handle owning a card's background listener task.
#[derive(Debug)]
pub struct ListenerHandle {
    device_name: String,
    shutdown: broadcast::Sender<()>,
    task: JoinHandle<()>,
}

impl ListenerHandle {
    /// Whether the listener has already delivered its frame (or aborted).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Request an abort; the listener logs the abort and delivers nothing.
    pub fn abort(&self) {
        let _ = self.shutdown.send(());
    }

    /// Wait for the listener task to end.
    pub async fn join(self) {
        if let Err(err) = self.task.await {
            error!(device = %self.device_name, error = %err, "listener task join error");
        }
    }

    /// Abort and wait, used on daemon shutdown.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(());
        self.join().await;
    }
}
