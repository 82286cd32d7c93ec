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
use tokio::time::sleep;
use tracing::{debug, info};

use wiresim_common::LineConfig;
use wiresim_frame::{DataFrame, FrameSink};
use wiresim_medium::WirePair;

use crate::assembler::{AssemblerStatus, FrameAssembler};

/// Body of the card's single-shot listener task.
///
/// Senses the wire until one frame is recovered, delivers it to the sink
/// exactly once, and returns; a shutdown signal aborts the whole process
/// with no delivery.
pub(crate) async fn run_listener(
    device_name: String,
    wire: Arc<dyn WirePair>,
    line: LineConfig,
    sink: Arc<dyn FrameSink>,
    mut shutdown: broadcast::Receiver<()>,
) {
    tokio::select! {
        _ = shutdown.recv() => {
            info!(device = %device_name, "listener aborted before delivery");
        }
        frame = recover_frame(&device_name, wire.as_ref(), &line) => {
            info!(device = %device_name, payload = %frame, bytes = frame.len(), "frame recovered");
            sink.receive(frame);
        }
    }
}

async fn recover_frame(device: &str, wire: &dyn WirePair, line: &LineConfig) -> DataFrame {
    wait_for_alert(device, wire, line).await;
    // Skip the rest of the alert pulse so bit recovery starts inside the
    // first data cell.
    sleep(line.armed_delay()).await;
    decode_bits(device, wire, line).await
}

/// Idle state: poll until a reading strictly exceeds the alert threshold.
///
/// The threshold sits at a fraction of the nominal HIGH level so thermal
/// jitter stays below it while a genuine alert pulse clears it.
pub(crate) async fn wait_for_alert(device: &str, wire: &dyn WirePair, line: &LineConfig) {
    let threshold = line.alert_threshold();
    loop {
        let volts = wire.voltage(device);
        if volts > threshold {
            debug!(device, volts, "alert pulse detected");
            return;
        }
        sleep(line.poll_interval).await;
    }
}

/// Decoding state: recover bits from zero crossings until the assembler
/// reports a terminator or the payload cap.
///
/// The sign remembered from the start of the current cell is the anchor; a
/// crossing against it yields a bit (negative-to-non-negative is `1`,
/// positive-to-non-positive is `0`; an exact zero matches either side and
/// never triggers by itself). After each recovered bit a clock-recovery
/// sample taken `recovery_delay` later tells runs of identical bits apart
/// from fresh cell boundaries: a matching sign means the upcoming
/// half-period still belongs to the current cell, so the anchor is kept and
/// the boundary is not consumed as a transition.
async fn decode_bits(device: &str, wire: &dyn WirePair, line: &LineConfig) -> DataFrame {
    let mut assembler = FrameAssembler::new(line);
    let mut anchor = wire.voltage(device);

    loop {
        let sample = wire.voltage(device);
        let bit = if anchor < 0.0 && sample >= 0.0 {
            Some(true)
        } else if anchor > 0.0 && sample <= 0.0 {
            Some(false)
        } else {
            None
        };

        if let Some(bit) = bit {
            match assembler.push_bit(bit) {
                AssemblerStatus::Reading => {}
                AssemblerStatus::Terminated => {
                    debug!(device, bytes = assembler.byte_count(), "terminator consumed");
                    break;
                }
                AssemblerStatus::Full => {
                    debug!(device, bytes = assembler.byte_count(), "payload cap reached; truncating");
                    break;
                }
            }

            sleep(line.recovery_delay()).await;
            let recheck = wire.voltage(device);
            let same_run = (anchor > 0.0 && recheck > 0.0) || (anchor < 0.0 && recheck < 0.0);
            if same_run {
                // Still inside the current cell; keep the pre-transition
                // anchor so the cell boundary is not read as data.
                continue;
            }
        }

        anchor = sample;
        sleep(line.poll_interval).await;
    }

    assembler.finish()
}
