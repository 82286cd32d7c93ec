//! ---
//! wiresim_section: "02-physical-medium"
//! wiresim_subsection: "module"
//! wiresim_type: "source"
//! wiresim_scope: "code"
//! wiresim_description: "Shared wire-pair voltage model and noise sources."
//! wiresim_version: "v0.0.0-prealpha"
//! wiresim_owner: "tbd"
//! ---
use indexmap::IndexMap;
use parking_lot::Mutex;
use tracing::trace;

/// Seam between devices and the physical medium.
///
/// The reading device passes its own identity for interface symmetry only;
/// the medium cannot filter a listener's own transmission out of the sum.
pub trait WirePair: Send + Sync {
    /// Record `volts` as the current contribution of `device`, replacing any
    /// previous value. Visible to all readers immediately.
    fn set_voltage(&self, device: &str, volts: f64);

    /// Sum of all contributions currently asserted on the pair.
    fn voltage(&self, device: &str) -> f64;
}

/// Concrete twisted wire pair summing every attached device's contribution.
///
/// One lock guards the whole contribution set, so a reader never observes a
/// sum with only part of a concurrent write applied. There is no history and
/// no cross-call snapshot: two separate reads may straddle another device's
/// update, exactly as on a physical bus.
#[derive(Debug, Default)]
pub struct TwistedWirePair {
    contributions: Mutex<IndexMap<String, f64>>,
}

impl TwistedWirePair {
    /// Create an idle wire with no contributions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of device identities that have asserted a contribution.
    pub fn attached_devices(&self) -> usize {
        self.contributions.lock().len()
    }
}

impl WirePair for TwistedWirePair {
    fn set_voltage(&self, device: &str, volts: f64) {
        let mut contributions = self.contributions.lock();
        contributions.insert(device.to_owned(), volts);
        trace!(device, volts, "contribution updated");
    }

    fn voltage(&self, _device: &str) -> f64 {
        let contributions = self.contributions.lock();
        contributions.values().sum()
    }
}
