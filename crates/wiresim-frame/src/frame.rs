//! ---
//! wiresim_section: "03-frame-data-model"
//! wiresim_subsection: "module"
//! wiresim_type: "source"
//! wiresim_scope: "code"
//! wiresim_description: "Frame payload carrier and receive sink contracts."
//! wiresim_version: "v0.0.0-prealpha"
//! wiresim_owner: "tbd"
//! ---
use std::fmt;

/// One message's payload: an ordered, finite, possibly empty byte sequence.
///
/// Created by a sender before transmission and reconstructed by the decoder
/// from recovered bytes. Carries no addressing, no checksum, and no
/// timestamps; framing lives entirely in the line code.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DataFrame {
    payload: Vec<u8>,
}

impl DataFrame {
    /// Wrap a raw byte sequence.
    pub fn new(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            payload: payload.into(),
        }
    }

    /// Frame with no payload.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Read-only view of the payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Payload length in bytes.
    pub fn len(&self) -> usize {
        self.payload.len()
    }

    /// Whether the frame carries no payload.
    pub fn is_empty(&self) -> bool {
        self.payload.is_empty()
    }

    /// Lowercase hex rendering of the payload, for logs and summaries.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.payload)
    }
}

impl From<Vec<u8>> for DataFrame {
    fn from(payload: Vec<u8>) -> Self {
        Self::new(payload)
    }
}

impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            f.write_str("(empty frame)")
        } else {
            write!(f, "{}", self.to_hex())
        }
    }
}
