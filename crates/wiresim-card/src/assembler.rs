//! ---
//! wiresim_section: "04-network-card"
//! wiresim_subsection: "module"
//! wiresim_type: "source"
//! wiresim_scope: "code"
//! wiresim_description: "Network card encode/transmit and sense/decode paths."
//! wiresim_version: "v0.0.0-prealpha"
//! wiresim_owner: "tbd"
//! ---
use std::fmt::Write as _;

use tracing::trace;
use wiresim_common::LineConfig;
use wiresim_frame::DataFrame;

/// Outcome of feeding one recovered bit into the assembler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssemblerStatus {
    /// More bits are needed.
    Reading,
    /// The escape + sentinel terminator pair was consumed; the frame is done.
    Terminated,
    /// The payload cap was reached with no terminator; the frame is
    /// truncated here.
    Full,
}

/// Accumulates recovered bits into the frame payload.
///
/// Bits arrive MSB-first; every completed byte is appended as two lowercase
/// hex digits and decoded once at delivery. A completed byte equal to the
/// escape value is deferred: if the sentinel follows it the pair is the
/// frame terminator, otherwise the escape was genuine payload data and both
/// bytes are emitted.
///
/// Known protocol ambiguity, inherited from the line code itself: a payload
/// whose final byte is the escape value makes the real trailer look like
/// escaped data, so the sentinel lands in the payload and the frame only
/// ends at the size cap. Senders that must carry a trailing escape byte are
/// on their own.
#[derive(Debug)]
pub struct FrameAssembler {
    escape_byte: u8,
    end_byte: u8,
    max_payload: usize,
    bits: u8,
    bit_count: u8,
    hex_digits: String,
    escape_pending: bool,
}

impl FrameAssembler {
    pub fn new(line: &LineConfig) -> Self {
        Self {
            escape_byte: line.escape_byte,
            end_byte: line.end_byte,
            max_payload: line.max_payload,
            bits: 0,
            bit_count: 0,
            hex_digits: String::new(),
            escape_pending: false,
        }
    }

    /// Feed one recovered bit, MSB-first within each byte.
    pub fn push_bit(&mut self, bit: bool) -> AssemblerStatus {
        self.bits = (self.bits << 1) | u8::from(bit);
        self.bit_count += 1;
        if self.bit_count < 8 {
            return AssemblerStatus::Reading;
        }
        let byte = self.bits;
        self.bits = 0;
        self.bit_count = 0;
        trace!(byte, "byte recovered");
        self.complete_byte(byte)
    }

    /// Number of payload bytes accumulated so far.
    pub fn byte_count(&self) -> usize {
        self.hex_digits.len() / 2
    }

    /// Convert the accumulated hex digits into the delivered frame.
    pub fn finish(self) -> DataFrame {
        if self.hex_digits.is_empty() {
            return DataFrame::empty();
        }
        let payload = hex::decode(&self.hex_digits).expect("assembler emits valid hex digits");
        DataFrame::new(payload)
    }

    fn complete_byte(&mut self, byte: u8) -> AssemblerStatus {
        if !self.escape_pending {
            if byte == self.escape_byte {
                // Emission deferred until the next byte disambiguates
                // terminator from literal payload data.
                self.escape_pending = true;
                return AssemblerStatus::Reading;
            }
            return self.append(byte);
        }

        self.escape_pending = false;
        if byte == self.end_byte {
            return AssemblerStatus::Terminated;
        }
        match self.append(self.escape_byte) {
            AssemblerStatus::Reading => self.append(byte),
            // The deferred escape landed exactly on the cap; the byte after
            // it is dropped so the delivered count never exceeds the cap.
            full => full,
        }
    }

    fn append(&mut self, byte: u8) -> AssemblerStatus {
        let _ = write!(self.hex_digits, "{byte:02x}");
        if self.byte_count() >= self.max_payload {
            AssemblerStatus::Full
        } else {
            AssemblerStatus::Reading
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_with_cap(max_payload: usize) -> LineConfig {
        LineConfig {
            max_payload,
            ..LineConfig::default()
        }
    }

    fn push_byte(assembler: &mut FrameAssembler, byte: u8) -> AssemblerStatus {
        let mut status = AssemblerStatus::Reading;
        for bit_index in (0..8).rev() {
            status = assembler.push_bit((byte >> bit_index) & 1 == 1);
        }
        status
    }

    #[test]
    fn accumulates_bits_msb_first() {
        let line = LineConfig::default();
        let mut assembler = FrameAssembler::new(&line);
        // 0x48 = 0b0100_1000
        for bit in [false, true, false, false, true, false, false, false] {
            assert_eq!(assembler.push_bit(bit), AssemblerStatus::Reading);
        }
        assert_eq!(assembler.byte_count(), 1);
        assert_eq!(assembler.finish().payload(), &[0x48]);
    }

    #[test]
    fn terminator_pair_ends_the_frame_and_is_not_payload() {
        let line = LineConfig::default();
        let mut assembler = FrameAssembler::new(&line);
        assert_eq!(push_byte(&mut assembler, 0x48), AssemblerStatus::Reading);
        assert_eq!(push_byte(&mut assembler, 0x5C), AssemblerStatus::Reading);
        assert_eq!(push_byte(&mut assembler, 0x7E), AssemblerStatus::Terminated);
        assert_eq!(assembler.finish().payload(), &[0x48]);
    }

    #[test]
    fn empty_transmission_yields_empty_frame() {
        let line = LineConfig::default();
        let mut assembler = FrameAssembler::new(&line);
        assert_eq!(push_byte(&mut assembler, 0x5C), AssemblerStatus::Reading);
        assert_eq!(push_byte(&mut assembler, 0x7E), AssemblerStatus::Terminated);
        assert!(assembler.finish().is_empty());
    }

    #[test]
    fn literal_escape_byte_is_deferred_then_emitted() {
        let line = LineConfig::default();
        let mut assembler = FrameAssembler::new(&line);
        assert_eq!(push_byte(&mut assembler, 0x5C), AssemblerStatus::Reading);
        assert_eq!(assembler.byte_count(), 0);
        assert_eq!(push_byte(&mut assembler, 0x41), AssemblerStatus::Reading);
        assert_eq!(assembler.byte_count(), 2);
        assert_eq!(push_byte(&mut assembler, 0x5C), AssemblerStatus::Reading);
        assert_eq!(push_byte(&mut assembler, 0x7E), AssemblerStatus::Terminated);
        assert_eq!(assembler.finish().payload(), &[0x5C, 0x41]);
    }

    #[test]
    fn sentinel_alone_is_ordinary_payload() {
        let line = LineConfig::default();
        let mut assembler = FrameAssembler::new(&line);
        assert_eq!(push_byte(&mut assembler, 0x7E), AssemblerStatus::Reading);
        assert_eq!(push_byte(&mut assembler, 0x5C), AssemblerStatus::Reading);
        assert_eq!(push_byte(&mut assembler, 0x7E), AssemblerStatus::Terminated);
        assert_eq!(assembler.finish().payload(), &[0x7E]);
    }

    #[test]
    fn cap_truncates_unterminated_stream() {
        let line = line_with_cap(3);
        let mut assembler = FrameAssembler::new(&line);
        assert_eq!(push_byte(&mut assembler, 0x01), AssemblerStatus::Reading);
        assert_eq!(push_byte(&mut assembler, 0x02), AssemblerStatus::Reading);
        assert_eq!(push_byte(&mut assembler, 0x03), AssemblerStatus::Full);
        assert_eq!(assembler.finish().payload(), &[0x01, 0x02, 0x03]);
    }

    #[test]
    fn deferred_escape_never_pushes_past_the_cap() {
        let line = line_with_cap(2);
        let mut assembler = FrameAssembler::new(&line);
        assert_eq!(push_byte(&mut assembler, 0x01), AssemblerStatus::Reading);
        assert_eq!(push_byte(&mut assembler, 0x5C), AssemblerStatus::Reading);
        // The deferred escape fills the cap; the byte it guarded is dropped.
        assert_eq!(push_byte(&mut assembler, 0x41), AssemblerStatus::Full);
        assert_eq!(assembler.finish().payload(), &[0x01, 0x5C]);
    }

    #[test]
    fn zero_and_high_bytes_round_trip_exactly() {
        let line = LineConfig::default();
        let mut assembler = FrameAssembler::new(&line);
        for byte in [0x00, 0xFF, 0x80] {
            assert_eq!(push_byte(&mut assembler, byte), AssemblerStatus::Reading);
        }
        assert_eq!(push_byte(&mut assembler, 0x5C), AssemblerStatus::Reading);
        assert_eq!(push_byte(&mut assembler, 0x7E), AssemblerStatus::Terminated);
        assert_eq!(assembler.finish().payload(), &[0x00, 0xFF, 0x80]);
    }
}
