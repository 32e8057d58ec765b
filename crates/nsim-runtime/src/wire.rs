//! Inter-worker signal record
//!
//! A signal crossing workers travels as a fixed 12-byte little-endian
//! record `{signal_type: i32, target_node_id: i32, value: f32}`, framed
//! with a 4-byte tag so it can never be confused with control traffic.

use nsim_graph::{NodeId, Signal, SignalType};
use thiserror::Error;

/// Frame tag for point-to-point signal traffic
pub const TAG_SIGNAL: u32 = 100;

/// Encoded record length
pub const RECORD_LEN: usize = 12;

/// Encoded frame length (tag + record)
pub const FRAME_LEN: usize = 4 + RECORD_LEN;

/// Frame decoding failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WireError {
    /// Frame is not `FRAME_LEN` bytes
    #[error("Frame length {found} (expected {expected})")]
    Length {
        /// Bytes received
        found: usize,
        /// Bytes expected
        expected: usize,
    },

    /// Frame carries a tag other than `TAG_SIGNAL`
    #[error("Unexpected frame tag {0}")]
    Tag(u32),
}

/// Signal as carried between workers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WireSignal {
    /// Signal type, unvalidated
    pub signal_type: i32,
    /// Target node identifier, unvalidated
    pub target: i32,
    /// Magnitude
    pub value: f32,
}

impl WireSignal {
    /// Pack a signal addressed to `target`
    pub fn new(target: NodeId, signal: Signal) -> Self {
        Self {
            signal_type: signal.signal_type.index() as i32,
            target: target.raw() as i32,
            value: signal.value,
        }
    }

    /// Validate the record; `None` if the type or target is out of range
    pub fn unpack(&self) -> Option<(NodeId, Signal)> {
        let signal_type = SignalType::new(self.signal_type.into())?;
        let target = NodeId::from_wire(self.target)?;
        Some((target, Signal::new(signal_type, self.value)))
    }

    /// Encode as a tagged frame
    pub fn encode(&self) -> [u8; FRAME_LEN] {
        let mut frame = [0u8; FRAME_LEN];
        frame[0..4].copy_from_slice(&TAG_SIGNAL.to_le_bytes());
        frame[4..8].copy_from_slice(&self.signal_type.to_le_bytes());
        frame[8..12].copy_from_slice(&self.target.to_le_bytes());
        frame[12..16].copy_from_slice(&self.value.to_le_bytes());
        frame
    }

    /// Decode a tagged frame
    pub fn decode(frame: &[u8]) -> Result<Self, WireError> {
        if frame.len() != FRAME_LEN {
            return Err(WireError::Length {
                found: frame.len(),
                expected: FRAME_LEN,
            });
        }
        let word = |at: usize| [frame[at], frame[at + 1], frame[at + 2], frame[at + 3]];
        let tag = u32::from_le_bytes(word(0));
        if tag != TAG_SIGNAL {
            return Err(WireError::Tag(tag));
        }
        Ok(Self {
            signal_type: i32::from_le_bytes(word(4)),
            target: i32::from_le_bytes(word(8)),
            value: f32::from_le_bytes(word(12)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_layout() {
        let wire = WireSignal {
            signal_type: 3,
            target: 258,
            value: 1.5,
        };
        let frame = wire.encode();
        assert_eq!(&frame[0..4], &[100, 0, 0, 0]);
        assert_eq!(&frame[4..8], &[3, 0, 0, 0]);
        assert_eq!(&frame[8..12], &[2, 1, 0, 0]);
        assert_eq!(&frame[12..16], &1.5f32.to_le_bytes());
        assert_eq!(WireSignal::decode(&frame).unwrap(), wire);
    }

    #[test]
    fn test_decode_rejects_foreign_tag() {
        let mut frame = WireSignal::new(NodeId::new(1), Signal::new(SignalType::new(0).unwrap(), 1.0)).encode();
        frame[0] = 7;
        assert_eq!(WireSignal::decode(&frame), Err(WireError::Tag(7)));
    }

    #[test]
    fn test_decode_rejects_short_frame() {
        assert!(matches!(
            WireSignal::decode(&[0u8; 5]),
            Err(WireError::Length { found: 5, .. })
        ));
    }

    #[test]
    fn test_unpack_validates() {
        let bad_type = WireSignal { signal_type: 10, target: 1, value: 1.0 };
        assert!(bad_type.unpack().is_none());

        let bad_target = WireSignal { signal_type: 1, target: -4, value: 1.0 };
        assert!(bad_target.unpack().is_none());

        let good = WireSignal { signal_type: 9, target: 4, value: 2.0 };
        let (target, signal) = good.unpack().unwrap();
        assert_eq!(target, NodeId::new(4));
        assert_eq!(signal.signal_type.index(), 9);
    }
}
