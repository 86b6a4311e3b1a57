//! Compressed packets

use bytes::Bytes;
use std::time::Duration;

/// One unit of encoder output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPacket {
    /// Compressed bitstream bytes
    pub data: Bytes,
    /// Samples per channel the packet was encoded from
    pub samples: usize,
    /// `samples / sample_rate`
    pub duration: Duration,
}

impl EncodedPacket {
    pub(crate) fn new(data: impl Into<Bytes>, samples: usize, sample_rate: u32) -> Self {
        let duration = if sample_rate == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(samples as f64 / sample_rate as f64)
        };
        Self {
            data: data.into(),
            samples,
            duration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_duration() {
        let pkt = EncodedPacket::new(vec![1u8, 2, 3], 1024, 48000);
        assert_eq!(pkt.data.len(), 3);
        assert!((pkt.duration.as_secs_f64() - 1024.0 / 48000.0).abs() < 1e-9);
    }

    #[test]
    fn test_packet_duration_zero_rate() {
        let pkt = EncodedPacket::new(Vec::new(), 1024, 0);
        assert_eq!(pkt.duration, Duration::ZERO);
    }
}
