//! MPEG-4 AudioSpecificConfig
//!
//! Only the leading fields are read: object type, sampling frequency and
//! channel configuration. That is enough to rebuild a decoder; the rest of
//! the record is kept verbatim in the raw bytes.

use bytes::Bytes;

use crate::error::{Result, TranscodeError};
use crate::frame::ChannelLayout;

/// Sampling frequencies addressable by a 4-bit index
pub const SAMPLE_RATES: [u32; 13] = [
    96000, 88200, 64000, 48000, 44100, 32000, 24000, 22050, 16000, 12000, 11025, 8000, 7350,
];

/// AAC low complexity
pub const OBJECT_TYPE_AAC_LC: u8 = 2;

const OBJECT_TYPE_ESCAPE: u32 = 31;
const FREQ_INDEX_ESCAPE: u32 = 15;

/// Decoded AudioSpecificConfig header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mpeg4AudioConfig {
    pub object_type: u8,
    pub sample_rate: u32,
    /// 0 means the layout is carried in the bitstream instead
    pub channel_config: u8,
}

impl Mpeg4AudioConfig {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut reader = BitReader::new(data);

        let mut object_type = reader.read(5)?;
        if object_type == OBJECT_TYPE_ESCAPE {
            object_type = 32 + reader.read(6)?;
        }

        let freq_index = reader.read(4)?;
        let sample_rate = if freq_index == FREQ_INDEX_ESCAPE {
            reader.read(24)?
        } else {
            *SAMPLE_RATES.get(freq_index as usize).ok_or_else(|| {
                TranscodeError::InvalidCodecData(format!(
                    "reserved sampling frequency index {}",
                    freq_index
                ))
            })?
        };

        let channel_config = reader.read(4)?;
        if channel_config > 7 {
            return Err(TranscodeError::InvalidCodecData(format!(
                "unsupported channel configuration {}",
                channel_config
            )));
        }

        Ok(Self {
            object_type: object_type as u8,
            sample_rate,
            channel_config: channel_config as u8,
        })
    }

    /// Serialize the header fields, padded to a whole byte.
    ///
    /// Fails for values the header cannot carry: object types 31 and above
    /// 95, explicit rates of 2^24 Hz or more, channel configs above 7.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        if self.object_type == OBJECT_TYPE_ESCAPE as u8 || self.object_type > 32 + 63 {
            return Err(TranscodeError::InvalidCodecData(format!(
                "AAC object type {} cannot be encoded",
                self.object_type
            )));
        }
        if self.channel_config > 7 {
            return Err(TranscodeError::InvalidCodecData(format!(
                "AAC channel config {} cannot be encoded",
                self.channel_config
            )));
        }

        let mut writer = BitWriter::default();
        if self.object_type > OBJECT_TYPE_ESCAPE as u8 {
            writer.write(OBJECT_TYPE_ESCAPE, 5);
            writer.write(u32::from(self.object_type - 32), 6);
        } else {
            writer.write(u32::from(self.object_type), 5);
        }
        match SAMPLE_RATES.iter().position(|r| *r == self.sample_rate) {
            Some(index) => writer.write(index as u32, 4),
            None if self.sample_rate < 1 << 24 => {
                writer.write(FREQ_INDEX_ESCAPE, 4);
                writer.write(self.sample_rate, 24);
            }
            None => {
                return Err(TranscodeError::InvalidCodecData(format!(
                    "AAC sample rate {} does not fit in 24 bits",
                    self.sample_rate
                )))
            }
        }
        writer.write(u32::from(self.channel_config), 4);
        Ok(writer.finish())
    }

    pub fn channel_layout(&self) -> ChannelLayout {
        type L = ChannelLayout;
        match self.channel_config {
            1 => L::FRONT_CENTER,
            2 => L::FRONT_LEFT | L::FRONT_RIGHT,
            3 => L::FRONT_CENTER | L::FRONT_LEFT | L::FRONT_RIGHT,
            4 => L::FRONT_CENTER | L::FRONT_LEFT | L::FRONT_RIGHT | L::BACK_CENTER,
            5 => L::FRONT_CENTER | L::FRONT_LEFT | L::FRONT_RIGHT | L::BACK_LEFT | L::BACK_RIGHT,
            6 => {
                L::FRONT_CENTER
                    | L::FRONT_LEFT
                    | L::FRONT_RIGHT
                    | L::BACK_LEFT
                    | L::BACK_RIGHT
                    | L::LOW_FREQ
            }
            7 => {
                L::FRONT_CENTER
                    | L::FRONT_LEFT
                    | L::FRONT_RIGHT
                    | L::SIDE_LEFT
                    | L::SIDE_RIGHT
                    | L::BACK_LEFT
                    | L::BACK_RIGHT
                    | L::LOW_FREQ
            }
            _ => L::empty(),
        }
    }
}

/// AAC stream parameters plus the config record they came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AacCodecData {
    config: Mpeg4AudioConfig,
    config_bytes: Bytes,
}

impl AacCodecData {
    pub fn from_config_bytes(data: impl Into<Bytes>) -> Result<Self> {
        let config_bytes = data.into();
        let config = Mpeg4AudioConfig::parse(&config_bytes)?;
        Ok(Self {
            config,
            config_bytes,
        })
    }

    pub fn from_config(config: Mpeg4AudioConfig) -> Result<Self> {
        let config_bytes = Bytes::from(config.to_bytes()?);
        Ok(Self {
            config,
            config_bytes,
        })
    }

    pub fn config(&self) -> &Mpeg4AudioConfig {
        &self.config
    }

    /// The AudioSpecificConfig record, used as decoder extradata.
    pub fn config_bytes(&self) -> &Bytes {
        &self.config_bytes
    }
}

struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read(&mut self, bits: usize) -> Result<u32> {
        if self.pos + bits > self.data.len() * 8 {
            return Err(TranscodeError::InvalidCodecData(format!(
                "AudioSpecificConfig truncated: need {} bits at offset {}, have {} bytes",
                bits,
                self.pos,
                self.data.len()
            )));
        }
        let mut value = 0u32;
        for _ in 0..bits {
            let byte = self.data[self.pos / 8];
            let bit = (byte >> (7 - self.pos % 8)) & 1;
            value = (value << 1) | u32::from(bit);
            self.pos += 1;
        }
        Ok(value)
    }
}

#[derive(Default)]
struct BitWriter {
    bytes: Vec<u8>,
    bits: usize,
}

impl BitWriter {
    fn write(&mut self, value: u32, bits: usize) {
        for i in (0..bits).rev() {
            if self.bits % 8 == 0 {
                self.bytes.push(0);
            }
            let bit = ((value >> i) & 1) as u8;
            if let Some(last) = self.bytes.last_mut() {
                *last |= bit << (7 - self.bits % 8);
            }
            self.bits += 1;
        }
    }

    fn finish(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aac_lc_44100_stereo() {
        // 00010 0100 0010 000
        let config = Mpeg4AudioConfig::parse(&[0x12, 0x10]).unwrap();
        assert_eq!(config.object_type, OBJECT_TYPE_AAC_LC);
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.channel_config, 2);
        assert_eq!(config.channel_layout(), ChannelLayout::STEREO);
    }

    #[test]
    fn test_parse_aac_lc_48000_5_1() {
        // 00010 0011 0110 000
        let config = Mpeg4AudioConfig::parse(&[0x11, 0xb0]).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.channel_config, 6);
        assert_eq!(config.channel_layout().count(), 6);
        assert!(config.channel_layout().contains(ChannelLayout::LOW_FREQ));
    }

    #[test]
    fn test_write_matches_known_bytes() {
        let config = Mpeg4AudioConfig {
            object_type: OBJECT_TYPE_AAC_LC,
            sample_rate: 44100,
            channel_config: 2,
        };
        assert_eq!(config.to_bytes().unwrap(), vec![0x12, 0x10]);
    }

    #[test]
    fn test_explicit_rate_and_escaped_object_type() {
        let config = Mpeg4AudioConfig {
            object_type: 42,
            sample_rate: 44056,
            channel_config: 1,
        };
        let bytes = config.to_bytes().unwrap();
        // 5 + 6 + 4 + 24 + 4 bits
        assert_eq!(bytes.len(), 6);
        assert_eq!(Mpeg4AudioConfig::parse(&bytes).unwrap(), config);
    }

    #[test]
    fn test_unrepresentable_values_rejected() {
        let base = Mpeg4AudioConfig {
            object_type: OBJECT_TYPE_AAC_LC,
            sample_rate: 44100,
            channel_config: 2,
        };
        for config in [
            Mpeg4AudioConfig {
                sample_rate: 1 << 24,
                ..base
            },
            Mpeg4AudioConfig {
                object_type: 96,
                ..base
            },
            Mpeg4AudioConfig {
                object_type: 31,
                ..base
            },
            Mpeg4AudioConfig {
                channel_config: 8,
                ..base
            },
        ] {
            let err = config.to_bytes().unwrap_err();
            assert!(matches!(err, TranscodeError::InvalidCodecData(_)));
        }

        let widest = Mpeg4AudioConfig {
            object_type: 95,
            sample_rate: (1 << 24) - 1,
            ..base
        };
        let bytes = widest.to_bytes().unwrap();
        assert_eq!(Mpeg4AudioConfig::parse(&bytes).unwrap(), widest);
    }

    #[test]
    fn test_truncated_config() {
        let err = Mpeg4AudioConfig::parse(&[0x12]).unwrap_err();
        assert!(matches!(err, TranscodeError::InvalidCodecData(_)));
        assert!(Mpeg4AudioConfig::parse(&[]).is_err());
    }

    #[test]
    fn test_reserved_frequency_index() {
        // object type 2, frequency index 13
        let err = Mpeg4AudioConfig::parse(&[0x16, 0x90]).unwrap_err();
        assert!(matches!(err, TranscodeError::InvalidCodecData(_)));
    }

    #[test]
    fn test_codec_data_keeps_raw_bytes() {
        let raw = vec![0x12, 0x10, 0x56, 0xe5, 0x00];
        let data = AacCodecData::from_config_bytes(raw.clone()).unwrap();
        assert_eq!(&data.config_bytes()[..], &raw[..]);
        assert_eq!(data.config().sample_rate, 44100);
    }
}
