//! Sample formats

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TranscodeError;

/// Storage type of one sample, and whether channels share a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SampleFormat {
    U8,
    S16,
    S32,
    Flt,
    Dbl,
    U8P,
    S16P,
    S32P,
    FltP,
    DblP,
}

impl SampleFormat {
    pub const ALL: [SampleFormat; 10] = [
        SampleFormat::U8,
        SampleFormat::S16,
        SampleFormat::S32,
        SampleFormat::Flt,
        SampleFormat::Dbl,
        SampleFormat::U8P,
        SampleFormat::S16P,
        SampleFormat::S32P,
        SampleFormat::FltP,
        SampleFormat::DblP,
    ];

    pub fn bytes_per_sample(self) -> usize {
        match self {
            SampleFormat::U8 | SampleFormat::U8P => 1,
            SampleFormat::S16 | SampleFormat::S16P => 2,
            SampleFormat::S32 | SampleFormat::S32P | SampleFormat::Flt | SampleFormat::FltP => 4,
            SampleFormat::Dbl | SampleFormat::DblP => 8,
        }
    }

    pub fn is_planar(self) -> bool {
        matches!(
            self,
            SampleFormat::U8P
                | SampleFormat::S16P
                | SampleFormat::S32P
                | SampleFormat::FltP
                | SampleFormat::DblP
        )
    }

    /// Number of buffers a frame with `channels` channels carries.
    pub fn plane_count(self, channels: usize) -> usize {
        if self.is_planar() {
            channels
        } else {
            1
        }
    }

    /// Byte length of one buffer holding `samples` samples per channel.
    pub fn plane_size(self, samples: usize, channels: usize) -> usize {
        if self.is_planar() {
            samples * self.bytes_per_sample()
        } else {
            samples * self.bytes_per_sample() * channels
        }
    }

    /// Bytes one sample position occupies within a single buffer.
    pub(crate) fn plane_stride(self, channels: usize) -> usize {
        self.plane_size(1, channels)
    }

    pub fn name(self) -> &'static str {
        match self {
            SampleFormat::U8 => "u8",
            SampleFormat::S16 => "s16",
            SampleFormat::S32 => "s32",
            SampleFormat::Flt => "flt",
            SampleFormat::Dbl => "dbl",
            SampleFormat::U8P => "u8p",
            SampleFormat::S16P => "s16p",
            SampleFormat::S32P => "s32p",
            SampleFormat::FltP => "fltp",
            SampleFormat::DblP => "dblp",
        }
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SampleFormat {
    type Err = TranscodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        SampleFormat::ALL
            .iter()
            .copied()
            .find(|f| f.name() == lower)
            .ok_or_else(|| TranscodeError::Config(format!("unknown sample format: {}", s)))
    }
}

impl TryFrom<String> for SampleFormat {
    type Error = TranscodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<SampleFormat> for String {
    fn from(value: SampleFormat) -> Self {
        value.name().to_string()
    }
}
