//! Channel layouts

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};
use std::str::FromStr;

use crate::error::TranscodeError;

/// Set of speaker positions present in a frame.
///
/// The bit values are this crate's own numbering and are unrelated to the
/// codec engine's channel masks; see [`crate::convert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ChannelLayout(u16);

impl ChannelLayout {
    pub const FRONT_CENTER: ChannelLayout = ChannelLayout(1 << 0);
    pub const FRONT_LEFT: ChannelLayout = ChannelLayout(1 << 1);
    pub const FRONT_RIGHT: ChannelLayout = ChannelLayout(1 << 2);
    pub const BACK_CENTER: ChannelLayout = ChannelLayout(1 << 3);
    pub const BACK_LEFT: ChannelLayout = ChannelLayout(1 << 4);
    pub const BACK_RIGHT: ChannelLayout = ChannelLayout(1 << 5);
    pub const SIDE_LEFT: ChannelLayout = ChannelLayout(1 << 6);
    pub const SIDE_RIGHT: ChannelLayout = ChannelLayout(1 << 7);
    pub const LOW_FREQ: ChannelLayout = ChannelLayout(1 << 8);

    pub const MONO: ChannelLayout = Self::FRONT_CENTER;
    pub const STEREO: ChannelLayout = ChannelLayout(Self::FRONT_LEFT.0 | Self::FRONT_RIGHT.0);
    pub const LAYOUT_2POINT1: ChannelLayout = ChannelLayout(Self::STEREO.0 | Self::LOW_FREQ.0);
    pub const SURROUND: ChannelLayout = ChannelLayout(Self::STEREO.0 | Self::FRONT_CENTER.0);
    pub const QUAD: ChannelLayout =
        ChannelLayout(Self::STEREO.0 | Self::BACK_LEFT.0 | Self::BACK_RIGHT.0);
    pub const LAYOUT_5POINT0: ChannelLayout =
        ChannelLayout(Self::SURROUND.0 | Self::SIDE_LEFT.0 | Self::SIDE_RIGHT.0);
    pub const LAYOUT_5POINT1: ChannelLayout =
        ChannelLayout(Self::LAYOUT_5POINT0.0 | Self::LOW_FREQ.0);
    pub const LAYOUT_7POINT1: ChannelLayout =
        ChannelLayout(Self::LAYOUT_5POINT1.0 | Self::BACK_LEFT.0 | Self::BACK_RIGHT.0);

    /// Individually named speaker positions, in bit order.
    pub const SPEAKERS: [ChannelLayout; 9] = [
        Self::FRONT_CENTER,
        Self::FRONT_LEFT,
        Self::FRONT_RIGHT,
        Self::BACK_CENTER,
        Self::BACK_LEFT,
        Self::BACK_RIGHT,
        Self::SIDE_LEFT,
        Self::SIDE_RIGHT,
        Self::LOW_FREQ,
    ];

    const NAMED: [(&'static str, ChannelLayout); 8] = [
        ("mono", Self::MONO),
        ("stereo", Self::STEREO),
        ("2.1", Self::LAYOUT_2POINT1),
        ("surround", Self::SURROUND),
        ("quad", Self::QUAD),
        ("5.0", Self::LAYOUT_5POINT0),
        ("5.1", Self::LAYOUT_5POINT1),
        ("7.1", Self::LAYOUT_7POINT1),
    ];

    pub const fn empty() -> Self {
        ChannelLayout(0)
    }

    pub const fn from_bits(bits: u16) -> Self {
        ChannelLayout(bits)
    }

    pub const fn bits(self) -> u16 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: ChannelLayout) -> bool {
        self.0 & other.0 == other.0
    }

    /// Number of channels.
    pub const fn count(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Best-effort default layout for a bare channel count.
    pub fn default_for_channels(channels: usize) -> Self {
        match channels {
            1 => Self::MONO,
            2 => Self::STEREO,
            3 => Self::SURROUND,
            4 => Self::QUAD,
            5 => Self::LAYOUT_5POINT0,
            6 => Self::LAYOUT_5POINT1,
            8 => Self::LAYOUT_7POINT1,
            _ => Self::empty(),
        }
    }

    fn name(self) -> Option<&'static str> {
        Self::NAMED
            .iter()
            .find(|(_, layout)| *layout == self)
            .map(|(name, _)| *name)
    }
}

impl BitOr for ChannelLayout {
    type Output = ChannelLayout;

    fn bitor(self, rhs: Self) -> Self::Output {
        ChannelLayout(self.0 | rhs.0)
    }
}

impl BitOrAssign for ChannelLayout {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for ChannelLayout {
    type Output = ChannelLayout;

    fn bitand(self, rhs: Self) -> Self::Output {
        ChannelLayout(self.0 & rhs.0)
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:#x}", self.0),
        }
    }
}

impl FromStr for ChannelLayout {
    type Err = TranscodeError;

    /// Accepts a layout name (`"stereo"`, `"5.1"`, …) or a numeric mask
    /// (`"6"`, `"0x6"`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let lower = s.to_ascii_lowercase();
        if let Some((_, layout)) = Self::NAMED.iter().find(|(name, _)| *name == lower) {
            return Ok(*layout);
        }
        let bits = match lower.strip_prefix("0x") {
            Some(hex) => u16::from_str_radix(hex, 16),
            None => lower.parse::<u16>(),
        };
        bits.map(ChannelLayout)
            .map_err(|_| TranscodeError::Config(format!("unknown channel layout: {}", s)))
    }
}

impl TryFrom<String> for ChannelLayout {
    type Error = TranscodeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ChannelLayout> for String {
    fn from(value: ChannelLayout) -> Self {
        value.to_string()
    }
}
