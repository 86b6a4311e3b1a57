//! The engine's numbering for sample formats and channel masks.
//!
//! Values match FFmpeg's `AVSampleFormat` and `AV_CH_*` so the FFmpeg
//! backend can pass them through unchanged.

/// Sample format code (`AVSampleFormat`)
pub type NativeSampleFormat = i32;
/// Channel bitmask (`AV_CH_*`)
pub type NativeChannelLayout = u64;

pub const SAMPLE_FMT_NONE: NativeSampleFormat = -1;
pub const SAMPLE_FMT_U8: NativeSampleFormat = 0;
pub const SAMPLE_FMT_S16: NativeSampleFormat = 1;
pub const SAMPLE_FMT_S32: NativeSampleFormat = 2;
pub const SAMPLE_FMT_FLT: NativeSampleFormat = 3;
pub const SAMPLE_FMT_DBL: NativeSampleFormat = 4;
pub const SAMPLE_FMT_U8P: NativeSampleFormat = 5;
pub const SAMPLE_FMT_S16P: NativeSampleFormat = 6;
pub const SAMPLE_FMT_S32P: NativeSampleFormat = 7;
pub const SAMPLE_FMT_FLTP: NativeSampleFormat = 8;
pub const SAMPLE_FMT_DBLP: NativeSampleFormat = 9;
pub const SAMPLE_FMT_S64: NativeSampleFormat = 10;
pub const SAMPLE_FMT_S64P: NativeSampleFormat = 11;

pub const CH_FRONT_LEFT: NativeChannelLayout = 0x0000_0001;
pub const CH_FRONT_RIGHT: NativeChannelLayout = 0x0000_0002;
pub const CH_FRONT_CENTER: NativeChannelLayout = 0x0000_0004;
pub const CH_LOW_FREQUENCY: NativeChannelLayout = 0x0000_0008;
pub const CH_BACK_LEFT: NativeChannelLayout = 0x0000_0010;
pub const CH_BACK_RIGHT: NativeChannelLayout = 0x0000_0020;
pub const CH_FRONT_LEFT_OF_CENTER: NativeChannelLayout = 0x0000_0040;
pub const CH_FRONT_RIGHT_OF_CENTER: NativeChannelLayout = 0x0000_0080;
pub const CH_BACK_CENTER: NativeChannelLayout = 0x0000_0100;
pub const CH_SIDE_LEFT: NativeChannelLayout = 0x0000_0200;
pub const CH_SIDE_RIGHT: NativeChannelLayout = 0x0000_0400;
pub const CH_TOP_CENTER: NativeChannelLayout = 0x0000_0800;

pub const CH_LAYOUT_STEREO: NativeChannelLayout = CH_FRONT_LEFT | CH_FRONT_RIGHT;
