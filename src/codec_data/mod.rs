//! Codec side data
//!
//! Everything needed to build a decoder for a stream an encoder produced.
//! Variants are chosen by codec id, never by inspecting the payload.

pub mod aac;

use bytes::Bytes;
use std::fmt;

use crate::error::Result;
use crate::frame::{AudioParams, ChannelLayout, SampleFormat};

pub use aac::{AacCodecData, Mpeg4AudioConfig};

/// Codec identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CodecId {
    Aac,
    Mp3,
    Opus,
    Vorbis,
    Flac,
    Ac3,
    PcmMulaw,
    PcmAlaw,
    PcmS16le,
    /// A codec without a name in this crate, by the engine's numeric id
    Native(u32),
}

impl CodecId {
    pub fn name(&self) -> &'static str {
        match self {
            CodecId::Aac => "aac",
            CodecId::Mp3 => "mp3",
            CodecId::Opus => "opus",
            CodecId::Vorbis => "vorbis",
            CodecId::Flac => "flac",
            CodecId::Ac3 => "ac3",
            CodecId::PcmMulaw => "pcm_mulaw",
            CodecId::PcmAlaw => "pcm_alaw",
            CodecId::PcmS16le => "pcm_s16le",
            CodecId::Native(_) => "native",
        }
    }

    /// Codecs whose decoders need no extradata.
    pub fn is_raw_pcm(&self) -> bool {
        matches!(self, CodecId::PcmMulaw | CodecId::PcmAlaw | CodecId::PcmS16le)
    }
}

impl fmt::Display for CodecId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodecId::Native(id) => write!(f, "native({})", id),
            other => f.write_str(other.name()),
        }
    }
}

/// Side data for codecs without a dedicated variant
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericCodecData {
    pub codec_id: CodecId,
    pub params: AudioParams,
    pub extradata: Bytes,
}

/// Codec side data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecData {
    Generic(GenericCodecData),
    Aac(AacCodecData),
}

impl CodecData {
    /// Derive side data from an opened encoder.
    ///
    /// AAC parses its AudioSpecificConfig out of the extradata; every other
    /// codec keeps the extradata opaque.
    pub fn from_encoder(codec_id: CodecId, params: AudioParams, extradata: &[u8]) -> Result<Self> {
        match codec_id {
            CodecId::Aac => Ok(CodecData::Aac(AacCodecData::from_config_bytes(
                Bytes::copy_from_slice(extradata),
            )?)),
            _ => Ok(CodecData::Generic(GenericCodecData {
                codec_id,
                params,
                extradata: Bytes::copy_from_slice(extradata),
            })),
        }
    }

    pub fn codec_id(&self) -> CodecId {
        match self {
            CodecData::Generic(data) => data.codec_id,
            CodecData::Aac(_) => CodecId::Aac,
        }
    }

    pub fn sample_format(&self) -> SampleFormat {
        match self {
            CodecData::Generic(data) => data.params.sample_format,
            // AAC decoders output planar float
            CodecData::Aac(_) => SampleFormat::FltP,
        }
    }

    pub fn channel_layout(&self) -> ChannelLayout {
        match self {
            CodecData::Generic(data) => data.params.channel_layout,
            CodecData::Aac(data) => data.config().channel_layout(),
        }
    }

    pub fn sample_rate(&self) -> u32 {
        match self {
            CodecData::Generic(data) => data.params.sample_rate,
            CodecData::Aac(data) => data.config().sample_rate,
        }
    }

    pub fn params(&self) -> AudioParams {
        AudioParams::new(self.sample_format(), self.channel_layout(), self.sample_rate())
    }

    pub fn extradata(&self) -> &[u8] {
        match self {
            CodecData::Generic(data) => &data.extradata[..],
            CodecData::Aac(data) => &data.config_bytes()[..],
        }
    }
}
