//! Native codec engine interface
//!
//! The transcoding core never touches codec bitstreams itself. Everything
//! it needs from the native library is expressed by the traits here:
//! - codec lookup by name or id
//! - opening encoder and decoder contexts
//! - encoding one frame / decoding one packet
//! - allocating and driving a resampling context
//!
//! Values crossing this boundary use the engine's own numbering (see
//! [`native`]); [`crate::convert`] translates to and from the crate's types.
//! Contexts release their native resources on `Drop`.

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod native;

use crate::codec_data::CodecId;
use crate::error::EngineError;

pub use native::{NativeChannelLayout, NativeSampleFormat};

/// Kind of media a codec handles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Audio,
    Video,
    Subtitle,
    Other,
}

/// How to look up a codec
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecQuery<'a> {
    Name(&'a str),
    Id(CodecId),
}

/// A codec known to the engine
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecHandle {
    pub id: CodecId,
    pub name: String,
    pub media_type: MediaType,
}

/// Layout triple in the engine's numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeParams {
    pub sample_format: NativeSampleFormat,
    pub channel_layout: NativeChannelLayout,
    pub channels: u16,
    pub sample_rate: u32,
}

/// Requested encoder parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncoderParams {
    pub audio: NativeParams,
    pub bit_rate: u64,
}

/// Declared decoder parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderParams {
    pub sample_rate: u32,
    pub channel_layout: NativeChannelLayout,
    pub channels: u16,
    pub extradata: Vec<u8>,
}

/// A frame handed to the engine.
///
/// The planes borrow the caller's buffers and are only valid for the
/// duration of the call they are passed to.
#[derive(Debug, Clone)]
pub struct NativeFrame<'a> {
    pub params: NativeParams,
    pub samples: usize,
    pub planes: Vec<&'a [u8]>,
}

/// A frame produced by the engine's decoder.
///
/// Planes may be longer than `samples` requires (engines pad their
/// buffers); the reported rate is not authoritative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub params: NativeParams,
    pub samples: usize,
    pub planes: Vec<Vec<u8>>,
}

/// An opened encoder
pub trait EncoderContext {
    /// Parameters the engine settled on; may differ from the request.
    fn opened(&self) -> NativeParams;

    /// Samples per channel every frame must carry, or 0 for any size.
    fn frame_size(&self) -> usize;

    /// Out-of-band configuration bytes a decoder needs.
    fn extradata(&self) -> &[u8];

    fn codec_id(&self) -> CodecId;

    /// Encode one frame into zero or one packets.
    fn encode(&mut self, frame: &NativeFrame<'_>) -> Result<Option<Vec<u8>>, EngineError>;

    /// Drain packets still held by the encoder at end of stream.
    fn finish(&mut self) -> Result<Vec<Vec<u8>>, EngineError> {
        Ok(Vec::new())
    }
}

/// An opened decoder
pub trait DecoderContext {
    /// Output parameters the engine reports after opening.
    fn opened(&self) -> NativeParams;

    /// Decode one packet into zero or one frames.
    fn decode(&mut self, packet: &[u8]) -> Result<Option<DecodedFrame>, EngineError>;
}

/// A configured resampling context
pub trait ResampleContext {
    /// Upper bound on the samples the next `convert` can produce for
    /// `input_samples` input samples, including samples held back from
    /// earlier calls.
    fn max_output_samples(&mut self, input_samples: usize) -> usize;

    /// Convert `input` (planes and sample count) into `output`, which has
    /// room for `output_capacity` samples per channel. `None` input drains
    /// samples held inside the context. Returns the number of samples
    /// written, which may be below capacity.
    fn convert(
        &mut self,
        output: &mut [&mut [u8]],
        output_capacity: usize,
        input: Option<(&[&[u8]], usize)>,
    ) -> Result<usize, EngineError>;
}

/// The native codec library
///
/// Engines are cheap handles: cloning one shares the underlying library.
pub trait CodecEngine: Clone {
    type Encoder: EncoderContext;
    type Decoder: DecoderContext;
    type Resampler: ResampleContext;

    fn find_encoder(&self, query: CodecQuery<'_>) -> Option<CodecHandle>;

    fn find_decoder(&self, query: CodecQuery<'_>) -> Option<CodecHandle>;

    fn open_encoder(
        &self,
        codec: &CodecHandle,
        params: &EncoderParams,
    ) -> Result<Self::Encoder, EngineError>;

    fn open_decoder(
        &self,
        codec: &CodecHandle,
        params: &DecoderParams,
    ) -> Result<Self::Decoder, EngineError>;

    fn alloc_resampler(
        &self,
        input: &NativeParams,
        output: &NativeParams,
    ) -> Result<Self::Resampler, EngineError>;
}

/// Check whether the engine has an encoder registered under `name`.
pub fn has_encoder<E: CodecEngine>(engine: &E, name: &str) -> bool {
    engine.find_encoder(CodecQuery::Name(name)).is_some()
}

/// Check whether the engine has a decoder registered under `name`.
pub fn has_decoder<E: CodecEngine>(engine: &E, name: &str) -> bool {
    engine.find_decoder(CodecQuery::Name(name)).is_some()
}
