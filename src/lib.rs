pub mod codec_data;
pub mod config;
pub mod convert;
pub mod engine;
pub mod error;
pub mod frame;
pub mod logging;
pub mod transcode;

#[cfg(test)]
pub(crate) mod tests;

pub use codec_data::{AacCodecData, CodecData, CodecId, GenericCodecData, Mpeg4AudioConfig};
pub use config::{DecoderConfig, EncoderConfig, LoggingSettings, TranscodeConfig};
pub use engine::{has_decoder, has_encoder, CodecEngine};
pub use error::{EngineError, ErrorKind, Result, TranscodeError};
pub use frame::{AudioFrame, AudioParams, ChannelLayout, EncodedPacket, SampleFormat};
pub use logging::init_logging;
pub use transcode::{AudioDecoder, AudioEncoder, Resampler};

#[cfg(feature = "ffmpeg")]
pub use engine::ffmpeg::FfmpegEngine;
