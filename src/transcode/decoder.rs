//! Audio decoder orchestration
//!
//! Builds a decoder from the [`CodecData`] an encoder produced and turns
//! compressed packets back into frames. The engine decoder opens lazily on
//! the first packet.

use bytes::Bytes;
use tracing::{debug, trace};

use crate::codec_data::{CodecData, CodecId};
use crate::config::DecoderConfig;
use crate::convert::{channel_layout_from_native, channel_layout_to_native, sample_format_from_native};
use crate::engine::{
    CodecEngine, CodecHandle, CodecQuery, DecodedFrame, DecoderContext, DecoderParams, MediaType,
};
use crate::error::{Result, TranscodeError};
use crate::frame::{AudioFrame, AudioParams, ChannelLayout};

enum DecoderState<D> {
    Unopened,
    Open(D),
    /// Open failed; the decoder cannot be used
    Failed(String),
}

/// Decoder for one audio stream
pub struct AudioDecoder<E: CodecEngine> {
    engine: E,
    codec: CodecHandle,
    /// Declared parameters until setup, the opened ones afterwards
    params: AudioParams,
    extradata: Bytes,
    state: DecoderState<E::Decoder>,
}

impl<E: CodecEngine> AudioDecoder<E> {
    pub fn new(engine: E, codec_data: &CodecData) -> Result<Self> {
        Self::with_config(engine, codec_data, &DecoderConfig::default())
    }

    /// Build a decoder for `codec_data`. The configured sample rate, when
    /// set, replaces the declared one on every decoded frame.
    pub fn with_config(engine: E, codec_data: &CodecData, config: &DecoderConfig) -> Result<Self> {
        let codec_id = codec_data.codec_id();
        let extradata = match (codec_id, codec_data) {
            (CodecId::Aac, CodecData::Aac(aac)) => aac.config_bytes().clone(),
            (CodecId::Aac, CodecData::Generic(_)) => {
                return Err(TranscodeError::UnsupportedCodecData(
                    "AAC stream without an AudioSpecificConfig".into(),
                ))
            }
            (id, _) if id.is_raw_pcm() => Bytes::new(),
            (_, CodecData::Generic(generic)) => generic.extradata.clone(),
            (id, CodecData::Aac(_)) => {
                return Err(TranscodeError::UnsupportedCodecData(format!(
                    "AAC codec data for a {} stream",
                    id
                )))
            }
        };

        let codec = engine
            .find_decoder(CodecQuery::Id(codec_id))
            .ok_or_else(|| TranscodeError::Setup(format!("Decoder not found: {}", codec_id)))?;
        if codec.media_type != MediaType::Audio {
            return Err(TranscodeError::Setup(format!(
                "{} is not an audio decoder ({:?})",
                codec.name, codec.media_type
            )));
        }

        let mut params = codec_data.params();
        if let Some(rate) = config.sample_rate.filter(|rate| *rate > 0) {
            params.sample_rate = rate;
        }

        Ok(Self {
            engine,
            codec,
            params,
            extradata,
            state: DecoderState::Unopened,
        })
    }

    /// Open the engine decoder. Runs automatically on the first `decode`.
    pub fn setup(&mut self) -> Result<()> {
        match &self.state {
            DecoderState::Open(_) => return Ok(()),
            DecoderState::Failed(reason) => {
                return Err(TranscodeError::Setup(format!(
                    "Decoder {} failed to open earlier: {}",
                    self.codec.name, reason
                )))
            }
            DecoderState::Unopened => {}
        }

        let declared = DecoderParams {
            sample_rate: self.params.sample_rate,
            channel_layout: channel_layout_to_native(self.params.channel_layout),
            channels: self.params.channels() as u16,
            extradata: self.extradata.to_vec(),
        };

        let context = match self.engine.open_decoder(&self.codec, &declared) {
            Ok(context) => context,
            Err(e) => {
                let reason = e.to_string();
                self.state = DecoderState::Failed(reason.clone());
                return Err(TranscodeError::Setup(format!(
                    "Failed to open decoder {}: {}",
                    self.codec.name, reason
                )));
            }
        };

        let opened = context.opened();
        if let Some(format) = sample_format_from_native(opened.sample_format) {
            self.params.sample_format = format;
        }
        let layout = channel_layout_from_native(opened.channel_layout);
        if !layout.is_empty() {
            self.params.channel_layout = layout;
        }
        if self.params.sample_rate == 0 {
            self.params.sample_rate = opened.sample_rate;
        }

        debug!(codec = %self.codec.name, params = %self.params, "Decoder opened");
        self.state = DecoderState::Open(context);
        Ok(())
    }

    /// Decode one packet into zero or one frames.
    pub fn decode(&mut self, packet: &[u8]) -> Result<Option<AudioFrame>> {
        self.setup()?;
        let DecoderState::Open(context) = &mut self.state else {
            return Err(TranscodeError::Setup(format!(
                "Decoder {} is not open",
                self.codec.name
            )));
        };

        let decoded = context.decode(packet).map_err(|e| {
            TranscodeError::Conversion(format!(
                "Decoder {} failed on {} byte packet: {}",
                self.codec.name,
                packet.len(),
                e
            ))
        })?;

        match decoded {
            Some(decoded) if decoded.samples > 0 => {
                let frame = self.to_frame(decoded)?;
                trace!(bytes = packet.len(), samples = frame.sample_count(), "Decoded packet");
                Ok(Some(frame))
            }
            _ => Ok(None),
        }
    }

    fn to_frame(&self, decoded: DecodedFrame) -> Result<AudioFrame> {
        let sample_format = sample_format_from_native(decoded.params.sample_format).ok_or_else(|| {
            TranscodeError::Conversion(format!(
                "Decoder {} produced unknown sample format {}",
                self.codec.name, decoded.params.sample_format
            ))
        })?;
        let channel_layout = match channel_layout_from_native(decoded.params.channel_layout) {
            layout if layout.is_empty() => {
                ChannelLayout::default_for_channels(usize::from(decoded.params.channels))
            }
            layout => layout,
        };

        // The engine's reported rate drifts for some codecs; ours is authoritative
        let params = AudioParams::new(sample_format, channel_layout, self.params.sample_rate);

        // Engines pad plane buffers; keep exactly the decoded samples
        let size = params.plane_size(decoded.samples);
        let planes = decoded
            .planes
            .into_iter()
            .enumerate()
            .map(|(index, mut plane)| {
                if plane.len() < size {
                    return Err(TranscodeError::Conversion(format!(
                        "Decoded plane {} holds {} bytes, {} samples of {} need {}",
                        index,
                        plane.len(),
                        decoded.samples,
                        params,
                        size
                    )));
                }
                plane.truncate(size);
                Ok(Bytes::from(plane))
            })
            .collect::<Result<Vec<_>>>()?;

        AudioFrame::new(params, decoded.samples, planes)
            .map_err(|e| TranscodeError::Conversion(format!("Decoder {}: {}", self.codec.name, e)))
    }

    /// Output parameters: declared until the decoder opens, then as opened.
    pub fn params(&self) -> AudioParams {
        self.params
    }

    pub fn codec(&self) -> &CodecHandle {
        &self.codec
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, DecoderState::Open(_))
    }

    /// Release the engine decoder.
    pub fn close(self) {
        if self.is_open() {
            debug!(codec = %self.codec.name, "Decoder closed");
        }
    }
}
