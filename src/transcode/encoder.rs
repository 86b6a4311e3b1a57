//! Audio encoder orchestration
//!
//! Accepts frames of any size and layout, converts them to the parameters
//! the codec was opened with, and cuts them into the fixed block size the
//! codec demands. Samples that do not fill a block wait in a buffer for the
//! next call.

use tracing::{debug, trace};

use super::native_frame;
use super::resampler::Resampler;
use crate::codec_data::{CodecData, CodecId};
use crate::config::EncoderConfig;
use crate::convert::{audio_params_to_native, channel_layout_from_native, sample_format_from_native};
use crate::engine::{CodecEngine, CodecHandle, CodecQuery, EncoderContext, EncoderParams, MediaType};
use crate::error::{Result, TranscodeError};
use crate::frame::{AudioFrame, AudioParams, ChannelLayout, EncodedPacket, SampleFormat};

/// Encoder for one audio stream
pub struct AudioEncoder<E: CodecEngine> {
    engine: E,
    codec: CodecHandle,
    config: EncoderConfig,
    /// Requested parameters until setup, the opened ones afterwards
    params: AudioParams,
    bit_rate: u64,
    /// Samples per block, 0 when the codec takes any size
    frame_size: usize,
    /// Samples in the last block handed to the codec
    last_block: usize,
    context: Option<E::Encoder>,
    codec_data: Option<CodecData>,
    framebuf: Option<AudioFrame>,
    resampler: Option<Resampler<E>>,
    /// Packets encoded by a call that then failed
    pending: Vec<EncodedPacket>,
    setup_error: Option<String>,
}

impl<E: CodecEngine> AudioEncoder<E> {
    /// Look up an encoder by its registered name.
    pub fn by_name(engine: E, name: &str) -> Result<Self> {
        let config = EncoderConfig {
            codec: name.to_string(),
            ..EncoderConfig::default()
        };
        Self::from_config(engine, &config)
    }

    /// Look up an encoder by codec id.
    pub fn by_codec(engine: E, id: CodecId) -> Result<Self> {
        let codec = engine
            .find_encoder(CodecQuery::Id(id))
            .ok_or_else(|| TranscodeError::Setup(format!("No encoder for codec {}", id)))?;
        let config = EncoderConfig {
            codec: codec.name.clone(),
            ..EncoderConfig::default()
        };
        Self::with_codec(engine, codec, config)
    }

    /// Build an encoder from configuration. The codec is looked up by
    /// `config.codec`; nothing is opened until the first frame.
    pub fn from_config(engine: E, config: &EncoderConfig) -> Result<Self> {
        let codec = engine
            .find_encoder(CodecQuery::Name(&config.codec))
            .ok_or_else(|| TranscodeError::Setup(format!("Encoder not found: {}", config.codec)))?;
        Self::with_codec(engine, codec, config.clone())
    }

    fn with_codec(engine: E, codec: CodecHandle, config: EncoderConfig) -> Result<Self> {
        if codec.media_type != MediaType::Audio {
            return Err(TranscodeError::Setup(format!(
                "{} is not an audio encoder ({:?})",
                codec.name, codec.media_type
            )));
        }
        let params = config.resolved_params();
        let bit_rate = config.resolved_bit_rate();
        Ok(Self {
            engine,
            codec,
            config,
            params,
            bit_rate,
            frame_size: 0,
            last_block: 0,
            context: None,
            codec_data: None,
            framebuf: None,
            resampler: None,
            pending: Vec::new(),
            setup_error: None,
        })
    }

    pub fn set_sample_format(&mut self, format: SampleFormat) -> Result<()> {
        self.check_unopened()?;
        self.config.sample_format = Some(format);
        self.params = self.config.resolved_params();
        Ok(())
    }

    pub fn set_sample_rate(&mut self, rate: u32) -> Result<()> {
        self.check_unopened()?;
        self.config.sample_rate = Some(rate);
        self.params = self.config.resolved_params();
        Ok(())
    }

    pub fn set_channel_layout(&mut self, layout: ChannelLayout) -> Result<()> {
        self.check_unopened()?;
        self.config.channel_layout = Some(layout);
        self.params = self.config.resolved_params();
        Ok(())
    }

    pub fn set_bit_rate(&mut self, bit_rate: u64) -> Result<()> {
        self.check_unopened()?;
        self.config.bit_rate = Some(bit_rate);
        self.bit_rate = self.config.resolved_bit_rate();
        Ok(())
    }

    fn check_unopened(&self) -> Result<()> {
        if self.context.is_some() {
            return Err(TranscodeError::Config(format!(
                "Encoder {} is already open",
                self.codec.name
            )));
        }
        Ok(())
    }

    /// Open the codec. Runs automatically on the first `encode`.
    ///
    /// The engine may coerce the requested format, layout and rate; the
    /// coerced values become the encoder's parameters. A failed open is
    /// remembered and reported by every later call.
    pub fn setup(&mut self) -> Result<()> {
        if self.context.is_some() {
            return Ok(());
        }
        if let Some(reason) = &self.setup_error {
            return Err(TranscodeError::Setup(format!(
                "Encoder {} failed to open earlier: {}",
                self.codec.name, reason
            )));
        }
        if let Err(e) = self.open() {
            self.setup_error = Some(match &e {
                TranscodeError::Setup(reason) => reason.clone(),
                other => other.to_string(),
            });
            return Err(e);
        }
        Ok(())
    }

    fn open(&mut self) -> Result<()> {
        let requested = self.config.resolved_params();
        let bit_rate = self.config.resolved_bit_rate();
        let native = EncoderParams {
            audio: audio_params_to_native(&requested),
            bit_rate,
        };

        let context = self.engine.open_encoder(&self.codec, &native).map_err(|e| {
            TranscodeError::Setup(format!("Failed to open encoder {}: {}", self.codec.name, e))
        })?;

        let opened = context.opened();
        let sample_format = sample_format_from_native(opened.sample_format).ok_or_else(|| {
            TranscodeError::Setup(format!(
                "Encoder {} opened with unknown sample format {}",
                self.codec.name, opened.sample_format
            ))
        })?;
        let channel_layout = match channel_layout_from_native(opened.channel_layout) {
            layout if layout.is_empty() => requested.channel_layout,
            layout => layout,
        };
        let sample_rate = match opened.sample_rate {
            0 => requested.sample_rate,
            rate => rate,
        };
        let params = AudioParams::new(sample_format, channel_layout, sample_rate);

        let codec_data = CodecData::from_encoder(context.codec_id(), params, context.extradata())
            .map_err(|e| {
                TranscodeError::Setup(format!(
                    "Encoder {} produced unusable codec data: {}",
                    self.codec.name, e
                ))
            })?;

        if params != requested {
            debug!(requested = %requested, opened = %params, "Encoder coerced parameters");
        }
        debug!(
            codec = %self.codec.name,
            params = %params,
            frame_size = context.frame_size(),
            bit_rate,
            "Encoder opened"
        );

        self.frame_size = context.frame_size();
        self.params = params;
        self.bit_rate = bit_rate;
        self.codec_data = Some(codec_data);
        self.context = Some(context);
        Ok(())
    }

    /// Encode one frame of any size and layout.
    ///
    /// Returns the packets for every complete block now available, which may
    /// be none. On an engine failure the block it failed on and every sample
    /// after it stay buffered, and packets encoded before it are returned by
    /// the next successful call.
    pub fn encode(&mut self, frame: &AudioFrame) -> Result<Vec<EncodedPacket>> {
        self.setup()?;

        let frame = if frame.params() != self.params {
            let resampler = self
                .resampler
                .get_or_insert_with(|| Resampler::new(self.engine.clone(), self.params));
            resampler.resample(frame)?
        } else if let Some(resampler) = self.resampler.as_mut() {
            // Input is back on the target layout; samples still inside the
            // resampler go first
            let tail = resampler.flush()?;
            if let Some(resampler) = self.resampler.take() {
                resampler.close();
            }
            match tail {
                Some(tail) => tail.concat(frame)?,
                None => frame.clone(),
            }
        } else {
            frame.clone()
        };

        self.push(frame)
    }

    fn push(&mut self, frame: AudioFrame) -> Result<Vec<EncodedPacket>> {
        let mut packets = std::mem::take(&mut self.pending);
        match self.push_blocks(frame, &mut packets) {
            Ok(()) => Ok(packets),
            Err(e) => {
                // Packets already produced go out with the next call
                self.pending = packets;
                Err(e)
            }
        }
    }

    fn push_blocks(&mut self, frame: AudioFrame, packets: &mut Vec<EncodedPacket>) -> Result<()> {
        let buffered = match self.framebuf.as_ref() {
            Some(buf) => buf.concat(&frame)?,
            None => frame,
        };
        // Variable block codecs take everything buffered at once
        let block_size = match self.frame_size {
            0 => buffered.sample_count(),
            size => size,
        };

        let mut offset = 0;
        let mut result = Ok(());
        while block_size > 0 && buffered.sample_count() - offset >= block_size {
            let block = buffered.slice(offset, offset + block_size)?;
            match self.encode_block(&block) {
                Ok(packet) => {
                    packets.extend(packet);
                    offset += block_size;
                }
                Err(e) => {
                    result = Err(e);
                    break;
                }
            }
        }
        self.keep_remainder(&buffered, offset)?;
        result
    }

    fn keep_remainder(&mut self, buffered: &AudioFrame, offset: usize) -> Result<()> {
        let total = buffered.sample_count();
        self.framebuf = if offset < total {
            Some(buffered.slice(offset, total)?)
        } else {
            None
        };
        Ok(())
    }

    fn encode_block(&mut self, block: &AudioFrame) -> Result<Option<EncodedPacket>> {
        let Some(context) = self.context.as_mut() else {
            return Err(TranscodeError::Setup(format!(
                "Encoder {} is not open",
                self.codec.name
            )));
        };

        let data = context.encode(&native_frame(block)).map_err(|e| {
            TranscodeError::Conversion(format!(
                "Encoder {} failed on {} samples: {}",
                self.codec.name,
                block.sample_count(),
                e
            ))
        })?;

        trace!(
            samples = block.sample_count(),
            bytes = data.as_ref().map_or(0, Vec::len),
            "Encoded block"
        );
        self.last_block = block.sample_count();
        Ok(data.map(|data| EncodedPacket::new(data, block.sample_count(), self.params.sample_rate)))
    }

    /// End the stream: drain the resampler, encode the partial block still
    /// buffered and collect whatever the codec held back.
    ///
    /// A failed flush leaves every buffered sample and undelivered packet in
    /// place for another attempt. Packets the codec held back are credited
    /// with one block of samples, or with the last block's size when the
    /// codec takes any size. The codec cannot take more frames afterwards.
    pub fn flush(&mut self) -> Result<Vec<EncodedPacket>> {
        if self.context.is_none() {
            return Ok(Vec::new());
        }

        if let Some(resampler) = self.resampler.as_mut() {
            let tail = resampler.flush()?;
            if let Some(resampler) = self.resampler.take() {
                resampler.close();
            }
            if let Some(tail) = tail {
                self.pending = self.push(tail)?;
            }
        }

        if let Some(rest) = self.framebuf.clone() {
            let packet = self.encode_block(&rest)?;
            self.framebuf = None;
            self.pending.extend(packet);
        }

        let block_samples = match self.frame_size {
            0 => self.last_block,
            size => size,
        };
        let sample_rate = self.params.sample_rate;
        if let Some(context) = self.context.as_mut() {
            let drained = context.finish().map_err(|e| {
                TranscodeError::Conversion(format!(
                    "Failed to drain encoder {}: {}",
                    self.codec.name, e
                ))
            })?;
            self.pending.extend(
                drained
                    .into_iter()
                    .map(|data| EncodedPacket::new(data, block_samples, sample_rate)),
            );
        }

        let packets = std::mem::take(&mut self.pending);
        debug!(codec = %self.codec.name, packets = packets.len(), "Encoder flushed");
        Ok(packets)
    }

    /// Side data for building a matching decoder; `None` before setup.
    pub fn codec_data(&self) -> Option<&CodecData> {
        self.codec_data.as_ref()
    }

    pub fn frame_size(&self) -> usize {
        self.frame_size
    }

    pub fn params(&self) -> AudioParams {
        self.params
    }

    pub fn bit_rate(&self) -> u64 {
        self.bit_rate
    }

    /// Samples waiting for a complete block.
    pub fn buffered_samples(&self) -> usize {
        self.framebuf.as_ref().map_or(0, AudioFrame::sample_count)
    }

    pub fn codec(&self) -> &CodecHandle {
        &self.codec
    }

    pub fn is_open(&self) -> bool {
        self.context.is_some()
    }

    /// Release the codec and resampler. Buffered samples are discarded.
    pub fn close(mut self) {
        if let Some(resampler) = self.resampler.take() {
            resampler.close();
        }
        debug!(
            codec = %self.codec.name,
            discarded = self.buffered_samples(),
            "Encoder closed"
        );
    }
}
