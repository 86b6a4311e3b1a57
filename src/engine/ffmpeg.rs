//! FFmpeg codec engine
//!
//! Implements [`CodecEngine`] over `ffmpeg-next`: send/receive codec API for
//! encoding and decoding, `libswresample` for conversion. Native values use
//! FFmpeg's own numbering, so sample format codes and channel masks pass
//! through unchanged.

use ffmpeg_next as ffmpeg;
use ffmpeg_next::codec;
use ffmpeg_next::software::resampling;
use ffmpeg_next::util::channel_layout::ChannelLayout;
use ffmpeg_next::util::format::sample::{Sample, Type};
use std::ops::Deref;

use super::native::*;
use super::{
    CodecEngine, CodecHandle, CodecQuery, DecodedFrame, DecoderContext, DecoderParams,
    EncoderContext, EncoderParams, MediaType, NativeFrame, NativeParams, ResampleContext,
};
use crate::codec_data::CodecId;
use crate::error::EngineError;

/// `AVERROR(EINVAL)`
const AVERROR_EINVAL: i32 = -22;

/// Handle to the process-wide FFmpeg libraries
#[derive(Debug, Clone, Copy)]
pub struct FfmpegEngine {
    _private: (),
}

impl FfmpegEngine {
    /// Initialise FFmpeg. Safe to call more than once.
    pub fn new() -> Result<Self, EngineError> {
        ffmpeg::init().map_err(|e| EngineError::Other(format!("FFmpeg init failed: {}", e)))?;
        // Only warnings and errors from the codec libraries
        unsafe {
            ffmpeg::ffi::av_log_set_level(ffmpeg::ffi::AV_LOG_WARNING as i32);
        }
        tracing::debug!("FFmpeg engine initialised");
        Ok(Self { _private: () })
    }
}

impl CodecEngine for FfmpegEngine {
    type Encoder = FfmpegEncoder;
    type Decoder = FfmpegDecoder;
    type Resampler = FfmpegResampler;

    fn find_encoder(&self, query: CodecQuery<'_>) -> Option<CodecHandle> {
        let codec = match query {
            CodecQuery::Name(name) => codec::encoder::find_by_name(name),
            CodecQuery::Id(id) => codec::encoder::find(codec_id_to_ffmpeg(id)?),
        }?;
        Some(handle(&codec))
    }

    fn find_decoder(&self, query: CodecQuery<'_>) -> Option<CodecHandle> {
        let codec = match query {
            CodecQuery::Name(name) => codec::decoder::find_by_name(name),
            CodecQuery::Id(id) => codec::decoder::find(codec_id_to_ffmpeg(id)?),
        }?;
        Some(handle(&codec))
    }

    fn open_encoder(
        &self,
        handle: &CodecHandle,
        params: &EncoderParams,
    ) -> Result<FfmpegEncoder, EngineError> {
        let codec = codec::encoder::find_by_name(&handle.name)
            .ok_or_else(|| EngineError::CodecNotFound(handle.name.clone()))?;
        let format = sample_from_native(params.audio.sample_format)
            .ok_or_else(|| EngineError::CodecOpen(format!("{}: bad sample format", handle.name)))?;
        let rate = params.audio.sample_rate as i32;

        // Parameters must be set before open
        let mut context = codec::Context::new_with_codec(codec);
        context.set_time_base(ffmpeg::Rational::new(1, rate));

        let mut audio = context.encoder().audio().map_err(|e| {
            EngineError::CodecOpen(format!("{}: cannot get audio encoder: {}", handle.name, e))
        })?;
        audio.set_rate(rate);
        audio.set_format(format);
        audio.set_channel_layout(ChannelLayout::from_bits_truncate(params.audio.channel_layout));
        audio.set_bit_rate(params.bit_rate as usize);

        let encoder = audio
            .open_as(codec)
            .map_err(|e| EngineError::CodecOpen(format!("{}: {}", handle.name, e)))?;

        let opened = NativeParams {
            sample_format: sample_to_native(encoder.format()),
            channel_layout: encoder.channel_layout().bits(),
            channels: encoder.channels(),
            sample_rate: encoder.rate(),
        };
        let extradata = {
            let ctx: &codec::Context = encoder.deref();
            // SAFETY: the context is open and owns `extradata` for its lifetime;
            // the bytes are copied out before it can change.
            unsafe {
                let ptr = ctx.as_ptr();
                if (*ptr).extradata.is_null() || (*ptr).extradata_size <= 0 {
                    Vec::new()
                } else {
                    std::slice::from_raw_parts((*ptr).extradata, (*ptr).extradata_size as usize)
                        .to_vec()
                }
            }
        };

        Ok(FfmpegEncoder {
            frame_size: encoder.frame_size() as usize,
            encoder,
            codec_id: handle.id,
            opened,
            extradata,
            pts: 0,
        })
    }

    fn open_decoder(
        &self,
        handle: &CodecHandle,
        params: &DecoderParams,
    ) -> Result<FfmpegDecoder, EngineError> {
        let codec = codec::decoder::find_by_name(&handle.name)
            .ok_or_else(|| EngineError::CodecNotFound(handle.name.clone()))?;

        let mut context = codec::Context::new_with_codec(codec);
        // SAFETY: the context is not open yet, so these fields are ours to
        // set. Extradata is allocated with av_mallocz and padded as FFmpeg
        // requires; the context frees it on drop.
        unsafe {
            let ptr = context.as_mut_ptr();
            (*ptr).sample_rate = params.sample_rate as i32;
            if params.channel_layout != 0 {
                ffmpeg::ffi::av_channel_layout_from_mask(&mut (*ptr).ch_layout, params.channel_layout);
            } else if params.channels > 0 {
                ffmpeg::ffi::av_channel_layout_default(&mut (*ptr).ch_layout, i32::from(params.channels));
            }
            if !params.extradata.is_empty() {
                let size = params.extradata.len();
                let buf = ffmpeg::ffi::av_mallocz(size + ffmpeg::ffi::AV_INPUT_BUFFER_PADDING_SIZE as usize)
                    as *mut u8;
                if buf.is_null() {
                    return Err(EngineError::CodecOpen(format!(
                        "{}: cannot allocate extradata",
                        handle.name
                    )));
                }
                std::ptr::copy_nonoverlapping(params.extradata.as_ptr(), buf, size);
                (*ptr).extradata = buf;
                (*ptr).extradata_size = size as i32;
            }
        }

        let decoder = context
            .decoder()
            .audio()
            .map_err(|e| EngineError::CodecOpen(format!("{}: {}", handle.name, e)))?;

        let opened = NativeParams {
            sample_format: sample_to_native(decoder.format()),
            channel_layout: decoder.channel_layout().bits(),
            channels: decoder.channels(),
            sample_rate: decoder.rate(),
        };
        Ok(FfmpegDecoder { decoder, opened })
    }

    fn alloc_resampler(
        &self,
        input: &NativeParams,
        output: &NativeParams,
    ) -> Result<FfmpegResampler, EngineError> {
        let in_format = sample_from_native(input.sample_format)
            .ok_or_else(|| EngineError::ResamplerCreate(format!("bad input format {}", input.sample_format)))?;
        let out_format = sample_from_native(output.sample_format)
            .ok_or_else(|| EngineError::ResamplerCreate(format!("bad output format {}", output.sample_format)))?;

        let context = resampling::Context::get(
            in_format,
            ChannelLayout::from_bits_truncate(input.channel_layout),
            input.sample_rate,
            out_format,
            ChannelLayout::from_bits_truncate(output.channel_layout),
            output.sample_rate,
        )
        .map_err(|e| EngineError::ResamplerCreate(e.to_string()))?;

        Ok(FfmpegResampler { context })
    }
}

pub struct FfmpegEncoder {
    encoder: ffmpeg::encoder::Audio,
    codec_id: CodecId,
    opened: NativeParams,
    frame_size: usize,
    extradata: Vec<u8>,
    pts: i64,
}

impl FfmpegEncoder {
    /// Receive one packet, or `None` if the encoder needs more input.
    fn receive(&mut self) -> Result<Option<Vec<u8>>, EngineError> {
        let mut packet = ffmpeg::codec::packet::Packet::empty();
        match self.encoder.receive_packet(&mut packet) {
            Ok(()) => Ok(Some(packet.data().map(<[u8]>::to_vec).unwrap_or_default())),
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => Ok(None),
            Err(ffmpeg::Error::Eof) => Ok(None),
            Err(e) => Err(EngineError::EncodeFrame(i32::from(e))),
        }
    }
}

impl EncoderContext for FfmpegEncoder {
    fn opened(&self) -> NativeParams {
        self.opened
    }

    fn frame_size(&self) -> usize {
        self.frame_size
    }

    fn extradata(&self) -> &[u8] {
        &self.extradata
    }

    fn codec_id(&self) -> CodecId {
        self.codec_id
    }

    fn encode(&mut self, frame: &NativeFrame<'_>) -> Result<Option<Vec<u8>>, EngineError> {
        let format = sample_from_native(frame.params.sample_format)
            .ok_or(EngineError::EncodeFrame(AVERROR_EINVAL))?;
        let mut av = ffmpeg::util::frame::Audio::new(
            format,
            frame.samples,
            ChannelLayout::from_bits_truncate(frame.params.channel_layout),
        );
        av.set_rate(frame.params.sample_rate);
        av.set_pts(Some(self.pts));
        for (index, plane) in frame.planes.iter().enumerate() {
            let target = audio_plane_data_mut(&mut av, index)
                .get_mut(..plane.len())
                .ok_or(EngineError::EncodeFrame(AVERROR_EINVAL))?;
            target.copy_from_slice(plane);
        }
        self.pts += frame.samples as i64;

        self.encoder
            .send_frame(&av)
            .map_err(|e| EngineError::EncodeFrame(i32::from(e)))?;
        self.receive()
    }

    fn finish(&mut self) -> Result<Vec<Vec<u8>>, EngineError> {
        self.encoder
            .send_eof()
            .map_err(|e| EngineError::EncodeFrame(i32::from(e)))?;
        let mut packets = Vec::new();
        while let Some(packet) = self.receive()? {
            packets.push(packet);
        }
        Ok(packets)
    }
}

pub struct FfmpegDecoder {
    decoder: ffmpeg::decoder::Audio,
    opened: NativeParams,
}

impl DecoderContext for FfmpegDecoder {
    fn opened(&self) -> NativeParams {
        self.opened
    }

    fn decode(&mut self, packet: &[u8]) -> Result<Option<DecodedFrame>, EngineError> {
        if packet.is_empty() {
            return Ok(None);
        }
        self.decoder
            .send_packet(&ffmpeg::codec::packet::Packet::copy(packet))
            .map_err(|e| EngineError::DecodePacket(i32::from(e)))?;

        let mut frame = ffmpeg::util::frame::Audio::empty();
        match self.decoder.receive_frame(&mut frame) {
            Ok(()) => {}
            Err(ffmpeg::Error::Other { errno }) if errno == ffmpeg::error::EAGAIN => return Ok(None),
            Err(ffmpeg::Error::Eof) => return Ok(None),
            Err(e) => return Err(EngineError::DecodePacket(i32::from(e))),
        }

        let channels = frame.channels();
        let plane_count = if frame.format().is_planar() {
            usize::from(channels)
        } else {
            1
        };
        Ok(Some(DecodedFrame {
            params: NativeParams {
                sample_format: sample_to_native(frame.format()),
                channel_layout: frame.channel_layout().bits(),
                channels,
                sample_rate: frame.rate(),
            },
            samples: frame.samples(),
            planes: (0..plane_count)
                .map(|index| audio_plane_data(&frame, index).to_vec())
                .collect(),
        }))
    }
}

pub struct FfmpegResampler {
    context: resampling::Context,
}

impl ResampleContext for FfmpegResampler {
    fn max_output_samples(&mut self, input_samples: usize) -> usize {
        // SAFETY: the context is initialised for as long as `self` lives.
        let samples = unsafe {
            ffmpeg::ffi::swr_get_out_samples(self.context.as_mut_ptr(), input_samples as i32)
        };
        samples.max(0) as usize
    }

    fn convert(
        &mut self,
        output: &mut [&mut [u8]],
        output_capacity: usize,
        input: Option<(&[&[u8]], usize)>,
    ) -> Result<usize, EngineError> {
        let mut out_ptrs: Vec<*mut u8> = output.iter_mut().map(|plane| plane.as_mut_ptr()).collect();
        let (mut in_ptrs, in_count): (Vec<*const u8>, i32) = match input {
            Some((planes, samples)) => (planes.iter().map(|p| p.as_ptr()).collect(), samples as i32),
            None => (Vec::new(), 0),
        };
        let in_arg = if in_ptrs.is_empty() {
            std::ptr::null_mut()
        } else {
            in_ptrs.as_mut_ptr()
        };

        // SAFETY: every output plane has room for `output_capacity` samples
        // and every input plane holds `in_count` samples; the pointer arrays
        // outlive the call.
        let produced = unsafe {
            ffmpeg::ffi::swr_convert(
                self.context.as_mut_ptr(),
                out_ptrs.as_mut_ptr(),
                output_capacity as i32,
                in_arg,
                in_count,
            )
        };
        if produced < 0 {
            return Err(EngineError::Resample(produced));
        }
        Ok(produced as usize)
    }
}

fn handle(codec: &codec::Codec) -> CodecHandle {
    CodecHandle {
        id: codec_id_from_ffmpeg(codec.id()),
        name: codec.name().to_string(),
        media_type: match codec.medium() {
            ffmpeg::media::Type::Audio => MediaType::Audio,
            ffmpeg::media::Type::Video => MediaType::Video,
            ffmpeg::media::Type::Subtitle => MediaType::Subtitle,
            _ => MediaType::Other,
        },
    }
}

fn codec_id_to_ffmpeg(id: CodecId) -> Option<codec::Id> {
    Some(match id {
        CodecId::Aac => codec::Id::AAC,
        CodecId::Mp3 => codec::Id::MP3,
        CodecId::Opus => codec::Id::OPUS,
        CodecId::Vorbis => codec::Id::VORBIS,
        CodecId::Flac => codec::Id::FLAC,
        CodecId::Ac3 => codec::Id::AC3,
        CodecId::PcmMulaw => codec::Id::PCM_MULAW,
        CodecId::PcmAlaw => codec::Id::PCM_ALAW,
        CodecId::PcmS16le => codec::Id::PCM_S16LE,
        CodecId::Native(_) => return None,
    })
}

fn codec_id_from_ffmpeg(id: codec::Id) -> CodecId {
    match id {
        codec::Id::AAC => CodecId::Aac,
        codec::Id::MP3 => CodecId::Mp3,
        codec::Id::OPUS => CodecId::Opus,
        codec::Id::VORBIS => CodecId::Vorbis,
        codec::Id::FLAC => CodecId::Flac,
        codec::Id::AC3 => CodecId::Ac3,
        codec::Id::PCM_MULAW => CodecId::PcmMulaw,
        codec::Id::PCM_ALAW => CodecId::PcmAlaw,
        codec::Id::PCM_S16LE => CodecId::PcmS16le,
        other => CodecId::Native(ffmpeg::ffi::AVCodecID::from(other) as u32),
    }
}

fn sample_from_native(format: NativeSampleFormat) -> Option<Sample> {
    Some(match format {
        SAMPLE_FMT_U8 => Sample::U8(Type::Packed),
        SAMPLE_FMT_S16 => Sample::I16(Type::Packed),
        SAMPLE_FMT_S32 => Sample::I32(Type::Packed),
        SAMPLE_FMT_FLT => Sample::F32(Type::Packed),
        SAMPLE_FMT_DBL => Sample::F64(Type::Packed),
        SAMPLE_FMT_U8P => Sample::U8(Type::Planar),
        SAMPLE_FMT_S16P => Sample::I16(Type::Planar),
        SAMPLE_FMT_S32P => Sample::I32(Type::Planar),
        SAMPLE_FMT_FLTP => Sample::F32(Type::Planar),
        SAMPLE_FMT_DBLP => Sample::F64(Type::Planar),
        SAMPLE_FMT_S64 => Sample::I64(Type::Packed),
        SAMPLE_FMT_S64P => Sample::I64(Type::Planar),
        _ => return None,
    })
}

fn sample_to_native(format: Sample) -> NativeSampleFormat {
    match format {
        Sample::U8(Type::Packed) => SAMPLE_FMT_U8,
        Sample::I16(Type::Packed) => SAMPLE_FMT_S16,
        Sample::I32(Type::Packed) => SAMPLE_FMT_S32,
        Sample::F32(Type::Packed) => SAMPLE_FMT_FLT,
        Sample::F64(Type::Packed) => SAMPLE_FMT_DBL,
        Sample::U8(Type::Planar) => SAMPLE_FMT_U8P,
        Sample::I16(Type::Planar) => SAMPLE_FMT_S16P,
        Sample::I32(Type::Planar) => SAMPLE_FMT_S32P,
        Sample::F32(Type::Planar) => SAMPLE_FMT_FLTP,
        Sample::F64(Type::Planar) => SAMPLE_FMT_DBLP,
        Sample::I64(Type::Packed) => SAMPLE_FMT_S64,
        Sample::I64(Type::Planar) => SAMPLE_FMT_S64P,
        Sample::None => SAMPLE_FMT_NONE,
    }
}

/// Extract an audio plane from an `AVFrame`.
///
/// `Audio::data(index)` stops counting planes when `linesize[1] == 0`, but
/// planar audio frames usually only set `linesize[0]` for every plane.
fn audio_plane_data(frame: &ffmpeg::util::frame::Audio, index: usize) -> &[u8] {
    let planes = if frame.format().is_planar() {
        usize::from(frame.channels())
    } else {
        1
    };
    if index >= planes {
        return &[];
    }
    // SAFETY: `index` is within the frame's planes and each plane spans
    // `linesize[0]` bytes.
    unsafe {
        let f = frame.as_ptr();
        let ptrs = (*f).extended_data;
        if ptrs.is_null() {
            return &[];
        }
        let plane = *ptrs.add(index);
        if plane.is_null() {
            return &[];
        }
        std::slice::from_raw_parts(plane, (*f).linesize[0] as usize)
    }
}

fn audio_plane_data_mut(frame: &mut ffmpeg::util::frame::Audio, index: usize) -> &mut [u8] {
    let planes = if frame.format().is_planar() {
        usize::from(frame.channels())
    } else {
        1
    };
    if index >= planes {
        return &mut [];
    }
    // SAFETY: as for `audio_plane_data`.
    unsafe {
        let f = frame.as_mut_ptr();
        let ptrs = (*f).extended_data;
        if ptrs.is_null() {
            return &mut [];
        }
        let plane = *ptrs.add(index);
        if plane.is_null() {
            return &mut [];
        }
        std::slice::from_raw_parts_mut(plane, (*f).linesize[0] as usize)
    }
}
