//! Audio frames
//!
//! A frame is a block of samples plus the three parameters that define how
//! its bytes are laid out. Frames are immutable; `concat` and `slice` build
//! new frames, and slicing shares the underlying buffers.

use bytes::{Bytes, BytesMut};
use std::fmt;
use std::time::Duration;

use super::{ChannelLayout, SampleFormat};
use crate::error::{Result, TranscodeError};

/// The `(format, layout, rate)` triple describing a frame's layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioParams {
    pub sample_format: SampleFormat,
    pub channel_layout: ChannelLayout,
    pub sample_rate: u32,
}

impl AudioParams {
    pub fn new(sample_format: SampleFormat, channel_layout: ChannelLayout, sample_rate: u32) -> Self {
        Self {
            sample_format,
            channel_layout,
            sample_rate,
        }
    }

    pub fn channels(&self) -> usize {
        self.channel_layout.count()
    }

    pub fn plane_count(&self) -> usize {
        self.sample_format.plane_count(self.channels())
    }

    pub fn plane_size(&self, samples: usize) -> usize {
        self.sample_format.plane_size(samples, self.channels())
    }
}

impl fmt::Display for AudioParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}Hz",
            self.sample_format, self.channel_layout, self.sample_rate
        )
    }
}

/// A block of audio samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioFrame {
    params: AudioParams,
    samples: usize,
    planes: Vec<Bytes>,
}

impl AudioFrame {
    /// Build a frame, checking that every plane holds exactly `samples`
    /// samples for the given parameters.
    pub fn new(params: AudioParams, samples: usize, planes: Vec<Bytes>) -> Result<Self> {
        let expected_planes = params.plane_count();
        if planes.len() != expected_planes {
            return Err(TranscodeError::InvalidFrame(format!(
                "{} expects {} planes, got {}",
                params,
                expected_planes,
                planes.len()
            )));
        }
        let expected_size = params.plane_size(samples);
        if let Some((index, plane)) = planes
            .iter()
            .enumerate()
            .find(|(_, plane)| plane.len() != expected_size)
        {
            return Err(TranscodeError::InvalidFrame(format!(
                "plane {} is {} bytes, expected {} for {} samples of {}",
                index,
                plane.len(),
                expected_size,
                samples,
                params
            )));
        }
        Ok(Self {
            params,
            samples,
            planes,
        })
    }

    /// A frame of `samples` silent samples.
    pub fn silence(params: AudioParams, samples: usize) -> Self {
        // unsigned 8-bit audio is centred on 0x80
        let fill = match params.sample_format {
            SampleFormat::U8 | SampleFormat::U8P => 0x80,
            _ => 0,
        };
        let plane = Bytes::from(vec![fill; params.plane_size(samples)]);
        Self {
            params,
            samples,
            planes: vec![plane; params.plane_count()],
        }
    }

    /// A frame holding no samples.
    pub fn empty(params: AudioParams) -> Self {
        Self {
            params,
            samples: 0,
            planes: vec![Bytes::new(); params.plane_count()],
        }
    }

    pub fn params(&self) -> AudioParams {
        self.params
    }

    pub fn sample_format(&self) -> SampleFormat {
        self.params.sample_format
    }

    pub fn channel_layout(&self) -> ChannelLayout {
        self.params.channel_layout
    }

    pub fn sample_rate(&self) -> u32 {
        self.params.sample_rate
    }

    /// Samples per channel.
    pub fn sample_count(&self) -> usize {
        self.samples
    }

    pub fn is_empty(&self) -> bool {
        self.samples == 0
    }

    pub fn planes(&self) -> &[Bytes] {
        &self.planes
    }

    pub fn plane(&self, index: usize) -> Option<&Bytes> {
        self.planes.get(index)
    }

    /// Playback duration at the frame's sample rate.
    pub fn duration(&self) -> Duration {
        if self.params.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples as f64 / self.params.sample_rate as f64)
    }

    /// Append `other` after `self`.
    pub fn concat(&self, other: &AudioFrame) -> Result<AudioFrame> {
        if self.params != other.params {
            return Err(TranscodeError::FrameMismatch(format!(
                "cannot concat {} with {}",
                self.params, other.params
            )));
        }
        let planes = self
            .planes
            .iter()
            .zip(&other.planes)
            .map(|(a, b)| {
                let mut joined = BytesMut::with_capacity(a.len() + b.len());
                joined.extend_from_slice(a);
                joined.extend_from_slice(b);
                joined.freeze()
            })
            .collect();
        Ok(AudioFrame {
            params: self.params,
            samples: self.samples + other.samples,
            planes,
        })
    }

    /// Samples `[start, end)` as a new frame sharing this frame's buffers.
    pub fn slice(&self, start: usize, end: usize) -> Result<AudioFrame> {
        if start > end || end > self.samples {
            return Err(TranscodeError::InvalidFrame(format!(
                "slice {}..{} out of range for {} samples",
                start, end, self.samples
            )));
        }
        let stride = self
            .params
            .sample_format
            .plane_stride(self.params.channels());
        let planes = self
            .planes
            .iter()
            .map(|plane| plane.slice(start * stride..end * stride))
            .collect();
        Ok(AudioFrame {
            params: self.params,
            samples: end - start,
            planes,
        })
    }
}
