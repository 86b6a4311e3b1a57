//! Sample format, channel layout and rate conversion
//!
//! The output parameters are fixed for the life of a [`Resampler`]; the input
//! parameters follow whatever the caller feeds it. When they change, the
//! samples the old engine context is still holding are drained and placed in
//! front of the first converted block, so no audio is lost across the switch.

use bytes::Bytes;
use tracing::{debug, trace};

use super::plane_views;
use crate::convert::audio_params_to_native;
use crate::engine::{CodecEngine, ResampleContext};
use crate::error::{Result, TranscodeError};
use crate::frame::{AudioFrame, AudioParams};

/// Converts frames of any layout into one fixed output layout
pub struct Resampler<E: CodecEngine> {
    engine: E,
    output: AudioParams,
    /// Parameters the live context was built for
    input: Option<AudioParams>,
    context: Option<E::Resampler>,
}

impl<E: CodecEngine> Resampler<E> {
    /// Create a resampler producing `output`. No engine context exists until
    /// the first frame arrives.
    pub fn new(engine: E, output: AudioParams) -> Self {
        Self {
            engine,
            output,
            input: None,
            context: None,
        }
    }

    pub fn output_params(&self) -> AudioParams {
        self.output
    }

    /// Input parameters of the live context, if any.
    pub fn input_params(&self) -> Option<AudioParams> {
        self.input
    }

    pub fn is_configured(&self) -> bool {
        self.context.is_some()
    }

    /// Convert one frame into the output parameters.
    ///
    /// If the frame's parameters differ from the previous frame's, the old
    /// context is drained first and its samples lead the returned frame.
    /// The result may hold fewer samples than the input when the engine
    /// keeps some back.
    pub fn resample(&mut self, frame: &AudioFrame) -> Result<AudioFrame> {
        let input = frame.params();

        let mut flushed = None;
        if self.input != Some(input) || self.context.is_none() {
            if let Some(context) = self.context.as_mut() {
                let drained = run(context, self.output, None, frame.sample_count())?;
                debug!(
                    from = ?self.input.map(|p| p.to_string()),
                    to = %input,
                    flushed = drained.sample_count(),
                    "Resampler input changed, drained old context"
                );
                flushed = Some(drained);
            }
            self.reconfigure(input)?;
        }

        let Some(context) = self.context.as_mut() else {
            return Err(TranscodeError::Setup("resampler has no context".into()));
        };
        let converted = run(context, self.output, Some(frame), frame.sample_count())?;
        trace!(
            input = frame.sample_count(),
            output = converted.sample_count(),
            "Resampled frame"
        );

        match flushed {
            Some(flush) if !flush.is_empty() => flush.concat(&converted),
            _ => Ok(converted),
        }
    }

    /// Drain samples still held by the context at end of stream.
    ///
    /// The context stays configured for the current input parameters.
    pub fn flush(&mut self) -> Result<Option<AudioFrame>> {
        let Some(context) = self.context.as_mut() else {
            return Ok(None);
        };
        let drained = run(context, self.output, None, 0)?;
        debug!(samples = drained.sample_count(), "Resampler flushed");
        Ok((!drained.is_empty()).then_some(drained))
    }

    /// Release the engine context.
    pub fn close(mut self) {
        if self.context.take().is_some() {
            debug!(output = %self.output, "Resampler closed");
        }
    }

    fn reconfigure(&mut self, input: AudioParams) -> Result<()> {
        // Release the old context before allocating its replacement
        self.context = None;
        self.input = None;

        let context = self
            .engine
            .alloc_resampler(
                &audio_params_to_native(&input),
                &audio_params_to_native(&self.output),
            )
            .map_err(|e| {
                TranscodeError::Setup(format!(
                    "Failed to create resampler {} -> {}: {}",
                    input, self.output, e
                ))
            })?;

        debug!(input = %input, output = %self.output, "Resampler configured");
        self.context = Some(context);
        self.input = Some(input);
        Ok(())
    }
}

impl<E: CodecEngine> Drop for Resampler<E> {
    fn drop(&mut self) {
        if self.context.take().is_some() {
            debug!(output = %self.output, "Resampler dropped without close, releasing context");
        }
    }
}

/// Run one convert call. `None` input drains the context; `hint` is the
/// input sample count used to size the output in that case.
fn run<R: ResampleContext>(
    context: &mut R,
    output: AudioParams,
    input: Option<&AudioFrame>,
    hint: usize,
) -> Result<AudioFrame> {
    let capacity = context.max_output_samples(hint);
    if capacity == 0 && input.is_none() {
        return Ok(AudioFrame::empty(output));
    }

    let mut buffers = vec![vec![0u8; output.plane_size(capacity)]; output.plane_count()];
    let status = {
        let mut views: Vec<&mut [u8]> = buffers.iter_mut().map(|b| b.as_mut_slice()).collect();
        match input {
            Some(frame) => {
                let planes = plane_views(frame);
                context.convert(
                    &mut views,
                    capacity,
                    Some((planes.as_slice(), frame.sample_count())),
                )
            }
            None => context.convert(&mut views, capacity, None),
        }
    };
    let produced = status.map_err(|e| {
        TranscodeError::Conversion(format!("Resampling to {} failed: {}", output, e))
    })?;
    if produced > capacity {
        return Err(TranscodeError::Conversion(format!(
            "Resampler wrote {} samples into room for {}",
            produced, capacity
        )));
    }

    // Fewer samples than capacity is normal; keep only what was written
    let used = output.plane_size(produced);
    let planes = buffers
        .into_iter()
        .map(|mut buffer| {
            buffer.truncate(used);
            Bytes::from(buffer)
        })
        .collect();
    AudioFrame::new(output, produced, planes)
}
