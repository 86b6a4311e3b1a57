//! Audio transcoding orchestration
//!
//! Stateful logic layered over the codec engine:
//! - Resampling with flush on input format changes
//! - Re-slicing arbitrary input into the encoder's fixed frame size
//! - Decoding packets back into frames

pub mod decoder;
pub mod encoder;
pub mod resampler;

pub use decoder::AudioDecoder;
pub use encoder::AudioEncoder;
pub use resampler::Resampler;

use crate::convert::audio_params_to_native;
use crate::engine::NativeFrame;
use crate::frame::AudioFrame;

/// Borrowed byte views of a frame's planes.
pub(crate) fn plane_views(frame: &AudioFrame) -> Vec<&[u8]> {
    frame.planes().iter().map(|plane| &plane[..]).collect()
}

/// Describe a frame in the engine's numbering without copying samples.
pub(crate) fn native_frame(frame: &AudioFrame) -> NativeFrame<'_> {
    NativeFrame {
        params: audio_params_to_native(&frame.params()),
        samples: frame.sample_count(),
        planes: plane_views(frame),
    }
}
