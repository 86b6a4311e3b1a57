//! Pipeline tests
//!
//! End-to-end behaviour of the transcoding layer over a scripted engine:
//! - Block slicing and sample conservation in the encoder
//! - Resampler reconfiguration and flush ordering
//! - Decoder lifecycle

pub mod decoder_lifecycle;
pub mod encoder_pipeline;
