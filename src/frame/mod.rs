//! Audio frame and codec-parameter model
//!
//! - Sample formats and channel layouts
//! - Frames with zero-copy slicing and concatenation
//! - Encoded packets

mod audio;
mod format;
mod layout;
mod packet;

pub use audio::{AudioFrame, AudioParams};
pub use format::SampleFormat;
pub use layout::ChannelLayout;
pub use packet::EncodedPacket;
