//! Conversions between the crate's audio parameters and the engine's
//! numbering.
//!
//! All functions are pure. Channel masks are translated bit by bit: the two
//! numberings share no values, and bits without a counterpart on the other
//! side are dropped.

use crate::engine::native::*;
use crate::engine::NativeParams;
use crate::frame::{AudioParams, ChannelLayout, SampleFormat};

const LAYOUT_BITS: [(ChannelLayout, NativeChannelLayout); 9] = [
    (ChannelLayout::FRONT_CENTER, CH_FRONT_CENTER),
    (ChannelLayout::FRONT_LEFT, CH_FRONT_LEFT),
    (ChannelLayout::FRONT_RIGHT, CH_FRONT_RIGHT),
    (ChannelLayout::BACK_CENTER, CH_BACK_CENTER),
    (ChannelLayout::BACK_LEFT, CH_BACK_LEFT),
    (ChannelLayout::BACK_RIGHT, CH_BACK_RIGHT),
    (ChannelLayout::SIDE_LEFT, CH_SIDE_LEFT),
    (ChannelLayout::SIDE_RIGHT, CH_SIDE_RIGHT),
    (ChannelLayout::LOW_FREQ, CH_LOW_FREQUENCY),
];

pub fn sample_format_to_native(format: SampleFormat) -> NativeSampleFormat {
    match format {
        SampleFormat::U8 => SAMPLE_FMT_U8,
        SampleFormat::S16 => SAMPLE_FMT_S16,
        SampleFormat::S32 => SAMPLE_FMT_S32,
        SampleFormat::Flt => SAMPLE_FMT_FLT,
        SampleFormat::Dbl => SAMPLE_FMT_DBL,
        SampleFormat::U8P => SAMPLE_FMT_U8P,
        SampleFormat::S16P => SAMPLE_FMT_S16P,
        SampleFormat::S32P => SAMPLE_FMT_S32P,
        SampleFormat::FltP => SAMPLE_FMT_FLTP,
        SampleFormat::DblP => SAMPLE_FMT_DBLP,
    }
}

/// `None` for codes with no internal equivalent (`SAMPLE_FMT_NONE`, 64-bit
/// integer formats, anything newer).
pub fn sample_format_from_native(format: NativeSampleFormat) -> Option<SampleFormat> {
    match format {
        SAMPLE_FMT_U8 => Some(SampleFormat::U8),
        SAMPLE_FMT_S16 => Some(SampleFormat::S16),
        SAMPLE_FMT_S32 => Some(SampleFormat::S32),
        SAMPLE_FMT_FLT => Some(SampleFormat::Flt),
        SAMPLE_FMT_DBL => Some(SampleFormat::Dbl),
        SAMPLE_FMT_U8P => Some(SampleFormat::U8P),
        SAMPLE_FMT_S16P => Some(SampleFormat::S16P),
        SAMPLE_FMT_S32P => Some(SampleFormat::S32P),
        SAMPLE_FMT_FLTP => Some(SampleFormat::FltP),
        SAMPLE_FMT_DBLP => Some(SampleFormat::DblP),
        _ => None,
    }
}

pub fn channel_layout_to_native(layout: ChannelLayout) -> NativeChannelLayout {
    LAYOUT_BITS
        .iter()
        .filter(|(internal, _)| layout.contains(*internal))
        .fold(0, |mask, (_, native)| mask | native)
}

pub fn channel_layout_from_native(mask: NativeChannelLayout) -> ChannelLayout {
    LAYOUT_BITS
        .iter()
        .filter(|(_, native)| mask & native != 0)
        .fold(ChannelLayout::empty(), |layout, (internal, _)| layout | *internal)
}

pub fn audio_params_to_native(params: &AudioParams) -> NativeParams {
    NativeParams {
        sample_format: sample_format_to_native(params.sample_format),
        channel_layout: channel_layout_to_native(params.channel_layout),
        channels: params.channels() as u16,
        sample_rate: params.sample_rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_format_round_trip() {
        for format in SampleFormat::ALL {
            let native = sample_format_to_native(format);
            assert_eq!(sample_format_from_native(native), Some(format), "{}", format);
        }
    }

    #[test]
    fn test_sample_format_table_is_injective() {
        let mut codes: Vec<_> = SampleFormat::ALL
            .iter()
            .map(|f| sample_format_to_native(*f))
            .collect();
        codes.sort();
        codes.dedup();
        assert_eq!(codes.len(), SampleFormat::ALL.len());
    }

    #[test]
    fn test_unknown_native_sample_format() {
        assert_eq!(sample_format_from_native(SAMPLE_FMT_NONE), None);
        assert_eq!(sample_format_from_native(SAMPLE_FMT_S64), None);
        assert_eq!(sample_format_from_native(SAMPLE_FMT_S64P), None);
        assert_eq!(sample_format_from_native(42), None);
    }

    #[test]
    fn test_stereo_round_trip() {
        let stereo = ChannelLayout::FRONT_LEFT | ChannelLayout::FRONT_RIGHT;
        let native = channel_layout_to_native(stereo);
        assert_eq!(native, CH_LAYOUT_STEREO);
        assert_eq!(channel_layout_from_native(native), stereo);
    }

    #[test]
    fn test_every_speaker_subset_round_trips() {
        for bits in 0u16..(1 << ChannelLayout::SPEAKERS.len()) {
            let layout = ChannelLayout::from_bits(bits);
            let native = channel_layout_to_native(layout);
            assert_eq!(native.count_ones() as usize, layout.count());
            assert_eq!(channel_layout_from_native(native), layout);
        }
    }

    #[test]
    fn test_numbering_differs() {
        // same speakers, different bit values
        assert_ne!(
            ChannelLayout::FRONT_CENTER.bits() as u64,
            channel_layout_to_native(ChannelLayout::FRONT_CENTER)
        );
        assert_eq!(channel_layout_to_native(ChannelLayout::LOW_FREQ), CH_LOW_FREQUENCY);
    }

    #[test]
    fn test_unmapped_bits_are_dropped() {
        let layout = ChannelLayout::from_bits(ChannelLayout::STEREO.bits() | (1 << 12));
        assert_eq!(channel_layout_to_native(layout), CH_LAYOUT_STEREO);

        let native = CH_FRONT_CENTER | CH_TOP_CENTER | CH_FRONT_LEFT_OF_CENTER;
        assert_eq!(channel_layout_from_native(native), ChannelLayout::MONO);
    }

    #[test]
    fn test_audio_params_to_native() {
        let params = AudioParams::new(SampleFormat::FltP, ChannelLayout::LAYOUT_5POINT1, 48000);
        let native = audio_params_to_native(&params);
        assert_eq!(native.sample_format, SAMPLE_FMT_FLTP);
        assert_eq!(native.channels, 6);
        assert_eq!(native.sample_rate, 48000);
        assert_eq!(
            native.channel_layout,
            CH_FRONT_LEFT
                | CH_FRONT_RIGHT
                | CH_FRONT_CENTER
                | CH_LOW_FREQUENCY
                | CH_SIDE_LEFT
                | CH_SIDE_RIGHT
        );
    }
}
