//! Decoder lifecycle tests

#[cfg(test)]
mod tests {
    use crate::codec_data::{AacCodecData, CodecData};
    use crate::error::TranscodeError;
    use crate::frame::{ChannelLayout, SampleFormat};
    use crate::tests::fixtures::MockEngine;
    use crate::transcode::{AudioDecoder, AudioEncoder};

    fn aac_stereo_44k() -> CodecData {
        CodecData::Aac(AacCodecData::from_config_bytes(vec![0x12, 0x10]).unwrap())
    }

    #[test]
    fn test_first_decode_opens_once() {
        let engine = MockEngine::new();
        let mut decoder = AudioDecoder::new(engine.clone(), &aac_stereo_44k()).unwrap();
        assert!(!decoder.is_open());
        assert_eq!(engine.state().decoder_opens, 0);

        let frame = decoder.decode(&[1, 2, 3, 4]).unwrap().unwrap();
        assert_eq!(frame.sample_count(), 4);
        assert_eq!(engine.state().decoder_opens, 1);

        decoder.decode(&[5, 6]).unwrap();
        assert_eq!(engine.state().decoder_opens, 1);
        assert_eq!(engine.state().decode_calls, 2);
    }

    #[test]
    fn test_frames_use_configured_rate() {
        let engine = MockEngine::new();
        let mut decoder = AudioDecoder::new(engine, &aac_stereo_44k()).unwrap();

        let frame = decoder.decode(&[9; 10]).unwrap().unwrap();
        // the engine reports 44107 Hz
        assert_eq!(frame.sample_rate(), 44100);
        assert_eq!(frame.sample_format(), SampleFormat::FltP);
        assert_eq!(frame.channel_layout(), ChannelLayout::STEREO);
    }

    #[test]
    fn test_padding_is_trimmed() {
        let mut decoder = AudioDecoder::new(MockEngine::new(), &aac_stereo_44k()).unwrap();

        let frame = decoder.decode(&[7, 8]).unwrap().unwrap();
        assert_eq!(frame.planes().len(), 2);
        for plane in frame.planes() {
            assert_eq!(&plane[..], &[7, 7, 7, 7, 8, 8, 8, 8]);
        }
    }

    #[test]
    fn test_failed_open_is_fatal() {
        let engine = MockEngine::new();
        engine.state_mut().fail_decoder_open = true;
        let mut decoder = AudioDecoder::new(engine.clone(), &aac_stereo_44k()).unwrap();

        let err = decoder.decode(&[1]).unwrap_err();
        assert!(err.is_setup_failure());

        engine.state_mut().fail_decoder_open = false;
        let err = decoder.decode(&[1]).unwrap_err();
        assert!(matches!(err, TranscodeError::Setup(_)));
        assert_eq!(engine.state().decoder_opens, 0);
        assert_eq!(engine.state().decode_calls, 0);
    }

    #[test]
    fn test_corrupt_packet_affects_one_call() {
        let mut decoder = AudioDecoder::new(MockEngine::new(), &aac_stereo_44k()).unwrap();

        let err = decoder.decode(&[0xFF, 0]).unwrap_err();
        assert!(err.is_conversion_failure());
        assert!(decoder.decode(&[1, 2]).unwrap().is_some());
    }

    #[test]
    fn test_encoder_codec_data_builds_decoder() {
        let engine = MockEngine::new();
        let mut encoder = AudioEncoder::by_name(engine.clone(), "aac").unwrap();
        encoder.set_sample_rate(48000).unwrap();
        encoder.setup().unwrap();

        let codec_data = encoder.codec_data().unwrap().clone();
        let mut decoder = AudioDecoder::new(engine.clone(), &codec_data).unwrap();
        decoder.setup().unwrap();

        assert_eq!(decoder.params().sample_rate, 48000);
        assert_eq!(decoder.params().channel_layout, ChannelLayout::STEREO);
        let declared = engine.state().last_decoder_params.clone().unwrap();
        assert_eq!(declared.extradata, codec_data.extradata().to_vec());

        decoder.close();
        encoder.close();
    }
}
