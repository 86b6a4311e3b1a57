//! Encoder block slicing and error recovery tests

#[cfg(test)]
mod tests {
    use crate::engine::native::SAMPLE_FMT_S16;
    use crate::frame::{AudioFrame, AudioParams, ChannelLayout, SampleFormat};
    use crate::tests::fixtures::{ramp, ramp_indices, MockEngine};
    use crate::transcode::AudioEncoder;
    use std::time::Duration;

    fn target() -> AudioParams {
        AudioParams::new(SampleFormat::FltP, ChannelLayout::STEREO, 44100)
    }

    fn aac(engine: &MockEngine) -> AudioEncoder<MockEngine> {
        AudioEncoder::by_name(engine.clone(), "aac").unwrap()
    }

    #[test]
    fn test_three_short_frames_make_one_block() {
        let engine = MockEngine::new();
        let mut encoder = aac(&engine);

        let packets = encoder.encode(&ramp(target(), 0, 500)).unwrap();
        assert!(packets.is_empty());
        assert_eq!(encoder.buffered_samples(), 500);

        let packets = encoder.encode(&ramp(target(), 500, 500)).unwrap();
        assert!(packets.is_empty());
        assert_eq!(encoder.buffered_samples(), 1000);

        let packets = encoder.encode(&ramp(target(), 1000, 500)).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].samples, 1024);
        assert_eq!(
            packets[0].duration,
            Duration::from_secs_f64(1024.0 / 44100.0)
        );
        assert_eq!(encoder.buffered_samples(), 476);

        let state = engine.state();
        assert_eq!(state.encoded.len(), 1);
        let indices = ramp_indices(&state.encoded[0].planes[0], 4);
        assert_eq!(indices, (0..1024).collect::<Vec<u64>>());
    }

    #[test]
    fn test_samples_are_conserved_in_order() {
        let engine = MockEngine::new();
        let mut encoder = aac(&engine);

        let mut next = 0;
        for size in [100, 3000, 7, 1024, 999, 1, 2048] {
            encoder.encode(&ramp(target(), next, size)).unwrap();
            assert!(encoder.buffered_samples() < 1024);
            next += size;
        }
        encoder.flush().unwrap();

        let state = engine.state();
        let (last, full) = state.encoded.split_last().unwrap();
        assert!(full.iter().all(|block| block.samples == 1024));
        assert!(last.samples <= 1024);

        let indices: Vec<u64> = state
            .encoded
            .iter()
            .flat_map(|block| ramp_indices(&block.planes[1], 4))
            .collect();
        assert_eq!(indices, (0..next as u64).collect::<Vec<u64>>());
    }

    #[test]
    fn test_large_frame_yields_several_blocks() {
        let engine = MockEngine::new();
        let mut encoder = aac(&engine);

        let packets = encoder.encode(&ramp(target(), 0, 5000)).unwrap();
        assert_eq!(packets.len(), 4);
        assert!(packets.iter().all(|p| p.samples == 1024));
        assert_eq!(encoder.buffered_samples(), 5000 - 4 * 1024);
    }

    #[test]
    fn test_failed_block_is_retried_on_next_call() {
        let engine = MockEngine::new();
        engine.state_mut().fail_encode_at = Some(1);
        let mut encoder = aac(&engine);

        let err = encoder.encode(&ramp(target(), 0, 3000)).unwrap_err();
        assert!(err.is_conversion_failure());
        assert_eq!(encoder.buffered_samples(), 3000 - 1024);

        // the packet encoded before the failure is delivered now, followed
        // by the block that failed
        let packets = encoder.encode(&ramp(target(), 3000, 100)).unwrap();
        assert_eq!(packets.len(), 3);
        assert_eq!(packets[0].data[..4], [0, 0, 0, 0]);
        assert_eq!(ramp_indices(&packets[1].data[..4096], 4)[0], 1024);
        assert_eq!(encoder.buffered_samples(), 3100 - 3 * 1024);

        encoder.flush().unwrap();
        let state = engine.state();
        let indices: Vec<u64> = state
            .encoded
            .iter()
            .flat_map(|block| ramp_indices(&block.planes[0], 4))
            .collect();
        assert_eq!(indices, (0..3100).collect::<Vec<u64>>());
    }

    #[test]
    fn test_failed_flush_keeps_pending_packets_and_resampler() {
        let engine = MockEngine::new().with_latency(10);
        engine.state_mut().fail_encode_at = Some(1);
        let mut encoder = aac(&engine);
        let s16 = AudioParams::new(SampleFormat::S16, ChannelLayout::STEREO, 44100);

        assert!(encoder.encode(&AudioFrame::silence(s16, 3000)).is_err());
        assert_eq!(encoder.buffered_samples(), 2990 - 1024);

        engine.state_mut().fail_convert = true;
        assert!(encoder.flush().unwrap_err().is_conversion_failure());
        assert_eq!(engine.state().resamplers_live, 1);
        assert_eq!(encoder.buffered_samples(), 2990 - 1024);

        engine.state_mut().fail_convert = false;
        let packets = encoder.flush().unwrap();
        let samples: Vec<usize> = packets.iter().map(|p| p.samples).collect();
        assert_eq!(samples, vec![1024, 1024, 952]);
        assert_eq!(engine.state().resamplers_live, 0);
        assert_eq!(encoder.buffered_samples(), 0);
    }

    #[test]
    fn test_failed_tail_block_is_kept_for_next_flush() {
        let engine = MockEngine::new();
        let mut encoder = aac(&engine);

        let packets = encoder.encode(&ramp(target(), 0, 1500)).unwrap();
        assert_eq!(packets.len(), 1);

        engine.state_mut().fail_encode_at = Some(1);
        assert!(encoder.flush().is_err());
        assert_eq!(encoder.buffered_samples(), 476);

        let packets = encoder.flush().unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].samples, 476);
        assert_eq!(
            ramp_indices(&packets[0].data[..476 * 4], 4),
            (1024..1500).collect::<Vec<u64>>()
        );
    }

    #[test]
    fn test_mismatched_input_goes_through_resampler() {
        let engine = MockEngine::new();
        let mut encoder = aac(&engine);
        let s16_48k = AudioParams::new(SampleFormat::S16, ChannelLayout::STEREO, 48000);

        let packets = encoder.encode(&AudioFrame::silence(s16_48k, 2000)).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(encoder.buffered_samples(), 2000 - 1024);

        let state = engine.state();
        assert_eq!(state.resamplers_allocated, 1);
        // resampled samples carry the id of the first resampler context
        assert!(state.encoded[0].planes.iter().flatten().all(|b| *b == 1));
    }

    #[test]
    fn test_resampler_tail_precedes_matching_input() {
        let engine = MockEngine::new().with_latency(10);
        let mut encoder = aac(&engine);
        let s16 = AudioParams::new(SampleFormat::S16, ChannelLayout::STEREO, 44100);

        encoder.encode(&AudioFrame::silence(s16, 100)).unwrap();
        assert_eq!(encoder.buffered_samples(), 90);

        encoder.encode(&ramp(target(), 0, 50)).unwrap();
        assert_eq!(encoder.buffered_samples(), 150);
        assert_eq!(engine.state().resamplers_live, 0);

        encoder.flush().unwrap();
        let state = engine.state();
        let block = &state.encoded[0];
        assert_eq!(block.samples, 150);
        assert!(block.planes[0][..400].iter().all(|b| *b == 1));
        assert_eq!(
            ramp_indices(&block.planes[0][400..], 4),
            (0..50).collect::<Vec<u64>>()
        );
    }

    #[test]
    fn test_failed_drain_keeps_resampler_tail() {
        let engine = MockEngine::new().with_latency(10);
        let mut encoder = aac(&engine);
        let s16 = AudioParams::new(SampleFormat::S16, ChannelLayout::STEREO, 44100);

        encoder.encode(&AudioFrame::silence(s16, 100)).unwrap();
        assert_eq!(encoder.buffered_samples(), 90);

        engine.state_mut().fail_convert = true;
        let err = encoder.encode(&ramp(target(), 0, 50)).unwrap_err();
        assert!(err.is_conversion_failure());
        assert_eq!(engine.state().resamplers_live, 1);
        assert_eq!(encoder.buffered_samples(), 90);

        engine.state_mut().fail_convert = false;
        encoder.encode(&ramp(target(), 0, 50)).unwrap();
        assert_eq!(encoder.buffered_samples(), 150);
        assert_eq!(engine.state().resamplers_live, 0);

        let packets = encoder.flush().unwrap();
        assert_eq!(packets[0].samples, 150);
    }

    #[test]
    fn test_coerced_format_drives_resampling() {
        let engine = MockEngine::new();
        engine.state_mut().coerce_encoder_format = Some(SAMPLE_FMT_S16);
        let mut encoder = aac(&engine);

        // planar float matches the request but not what the codec opened with
        encoder.encode(&ramp(target(), 0, 1024)).unwrap();
        assert_eq!(encoder.params().sample_format, SampleFormat::S16);
        assert_eq!(engine.state().resamplers_allocated, 1);
    }
}
