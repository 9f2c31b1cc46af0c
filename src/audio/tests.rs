use super::gate::{rms_db, GateDecision, SilenceGate};
use super::recorder::append_downmixed_samples;
use super::resample::{
    design_low_pass, downsampling_tap_count, low_pass_fir, resample_linear,
    resample_to_target_rate,
};
use super::TARGET_RATE;

#[test]
fn downmixes_multi_channel_audio() {
    let mut buf = Vec::new();
    let samples = [1.0f32, -1.0, 0.5, 0.5];
    append_downmixed_samples(&mut buf, &samples, 2, |sample| sample);
    assert_eq!(buf, vec![0.0, 0.5]);
}

#[test]
fn preserves_single_channel_audio() {
    let mut buf = Vec::new();
    let samples = [0.1f32, 0.2, 0.3];
    append_downmixed_samples(&mut buf, &samples, 1, |sample| sample);
    assert_eq!(buf, samples);
}

#[test]
fn downmix_handles_trailing_partial_frame() {
    let mut buf = Vec::new();
    let samples = [1.0f32, 1.0, 0.5];
    append_downmixed_samples(&mut buf, &samples, 2, |sample| sample);
    assert_eq!(buf, vec![1.0, 0.5]);
}

#[test]
fn resample_linear_scales_length() {
    let input = vec![0.0f32, 1.0, 2.0, 3.0];
    let result = resample_linear(&input, 0.5);
    assert!(result.len() < input.len());
    assert!((result.first().copied().unwrap_or_default() - 0.0).abs() < 1e-6);
}

#[test]
fn resample_to_target_rate_returns_input_when_rate_matches() {
    let input = vec![0.1f32, 0.2, 0.3];
    let output = resample_to_target_rate(&input, TARGET_RATE);
    assert_eq!(output, input);
}

#[test]
fn resample_to_target_rate_returns_empty_for_empty_input() {
    let input: Vec<f32> = Vec::new();
    let output = resample_to_target_rate(&input, 48_000);
    assert!(output.is_empty());
}

#[test]
fn resample_to_target_rate_shrinks_48khz_input() {
    let input: Vec<f32> = (0..4_800).map(|i| (i as f32 * 0.01).sin()).collect();
    let result = resample_to_target_rate(&input, 48_000);
    let expected = (input.len() as f64 * TARGET_RATE as f64 / 48_000f64).round() as usize;
    let diff = (result.len() as isize - expected as isize).abs();
    assert!(diff <= 1, "expected ~{expected} samples, got {}", result.len());
}

#[test]
fn resample_to_target_rate_passes_through_absurd_rates() {
    let input = vec![0.1f32, 0.2];
    assert_eq!(resample_to_target_rate(&input, 0), input);
    assert_eq!(resample_to_target_rate(&input, 10_000_000), input);
}

#[test]
fn tap_count_is_odd_and_bounded() {
    for rate in [22_050u32, 44_100, 48_000, 96_000, 192_000] {
        let taps = downsampling_tap_count(rate);
        assert_eq!(taps % 2, 1, "taps must be odd for rate {rate}");
        assert!(taps >= 11 && taps <= 129);
    }
}

#[test]
fn low_pass_preserves_dc_level() {
    let input = vec![1.0f32; 256];
    let taps = downsampling_tap_count(48_000);
    let output = low_pass_fir(&input, 48_000, taps);
    assert_eq!(output.len(), input.len());
    // Away from the edges a normalized filter should pass DC unchanged.
    assert!((output[128] - 1.0).abs() < 1e-3, "got {}", output[128]);
}

#[test]
fn low_pass_coefficients_are_normalized() {
    let coeffs = design_low_pass(0.25, 33);
    let sum: f32 = coeffs.iter().sum();
    assert!((sum - 1.0).abs() < 1e-5, "coefficient sum {sum}");
}

#[test]
fn rms_db_reports_floor_for_empty_and_silent_input() {
    assert_eq!(rms_db(&[]), -120.0);
    let silent = vec![0.0f32; 1_600];
    assert!(rms_db(&silent) <= -100.0);
}

#[test]
fn rms_db_matches_known_amplitude() {
    let half_scale = vec![0.5f32; 1_600];
    let db = rms_db(&half_scale);
    assert!((db - (-6.02)).abs() < 0.1, "got {db}");
}

#[test]
fn gate_skips_silence_and_passes_speech_levels() {
    let gate = SilenceGate::new(-46.0);
    let silent = vec![0.0f32; 1_600];
    assert!(matches!(gate.evaluate(&silent), GateDecision::Skip { .. }));

    let loud = vec![0.5f32; 1_600];
    match gate.evaluate(&loud) {
        GateDecision::Pass { level_db } => assert!(level_db > -10.0),
        other => panic!("expected pass, got {other:?}"),
    }
}

#[test]
fn gate_threshold_is_inclusive_boundary() {
    // Amplitude 0.005 RMS is the classic dictation silence threshold.
    let gate = SilenceGate::new(-46.0);
    let just_above = vec![0.006f32; 1_600];
    assert!(matches!(
        gate.evaluate(&just_above),
        GateDecision::Pass { .. }
    ));
    let just_below = vec![0.004f32; 1_600];
    assert!(matches!(
        gate.evaluate(&just_below),
        GateDecision::Skip { .. }
    ));
}

#[test]
fn gate_skips_empty_buffers() {
    let gate = SilenceGate::new(-46.0);
    assert!(matches!(gate.evaluate(&[]), GateDecision::Skip { .. }));
}
