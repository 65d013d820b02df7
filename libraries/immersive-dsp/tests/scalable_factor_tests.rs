//! Scalable-factor engine tests
//!
//! Layers are fed the way an encoder session does it: one block at a time,
//! base layer first, with the channels shared between nested layers carrying
//! the same content.

use immersive_core::{
    ChannelLayer, ChannelRole, DspConfig, ImmersiveError, LayoutMap, SampleBuffer,
    ScaleFactorMode,
};
use immersive_dsp::{
    compute_layer, compute_layer_accumulating, ChannelGroup, DemixingMetadata,
    ScalableFactorEngine, ScalableInputView, ScaleFactorResult,
};

const FRAME: usize = 480;
const ALL_GAINED_DOWN: [bool; 12] = [true; 12];

/// Planar block where channel `c` is a constant `level(c)`
fn planar(channels: usize, level: impl Fn(usize) -> f32) -> Vec<f32> {
    (0..channels)
        .flat_map(|c| std::iter::repeat(level(c)).take(FRAME))
        .collect()
}

/// Stereo signal shared by every layer in these tests
fn shared_level(channel: usize) -> f32 {
    match channel {
        0 => 0.5,
        1 => -0.25,
        _ => 0.1,
    }
}

fn view<'a>(
    layer: ChannelLayer,
    mixed: &'a [f32],
    residual: &'a [f32],
    active: LayoutMap,
) -> ScalableInputView<'a> {
    let channels = layer.channel_count();
    ScalableInputView::new(
        ChannelGroup::new(channels, SampleBuffer::float32(mixed)),
        ChannelGroup::empty(),
        FRAME,
        active,
    )
    .with_surround(ChannelGroup::new(channels, SampleBuffer::float32(residual)))
    .with_gain_down(&ALL_GAINED_DOWN)
}

fn scale_factors(metadata: &DemixingMetadata, layer: ChannelLayer) -> ScaleFactorResult {
    *metadata.scale_factors(layer).expect("layer computed")
}

// =============================================================================
// Layer invariance
// =============================================================================

#[test]
fn shared_channels_keep_their_scale_factors_across_layers() {
    let layout = LayoutMap::from_layers(&[ChannelLayer::Stereo200, ChannelLayer::Surround510]);
    let mut engine = ScalableFactorEngine::new(layout).unwrap();
    let mut metadata = DemixingMetadata::new();

    let stereo = planar(2, shared_level);
    let stereo_residual = planar(2, |c| shared_level(c) * 0.7);
    let surround = planar(6, shared_level);
    let surround_residual = planar(6, |c| shared_level(c) * 0.7);

    for _ in 0..5 {
        compute_layer_accumulating(
            &mut engine,
            &mut metadata,
            &view(ChannelLayer::Stereo200, &stereo, &stereo_residual, layout),
            ChannelLayer::Stereo200,
        )
        .unwrap();
        compute_layer_accumulating(
            &mut engine,
            &mut metadata,
            &view(ChannelLayer::Surround510, &surround, &surround_residual, layout),
            ChannelLayer::Surround510,
        )
        .unwrap();

        let base = scale_factors(&metadata, ChannelLayer::Stereo200);
        let next = scale_factors(&metadata, ChannelLayer::Surround510);
        for ch in 0..2 {
            assert_eq!(base.scalefactor_index[ch], next.scalefactor_index[ch]);
            assert!((base.scalefactor_data[ch] - next.scalefactor_data[ch]).abs() < 1e-6);
        }
    }

    // 0.7 amplitude residual: 10 log10(1 + 0.49) = 1.73 dB
    let base = scale_factors(&metadata, ChannelLayer::Stereo200);
    assert_eq!(base.scalefactor_index[0], 1);
    assert!((base.scalefactor_data[0] - 0.8192).abs() < 1e-3);
}

/// Every channel at 0.5, with a height down-mix residual of 0.5 on the heights
fn height_residual(layer: ChannelLayer) -> (Vec<f32>, Vec<f32>) {
    let layout = layer.composition();
    let mixed = planar(layout.total(), |_| 0.5);
    let top = planar(layout.total(), |c| match layout.role(c) {
        Some(ChannelRole::Height(_)) => 0.5,
        _ => 0.0,
    });
    (mixed, top)
}

fn height_view<'a>(
    layer: ChannelLayer,
    mixed: &'a [f32],
    top: &'a [f32],
    active: LayoutMap,
) -> ScalableInputView<'a> {
    let channels = layer.channel_count();
    ScalableInputView::new(
        ChannelGroup::new(channels, SampleBuffer::float32(mixed)),
        ChannelGroup::empty(),
        FRAME,
        active,
    )
    .with_top(ChannelGroup::new(channels, SampleBuffer::float32(top)))
    .with_gain_down(&ALL_GAINED_DOWN)
}

#[test]
fn heights_keep_their_history_when_surrounds_grow() {
    let layout = LayoutMap::from_layers(&[ChannelLayer::Surround512, ChannelLayer::Surround712]);
    let mut engine = ScalableFactorEngine::new(layout).unwrap();
    let mut metadata = DemixingMetadata::new();

    let (mixed_512, top_512) = height_residual(ChannelLayer::Surround512);
    let (mixed_712, top_712) = height_residual(ChannelLayer::Surround712);
    let upper = height_view(ChannelLayer::Surround712, &mixed_712, &top_712, layout);

    compute_layer_accumulating(
        &mut engine,
        &mut metadata,
        &height_view(ChannelLayer::Surround512, &mixed_512, &top_512, layout),
        ChannelLayer::Surround512,
    )
    .unwrap();
    compute_layer_accumulating(&mut engine, &mut metadata, &upper, ChannelLayer::Surround712)
        .unwrap();

    // Steady content: smoothing must agree with a single-block computation
    let mut single = DemixingMetadata::new();
    compute_layer(&mut single, &upper, ChannelLayer::Surround712, ScaleFactorMode::Rms).unwrap();

    let accumulated = scale_factors(&metadata, ChannelLayer::Surround712);
    let expected = scale_factors(&single, ChannelLayer::Surround712);
    assert_eq!(accumulated.scalefactor_index, expected.scalefactor_index);
    assert_eq!(
        accumulated.scalefactor_index[..10],
        [0, 0, 0, 0, 0, 0, 0, 0, 2, 2]
    );

    // The two new rear surrounds inherit nothing; the heights carry two blocks
    let history = engine.history(ChannelLayer::Surround712);
    assert_eq!(history.average_db[5..7], [0.0, 0.0]);
    assert_eq!(history.blocks[5..10], [1, 1, 2, 2, 2]);
}

#[test]
fn changing_content_is_smoothed_not_jumped() {
    let layout = LayoutMap::from_layers(&[ChannelLayer::Stereo200, ChannelLayer::Surround510]);
    let mut engine = ScalableFactorEngine::new(layout).unwrap();
    let mut metadata = DemixingMetadata::new();

    let stereo = planar(2, shared_level);
    let surround = planar(6, shared_level);
    let mut deltas = Vec::new();

    for ratio in [0.2_f32, 1.0, 0.5, 2.0] {
        let stereo_residual = planar(2, |c| shared_level(c) * ratio);
        let surround_residual = planar(6, |c| shared_level(c) * ratio);
        deltas.push(10.0 * (1.0 + ratio * ratio).log10());

        compute_layer_accumulating(
            &mut engine,
            &mut metadata,
            &view(ChannelLayer::Stereo200, &stereo, &stereo_residual, layout),
            ChannelLayer::Stereo200,
        )
        .unwrap();
        compute_layer_accumulating(
            &mut engine,
            &mut metadata,
            &view(ChannelLayer::Surround510, &surround, &surround_residual, layout),
            ChannelLayer::Surround510,
        )
        .unwrap();

        let lowest = deltas.iter().copied().fold(f32::INFINITY, f32::min);
        let highest = deltas.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let base = engine.history(ChannelLayer::Stereo200).average_db[0];
        let next = engine.history(ChannelLayer::Surround510).average_db[0];

        for average in [base, next] {
            assert!(average >= lowest - 1e-4 && average <= highest + 1e-4);
        }
        // Both layers have folded the same deltas, the upper one once more
        // for the first block it inherited
        assert!((base - next).abs() <= (highest - lowest) / 2.0 + 1e-4);
    }

    let history = engine.history(ChannelLayer::Surround510);
    assert_eq!(history.computed, 4);
    assert_eq!(history.blocks[0], 5);
    assert_eq!(history.blocks[5], 4);
}

// =============================================================================
// Ordering
// =============================================================================

#[test]
fn upper_layer_before_its_predecessor_is_rejected() {
    let layout = LayoutMap::from_layers(&[
        ChannelLayer::Stereo200,
        ChannelLayer::Surround510,
        ChannelLayer::Surround512,
    ]);
    let mut engine = ScalableFactorEngine::new(layout).unwrap();
    let mut metadata = DemixingMetadata::new();

    let stereo = planar(2, shared_level);
    let six = planar(6, shared_level);
    let eight = planar(8, shared_level);

    compute_layer_accumulating(
        &mut engine,
        &mut metadata,
        &view(ChannelLayer::Stereo200, &stereo, &stereo, layout),
        ChannelLayer::Stereo200,
    )
    .unwrap();

    let before = engine.clone();
    let err = compute_layer_accumulating(
        &mut engine,
        &mut metadata,
        &view(ChannelLayer::Surround512, &eight, &eight, layout),
        ChannelLayer::Surround512,
    )
    .unwrap_err();

    assert_eq!(
        err,
        ImmersiveError::LayerOutOfOrder {
            layer: ChannelLayer::Surround512,
            predecessor: ChannelLayer::Surround510,
        }
    );
    assert_eq!(err.code(), -20);
    assert!(err.is_sequencing());
    assert_eq!(engine, before);
    assert!(metadata.layer(ChannelLayer::Surround512).is_none());

    // In order it goes through
    compute_layer_accumulating(
        &mut engine,
        &mut metadata,
        &view(ChannelLayer::Surround510, &six, &six, layout),
        ChannelLayer::Surround510,
    )
    .unwrap();
    compute_layer_accumulating(
        &mut engine,
        &mut metadata,
        &view(ChannelLayer::Surround512, &eight, &eight, layout),
        ChannelLayer::Surround512,
    )
    .unwrap();

    // Twice in one round is out of order too
    let again = compute_layer_accumulating(
        &mut engine,
        &mut metadata,
        &view(ChannelLayer::Surround512, &eight, &eight, layout),
        ChannelLayer::Surround512,
    );
    assert!(matches!(again, Err(ImmersiveError::LayerOutOfOrder { .. })));
}

#[test]
fn alternate_branch_through_312() {
    let layout = LayoutMap::from_layers(&[
        ChannelLayer::Stereo200,
        ChannelLayer::Surround312,
        ChannelLayer::Surround512,
    ]);
    let engine = ScalableFactorEngine::new(layout).unwrap();

    assert_eq!(
        engine.hierarchy(),
        &[
            ChannelLayer::Stereo200,
            ChannelLayer::Surround312,
            ChannelLayer::Surround512
        ]
    );
    assert_eq!(
        engine.predecessor(ChannelLayer::Surround512),
        Some(ChannelLayer::Surround312)
    );
}

// =============================================================================
// Sample representations
// =============================================================================

#[test]
fn int16_and_float_inputs_agree() {
    let layout = LayoutMap::from_layers(&[ChannelLayer::Stereo200]);

    let mixed_i16: Vec<i16> = (0..2 * FRAME).map(|i| ((i % 64) as i16 - 32) * 256).collect();
    let residual_i16: Vec<i16> = (0..2 * FRAME).map(|i| ((i % 16) as i16 - 8) * 128).collect();
    let mixed_f32: Vec<f32> = mixed_i16.iter().map(|s| f32::from(*s) / 32768.0).collect();
    let residual_f32: Vec<f32> = residual_i16.iter().map(|s| f32::from(*s) / 32768.0).collect();

    let int_view = ScalableInputView::new(
        ChannelGroup::new(2, SampleBuffer::int16(&mixed_i16)),
        ChannelGroup::empty(),
        FRAME,
        layout,
    )
    .with_top(ChannelGroup::new(2, SampleBuffer::int16(&residual_i16)))
    .with_gain_down(&ALL_GAINED_DOWN);

    let float_view = ScalableInputView::new(
        ChannelGroup::new(2, SampleBuffer::float32(&mixed_f32)),
        ChannelGroup::empty(),
        FRAME,
        layout,
    )
    .with_top(ChannelGroup::new(2, SampleBuffer::float32(&residual_f32)))
    .with_gain_down(&ALL_GAINED_DOWN);

    let mut from_int = DemixingMetadata::new();
    let mut from_float = DemixingMetadata::new();
    compute_layer(&mut from_int, &int_view, ChannelLayer::Stereo200, ScaleFactorMode::Rms).unwrap();
    compute_layer(&mut from_float, &float_view, ChannelLayer::Stereo200, ScaleFactorMode::Rms)
        .unwrap();

    assert_eq!(from_int, from_float);
}

#[test]
fn raw_tagged_bytes_decode_into_views() {
    let layout = LayoutMap::from_layers(&[ChannelLayer::Mono100]);
    let samples: Vec<f32> = (0..FRAME).map(|i| (i as f32 * 0.01).sin() * 0.5).collect();
    let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();

    let raw = ChannelGroup::from_le_bytes(1, 1, &bytes).unwrap();
    let raw_view = ScalableInputView::new(raw, ChannelGroup::empty(), FRAME, layout);
    let typed_view = ScalableInputView::new(
        ChannelGroup::new(1, SampleBuffer::float32(&samples)),
        ChannelGroup::empty(),
        FRAME,
        layout,
    );

    let mut a = DemixingMetadata::new();
    let mut b = DemixingMetadata::new();
    compute_layer(&mut a, &raw_view, ChannelLayer::Mono100, ScaleFactorMode::Peak).unwrap();
    compute_layer(&mut b, &typed_view, ChannelLayer::Mono100, ScaleFactorMode::Peak).unwrap();
    assert_eq!(a, b);

    let err = ChannelGroup::from_le_bytes(1, 2, &bytes).unwrap_err();
    assert_eq!(err, ImmersiveError::UnsupportedSampleFormat(2));
    assert_eq!(err.code(), -5);
}

// =============================================================================
// Policies and errors
// =============================================================================

#[test]
fn peak_and_rms_policies_differ() {
    let layout = LayoutMap::from_layers(&[ChannelLayer::Stereo200]);
    let mixed = planar(2, |_| 0.5);
    let residual = planar(2, |_| 0.5);
    let input = view(ChannelLayer::Stereo200, &mixed, &residual, layout);

    let mut rms = DemixingMetadata::new();
    let mut peak = DemixingMetadata::new();
    compute_layer(&mut rms, &input, ChannelLayer::Stereo200, ScaleFactorMode::Rms).unwrap();
    compute_layer(&mut peak, &input, ChannelLayer::Stereo200, ScaleFactorMode::Peak).unwrap();

    // +3 dB of energy vs +6 dB of amplitude
    assert_eq!(scale_factors(&rms, ChannelLayer::Stereo200).scalefactor_index[0], 2);
    assert_eq!(scale_factors(&peak, ChannelLayer::Stereo200).scalefactor_index[0], 4);
}

#[test]
fn unknown_mode_code_is_rejected() {
    assert_eq!(
        ScaleFactorMode::from_code(7),
        Err(ImmersiveError::UnknownScaleFactorMode(7))
    );
    assert_eq!(ImmersiveError::UnknownScaleFactorMode(7).code(), -6);
}

#[test]
fn data_errors_write_nothing() {
    let layout = LayoutMap::from_layers(&[ChannelLayer::Stereo200]);
    let mut engine = ScalableFactorEngine::new(layout).unwrap();
    let mut metadata = DemixingMetadata::new();
    let mixed = planar(2, shared_level);

    let missing = ScalableInputView::new(
        ChannelGroup::new(2, SampleBuffer::float32(&mixed)),
        ChannelGroup {
            channels: 2,
            samples: None,
        },
        FRAME,
        layout,
    );
    let err = compute_layer_accumulating(&mut engine, &mut metadata, &missing, ChannelLayer::Stereo200)
        .unwrap_err();
    assert_eq!(err, ImmersiveError::MissingBuffer("reconstructed"));

    let inactive = ScalableInputView::new(
        ChannelGroup::new(2, SampleBuffer::float32(&mixed)),
        ChannelGroup::empty(),
        FRAME,
        LayoutMap::new(),
    );
    let err = compute_layer_accumulating(&mut engine, &mut metadata, &inactive, ChannelLayer::Stereo200)
        .unwrap_err();
    assert_eq!(err.code(), -10);

    assert_eq!(metadata.computed_layers().count(), 0);
    assert_eq!(engine.history(ChannelLayer::Stereo200).computed, 0);
}

#[test]
fn engine_from_default_configuration() {
    let config = DspConfig::default();
    let engine = ScalableFactorEngine::from_settings(&config.scalable).unwrap();
    assert_eq!(engine.hierarchy(), &[ChannelLayer::Stereo200]);
    assert_eq!(engine.mode(), ScaleFactorMode::Rms);
}
