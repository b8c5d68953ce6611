//! Integration tests for denoiser creation and frame recording.
//!
//! Every test drives the public API only: build a denoiser, inspect the
//! static description, update settings and check the recorded dispatches.
//!
//! ```bash
//! cargo test --test denoiser_tests
//! cargo test --test denoiser_tests --features serde
//! ```

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;

use rstest::rstest;

use common::{
    BadMipMethod, CountingAllocator, ExhaustedAllocator, NoGrowAllocator, TwoPassMethod, float_at,
    init_logger, uint_at,
};
use redlilium_denoiser::types::DescriptorType;
use redlilium_denoiser::{
    CommonSettings, Denoiser, DenoiserCreationDesc, DenoiserError, Format, Method, MethodDesc,
    MethodSettings, ResourceType, ResultCode, ShadowSettings, SpecularSettings,
    TransientMergePolicy,
};

fn create(methods: &[Method], width: u16, height: u16) -> Denoiser {
    let desc = methods.iter().fold(
        DenoiserCreationDesc::new().with_validation(true),
        |desc, &method| desc.with_method(MethodDesc::new(method, width, height)),
    );
    Denoiser::new(desc).unwrap()
}

// ============================================================================
// Creation
// ============================================================================

/// Every built-in method packs exactly the constant sizes it declares.
#[rstest]
#[case::diffuse(Method::Diffuse, 6)]
#[case::specular(Method::Specular, 7)]
#[case::shadow(Method::Shadow, 5)]
#[case::reference(Method::Reference, 2)]
#[case::reflection_mv(Method::SpecularReflectionMv, 1)]
fn test_builtin_constant_sizes_match(#[case] method: Method, #[case] passes: usize) {
    init_logger();

    let mut denoiser = create(&[method], 1920, 1080);
    let declared: Vec<u32> = denoiser.registry().methods()[0]
        .passes()
        .iter()
        .map(|p| p.constant_size)
        .collect();

    for frame_index in 0..3 {
        denoiser
            .set_common_settings(CommonSettings {
                frame_index,
                ..Default::default()
            })
            .unwrap();
        let dispatches = denoiser.record_frame().unwrap();
        assert_eq!(dispatches.len(), passes);
        for (dispatch, &size) in dispatches.iter().zip(&declared) {
            assert_eq!(dispatch.constant_buffer_data_size(), size, "{}", dispatch.name);
        }
    }
}

#[rstest]
#[case::zero_width(0, 1080)]
#[case::zero_height(1920, 0)]
#[case::too_wide(16385, 1080)]
fn test_bad_resolution_is_invalid(#[case] width: u16, #[case] height: u16) {
    let err = Denoiser::new(
        DenoiserCreationDesc::new().with_method(MethodDesc::new(Method::Diffuse, width, height)),
    )
    .unwrap_err();
    assert_eq!(err.code(), ResultCode::InvalidArgument);
}

#[test]
fn test_mip_range_outside_texture_fails() {
    init_logger();

    let err = Denoiser::new(
        DenoiserCreationDesc::new().with_custom_method(Box::new(BadMipMethod), 256, 256),
    )
    .unwrap_err();
    assert!(matches!(err, DenoiserError::InvalidArgument(_)));
}

#[test]
fn test_creation_is_deterministic() {
    let a = create(&[Method::Diffuse, Method::Specular, Method::Shadow], 1280, 720);
    let b = create(&[Method::Diffuse, Method::Specular, Method::Shadow], 1280, 720);
    assert_eq!(a.desc(), b.desc());
}

#[test]
fn test_custom_method_layout() {
    init_logger();

    let mut denoiser = Denoiser::new(
        DenoiserCreationDesc::new()
            .with_validation(true)
            .with_custom_method(Box::new(TwoPassMethod::default()), 1920, 1080),
    )
    .unwrap();

    let desc = denoiser.desc();
    assert_eq!(desc.permanent_pool.len(), 1);
    assert_eq!(desc.permanent_pool[0].format, Format::Rg32Uint);
    assert_eq!(desc.transient_pool.len(), 1);
    assert_eq!(desc.transient_pool[0].format, Format::Rgba16Sfloat);
    assert_eq!(
        (desc.transient_pool[0].width, desc.transient_pool[0].height),
        (1920, 1080)
    );
    assert!(desc.constant_buffer.max_data_size >= 96);

    let sets = &desc.descriptor_set;
    assert_eq!(sets.set_max_num, 2);
    assert_eq!(sets.constant_buffer_max_num, 2);
    assert_eq!(sets.texture_max_num, 3);
    assert_eq!(sets.storage_texture_max_num, 3);
    assert_eq!(sets.texture_max_num_per_set, 2);
    assert_eq!(sets.storage_texture_max_num_per_set, 2);
    assert_eq!(sets.descriptor_range_max_num_per_pipeline, 2);

    let dispatches = denoiser.record_frame().unwrap();
    assert_eq!(dispatches.len(), 2);
    assert_eq!(dispatches[0].constant_data.len(), 64);
    assert_eq!(dispatches[1].constant_data.len(), 96);
    // Pass fields follow the shared block.
    assert_eq!(float_at(dispatches[0].constant_data, 48), 1.0);
    assert_eq!(float_at(dispatches[0].constant_data, 60), 4.0);
    assert_eq!(uint_at(dispatches[1].constant_data, 92), 12);

    let second = dispatches[1].resources;
    assert_eq!(second[0].state_needed, DescriptorType::Texture);
    assert_eq!(second[0].ty, ResourceType::TransientPool);
    assert_eq!(second[1].ty, ResourceType::PermanentPool);
    assert_eq!(second[1].state_needed, DescriptorType::StorageTexture);
    assert_eq!(second[2].ty, ResourceType::OutRadiance);
}

#[rstest]
#[case::superset(TransientMergePolicy::Superset, 3)]
#[case::exclusive(TransientMergePolicy::Exclusive, 6)]
fn test_transient_policy(#[case] policy: TransientMergePolicy, #[case] transient: usize) {
    let denoiser = Denoiser::new(
        DenoiserCreationDesc::new()
            .with_transient_policy(policy)
            .with_method(MethodDesc::new(Method::Diffuse, 1920, 1080))
            .with_method(MethodDesc::new(Method::Specular, 1920, 1080)),
    )
    .unwrap();
    assert_eq!(denoiser.desc().transient_pool.len(), transient);
    assert_eq!(denoiser.desc().permanent_pool.len(), 8);
}

/// Sharing transient slots across methods never narrows a user's format.
#[test]
fn test_transient_sharing_keeps_every_format() {
    init_logger();

    let denoiser = create(&[Method::Diffuse, Method::Shadow], 1920, 1080);
    let formats: Vec<Format> = denoiser
        .desc()
        .transient_pool
        .iter()
        .map(|t| t.format)
        .collect();
    assert_eq!(
        formats,
        vec![
            Format::Rgba8Unorm,
            Format::Rgba16Sfloat,
            Format::R16Sfloat,
            Format::Rg8Unorm,
            Format::Rgba8Unorm,
        ]
    );

    // Diffuse scaled view depth keeps a float slot of its own.
    let depth = &denoiser.desc().transient_pool[2];
    assert_eq!(depth.mip_num, 5);
    assert_eq!((depth.width, depth.height), (1920, 1080));

    // Shadow hit distance shares the RGBA16F slot, never an 8-bit one.
    let shadow = &denoiser.registry().methods()[1];
    let pre_blur = &shadow.passes()[2];
    let hit_dist = pre_blur.outputs[0].resolve(0);
    assert_eq!(hit_dist.ty, ResourceType::TransientPool);
    assert_eq!(
        denoiser.desc().transient_pool[hit_dist.index_in_pool as usize].format,
        Format::Rgba16Sfloat
    );
}

// ============================================================================
// Recording
// ============================================================================

#[test]
fn test_recording_is_deterministic() {
    let mut a = create(&[Method::Specular, Method::Shadow], 1920, 1080);
    let mut b = create(&[Method::Specular, Method::Shadow], 1920, 1080);

    let settings = CommonSettings {
        frame_index: 7,
        jitter: redlilium_denoiser::math::Vec2::new(0.25, -0.25),
        ..Default::default()
    };
    a.set_common_settings(settings.clone()).unwrap();
    b.set_common_settings(settings).unwrap();

    let da = a.record_frame().unwrap();
    let db = b.record_frame().unwrap();
    assert_eq!(da, db);
}

#[test]
fn test_pool_indices_stable_across_frames() {
    let mut denoiser = create(&[Method::Diffuse, Method::Specular], 1920, 1080);

    let first: Vec<_> = denoiser
        .record_frame()
        .unwrap()
        .iter()
        .map(|d| d.resources.to_vec())
        .collect();
    let second: Vec<_> = denoiser
        .record_frame()
        .unwrap()
        .iter()
        .map(|d| d.resources.to_vec())
        .collect();
    assert_eq!(first, second);
}

#[test]
fn test_ping_pong_follows_frame_parity() {
    let mut denoiser = create(&[Method::Specular], 1920, 1080);

    let mut slots = Vec::new();
    for frame_index in 0..4 {
        denoiser
            .set_common_settings(CommonSettings {
                frame_index,
                ..Default::default()
            })
            .unwrap();
        let dispatches = denoiser.record_frame().unwrap();
        // Pre-blur writes the stabilized texture that is not current history.
        let temp = dispatches[0].resources[3];
        assert_eq!(temp.ty, ResourceType::PermanentPool);
        slots.push(temp.index_in_pool);
    }
    assert_eq!(slots, vec![2, 3, 2, 3]);
}

#[test]
fn test_reference_accumulation_overrides_specular() {
    let mut denoiser = create(&[Method::Specular], 1920, 1080);

    {
        let dispatches = denoiser.record_frame().unwrap();
        assert_eq!(float_at(dispatches[0].constant_data, 156), 30.0);
        assert_eq!(float_at(dispatches[1].constant_data, 376), 0.01);
        assert_eq!(float_at(dispatches[1].constant_data, 384), 31.0);
    }

    denoiser
        .set_common_settings(CommonSettings {
            force_reference_accumulation: true,
            ..Default::default()
        })
        .unwrap();
    let dispatches = denoiser.record_frame().unwrap();
    assert_eq!(float_at(dispatches[0].constant_data, 156), 0.0);
    assert_eq!(float_at(dispatches[1].constant_data, 376), 0.005);
    assert_eq!(float_at(dispatches[1].constant_data, 384), 63.0);
}

#[test]
fn test_dynamic_resolution_shrinks_grid() {
    let mut denoiser = create(&[Method::Specular], 1920, 1080);
    denoiser
        .set_common_settings(CommonSettings {
            resolution_scale: 0.5,
            ..Default::default()
        })
        .unwrap();

    let dispatches = denoiser.record_frame().unwrap();
    assert_eq!((dispatches[0].grid_width, dispatches[0].grid_height), (120, 68));
    // Half-resolution mip pass with 16x16 groups.
    assert_eq!((dispatches[2].grid_width, dispatches[2].grid_height), (30, 17));
}

#[test]
fn test_record_methods_filters_and_keeps_order() {
    let mut denoiser = create(&[Method::Diffuse, Method::Shadow, Method::Reference], 640, 480);
    let handles = denoiser.method_handles();

    let dispatches = denoiser.record_methods(&[handles[2], handles[0]]).unwrap();
    assert_eq!(dispatches.len(), 8);
    assert!(dispatches[0].name.starts_with("Diffuse"));
    assert!(dispatches[7].name.starts_with("Reference"));
}

// ============================================================================
// Settings and validation
// ============================================================================

#[test]
fn test_wrong_settings_kind_is_rejected() {
    let mut denoiser = create(&[Method::Specular], 640, 480);
    let handle = denoiser.method_handles()[0];

    let err = denoiser
        .set_method_settings(handle, &MethodSettings::Shadow(ShadowSettings::default()))
        .unwrap_err();
    assert_eq!(err.code(), ResultCode::InvalidArgument);

    let settings = SpecularSettings {
        blur_radius: 12.0,
        ..Default::default()
    };
    denoiser
        .set_method_settings(handle, &MethodSettings::Specular(settings))
        .unwrap();
    let dispatches = denoiser.record_frame().unwrap();
    assert_eq!(float_at(dispatches[0].constant_data, 156), 12.0);
}

#[rstest]
#[case::overflow(4)]
#[case::underflow(-4)]
fn test_constant_mismatch_with_validation(#[case] extra_words: i32) {
    init_logger();

    let mut denoiser = Denoiser::new(
        DenoiserCreationDesc::new()
            .with_validation(true)
            .with_custom_method(Box::new(TwoPassMethod { extra_words }), 256, 256),
    )
    .unwrap();

    let err = denoiser.record_frame().unwrap_err();
    let packed = (96 + extra_words * 4) as u32;
    assert_eq!(
        err,
        DenoiserError::ConstantLayoutMismatch {
            pass: "Two pass - second".to_string(),
            declared: 96,
            packed,
        }
    );
}

#[test]
fn test_constant_mismatch_without_validation_truncates() {
    let mut denoiser = Denoiser::new(
        DenoiserCreationDesc::new()
            .with_validation(false)
            .with_custom_method(Box::new(TwoPassMethod { extra_words: 4 }), 256, 256),
    )
    .unwrap();

    let dispatches = denoiser.record_frame().unwrap();
    assert_eq!(dispatches[1].constant_data.len(), 96);
    assert_eq!(uint_at(dispatches[1].constant_data, 92), 12);
}

#[test]
fn test_constant_underflow_without_validation_zero_pads() {
    let mut denoiser = Denoiser::new(
        DenoiserCreationDesc::new()
            .with_validation(false)
            .with_custom_method(Box::new(TwoPassMethod { extra_words: -2 }), 256, 256),
    )
    .unwrap();

    let dispatches = denoiser.record_frame().unwrap();
    assert_eq!(uint_at(dispatches[1].constant_data, 84), 10);
    assert_eq!(uint_at(dispatches[1].constant_data, 88), 0);
    assert_eq!(uint_at(dispatches[1].constant_data, 92), 0);
}

// ============================================================================
// Allocation
// ============================================================================

#[test]
fn test_custom_allocator_is_used_and_released() {
    let allocator = Arc::new(CountingAllocator::default());
    {
        let mut denoiser = Denoiser::new(
            DenoiserCreationDesc::new()
                .with_allocator(allocator.clone())
                .with_method(MethodDesc::new(Method::Specular, 1280, 720)),
        )
        .unwrap();
        denoiser.record_frame().unwrap();

        assert_eq!(allocator.allocations.load(Ordering::SeqCst), 1);
        assert!(allocator.live_bytes.load(Ordering::SeqCst) > 0);
    }
    assert_eq!(allocator.frees.load(Ordering::SeqCst), 1);
    assert_eq!(allocator.live_bytes.load(Ordering::SeqCst), 0);
}

#[test]
fn test_failed_registration_keeps_denoiser_usable() {
    init_logger();

    let mut denoiser = Denoiser::new(
        DenoiserCreationDesc::new()
            .with_allocator(Arc::new(NoGrowAllocator))
            .with_method(MethodDesc::new(Method::Reference, 640, 480)),
    )
    .unwrap();
    let before = denoiser.desc().clone();

    let err = denoiser
        .register_method(MethodDesc::new(Method::Specular, 640, 480))
        .unwrap_err();
    assert_eq!(err.code(), ResultCode::Failure);

    assert_eq!(denoiser.method_handles().len(), 1);
    assert_eq!(denoiser.desc(), &before);
    assert!(denoiser.registry().pools().transient().is_empty());
    assert_eq!(denoiser.registry().pools().permanent().len(), 2);
    assert_eq!(denoiser.record_frame().unwrap().len(), 2);
}

#[test]
fn test_exhausted_allocator_fails_creation() {
    let err = Denoiser::new(
        DenoiserCreationDesc::new()
            .with_allocator(Arc::new(ExhaustedAllocator))
            .with_method(MethodDesc::new(Method::Diffuse, 640, 480)),
    )
    .unwrap_err();
    assert_eq!(err.code(), ResultCode::Failure);
}

// ============================================================================
// Serialization
// ============================================================================

#[cfg(feature = "serde")]
#[test]
fn test_settings_from_toml() {
    use redlilium_denoiser::DiffuseSettings;

    let common: CommonSettings = toml::from_str(
        r#"
        frame_index = 12
        denoising_range = 250.0
        force_reference_accumulation = true
        "#,
    )
    .unwrap();
    assert_eq!(common.frame_index, 12);
    assert_eq!(common.denoising_range, 250.0);
    assert!(common.force_reference_accumulation);
    assert_eq!(common.resolution_scale, 1.0);

    let diffuse: DiffuseSettings = toml::from_str("blur_radius = 15.0").unwrap();
    assert_eq!(diffuse.blur_radius, 15.0);
    assert_eq!(diffuse.max_accumulated_frame_num, 31);

    let mut denoiser = create(&[Method::Diffuse], 640, 480);
    denoiser.set_common_settings(common).unwrap();
    denoiser
        .set_method_settings(denoiser.method_handles()[0], &MethodSettings::Diffuse(diffuse))
        .unwrap();
    assert_eq!(denoiser.record_frame().unwrap().len(), 6);
}
