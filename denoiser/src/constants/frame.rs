//! Immutable per-frame state derived from [`CommonSettings`].

use bytemuck::{Pod, Zeroable};
use static_assertions::const_assert_eq;

use super::{ConstantWriter, SHARED_CONSTANT_SIZE};
use crate::error::{DenoiserError, Result};
use crate::math::{self, Mat4, Vec2, Vec3, Vec4};
use crate::settings::CommonSettings;

/// Camera and frame values shared by all methods for one frame.
///
/// Built once per [`CommonSettings`] update and passed by reference to every
/// constant packer.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameContext {
    pub view_to_clip: Mat4,
    pub view_to_clip_prev: Mat4,
    pub world_to_view: Mat4,
    pub world_to_view_prev: Mat4,
    pub view_to_world: Mat4,
    pub world_to_clip: Mat4,
    pub world_to_clip_prev: Mat4,
    /// See [`math::frustum_from_projection`].
    pub frustum: Vec4,
    pub frustum_prev: Vec4,
    pub is_ortho: bool,
    pub is_ortho_prev: bool,
    /// Previous camera position minus current, in world space.
    pub camera_delta: Vec3,
    /// Largest per-axis jitter change since the previous frame, in pixels.
    pub jitter_delta: f32,
    pub checkerboard_resolve_accum_speed: f32,
    /// Per-frame sample rotations for the three spatial passes.
    pub rotators: [Vec4; 3],
    pub motion_vector_scale: Vec2,
    pub resolution_scale: f32,
    pub frame_index: u32,
    pub meters_to_units: f32,
    pub denoising_range: f32,
    pub debug: f32,
    pub force_reference_accumulation: bool,
}

impl FrameContext {
    /// Derive the frame state from validated settings.
    ///
    /// Fails with `InvalidArgument` if the settings are invalid or a view
    /// matrix cannot be inverted.
    pub fn new(settings: &CommonSettings) -> Result<Self> {
        settings.validate()?;

        let view_to_world = settings.world_to_view.try_inverse().ok_or_else(|| {
            DenoiserError::invalid("world-to-view matrix is not invertible".to_string())
        })?;
        let position = view_to_world.fixed_view::<3, 1>(0, 3).into_owned();
        let position_prev = math::camera_position(&settings.world_to_view_prev).ok_or_else(|| {
            DenoiserError::invalid("previous world-to-view matrix is not invertible".to_string())
        })?;

        let jitter_delta = (settings.jitter - settings.jitter_prev).abs().max();
        let rotators = [0, 1, 2].map(|stream| math::rotator(math::frame_angle(settings.frame_index, stream)));

        Ok(Self {
            view_to_clip: settings.view_to_clip,
            view_to_clip_prev: settings.view_to_clip_prev,
            world_to_view: settings.world_to_view,
            world_to_view_prev: settings.world_to_view_prev,
            view_to_world,
            world_to_clip: settings.view_to_clip * settings.world_to_view,
            world_to_clip_prev: settings.view_to_clip_prev * settings.world_to_view_prev,
            frustum: math::frustum_from_projection(&settings.view_to_clip),
            frustum_prev: math::frustum_from_projection(&settings.view_to_clip_prev),
            is_ortho: math::is_orthographic(&settings.view_to_clip),
            is_ortho_prev: math::is_orthographic(&settings.view_to_clip_prev),
            camera_delta: position_prev - position,
            jitter_delta,
            checkerboard_resolve_accum_speed: math::lerp(0.95, 0.5, jitter_delta.min(1.0)),
            rotators,
            motion_vector_scale: settings.motion_vector_scale,
            resolution_scale: settings.resolution_scale,
            frame_index: settings.frame_index,
            meters_to_units: settings.meters_to_units,
            denoising_range: settings.denoising_range,
            debug: settings.debug,
            force_reference_accumulation: settings.force_reference_accumulation,
        })
    }

    /// Rectangle actually rendered this frame for a method of the given size.
    ///
    /// Never smaller than 1x1.
    pub fn rect_size(&self, width: u16, height: u16) -> (u32, u32) {
        let scale = |v: u16| ((v as f32 * self.resolution_scale).round() as u32).max(1);
        (scale(width), scale(height))
    }

    /// Camera delta packed with a flag in the fourth component.
    pub fn camera_delta_and(&self, w: f32) -> Vec4 {
        Vec4::new(self.camera_delta.x, self.camera_delta.y, self.camera_delta.z, w)
    }
}

/// The block written at the start of every pass's constant data.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SharedConstants {
    pub frustum: [f32; 4],
    pub inv_rect_size: [f32; 2],
    pub rect_size: [f32; 2],
    pub denoising_range: f32,
    pub is_ortho: f32,
    pub debug: f32,
    pub frame_index: u32,
}

const_assert_eq!(std::mem::size_of::<SharedConstants>(), SHARED_CONSTANT_SIZE as usize);

impl SharedConstants {
    /// Shared values for a method running at `width` x `height`.
    pub fn new(frame: &FrameContext, width: u16, height: u16) -> Self {
        let (w, h) = frame.rect_size(width, height);
        Self {
            frustum: frame.frustum.into(),
            inv_rect_size: [1.0 / w as f32, 1.0 / h as f32],
            rect_size: [w as f32, h as f32],
            denoising_range: frame.denoising_range,
            is_ortho: if frame.is_ortho { 1.0 } else { 0.0 },
            debug: frame.debug,
            frame_index: frame.frame_index,
        }
    }

    /// Append the block to a pass's constants.
    pub fn write(&self, writer: &mut ConstantWriter<'_>) {
        writer.add_bytes(bytemuck::bytes_of(self));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moving_camera() -> CommonSettings {
        CommonSettings {
            view_to_clip: math::perspective_rh(1.0, 16.0 / 9.0, 0.1, 100.0),
            view_to_clip_prev: math::perspective_rh(1.0, 16.0 / 9.0, 0.1, 100.0),
            world_to_view: math::look_at_rh(&Vec3::new(0.0, 1.0, 5.0), &Vec3::zeros(), &Vec3::y()),
            world_to_view_prev: math::look_at_rh(&Vec3::new(0.5, 1.0, 5.0), &Vec3::zeros(), &Vec3::y()),
            jitter: Vec2::new(0.25, -0.25),
            jitter_prev: Vec2::new(-0.25, 0.125),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_context() {
        let frame = FrameContext::new(&CommonSettings::default()).unwrap();
        assert_eq!(frame.view_to_world, Mat4::identity());
        assert_eq!(frame.camera_delta, Vec3::zeros());
        assert_eq!(frame.jitter_delta, 0.0);
        assert_eq!(frame.checkerboard_resolve_accum_speed, 0.95);
    }

    #[test]
    fn test_camera_delta_and_jitter() {
        let frame = FrameContext::new(&moving_camera()).unwrap();
        assert!((frame.camera_delta - Vec3::new(0.5, 0.0, 0.0)).norm() < 1e-4);
        assert_eq!(frame.jitter_delta, 0.5);
        assert_eq!(frame.checkerboard_resolve_accum_speed, math::lerp(0.95, 0.5, 0.5));
        assert!(!frame.is_ortho);
    }

    #[test]
    fn test_rotators_follow_frame_index() {
        let mut settings = moving_camera();
        let a = FrameContext::new(&settings).unwrap();
        let b = FrameContext::new(&settings).unwrap();
        assert_eq!(a.rotators, b.rotators);

        settings.frame_index = 1;
        let c = FrameContext::new(&settings).unwrap();
        assert_ne!(a.rotators, c.rotators);
    }

    #[test]
    fn test_singular_view_is_rejected() {
        let settings = CommonSettings {
            world_to_view: Mat4::zeros(),
            ..Default::default()
        };
        assert!(matches!(
            FrameContext::new(&settings),
            Err(DenoiserError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_rect_size_scales() {
        let settings = CommonSettings {
            resolution_scale: 0.5,
            ..Default::default()
        };
        let frame = FrameContext::new(&settings).unwrap();
        assert_eq!(frame.rect_size(1920, 1080), (960, 540));
        assert_eq!(frame.rect_size(1, 1), (1, 1));
    }

    #[test]
    fn test_shared_constants_layout() {
        let frame = FrameContext::new(&CommonSettings::default()).unwrap();
        let shared = SharedConstants::new(&frame, 64, 32);
        assert_eq!(shared.rect_size, [64.0, 32.0]);
        assert_eq!(shared.inv_rect_size, [1.0 / 64.0, 1.0 / 32.0]);

        let mut buf = [0u8; 48];
        let mut writer = ConstantWriter::new(&mut buf);
        shared.write(&mut writer);
        assert_eq!(writer.packed(), 48);
        writer.finish(true, "shared").unwrap();
    }
}
