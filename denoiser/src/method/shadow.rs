//! Shadow denoiser.
//!
//! Works on screen tiles first: tiles without penumbra are skipped by the
//! later passes. The denoised result is double-buffered so temporal
//! stabilization can read the previous frame.

use super::{DenoiseMethod, PackContext, flag, unknown_pass};
use crate::constants::{ConstantLayout, ConstantWriter};
use crate::error::Result;
use crate::graph::{MethodBuilder, PassId, ResourceView};
use crate::settings::{MethodSettings, ShadowSettings, wrong_settings};
use crate::types::{Format, ResourceType, TextureDesc};

const CLASSIFY_TILES: PassId = PassId::new(0);
const SMOOTH_TILES: PassId = PassId::new(1);
const PRE_BLUR: PassId = PassId::new(2);
const BLUR: PassId = PassId::new(3);
const TEMPORAL_STABILIZATION: PassId = PassId::new(4);

/// Pixels per classification tile side.
const TILE_SIZE: u16 = 16;

/// Shadow and translucency denoiser.
#[derive(Debug, Clone, Default)]
pub struct Shadow {
    settings: ShadowSettings,
}

impl Shadow {
    /// Create the denoiser with the given settings.
    pub fn new(settings: ShadowSettings) -> Self {
        Self { settings }
    }

    /// Current settings.
    pub fn settings(&self) -> &ShadowSettings {
        &self.settings
    }
}

impl DenoiseMethod for Shadow {
    fn name(&self) -> &str {
        "Shadow"
    }

    fn build(&self, b: &mut MethodBuilder<'_>) -> Result<()> {
        let (w, h) = (b.width(), b.height());
        let (tiles_w, tiles_h) = (w.div_ceil(TILE_SIZE), h.div_ceil(TILE_SIZE));

        let history_1 = b.declare_permanent(TextureDesc::new(Format::Rgba8Unorm, w, h))?;
        let history_2 = b.declare_permanent(TextureDesc::new(Format::Rgba8Unorm, w, h))?;

        let hit_dist = b.declare_transient(TextureDesc::new(Format::Rg16Sfloat, w, h))?;
        let tiles = b.declare_transient(TextureDesc::new(Format::Rg8Unorm, tiles_w, tiles_h))?;
        let smoothed_tiles =
            b.declare_transient(TextureDesc::new(Format::Rg8Unorm, tiles_w, tiles_h))?;
        let temp = b.declare_transient(TextureDesc::new(Format::Rgba8Unorm, w, h))?;

        let current = ResourceView::from(history_1).ping_pong(history_2);
        let previous = ResourceView::from(history_2).ping_pong(history_1);

        b.begin_pass(CLASSIFY_TILES, "Shadow - classify tiles", "Shadow_ClassifyTiles.cs")?;
        b.add_input(ResourceType::InShadowData)?;
        b.add_output(tiles)?;
        b.set_constant_layout(ConstantLayout::shared())?;
        b.set_resolution_divisor(TILE_SIZE)?;
        b.end_pass()?;

        b.begin_pass(SMOOTH_TILES, "Shadow - smooth tiles", "Shadow_SmoothTiles.cs")?;
        b.add_input(tiles)?;
        b.add_output(smoothed_tiles)?;
        b.set_constant_layout(ConstantLayout::new(0, 0, 1, 0))?;
        b.set_resolution_divisor(TILE_SIZE)?;
        b.end_pass()?;

        b.begin_pass(PRE_BLUR, "Shadow - pre-blur", "Shadow_PreBlur.cs")?;
        b.add_input(ResourceType::InNormalRoughness)?;
        b.add_input(ResourceType::InViewZ)?;
        b.add_input(ResourceType::InShadowData)?;
        b.add_input(ResourceType::InShadowTranslucency)?;
        b.add_input(smoothed_tiles)?;
        b.add_output(hit_dist)?;
        b.add_output(temp)?;
        b.set_constant_layout(ConstantLayout::new(1, 1, 0, 2))?;
        b.end_pass()?;

        b.begin_pass(BLUR, "Shadow - blur", "Shadow_Blur.cs")?;
        b.add_input(ResourceType::InNormalRoughness)?;
        b.add_input(ResourceType::InViewZ)?;
        b.add_input(hit_dist)?;
        b.add_input(temp)?;
        b.add_input(smoothed_tiles)?;
        b.add_output(current)?;
        b.set_constant_layout(ConstantLayout::new(1, 1, 0, 2))?;
        b.end_pass()?;

        b.begin_pass(
            TEMPORAL_STABILIZATION,
            "Shadow - temporal stabilization",
            "Shadow_TemporalStabilization.cs",
        )?;
        b.add_input(ResourceType::InViewZ)?;
        b.add_input(ResourceType::InMv)?;
        b.add_input(current)?;
        b.add_input(previous)?;
        b.add_input(smoothed_tiles)?;
        b.add_output(ResourceType::OutShadowTranslucency)?;
        b.set_constant_layout(ConstantLayout::new(2, 1, 1, 0))?;
        b.end_pass()?;

        Ok(())
    }

    fn set_settings(&mut self, settings: &MethodSettings) -> Result<()> {
        match settings {
            MethodSettings::Shadow(settings) => {
                self.settings = *settings;
                Ok(())
            }
            other => Err(wrong_settings(self.name(), other)),
        }
    }

    fn pack_constants(
        &self,
        pass: PassId,
        ctx: &PackContext<'_>,
        out: &mut ConstantWriter<'_>,
    ) -> Result<()> {
        let frame = ctx.frame;
        let plane_distance = self.settings.plane_distance_sensitivity * frame.meters_to_units;
        let blur_radius_scale = if frame.force_reference_accumulation {
            0.0
        } else {
            self.settings.blur_radius_scale
        };

        match pass {
            CLASSIFY_TILES => {}
            SMOOTH_TILES => {
                out.add_uint2(
                    ctx.width.div_ceil(TILE_SIZE) as u32,
                    ctx.height.div_ceil(TILE_SIZE) as u32,
                );
            }
            PRE_BLUR => {
                out.add_float4x4(&frame.world_to_view);
                out.add_float4(frame.rotators[0]);
                out.add_float(plane_distance);
                out.add_float(blur_radius_scale);
            }
            BLUR => {
                out.add_float4x4(&frame.world_to_view);
                out.add_float4(frame.rotators[1]);
                out.add_float(plane_distance);
                out.add_float(blur_radius_scale);
            }
            TEMPORAL_STABILIZATION => {
                out.add_float4x4(&frame.world_to_clip_prev);
                out.add_float4x4(&frame.view_to_world);
                out.add_float4(frame.camera_delta_and(flag(frame.is_ortho_prev)));
                out.add_float2(frame.motion_vector_scale);
            }
            other => return Err(unknown_pass(self.name(), other)),
        }
        Ok(())
    }
}
