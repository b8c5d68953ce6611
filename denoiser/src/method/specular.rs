//! Specular radiance denoiser.

use super::{DenoiseMethod, PackContext, flag, hit_distance_scaling, unknown_pass};
use crate::constants::{ConstantLayout, ConstantWriter};
use crate::error::Result;
use crate::graph::{MethodBuilder, PassId, ResourceView};
use crate::math::{Vec2, Vec4};
use crate::settings::{
    AccumulationParams, MAX_HISTORY_FRAME_NUM, MethodSettings, SpecularSettings, wrong_settings,
};
use crate::types::{Format, ResourceType, TextureDesc};

const PRE_BLUR: PassId = PassId::new(0);
const TEMPORAL_ACCUMULATION: PassId = PassId::new(1);
const MIP_GENERATION: PassId = PassId::new(2);
const HISTORY_FIX: PassId = PassId::new(3);
const BLUR: PassId = PassId::new(4);
const POST_BLUR: PassId = PassId::new(5);
const TEMPORAL_STABILIZATION: PassId = PassId::new(6);

/// Mips of the accumulated signal and scaled view depth used by history fix.
const MIP_NUM: u16 = 5;

/// Specular denoiser: pre-blur, temporal accumulation, history reconstruction,
/// two spatial blurs and temporal stabilization.
#[derive(Debug, Clone, Default)]
pub struct Specular {
    settings: SpecularSettings,
}

impl Specular {
    /// Create the denoiser with the given settings.
    pub fn new(settings: SpecularSettings) -> Self {
        Self { settings }
    }

    /// Current settings.
    pub fn settings(&self) -> &SpecularSettings {
        &self.settings
    }
}

impl DenoiseMethod for Specular {
    fn name(&self) -> &str {
        "Specular"
    }

    fn build(&self, b: &mut MethodBuilder<'_>) -> Result<()> {
        let (w, h) = (b.width(), b.height());

        let prev_view_z_normal_roughness = b.declare_permanent(TextureDesc::new(Format::Rg32Uint, w, h))?;
        let history = b.declare_permanent(TextureDesc::new(Format::Rgba16Sfloat, w, h))?;
        let stabilized_1 = b.declare_permanent(TextureDesc::new(Format::Rgba16Sfloat, w, h))?;
        let stabilized_2 = b.declare_permanent(TextureDesc::new(Format::Rgba16Sfloat, w, h))?;

        let internal_data = b.declare_transient(TextureDesc::new(Format::Rgba8Unorm, w, h))?;
        let accumulated =
            b.declare_transient(TextureDesc::new(Format::Rgba16Sfloat, w, h).with_mips(MIP_NUM))?;
        let scaled_view_z =
            b.declare_transient(TextureDesc::new(Format::R16Sfloat, w, h).with_mips(MIP_NUM))?;

        // Stabilized history doubles as blur scratch, swapped every frame.
        let temp = ResourceView::from(stabilized_1).ping_pong(stabilized_2);

        b.begin_pass(PRE_BLUR, "Specular - pre-blur", "Specular_PreBlur.cs")?;
        b.add_input(ResourceType::InNormalRoughness)?;
        b.add_input(ResourceType::InViewZ)?;
        b.add_input(ResourceType::InSpecHitDist)?;
        b.add_output(temp)?;
        b.add_output(scaled_view_z)?;
        b.set_constant_layout(ConstantLayout::new(1, 3, 0, 1))?;
        b.end_pass()?;

        b.begin_pass(
            TEMPORAL_ACCUMULATION,
            "Specular - temporal accumulation",
            "Specular_TemporalAccumulation.cs",
        )?;
        b.add_input(ResourceType::InNormalRoughness)?;
        b.add_input(ResourceType::InViewZ)?;
        b.add_input(ResourceType::InMv)?;
        b.add_input(history)?;
        b.add_input(temp)?;
        b.add_input(prev_view_z_normal_roughness)?;
        b.add_output(accumulated)?;
        b.add_output(internal_data)?;
        b.set_constant_layout(ConstantLayout::new(4, 4, 1, 4))?;
        b.end_pass()?;

        b.begin_pass(MIP_GENERATION, "Specular - mip generation", "Specular_Mips.cs")?;
        b.add_input(accumulated)?;
        b.add_input(scaled_view_z)?;
        for mip in 1..MIP_NUM {
            b.add_output(ResourceView::from(accumulated).mips(mip, 1))?;
            b.add_output(ResourceView::from(scaled_view_z).mips(mip, 1))?;
        }
        b.set_constant_layout(ConstantLayout::shared())?;
        b.set_resolution_divisor(2)?;
        b.set_tile_size(16, 16)?;
        b.end_pass()?;

        b.begin_pass(HISTORY_FIX, "Specular - history fix", "Specular_HistoryFix.cs")?;
        b.add_input(internal_data)?;
        b.add_input(ResourceType::InNormalRoughness)?;
        b.add_input(ResourceView::from(accumulated).mips(1, MIP_NUM - 1))?;
        b.add_input(ResourceView::from(scaled_view_z).mips(0, MIP_NUM))?;
        b.add_output(accumulated)?;
        b.set_constant_layout(ConstantLayout::new(0, 0, 1, 0))?;
        b.end_pass()?;

        b.begin_pass(BLUR, "Specular - blur", "Specular_Blur.cs")?;
        b.add_input(ResourceType::InNormalRoughness)?;
        b.add_input(internal_data)?;
        b.add_input(accumulated)?;
        b.add_input(scaled_view_z)?;
        b.add_output(temp)?;
        b.set_constant_layout(ConstantLayout::new(1, 3, 0, 0))?;
        b.end_pass()?;

        b.begin_pass(POST_BLUR, "Specular - post-blur", "Specular_PostBlur.cs")?;
        b.add_input(ResourceType::InNormalRoughness)?;
        b.add_input(internal_data)?;
        b.add_input(temp)?;
        b.add_input(scaled_view_z)?;
        b.add_input(accumulated)?;
        b.add_output(history)?;
        b.set_constant_layout(ConstantLayout::new(1, 3, 0, 1))?;
        b.end_pass()?;

        b.begin_pass(
            TEMPORAL_STABILIZATION,
            "Specular - temporal stabilization",
            "Specular_TemporalStabilization.cs",
        )?;
        b.add_input(ResourceType::InNormalRoughness)?;
        b.add_input(ResourceType::InViewZ)?;
        b.add_input(ResourceType::InMv)?;
        b.add_input(internal_data)?;
        b.add_input(ResourceView::from(stabilized_2).ping_pong(stabilized_1))?;
        b.add_input(history)?;
        b.add_output(prev_view_z_normal_roughness)?;
        b.add_output(ResourceView::from(stabilized_1).ping_pong(stabilized_2))?;
        b.add_output(ResourceType::OutSpecHitDist)?;
        b.set_constant_layout(ConstantLayout::new(3, 2, 2, 0))?;
        b.end_pass()?;

        Ok(())
    }

    fn set_settings(&mut self, settings: &MethodSettings) -> Result<()> {
        match settings {
            MethodSettings::Specular(settings) => {
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
        let settings = &self.settings;
        let accumulation = AccumulationParams::resolve(
            settings.max_accumulated_frame_num,
            MAX_HISTORY_FRAME_NUM,
            settings.blur_radius,
            settings.disocclusion_threshold,
            settings.antilag_settings.enable,
            frame.force_reference_accumulation,
        );

        let scaling = hit_distance_scaling(&settings.hit_distance_parameters, frame.meters_to_units);
        let trimming = &settings.lobe_trimming_parameters;
        let trimming_and_blur_radius = Vec4::new(trimming.a, trimming.b, trimming.c, accumulation.blur_radius);
        let trimming_and_accum_speed = Vec4::new(
            trimming.a,
            trimming.b,
            trimming.c,
            frame.checkerboard_resolve_accum_speed,
        );
        let checkerboard = settings.checkerboard_mode.packed();

        match pass {
            PRE_BLUR => {
                out.add_float4x4(&frame.world_to_view);
                out.add_float4(frame.rotators[0]);
                out.add_float4(scaling);
                out.add_float4(trimming_and_blur_radius);
                out.add_uint(checkerboard);
            }
            TEMPORAL_ACCUMULATION => {
                out.add_float4x4(&frame.world_to_view_prev);
                out.add_float4x4(&frame.world_to_clip_prev);
                out.add_float4x4(&frame.view_to_world);
                out.add_float4x4(&frame.world_to_clip);
                out.add_float4(frame.frustum_prev);
                out.add_float4(frame.camera_delta_and(flag(frame.is_ortho_prev)));
                out.add_float4(scaling);
                out.add_float4(trimming_and_accum_speed);
                out.add_float2(frame.motion_vector_scale);
                out.add_float(accumulation.disocclusion_threshold);
                out.add_float(frame.jitter_delta);
                out.add_float(accumulation.max_accumulated_frame_num);
                out.add_uint(checkerboard);
            }
            MIP_GENERATION => {}
            HISTORY_FIX => {
                out.add_uint2(ctx.width as u32, ctx.height as u32);
            }
            BLUR => {
                out.add_float4x4(&frame.world_to_view);
                out.add_float4(frame.rotators[1]);
                out.add_float4(scaling);
                out.add_float4(trimming_and_blur_radius);
            }
            POST_BLUR => {
                out.add_float4x4(&frame.world_to_view);
                out.add_float4(frame.rotators[2]);
                out.add_float4(scaling);
                out.add_float4(trimming_and_blur_radius);
                out.add_float(settings.post_blur_max_adaptive_radius_scale);
            }
            TEMPORAL_STABILIZATION => {
                out.add_float4x4(&frame.world_to_clip_prev);
                out.add_float4x4(&frame.view_to_world);
                out.add_float4x4(&frame.world_to_clip);
                out.add_float4(scaling);
                out.add_float4(frame.camera_delta_and(flag(accumulation.use_antilag)));
                out.add_float2(frame.motion_vector_scale);
                out.add_float2(Vec2::new(
                    settings.antilag_settings.intensity_threshold_min,
                    settings.antilag_settings.intensity_threshold_max,
                ));
            }
            other => return Err(unknown_pass(self.name(), other)),
        }
        Ok(())
    }
}
