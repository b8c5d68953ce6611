//! Specular reflection motion vectors.

use super::{DenoiseMethod, PackContext, flag, hit_distance_scaling, unknown_pass};
use crate::constants::{ConstantLayout, ConstantWriter};
use crate::error::Result;
use crate::graph::{MethodBuilder, PassId};
use crate::settings::{MethodSettings, ReflectionMvSettings, wrong_settings};
use crate::types::ResourceType;

const REFLECTION_MV: PassId = PassId::new(0);

/// Computes screen-space motion of specular reflections from hit distances.
///
/// Owns no pool textures.
#[derive(Debug, Clone, Default)]
pub struct ReflectionMv {
    settings: ReflectionMvSettings,
}

impl ReflectionMv {
    /// Create the generator with the given settings.
    pub fn new(settings: ReflectionMvSettings) -> Self {
        Self { settings }
    }
}

impl DenoiseMethod for ReflectionMv {
    fn name(&self) -> &str {
        "Specular reflection MV"
    }

    fn build(&self, b: &mut MethodBuilder<'_>) -> Result<()> {
        b.begin_pass(REFLECTION_MV, "Specular reflection MV", "SpecularReflectionMv.cs")?;
        b.add_input(ResourceType::InMv)?;
        b.add_input(ResourceType::InNormalRoughness)?;
        b.add_input(ResourceType::InViewZ)?;
        b.add_input(ResourceType::InSpecHitDist)?;
        b.add_output(ResourceType::OutReflectionMv)?;
        b.set_constant_layout(ConstantLayout::new(2, 2, 1, 0))?;
        b.end_pass()?;
        Ok(())
    }

    fn set_settings(&mut self, settings: &MethodSettings) -> Result<()> {
        match settings {
            MethodSettings::ReflectionMv(settings) => {
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
        match pass {
            REFLECTION_MV => {
                out.add_float4x4(&frame.world_to_clip_prev);
                out.add_float4x4(&frame.view_to_world);
                out.add_float4(hit_distance_scaling(
                    &self.settings.hit_distance_parameters,
                    frame.meters_to_units,
                ));
                out.add_float4(frame.camera_delta_and(flag(frame.is_ortho_prev)));
                out.add_float2(frame.motion_vector_scale);
            }
            other => return Err(unknown_pass(self.name(), other)),
        }
        Ok(())
    }
}
