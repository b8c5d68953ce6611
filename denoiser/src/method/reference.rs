//! Reference accumulator.

use super::{DenoiseMethod, PackContext, unknown_pass};
use crate::constants::{ConstantLayout, ConstantWriter};
use crate::error::Result;
use crate::graph::{MethodBuilder, PassId, ResourceView};
use crate::settings::{
    MethodSettings, REFERENCE_MAX_HISTORY_FRAME_NUM, ReferenceSettings, wrong_settings,
};
use crate::types::{Format, ResourceType, TextureDesc};

const ACCUMULATE: PassId = PassId::new(0);
const RESOLVE: PassId = PassId::new(1);

/// Accumulates the raw signal over many frames to produce ground truth.
#[derive(Debug, Clone, Default)]
pub struct Reference {
    settings: ReferenceSettings,
}

impl Reference {
    /// Create the accumulator with the given settings.
    pub fn new(settings: ReferenceSettings) -> Self {
        Self { settings }
    }

    /// Current settings.
    pub fn settings(&self) -> &ReferenceSettings {
        &self.settings
    }
}

impl DenoiseMethod for Reference {
    fn name(&self) -> &str {
        "Reference"
    }

    fn build(&self, b: &mut MethodBuilder<'_>) -> Result<()> {
        let (w, h) = (b.width(), b.height());

        let accumulated_a = b.declare_permanent(TextureDesc::new(Format::Rgba32Sfloat, w, h))?;
        let accumulated_b = b.declare_permanent(TextureDesc::new(Format::Rgba32Sfloat, w, h))?;

        let current = ResourceView::from(accumulated_a).ping_pong(accumulated_b);
        let previous = ResourceView::from(accumulated_b).ping_pong(accumulated_a);

        b.begin_pass(ACCUMULATE, "Reference - accumulate", "Reference_Accumulate.cs")?;
        b.add_input(ResourceType::InRadiance)?;
        b.add_input(previous)?;
        b.add_output(current)?;
        b.set_constant_layout(ConstantLayout::new(0, 0, 0, 1))?;
        b.end_pass()?;

        b.begin_pass(RESOLVE, "Reference - resolve", "Reference_Resolve.cs")?;
        b.add_input(current)?;
        b.add_output(ResourceType::OutRadiance)?;
        b.set_constant_layout(ConstantLayout::shared())?;
        b.end_pass()?;

        Ok(())
    }

    fn set_settings(&mut self, settings: &MethodSettings) -> Result<()> {
        match settings {
            MethodSettings::Reference(settings) => {
                self.settings = *settings;
                Ok(())
            }
            other => Err(wrong_settings(self.name(), other)),
        }
    }

    fn pack_constants(
        &self,
        pass: PassId,
        _ctx: &PackContext<'_>,
        out: &mut ConstantWriter<'_>,
    ) -> Result<()> {
        match pass {
            ACCUMULATE => {
                let frames = self
                    .settings
                    .max_accumulated_frame_num
                    .min(REFERENCE_MAX_HISTORY_FRAME_NUM);
                out.add_float(frames as f32);
            }
            RESOLVE => {}
            other => return Err(unknown_pass(self.name(), other)),
        }
        Ok(())
    }
}
