//! Per-frame dispatch recording.

use std::ops::Range;

use crate::allocator::{ArenaRegion, ConstantArena};
use crate::constants::{ConstantWriter, FrameContext, SharedConstants};
use crate::error::{DenoiserError, Result};
use crate::graph::TileSize;
use crate::method::PackContext;
use crate::registry::{MethodHandle, MethodRegistry};
use crate::types::Resource;

/// One compute dispatch for the host to execute.
///
/// Borrows from the denoiser's per-frame storage; valid until the next
/// recording call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DispatchDesc<'a> {
    /// Pass name, for debugging and profiling markers.
    pub name: &'a str,
    /// Index into [`DenoiserDesc::pipelines`](crate::DenoiserDesc::pipelines).
    pub pipeline_index: u16,
    /// Inputs then outputs, in descriptor range order.
    pub resources: &'a [Resource],
    /// Packed constants; empty if the pipeline has no constant data.
    pub constant_data: &'a [u8],
    pub grid_width: u16,
    pub grid_height: u16,
}

impl DispatchDesc<'_> {
    /// Size of the packed constants in bytes.
    pub fn constant_buffer_data_size(&self) -> u32 {
        self.constant_data.len() as u32
    }
}

/// Number of thread groups covering a rectangle.
///
/// The rectangle is first divided by the pass's resolution divisor, then by
/// its tile size, rounding up both times. This is the only place dispatch
/// sizes are computed.
pub fn grid_size(rect: (u32, u32), divisor: u16, tile: TileSize) -> (u16, u16) {
    let groups = |extent: u32, tile: u16| {
        let groups = extent.div_ceil(divisor as u32).div_ceil(tile as u32);
        u16::try_from(groups).unwrap_or(u16::MAX)
    };
    (groups(rect.0, tile.width), groups(rect.1, tile.height))
}

#[derive(Debug, Clone)]
struct DispatchRecord {
    method: usize,
    pass: usize,
    resources: Range<usize>,
    constants: ArenaRegion,
    grid: (u16, u16),
}

/// Reusable storage for one frame of dispatches.
#[derive(Debug, Default)]
pub struct FrameRecorder {
    resources: Vec<Resource>,
    records: Vec<DispatchRecord>,
}

impl FrameRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pack constants and resolve resources for every pass of the selected
    /// methods, in registration then declaration order.
    ///
    /// With `only` set, methods not listed are skipped.
    pub fn record(
        &mut self,
        registry: &MethodRegistry,
        regions: &[Vec<ArenaRegion>],
        arena: &mut ConstantArena,
        frame: &FrameContext,
        only: Option<&[MethodHandle]>,
        validation: bool,
    ) -> Result<()> {
        crate::profile_function!();

        self.resources.clear();
        self.records.clear();

        for (method_index, entry) in registry.methods().iter().enumerate() {
            if only.is_some_and(|handles| !handles.contains(&entry.handle())) {
                continue;
            }

            let method_regions = regions.get(method_index).ok_or_else(|| {
                DenoiserError::failure(format!("{}: method is not finalized", entry.name()))
            })?;
            let ctx = PackContext {
                frame,
                width: entry.width(),
                height: entry.height(),
            };
            let shared = SharedConstants::new(frame, entry.width(), entry.height());
            let rect = frame.rect_size(entry.width(), entry.height());

            for (pass_index, (pass, &region)) in
                entry.passes().iter().zip(method_regions).enumerate()
            {
                crate::profile_scope_dynamic!(pass.name.as_str());

                if region.size != pass.constant_size as usize {
                    return Err(DenoiserError::failure(format!(
                        "constant region of pass '{}' holds {} bytes, expected {}",
                        pass.name, region.size, pass.constant_size
                    )));
                }
                let data = arena.region_mut(region).ok_or_else(|| {
                    DenoiserError::failure(format!(
                        "constant region of pass '{}' lies outside the arena",
                        pass.name
                    ))
                })?;

                if pass.constant_size > 0 {
                    crate::profile_scope!("pack_constants");
                    let mut writer = ConstantWriter::new(data);
                    shared.write(&mut writer);
                    entry.method().pack_constants(pass.id, &ctx, &mut writer)?;
                    writer.finish(validation, &pass.name)?;
                }

                let start = self.resources.len();
                self.resources
                    .extend(pass.bindings().map(|b| b.resolve(frame.frame_index)));

                self.records.push(DispatchRecord {
                    method: method_index,
                    pass: pass_index,
                    resources: start..self.resources.len(),
                    constants: region,
                    grid: grid_size(rect, pass.resolution_divisor, pass.tile_size),
                });
            }
        }

        Ok(())
    }

    /// Dispatches of the last recording.
    ///
    /// `registry` and `arena` must be the ones passed to the last
    /// [`FrameRecorder::record`] call; a record that no longer resolves is a
    /// `Failure`.
    pub fn dispatches<'a>(
        &'a self,
        registry: &'a MethodRegistry,
        arena: &'a ConstantArena,
    ) -> Result<Vec<DispatchDesc<'a>>> {
        self.records
            .iter()
            .map(|record| {
                let pass = registry
                    .methods()
                    .get(record.method)
                    .and_then(|entry| entry.passes().get(record.pass))
                    .ok_or_else(|| {
                        DenoiserError::failure(format!(
                            "recorded pass {} of method {} is not registered",
                            record.pass, record.method
                        ))
                    })?;
                let resources = self.resources.get(record.resources.clone()).ok_or_else(|| {
                    DenoiserError::failure(format!("resources of pass '{}' are missing", pass.name))
                })?;
                let constant_data = arena.region(record.constants).ok_or_else(|| {
                    DenoiserError::failure(format!(
                        "constant region of pass '{}' lies outside the arena",
                        pass.name
                    ))
                })?;

                Ok(DispatchDesc {
                    name: &pass.name,
                    pipeline_index: pass.pipeline_index,
                    resources,
                    constant_data,
                    grid_width: record.grid.0,
                    grid_height: record.grid.1,
                })
            })
            .collect()
    }
}
