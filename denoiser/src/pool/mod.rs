//! Permanent and transient texture pools.
//!
//! Methods declare the textures they need through the [`PoolRegistry`] while
//! they are built. Each declaration returns a [`PoolSlot`], a stable index
//! into one of the two pools that stays valid for the denoiser's lifetime.
//!
//! # Transient aliasing
//!
//! Transient textures are scratch memory that only lives for the duration of
//! one method's dispatches. Under [`TransientMergePolicy::Superset`] the n-th
//! transient declaration of every method prefers slot n, and the slot
//! descriptor grows to satisfy every user. A slot is only shared when its
//! format can hold the requested one (see [`Format::can_hold`]); otherwise the
//! declaration takes another compatible slot or a fresh one. A method never
//! receives the same transient slot twice.
//!
//! [`Format::can_hold`]: crate::types::Format::can_hold

use crate::error::{DenoiserError, Result};
use crate::types::{ResourceType, TextureDesc};

/// Which pool a slot belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PoolKind {
    /// Exclusively owned by one method.
    Permanent,
    /// Scratch storage shared across methods.
    Transient,
}

impl PoolKind {
    /// The dispatch-level resource identity of this pool.
    pub fn resource_type(self) -> ResourceType {
        match self {
            Self::Permanent => ResourceType::PermanentPool,
            Self::Transient => ResourceType::TransientPool,
        }
    }
}

/// Index of a texture in one of the pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PoolSlot {
    kind: PoolKind,
    index: u16,
}

impl PoolSlot {
    pub(crate) fn new(kind: PoolKind, index: u16) -> Self {
        Self { kind, index }
    }

    /// Pool this slot belongs to.
    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    /// Index within the pool.
    pub fn index(&self) -> u16 {
        self.index
    }
}

/// How transient declarations of different methods share slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TransientMergePolicy {
    /// Transient declarations of different methods share compatible slots,
    /// preferring the slot with the same ordinal. The slot keeps the maximum
    /// size and mip count of all users and a format that holds all of them.
    #[default]
    Superset,
    /// Every transient declaration gets its own slot.
    Exclusive,
}

/// Merge two transient descriptors into one that satisfies both.
///
/// Width, height and mip count take the maximum. The format is whichever of
/// the two can hold the other, preferring `existing`. Returns `None` when
/// neither format can hold the other.
pub fn merge_superset(existing: &TextureDesc, requested: &TextureDesc) -> Option<TextureDesc> {
    let format = if existing.format.can_hold(requested.format) {
        existing.format
    } else if requested.format.can_hold(existing.format) {
        requested.format
    } else {
        return None;
    };

    Some(TextureDesc {
        format,
        width: existing.width.max(requested.width),
        height: existing.height.max(requested.height),
        mip_num: existing.mip_num.max(requested.mip_num),
    })
}

/// Ordered texture descriptors of both pools.
#[derive(Debug, Clone, Default)]
pub struct PoolRegistry {
    permanent: Vec<TextureDesc>,
    transient: Vec<TextureDesc>,
    policy: TransientMergePolicy,
    transient_ordinal: usize,
    /// Transient slots handed to the method being built.
    claimed: Vec<usize>,
}

impl PoolRegistry {
    /// Create empty pools with the given transient policy.
    pub fn new(policy: TransientMergePolicy) -> Self {
        Self {
            policy,
            ..Default::default()
        }
    }

    /// Transient merge policy in effect.
    pub fn policy(&self) -> TransientMergePolicy {
        self.policy
    }

    /// Start declarations for a new method.
    ///
    /// Resets the method-local transient ordinal and claimed slots.
    pub fn begin_method(&mut self) {
        self.transient_ordinal = 0;
        self.claimed.clear();
    }

    /// Declare a texture in the given pool and return its slot.
    ///
    /// Permanent declarations always append. Transient declarations append or
    /// alias an existing slot according to the merge policy.
    pub fn declare(&mut self, kind: PoolKind, desc: TextureDesc) -> Result<PoolSlot> {
        desc.validate()?;

        match kind {
            PoolKind::Permanent => push_slot(&mut self.permanent, kind, desc),
            PoolKind::Transient => match self.policy {
                TransientMergePolicy::Exclusive => push_slot(&mut self.transient, kind, desc),
                TransientMergePolicy::Superset => self.declare_shared_transient(desc),
            },
        }
    }

    fn declare_shared_transient(&mut self, desc: TextureDesc) -> Result<PoolSlot> {
        let ordinal = self.transient_ordinal;
        self.transient_ordinal += 1;

        let shared = std::iter::once(ordinal)
            .chain(0..self.transient.len())
            .filter(|index| !self.claimed.contains(index))
            .find_map(|index| {
                let existing = self.transient.get(index)?;
                merge_superset(existing, &desc).map(|merged| (index, merged))
            });

        let slot = match shared {
            Some((index, merged)) => {
                if let Some(existing) = self.transient.get_mut(index)
                    && merged != *existing
                {
                    log::debug!("Transient slot {index} upgraded from {existing:?} to {merged:?}");
                    *existing = merged;
                }
                PoolSlot::new(PoolKind::Transient, slot_index(index)?)
            }
            None => {
                if ordinal < self.transient.len() {
                    log::debug!(
                        "Transient {:?} has no compatible slot, appending slot {}",
                        desc.format,
                        self.transient.len()
                    );
                }
                push_slot(&mut self.transient, PoolKind::Transient, desc)?
            }
        };

        self.claimed.push(slot.index() as usize);
        Ok(slot)
    }

    /// Look up the descriptor stored for a slot.
    pub fn get(&self, slot: PoolSlot) -> Option<&TextureDesc> {
        let pool = match slot.kind {
            PoolKind::Permanent => &self.permanent,
            PoolKind::Transient => &self.transient,
        };
        pool.get(slot.index as usize)
    }

    /// Permanent pool descriptors in slot order.
    pub fn permanent(&self) -> &[TextureDesc] {
        &self.permanent
    }

    /// Transient pool descriptors in slot order.
    pub fn transient(&self) -> &[TextureDesc] {
        &self.transient
    }
}

fn slot_index(index: usize) -> Result<u16> {
    u16::try_from(index)
        .map_err(|_| DenoiserError::failure(format!("pool slot index {index} exceeds u16")))
}

fn push_slot(pool: &mut Vec<TextureDesc>, kind: PoolKind, desc: TextureDesc) -> Result<PoolSlot> {
    let index = slot_index(pool.len())?;
    pool.push(desc);
    Ok(PoolSlot::new(kind, index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Format;

    fn tex(format: Format, w: u16, h: u16) -> TextureDesc {
        TextureDesc::new(format, w, h)
    }

    #[test]
    fn test_permanent_slots_never_alias() {
        let mut pools = PoolRegistry::default();
        pools.begin_method();
        let a = pools
            .declare(PoolKind::Permanent, tex(Format::Rg32Uint, 64, 64))
            .unwrap();
        pools.begin_method();
        let b = pools
            .declare(PoolKind::Permanent, tex(Format::Rg32Uint, 64, 64))
            .unwrap();

        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(pools.permanent().len(), 2);
    }

    #[test]
    fn test_superset_aliases_by_ordinal() {
        let mut pools = PoolRegistry::new(TransientMergePolicy::Superset);
        pools.begin_method();
        let a0 = pools
            .declare(PoolKind::Transient, tex(Format::Rg16Sfloat, 1920, 1080))
            .unwrap();
        let a1 = pools
            .declare(PoolKind::Transient, tex(Format::R16Sfloat, 1920, 1080).with_mips(5))
            .unwrap();

        pools.begin_method();
        let b0 = pools
            .declare(PoolKind::Transient, tex(Format::Rgba16Sfloat, 1280, 1440))
            .unwrap();

        assert_eq!(a0, b0);
        assert_ne!(a0, a1);
        assert_eq!(pools.transient().len(), 2);

        let merged = pools.get(a0).unwrap();
        assert_eq!(merged.format, Format::Rgba16Sfloat);
        assert_eq!(merged.width, 1920);
        assert_eq!(merged.height, 1440);
        assert_eq!(merged.mip_num, 1);
    }

    #[test]
    fn test_superset_keeps_formats_apart() {
        let mut pools = PoolRegistry::new(TransientMergePolicy::Superset);
        pools.begin_method();
        let depth = pools
            .declare(PoolKind::Transient, tex(Format::R16Sfloat, 64, 64))
            .unwrap();

        pools.begin_method();
        let tiles = pools
            .declare(PoolKind::Transient, tex(Format::Rg8Unorm, 4, 4))
            .unwrap();
        let hit_dist = pools
            .declare(PoolKind::Transient, tex(Format::Rg16Sfloat, 64, 64))
            .unwrap();

        assert_ne!(depth, tiles);
        // The depth slot is free for this method and can hold the request.
        assert_eq!(hit_dist, depth);
        assert_eq!(pools.get(depth).unwrap().format, Format::Rg16Sfloat);
        assert_eq!(pools.get(tiles).unwrap().format, Format::Rg8Unorm);
        assert_eq!(pools.transient().len(), 2);
    }

    #[test]
    fn test_superset_never_reuses_a_slot_within_a_method() {
        let mut pools = PoolRegistry::new(TransientMergePolicy::Superset);
        pools.begin_method();
        pools
            .declare(PoolKind::Transient, tex(Format::Rgba8Unorm, 64, 64))
            .unwrap();

        pools.begin_method();
        let a = pools
            .declare(PoolKind::Transient, tex(Format::Rg16Sfloat, 64, 64))
            .unwrap();
        let b = pools
            .declare(PoolKind::Transient, tex(Format::Rg16Sfloat, 64, 64))
            .unwrap();
        let c = pools
            .declare(PoolKind::Transient, tex(Format::Rgba8Unorm, 64, 64))
            .unwrap();
        let d = pools
            .declare(PoolKind::Transient, tex(Format::Rgba8Unorm, 64, 64))
            .unwrap();

        assert_eq!(c.index(), 0);
        let mut indices = vec![a.index(), b.index(), c.index(), d.index()];
        indices.sort_unstable();
        indices.dedup();
        assert_eq!(indices.len(), 4);
    }

    #[test]
    fn test_exclusive_never_aliases() {
        let mut pools = PoolRegistry::new(TransientMergePolicy::Exclusive);
        pools.begin_method();
        let a = pools
            .declare(PoolKind::Transient, tex(Format::Rgba8Unorm, 64, 64))
            .unwrap();
        pools.begin_method();
        let b = pools
            .declare(PoolKind::Transient, tex(Format::Rgba8Unorm, 64, 64))
            .unwrap();

        assert_ne!(a, b);
        assert_eq!(pools.transient().len(), 2);
    }

    #[test]
    fn test_merge_format_compatibility() {
        let existing = tex(Format::Rgba16Sfloat, 8, 8);
        let requested = tex(Format::R16Sfloat, 16, 4);
        let merged = merge_superset(&existing, &requested).unwrap();
        assert_eq!(merged.format, Format::Rgba16Sfloat);
        assert_eq!((merged.width, merged.height), (16, 8));

        let existing = tex(Format::Rg8Unorm, 8, 8);
        let requested = tex(Format::Rgba8Unorm, 8, 8);
        assert_eq!(
            merge_superset(&existing, &requested).unwrap().format,
            Format::Rgba8Unorm
        );

        // Different numeric classes never merge.
        assert!(merge_superset(&tex(Format::Rgba8Unorm, 8, 8), &tex(Format::Rgba8Snorm, 8, 8)).is_none());
        assert!(merge_superset(&tex(Format::Rg8Unorm, 8, 8), &tex(Format::R16Sfloat, 8, 8)).is_none());
        // Neither holds the other.
        assert!(merge_superset(&tex(Format::R32Sfloat, 8, 8), &tex(Format::Rg16Sfloat, 8, 8)).is_none());
    }

    #[test]
    fn test_zero_sized_declaration_fails() {
        let mut pools = PoolRegistry::default();
        pools.begin_method();
        let err = pools
            .declare(PoolKind::Permanent, tex(Format::Rgba8Unorm, 0, 8))
            .unwrap_err();
        assert!(matches!(err, DenoiserError::InvalidArgument(_)));

        let err = pools
            .declare(PoolKind::Transient, tex(Format::Rgba8Unorm, 8, 8).with_mips(0))
            .unwrap_err();
        assert!(matches!(err, DenoiserError::InvalidArgument(_)));
        assert!(pools.permanent().is_empty());
        assert!(pools.transient().is_empty());
    }

    #[test]
    fn test_pool_kind_resource_type() {
        assert_eq!(PoolKind::Permanent.resource_type(), ResourceType::PermanentPool);
        assert_eq!(PoolKind::Transient.resource_type(), ResourceType::TransientPool);
    }
}
