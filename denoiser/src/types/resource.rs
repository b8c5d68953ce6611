//! Resource identities referenced by dispatches.

use super::DescriptorType;

/// Identity of a resource referenced by a dispatch.
///
/// Host-provided inputs and outputs are named directly; pool textures are
/// referenced through [`ResourceType::PermanentPool`] or
/// [`ResourceType::TransientPool`] plus an index into the matching pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceType {
    // Common inputs
    /// Motion vectors (2D screen space or 3D world space).
    InMv,
    /// Packed normal and roughness.
    InNormalRoughness,
    /// Linear view depth.
    InViewZ,

    // Inputs
    /// Noisy diffuse radiance and hit distance.
    InDiffHitDist,
    /// Noisy specular radiance and hit distance.
    InSpecHitDist,
    /// Noisy shadow data.
    InShadowData,
    /// Optional shadow translucency.
    InShadowTranslucency,
    /// Noisy signal for reference accumulation.
    InRadiance,

    // Outputs
    /// Denoised diffuse radiance and hit distance.
    OutDiffHitDist,
    /// Denoised specular radiance and hit distance.
    OutSpecHitDist,
    /// Denoised shadow and translucency.
    OutShadowTranslucency,
    /// Accumulated signal.
    OutRadiance,
    /// Specular reflection motion vectors.
    OutReflectionMv,

    // Pools
    /// Scratch texture pool, reusable after denoising.
    TransientPool,
    /// Texture pool dedicated to the denoiser.
    PermanentPool,
}

impl ResourceType {
    /// Check if this identity refers to a pool rather than a host resource.
    pub fn is_pool(self) -> bool {
        matches!(self, Self::TransientPool | Self::PermanentPool)
    }

    /// Check if this is a host-provided output.
    pub fn is_output(self) -> bool {
        matches!(
            self,
            Self::OutDiffHitDist
                | Self::OutSpecHitDist
                | Self::OutShadowTranslucency
                | Self::OutRadiance
                | Self::OutReflectionMv
        )
    }
}

/// A flattened resource reference as emitted in a dispatch.
///
/// For host resources `index_in_pool` is always 0. The host maps
/// `(ty, index_in_pool)` to a real texture and creates a view over
/// `[mip_offset, mip_offset + mip_num)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Resource {
    /// Binding state required by the shader.
    pub state_needed: DescriptorType,
    /// Resource identity.
    pub ty: ResourceType,
    /// Index into the pool named by `ty`.
    pub index_in_pool: u16,
    /// First mip level of the view.
    pub mip_offset: u16,
    /// Number of mip levels in the view.
    pub mip_num: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_identities() {
        assert!(ResourceType::TransientPool.is_pool());
        assert!(ResourceType::PermanentPool.is_pool());
        assert!(!ResourceType::InMv.is_pool());
        assert!(!ResourceType::OutSpecHitDist.is_pool());
    }

    #[test]
    fn test_output_identities() {
        assert!(ResourceType::OutRadiance.is_output());
        assert!(!ResourceType::InRadiance.is_output());
        assert!(!ResourceType::PermanentPool.is_output());
    }
}
