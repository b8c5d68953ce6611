//! Static sampler declarations.

/// Static samplers the denoiser shaders expect to be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sampler {
    /// Nearest filtering, clamp to edge.
    NearestClamp,
    /// Nearest filtering, mirrored repeat.
    NearestMirroredRepeat,
    /// Linear filtering, clamp to edge.
    LinearClamp,
    /// Linear filtering, mirrored repeat.
    LinearMirroredRepeat,
}

/// A static sampler bound at a fixed register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StaticSamplerDesc {
    /// Sampler kind.
    pub sampler: Sampler,
    /// Shader register index.
    pub register_index: u32,
}

/// The samplers shared by every denoiser pipeline, in register order.
pub const STATIC_SAMPLERS: [StaticSamplerDesc; 4] = [
    StaticSamplerDesc {
        sampler: Sampler::NearestClamp,
        register_index: 0,
    },
    StaticSamplerDesc {
        sampler: Sampler::NearestMirroredRepeat,
        register_index: 1,
    },
    StaticSamplerDesc {
        sampler: Sampler::LinearClamp,
        register_index: 2,
    },
    StaticSamplerDesc {
        sampler: Sampler::LinearMirroredRepeat,
        register_index: 3,
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_sampler_registers_are_contiguous() {
        for (i, desc) in STATIC_SAMPLERS.iter().enumerate() {
            assert_eq!(desc.register_index, i as u32);
        }
    }
}
