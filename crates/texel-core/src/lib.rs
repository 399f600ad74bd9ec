//! # Texel Core
//!
//! Texel density evaluation for 3D meshes: texture pixels per world-space
//! meter, `resolution * sqrt(uv_area / world_area)`.
//!
//! This crate provides:
//! - **Area**: world-space and UV-space triangle-sum areas
//! - **Evaluate**: per-mesh validation, density and classification
//! - **Aggregate**: one overall verdict per root from summed areas
//! - **Batch**: failure-isolated evaluation of many roots
//! - **Scene Graph**: hierarchical transforms, activation and prefabs

pub mod aggregate;
pub mod area;
pub mod batch;
pub mod error;
pub mod evaluate;
pub mod math;
pub mod mesh;
pub mod scene;

use serde::{Deserialize, Serialize};

pub use aggregate::{aggregate, AggregateResult};
pub use batch::{evaluate_items, run_batch, run_batch_parallel, BatchOutcome, BatchReport, MeshEnumerator, RootReport};
pub use error::{ConfigError, MeshIssue, SceneError};
pub use evaluate::{classify, evaluate_mesh, texel_density, DensityStatus, MeshEvalResult};
pub use mesh::{MeshGeometry, MeshItem};
pub use scene::{MeshSlot, Node, NodeId, Prefab, PrefabNode, SceneGraph, Transform};

/// Common texture resolutions offered by the tool
pub const RESOLUTION_PRESETS: [u32; 4] = [512, 1024, 2048, 4096];

/// Texel density configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DensityConfig {
    /// Texture resolution in pixels along one side
    pub texture_resolution: u32,
    /// Target density in pixels per meter
    pub target_texel_density: f32,
    /// Allowed deviation from the target, in percent
    pub tolerance_percent: f32,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            texture_resolution: 2048,
            target_texel_density: 512.0,
            tolerance_percent: 10.0,
        }
    }
}

impl DensityConfig {
    /// Check the configuration before any computation
    ///
    /// Negative tolerance is accepted and treated as 0.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.target_texel_density > 0.0 && self.target_texel_density.is_finite()) {
            return Err(ConfigError::InvalidTarget(self.target_texel_density));
        }
        if self.texture_resolution == 0 {
            return Err(ConfigError::InvalidResolution);
        }
        Ok(())
    }

    /// Tolerance as used for classification
    pub fn effective_tolerance(&self) -> f32 {
        self.tolerance_percent.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = DensityConfig::default();
        assert!(config.validate().is_ok());
        assert!(RESOLUTION_PRESETS.contains(&config.texture_resolution));
    }

    #[test]
    fn test_config_rejects_bad_target() {
        for target in [0.0, -12.0, f32::NAN, f32::INFINITY] {
            let config = DensityConfig {
                target_texel_density: target,
                ..DensityConfig::default()
            };
            assert!(matches!(config.validate(), Err(ConfigError::InvalidTarget(_))));
        }
    }

    #[test]
    fn test_config_rejects_zero_resolution() {
        let config = DensityConfig {
            texture_resolution: 0,
            ..DensityConfig::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::InvalidResolution));
    }

    #[test]
    fn test_negative_tolerance_floored() {
        let config = DensityConfig {
            tolerance_percent: -5.0,
            ..DensityConfig::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.effective_tolerance(), 0.0);
    }
}
