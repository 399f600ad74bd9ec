//! Aggregation
//!
//! Folds the per-mesh results of one root into a single verdict. The overall
//! density is derived from summed areas, which weights large meshes by their
//! size; it is not the mean of per-mesh densities.

use serde::{Deserialize, Serialize};

use crate::evaluate::{classify, texel_density, DensityStatus, MeshEvalResult};
use crate::DensityConfig;

/// Overall verdict for one root
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Whether an overall density could be derived
    pub has_value: bool,
    /// Density from summed areas, 0 without a value
    pub overall_texel_density: f32,
    /// Classification of the overall density
    pub overall_status: DensityStatus,
    /// Meshes that contributed to the sums
    pub valid_mesh_count: usize,
    /// Meshes found under the root
    pub total_mesh_count: usize,
}

impl AggregateResult {
    /// Aggregate with no value
    pub fn empty(total_mesh_count: usize, valid_mesh_count: usize) -> Self {
        Self {
            has_value: false,
            overall_texel_density: 0.0,
            overall_status: DensityStatus::Error,
            valid_mesh_count,
            total_mesh_count,
        }
    }
}

impl Default for AggregateResult {
    fn default() -> Self {
        Self::empty(0, 0)
    }
}

/// Aggregate the results of one root
///
/// Without a positive finite target, or when the summed areas are not
/// positive and finite, the root has no value.
pub fn aggregate(results: &[MeshEvalResult], config: &DensityConfig) -> AggregateResult {
    let total = results.len();
    if total == 0 {
        return AggregateResult::empty(0, 0);
    }

    let mut world_sum = 0.0_f64;
    let mut uv_sum = 0.0_f64;
    let mut valid = 0usize;

    for result in results.iter().filter(|r| r.status.is_valid()) {
        world_sum += result.world_area as f64;
        uv_sum += result.uv_area as f64;
        valid += 1;
    }

    let positive = |sum: f64| sum > 0.0 && sum.is_finite();
    if valid == 0 || !positive(world_sum) || !positive(uv_sum) {
        return AggregateResult::empty(total, valid);
    }

    let density = texel_density(config.texture_resolution, uv_sum, world_sum);
    let status = classify(density, config.target_texel_density, config.tolerance_percent);
    if status == DensityStatus::Error {
        return AggregateResult::empty(total, valid);
    }

    AggregateResult {
        has_value: true,
        overall_texel_density: density,
        overall_status: status,
        valid_mesh_count: valid,
        total_mesh_count: total,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESOLUTION: u32 = 1024;

    fn config() -> DensityConfig {
        DensityConfig {
            texture_resolution: RESOLUTION,
            target_texel_density: 1024.0,
            tolerance_percent: 10.0,
        }
    }

    fn result(name: &str, world_area: f32, uv_area: f32) -> MeshEvalResult {
        let config = config();
        let density = texel_density(config.texture_resolution, uv_area as f64, world_area as f64);
        MeshEvalResult {
            name: name.to_string(),
            status: classify(density, config.target_texel_density, config.tolerance_percent),
            texel_density: density,
            world_area,
            uv_area,
        }
    }

    fn failed(name: &str) -> MeshEvalResult {
        MeshEvalResult {
            name: name.to_string(),
            status: DensityStatus::Error,
            texel_density: 0.0,
            world_area: 50.0,
            uv_area: 0.0,
        }
    }

    #[test]
    fn test_empty_results() {
        let aggregate = aggregate(&[], &config());
        assert!(!aggregate.has_value);
        assert_eq!(aggregate.overall_status, DensityStatus::Error);
        assert_eq!(aggregate.valid_mesh_count, 0);
        assert_eq!(aggregate.total_mesh_count, 0);
    }

    #[test]
    fn test_all_invalid() {
        let aggregate = aggregate(&[failed("A"), failed("B")], &config());
        assert!(!aggregate.has_value);
        assert_eq!(aggregate.overall_status, DensityStatus::Error);
        assert_eq!(aggregate.valid_mesh_count, 0);
        assert_eq!(aggregate.total_mesh_count, 2);
    }

    #[test]
    fn test_identical_density_is_preserved() {
        let results = [result("A", 4.0, 0.25), result("B", 16.0, 1.0), result("C", 1.0, 0.0625)];
        let aggregate = aggregate(&results, &config());

        assert!(aggregate.has_value);
        assert!((aggregate.overall_texel_density - 256.0).abs() < 1e-3);
        assert_eq!(aggregate.valid_mesh_count, 3);
    }

    #[test]
    fn test_weighted_by_area_not_mean() {
        let results = [result("Large", 100.0, 100.0), result("Small", 1.0, 4.0)];
        assert!((results[0].texel_density - RESOLUTION as f32).abs() < 1e-3);
        assert!((results[1].texel_density - 2.0 * RESOLUTION as f32).abs() < 1e-3);

        let aggregate = aggregate(&results, &config());
        let expected = RESOLUTION as f64 * (104.0_f64 / 101.0).sqrt();

        assert!((aggregate.overall_texel_density as f64 - expected).abs() < 1e-2);
        assert!((aggregate.overall_texel_density - 1.5 * RESOLUTION as f32).abs() > 100.0);
        assert_eq!(aggregate.overall_status, DensityStatus::Ok);
    }

    #[test]
    fn test_non_finite_sums_have_no_value() {
        let mut corrupt = result("Corrupt", 1.0, 1.0);
        corrupt.world_area = f32::NAN;
        let aggregate = aggregate(&[result("Good", 4.0, 1.0), corrupt], &config());

        assert!(!aggregate.has_value);
        assert_eq!(aggregate.overall_status, DensityStatus::Error);
        assert_eq!(aggregate.overall_texel_density, 0.0);
        assert_eq!(aggregate.total_mesh_count, 2);
    }

    #[test]
    fn test_invalid_target_has_no_value() {
        let results = [result("A", 4.0, 1.0)];
        let config = DensityConfig {
            target_texel_density: 0.0,
            ..config()
        };
        let aggregate = aggregate(&results, &config);

        assert!(!aggregate.has_value);
        assert_eq!(aggregate.overall_status, DensityStatus::Error);
        assert_eq!(aggregate.overall_texel_density, 0.0);
    }

    #[test]
    fn test_errors_excluded_from_sums() {
        let results = [result("Good", 4.0, 1.0), failed("Broken")];
        let aggregate = aggregate(&results, &config());

        assert!(aggregate.has_value);
        assert!((aggregate.overall_texel_density - 512.0).abs() < 1e-3);
        assert_eq!(aggregate.overall_status, DensityStatus::Low);
        assert_eq!(aggregate.valid_mesh_count, 1);
        assert_eq!(aggregate.total_mesh_count, 2);
    }
}
