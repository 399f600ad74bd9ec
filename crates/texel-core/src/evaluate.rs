//! Mesh Evaluation
//!
//! Validates a single mesh item, computes its texel density and classifies
//! it against the configured target.

use serde::{Deserialize, Serialize};

use crate::area::{self, UvLayout};
use crate::error::MeshIssue;
use crate::mesh::MeshItem;
use crate::DensityConfig;

/// Texel density verdict for a mesh or a whole root
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DensityStatus {
    /// Below target by more than the tolerance
    Low,
    /// Within tolerance of the target
    Ok,
    /// Above target by more than the tolerance
    High,
    /// Could not be evaluated
    Error,
}

impl DensityStatus {
    /// Check whether this status carries a density value
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Error)
    }

    /// Short label for reports
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Ok => "OK",
            Self::High => "HIGH",
            Self::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for DensityStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of evaluating one mesh
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshEvalResult {
    /// Display name of the mesh item
    pub name: String,
    /// Classification
    pub status: DensityStatus,
    /// Texel density in pixels per meter, 0 on error
    pub texel_density: f32,
    /// World-space surface area in square meters
    pub world_area: f32,
    /// UV-space area
    pub uv_area: f32,
}

impl MeshEvalResult {
    fn error(name: &str, issue: MeshIssue, world_area: f32, uv_area: f32) -> Self {
        log::warn!("{}: {}", name, issue);
        Self {
            name: name.to_string(),
            status: DensityStatus::Error,
            texel_density: 0.0,
            world_area,
            uv_area,
        }
    }
}

/// Texel density from areas: `resolution * sqrt(uv_area / world_area)`
pub fn texel_density(resolution: u32, uv_area: f64, world_area: f64) -> f32 {
    (resolution as f64 * (uv_area / world_area).sqrt()) as f32
}

/// Classify a density against a target with a percentage tolerance
///
/// Negative tolerance is floored to 0. A value that is not finite, or a
/// target that is not positive and finite, yields [`DensityStatus::Error`].
pub fn classify(value: f32, target: f32, tolerance_percent: f32) -> DensityStatus {
    if !value.is_finite() || !is_positive_finite(target) {
        return DensityStatus::Error;
    }

    let tolerance = tolerance_percent.max(0.0) as f64;
    let target = target as f64;
    let diff_percent = (value as f64 - target) / target * 100.0;

    if diff_percent < -tolerance {
        DensityStatus::Low
    } else if diff_percent > tolerance {
        DensityStatus::High
    } else {
        DensityStatus::Ok
    }
}

fn is_positive_finite(value: f32) -> bool {
    value > 0.0 && value.is_finite()
}

/// Evaluate one mesh item
///
/// The first failing check wins; every failure logs its cause and yields an
/// error status with whatever areas were computed up to that point.
pub fn evaluate_mesh(item: &MeshItem, config: &DensityConfig) -> MeshEvalResult {
    let Some(geometry) = item.geometry.as_deref() else {
        return MeshEvalResult::error(&item.name, MeshIssue::MissingGeometry, 0.0, 0.0);
    };

    let layout = area::uv_layout(&geometry.uvs, geometry.vertex_count());
    if layout == UvLayout::Missing {
        return MeshEvalResult::error(&item.name, MeshIssue::MissingUv, 0.0, 0.0);
    }

    let skipped = area::out_of_range_triangles(&geometry.submeshes, geometry.vertex_count());
    if skipped > 0 {
        log::warn!("{}: skipped {} triangle(s) with out-of-range indices", item.name, skipped);
    }

    let world_area = area::world_area(&geometry.positions, &item.world, &geometry.submeshes);
    let uv_area = area::uv_area(&geometry.uvs, geometry.vertex_count(), &geometry.submeshes);

    if !is_positive_finite(world_area) {
        return MeshEvalResult::error(
            &item.name,
            MeshIssue::InvalidWorldArea(world_area),
            world_area,
            uv_area,
        );
    }

    if !is_positive_finite(uv_area) {
        let issue = match layout {
            UvLayout::Mismatch { uvs, vertices } => MeshIssue::UvVertexCountMismatch { uvs, vertices },
            _ => MeshIssue::InvalidUvArea(uv_area),
        };
        return MeshEvalResult::error(&item.name, issue, world_area, uv_area);
    }

    let density = texel_density(config.texture_resolution, uv_area as f64, world_area as f64);
    let status = classify(density, config.target_texel_density, config.tolerance_percent);
    if status == DensityStatus::Error {
        let issue = if is_positive_finite(config.target_texel_density) {
            MeshIssue::InvalidDensity(density)
        } else {
            MeshIssue::InvalidTarget(config.target_texel_density)
        };
        return MeshEvalResult::error(&item.name, issue, world_area, uv_area);
    }

    MeshEvalResult {
        name: item.name.clone(),
        status,
        texel_density: density,
        world_area,
        uv_area,
    }
}
