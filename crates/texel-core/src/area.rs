//! Area Reducers
//!
//! World-space surface area and UV-space area of a triangle mesh.
//!
//! Both reducers accumulate in `f64` and narrow to `f32` only on return, so
//! meshes with very large triangle counts do not drift. Triangles with an
//! out-of-range index are skipped one at a time. The reducers only trace at
//! debug level; the evaluator reports errors against the mesh name.

use glam::{Mat4, Vec2, Vec3};

use crate::math::{triangle_area_2d, triangle_area_3d, triangle_indices};

/// State of UV channel 0 relative to the vertex buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UvLayout {
    /// The channel has no entries
    Missing,
    /// The channel length differs from the vertex count
    Mismatch {
        /// Number of UV entries
        uvs: usize,
        /// Number of vertices
        vertices: usize,
    },
    /// One UV per vertex
    Matched,
}

/// Classify UV channel 0 against the vertex count
pub fn uv_layout(uvs: &[Vec2], vertex_count: usize) -> UvLayout {
    if uvs.is_empty() {
        UvLayout::Missing
    } else if uvs.len() != vertex_count {
        UvLayout::Mismatch {
            uvs: uvs.len(),
            vertices: vertex_count,
        }
    } else {
        UvLayout::Matched
    }
}

/// Number of triangles referencing an index outside `vertex_count`
pub fn out_of_range_triangles(submeshes: &[Vec<u32>], vertex_count: usize) -> usize {
    submeshes
        .iter()
        .flat_map(|indices| indices.chunks_exact(3))
        .filter(|triangle| triangle_indices(triangle, vertex_count).is_none())
        .count()
}

/// Total surface area of all submeshes after applying `transform`
pub fn world_area(positions: &[Vec3], transform: &Mat4, submeshes: &[Vec<u32>]) -> f32 {
    if positions.is_empty() {
        return 0.0;
    }

    let mut area = 0.0_f64;
    let mut skipped = 0usize;

    for indices in submeshes {
        for triangle in indices.chunks_exact(3) {
            let Some([i0, i1, i2]) = triangle_indices(triangle, positions.len()) else {
                skipped += 1;
                continue;
            };

            let v0 = transform.transform_point3(positions[i0]).as_dvec3();
            let v1 = transform.transform_point3(positions[i1]).as_dvec3();
            let v2 = transform.transform_point3(positions[i2]).as_dvec3();
            area += triangle_area_3d(v0, v1, v2);
        }
    }

    if skipped > 0 {
        log::debug!(
            "world area: skipped {} triangle(s) with indices outside {} vertices",
            skipped,
            positions.len()
        );
    }

    area as f32
}

/// Total UV-space area of all submeshes
///
/// Returns 0 when the channel is empty, and also when its length differs
/// from `vertex_count`: misaligned UVs are treated as absent.
pub fn uv_area(uvs: &[Vec2], vertex_count: usize, submeshes: &[Vec<u32>]) -> f32 {
    match uv_layout(uvs, vertex_count) {
        UvLayout::Missing => return 0.0,
        UvLayout::Mismatch { .. } => return 0.0,
        UvLayout::Matched => {}
    }

    let mut area = 0.0_f64;
    let mut skipped = 0usize;

    for indices in submeshes {
        for triangle in indices.chunks_exact(3) {
            let Some([i0, i1, i2]) = triangle_indices(triangle, uvs.len()) else {
                skipped += 1;
                continue;
            };

            area += triangle_area_2d(uvs[i0].as_dvec2(), uvs[i1].as_dvec2(), uvs[i2].as_dvec2());
        }
    }

    if skipped > 0 {
        log::debug!("uv area: skipped {} triangle(s) with indices outside {} UVs", skipped, uvs.len());
    }

    area as f32
}
