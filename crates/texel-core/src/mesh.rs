//! Mesh Data
//!
//! Read-only mesh buffers supplied by the host and the transient items that
//! enumeration hands to the evaluator.

use std::sync::Arc;

use glam::{Mat4, Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Vertex, UV and index buffers of one mesh
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshGeometry {
    /// Vertex positions in local space
    pub positions: Vec<Vec3>,
    /// UV channel 0, ideally one entry per vertex
    #[serde(default)]
    pub uvs: Vec<Vec2>,
    /// Triangle index lists, one per submesh
    #[serde(default)]
    pub submeshes: Vec<Vec<u32>>,
}

impl MeshGeometry {
    /// Create a mesh with a single submesh
    pub fn new(positions: Vec<Vec3>, uvs: Vec<Vec2>, indices: Vec<u32>) -> Self {
        Self {
            positions,
            uvs,
            submeshes: vec![indices],
        }
    }

    /// Create a mesh from several submeshes
    pub fn with_submeshes(positions: Vec<Vec3>, uvs: Vec<Vec2>, submeshes: Vec<Vec<u32>>) -> Self {
        Self {
            positions,
            uvs,
            submeshes,
        }
    }

    /// Number of vertices
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of submeshes
    pub fn submesh_count(&self) -> usize {
        self.submeshes.len()
    }

    /// Number of complete triangles across all submeshes
    pub fn triangle_count(&self) -> usize {
        self.submeshes.iter().map(|indices| indices.len() / 3).sum()
    }

    /// Check whether UV channel 0 has any entries
    pub fn has_uvs(&self) -> bool {
        !self.uvs.is_empty()
    }
}

/// One mesh-bearing node, as produced by enumeration
#[derive(Debug, Clone)]
pub struct MeshItem {
    /// Display name
    pub name: String,
    /// Mesh buffers; `None` when the node references no mesh
    pub geometry: Option<Arc<MeshGeometry>>,
    /// Local-to-world transform
    pub world: Mat4,
}

impl MeshItem {
    /// Create an item with geometry
    pub fn new(name: impl Into<String>, geometry: Arc<MeshGeometry>, world: Mat4) -> Self {
        Self {
            name: name.into(),
            geometry: Some(geometry),
            world,
        }
    }

    /// Create an item for a node whose mesh reference is absent
    pub fn missing(name: impl Into<String>, world: Mat4) -> Self {
        Self {
            name: name.into(),
            geometry: None,
            world,
        }
    }
}
