//! Error types

use thiserror::Error;

use crate::scene::NodeId;

/// Configuration rejected before any computation
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("target texel density must be a positive finite number, got {0}")]
    InvalidTarget(f32),

    #[error("texture resolution must be positive")]
    InvalidResolution,
}

/// Why a mesh evaluated to an error status
///
/// Only used for diagnostics; results carry a plain error status.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum MeshIssue {
    #[error("no mesh assigned")]
    MissingGeometry,

    #[error("no UVs in channel 0")]
    MissingUv,

    #[error("{uvs} UVs for {vertices} vertices")]
    UvVertexCountMismatch { uvs: usize, vertices: usize },

    #[error("world area is not positive and finite ({0})")]
    InvalidWorldArea(f32),

    #[error("UV area is not positive and finite ({0})")]
    InvalidUvArea(f32),

    #[error("texel density is not finite ({0})")]
    InvalidDensity(f32),

    #[error("target texel density is not positive and finite ({0})")]
    InvalidTarget(f32),
}

/// Scene graph errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SceneError {
    #[error("node not found: {0}")]
    NodeNotFound(NodeId),

    #[error("no node named '{0}'")]
    NameNotFound(String),

    #[error("cannot parent {child} under its own descendant {parent}")]
    CyclicParent { child: NodeId, parent: NodeId },
}
