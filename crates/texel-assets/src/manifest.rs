//! Project manifests
//!
//! JSON description of a project: named meshes, prefab assets by path and
//! the nodes of the open scene.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use texel_core::{DensityConfig, MeshGeometry, Prefab, PrefabNode, SceneGraph};

use crate::{AssetDatabase, AssetError, AssetResult};

/// Prefab asset entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefabAsset {
    /// Asset path, e.g. `Props/Crate.prefab`
    pub path: PathBuf,
    /// Root node template
    pub root: PrefabNode,
}

impl PrefabAsset {
    /// Prefab name, taken from the file stem
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .map(|stem| stem.to_string_lossy().to_string())
            .unwrap_or_else(|| self.root.name.clone())
    }
}

/// On-disk project description
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectManifest {
    /// Saved tool settings
    #[serde(default)]
    pub config: Option<DensityConfig>,
    /// Fail prefab instantiation on unknown mesh references
    #[serde(default)]
    pub strict_mesh_refs: bool,
    /// Mesh buffers by name
    #[serde(default)]
    pub meshes: BTreeMap<String, MeshGeometry>,
    /// Prefab assets
    #[serde(default)]
    pub prefabs: Vec<PrefabAsset>,
    /// Root nodes of the open scene
    #[serde(default)]
    pub scene: Vec<PrefabNode>,
}

/// Loaded project: asset database plus the open scene
#[derive(Default)]
pub struct Project {
    /// Registered meshes and prefabs
    pub assets: AssetDatabase,
    /// Open scene
    pub scene: SceneGraph,
    /// Saved tool settings, if any
    pub config: Option<DensityConfig>,
}

impl ProjectManifest {
    /// Parse a manifest from JSON
    pub fn from_json(json: &str) -> AssetResult<Self> {
        serde_json::from_str(json).map_err(|e| AssetError::SerializationError(e.to_string()))
    }

    /// Read a manifest file
    pub fn load(path: impl AsRef<Path>) -> AssetResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)?;
        let manifest = Self::from_json(&json)?;
        log::info!(
            "Loaded {}: {} mesh(es), {} prefab(s), {} scene root(s)",
            path.display(),
            manifest.meshes.len(),
            manifest.prefabs.len(),
            manifest.scene.len()
        );
        Ok(manifest)
    }

    /// Serialize to pretty JSON
    pub fn to_json(&self) -> AssetResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| AssetError::SerializationError(e.to_string()))
    }

    /// Register all assets and build the scene
    pub fn into_project(self) -> Project {
        let mut assets = AssetDatabase::new();
        assets.set_strict_mesh_refs(self.strict_mesh_refs);

        for (name, geometry) in self.meshes {
            assets.register_mesh(name, Arc::new(geometry));
        }

        for asset in self.prefabs {
            let name = asset.name();
            assets.register_prefab(asset.path, Prefab::from_root(name, asset.root));
        }

        let mut scene = SceneGraph::new();
        for node in self.scene {
            let prefab = Prefab::from_root(node.name.clone(), node);
            scene.instantiate(&prefab, |name| assets.mesh(name));
        }

        Project {
            assets,
            scene,
            config: self.config,
        }
    }
}
