//! # Texel Assets
//!
//! Asset database for texel density runs.
//!
//! ## Features
//! - Path-hashed asset IDs
//! - Mesh and prefab registration
//! - Folder scans in deterministic path order
//! - Temporary prefab instantiation for mesh enumeration
//! - JSON project manifests

pub mod manifest;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ahash::AHashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use texel_core::{MeshEnumerator, MeshGeometry, MeshItem, NodeId, Prefab, PrefabNode, SceneGraph};
use thiserror::Error;

pub use manifest::{PrefabAsset, Project, ProjectManifest};

/// Asset errors
#[derive(Error, Debug)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Instantiation failed: {0}")]
    InstantiateFailed(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// Result type for asset operations
pub type AssetResult<T> = Result<T, AssetError>;

/// Path-addressed asset ID (hash-based)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AssetId(pub u64);

impl AssetId {
    /// Create an asset ID from a path
    pub fn from_path(path: &Path) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        path.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Get the raw ID value
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for AssetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Asset type categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    Mesh,
    Prefab,
}

/// Asset metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetMeta {
    /// Asset ID
    pub id: AssetId,
    /// Asset name
    pub name: String,
    /// Asset type
    pub asset_type: AssetType,
    /// Source path (relative to project)
    pub source_path: PathBuf,
}

/// Asset database for tracking meshes and prefabs
#[derive(Default)]
pub struct AssetDatabase {
    /// All registered assets
    assets: RwLock<AHashMap<AssetId, AssetMeta>>,
    /// Path to ID mapping
    path_to_id: RwLock<AHashMap<PathBuf, AssetId>>,
    /// Mesh buffers by mesh name
    meshes: RwLock<AHashMap<String, Arc<MeshGeometry>>>,
    /// Prefab templates
    prefabs: RwLock<AHashMap<AssetId, Prefab>>,
    /// Fail instantiation on unresolved mesh references
    strict_mesh_refs: bool,
}

impl AssetDatabase {
    /// Create a new asset database
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail instantiation when a prefab references an unknown mesh,
    /// instead of leaving the reference missing
    pub fn set_strict_mesh_refs(&mut self, strict: bool) {
        self.strict_mesh_refs = strict;
    }

    fn register(&self, meta: AssetMeta) {
        let id = meta.id;
        let path = meta.source_path.clone();
        self.assets.write().insert(id, meta);
        self.path_to_id.write().insert(path, id);
    }

    /// Register a mesh under `name`; the name doubles as its path
    pub fn register_mesh(&self, name: impl Into<String>, geometry: Arc<MeshGeometry>) -> AssetId {
        let name = name.into();
        let source_path = PathBuf::from(&name);
        let id = AssetId::from_path(&source_path);

        self.meshes.write().insert(name.clone(), geometry);
        self.register(AssetMeta {
            id,
            name,
            asset_type: AssetType::Mesh,
            source_path,
        });
        id
    }

    /// Register a prefab at `path`
    pub fn register_prefab(&self, path: impl Into<PathBuf>, prefab: Prefab) -> AssetId {
        let source_path = path.into();
        let id = AssetId::from_path(&source_path);

        self.register(AssetMeta {
            id,
            name: prefab.name.clone(),
            asset_type: AssetType::Prefab,
            source_path,
        });
        self.prefabs.write().insert(id, prefab);
        id
    }

    /// Get asset metadata by ID
    pub fn get(&self, id: AssetId) -> Option<AssetMeta> {
        self.assets.read().get(&id).cloned()
    }

    /// Get asset ID by path
    pub fn get_id_by_path(&self, path: &Path) -> Option<AssetId> {
        self.path_to_id.read().get(path).copied()
    }

    /// Get mesh buffers by name
    pub fn mesh(&self, name: &str) -> Option<Arc<MeshGeometry>> {
        self.meshes.read().get(name).cloned()
    }

    /// Assets of a type under `folder`, sorted by path
    pub fn find_assets(&self, folder: &Path, asset_type: AssetType) -> Vec<AssetMeta> {
        let mut found: Vec<AssetMeta> = self
            .assets
            .read()
            .values()
            .filter(|m| m.asset_type == asset_type && m.source_path.starts_with(folder))
            .cloned()
            .collect();
        found.sort_by(|a, b| a.source_path.cmp(&b.source_path));
        found
    }

    /// Batch roots for every prefab under `folder`, keyed by path
    pub fn prefab_roots(&self, folder: &Path) -> Vec<(String, AssetId)> {
        self.find_assets(folder, AssetType::Prefab)
            .into_iter()
            .map(|meta| (meta.source_path.display().to_string(), meta.id))
            .collect()
    }

    /// Instantiate a prefab into a fresh scene graph
    pub fn instantiate(&self, id: AssetId) -> AssetResult<(SceneGraph, NodeId)> {
        let prefabs = self.prefabs.read();
        let prefab = prefabs
            .get(&id)
            .ok_or_else(|| AssetError::NotFound(format!("prefab {}", id)))?;

        let meshes = self.meshes.read();
        if self.strict_mesh_refs {
            if let Some(missing) = first_unresolved(&prefab.root, &meshes) {
                return Err(AssetError::InstantiateFailed(format!(
                    "{} references unknown mesh '{}'",
                    prefab.name, missing
                )));
            }
        }

        let mut scene = SceneGraph::new();
        let root = scene.instantiate(prefab, |name| meshes.get(name).cloned());
        log::debug!("Instantiated {} with {} node(s)", prefab.name, scene.node_count());
        Ok((scene, root))
    }

    /// Get total asset count
    pub fn asset_count(&self) -> usize {
        self.assets.read().len()
    }

    /// Clear the database
    pub fn clear(&self) {
        self.assets.write().clear();
        self.path_to_id.write().clear();
        self.meshes.write().clear();
        self.prefabs.write().clear();
    }
}

fn first_unresolved<'a>(node: &'a PrefabNode, meshes: &AHashMap<String, Arc<MeshGeometry>>) -> Option<&'a str> {
    if let Some(mesh) = node.mesh.as_deref() {
        if !meshes.contains_key(mesh) {
            return Some(mesh);
        }
    }
    node.children.iter().find_map(|child| first_unresolved(child, meshes))
}

impl MeshEnumerator<AssetId> for AssetDatabase {
    /// Instantiate the prefab temporarily and enumerate its meshes
    fn enumerate_mesh_items(&self, root: &AssetId, include_inactive: bool) -> anyhow::Result<Vec<MeshItem>> {
        let (scene, node) = self.instantiate(*root)?;
        Ok(scene.mesh_items(node, include_inactive)?)
    }
}

#[cfg(test)]
mod tests {
    use texel_core::math::{Vec2, Vec3};

    use super::*;

    fn quad() -> Arc<MeshGeometry> {
        Arc::new(MeshGeometry::new(
            vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 1.0, 0.0), Vec3::Y],
            vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y],
            vec![0, 1, 2, 0, 2, 3],
        ))
    }

    fn crate_prefab() -> Prefab {
        Prefab::from_root(
            "Crate",
            PrefabNode::new("Crate")
                .with_mesh("quad")
                .with_child(PrefabNode::new("Lid").with_mesh("quad").with_active(false)),
        )
    }

    #[test]
    fn test_asset_id_from_path() {
        let a = AssetId::from_path(Path::new("Props/Crate.prefab"));
        let b = AssetId::from_path(Path::new("Props/Crate.prefab"));
        let c = AssetId::from_path(Path::new("Props/Barrel.prefab"));
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(format!("{a}").len(), 16);
    }

    #[test]
    fn test_register_and_lookup() {
        let db = AssetDatabase::new();
        db.register_mesh("quad", quad());
        let id = db.register_prefab("Props/Crate.prefab", crate_prefab());

        assert_eq!(db.asset_count(), 2);
        assert_eq!(db.get_id_by_path(Path::new("Props/Crate.prefab")), Some(id));
        assert_eq!(db.get(id).unwrap().asset_type, AssetType::Prefab);
        assert!(db.mesh("quad").is_some());
    }

    #[test]
    fn test_find_assets_in_folder() {
        let db = AssetDatabase::new();
        db.register_prefab("Props/Zebra.prefab", Prefab::new("Zebra"));
        db.register_prefab("Props/Barrel.prefab", Prefab::new("Barrel"));
        db.register_prefab("Characters/Hero.prefab", Prefab::new("Hero"));
        db.register_mesh("Props/quad", quad());

        let roots = db.prefab_roots(Path::new("Props"));
        let paths: Vec<_> = roots.iter().map(|(path, _)| path.as_str()).collect();
        assert_eq!(paths, vec!["Props/Barrel.prefab", "Props/Zebra.prefab"]);

        assert!(db.prefab_roots(Path::new("Environment")).is_empty());
    }

    #[test]
    fn test_enumerate_includes_inactive() {
        let db = AssetDatabase::new();
        db.register_mesh("quad", quad());
        let id = db.register_prefab("Props/Crate.prefab", crate_prefab());

        assert_eq!(db.enumerate_mesh_items(&id, true).unwrap().len(), 2);
        assert_eq!(db.enumerate_mesh_items(&id, false).unwrap().len(), 1);
    }

    #[test]
    fn test_unknown_prefab_fails() {
        let db = AssetDatabase::new();
        let err = db.instantiate(AssetId(42)).unwrap_err();
        assert!(matches!(err, AssetError::NotFound(_)));
    }

    #[test]
    fn test_unresolved_mesh_reference() {
        let mut db = AssetDatabase::new();
        let id = db.register_prefab("Props/Crate.prefab", crate_prefab());

        let items = db.enumerate_mesh_items(&id, true).unwrap();
        assert!(items.iter().all(|item| item.geometry.is_none()));

        db.set_strict_mesh_refs(true);
        let err = db.instantiate(id).unwrap_err();
        assert!(matches!(err, AssetError::InstantiateFailed(_)));
        assert!(err.to_string().contains("quad"));
    }
}
