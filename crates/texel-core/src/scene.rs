//! Scene Graph
//!
//! Hierarchical scene representation used to enumerate mesh items:
//! - Transform parenting
//! - Per-node activation
//! - Prefab instantiation
//!
//! Enumeration walks a root depth-first in child order and computes each
//! world matrix as `parent_world * local_matrix`.

use std::collections::HashMap;
use std::sync::Arc;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::batch::MeshEnumerator;
use crate::error::SceneError;
use crate::mesh::{MeshGeometry, MeshItem};

/// Transform component for nodes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    /// Local position
    pub position: Vec3,
    /// Local rotation
    pub rotation: Quat,
    /// Local scale
    pub scale: Vec3,
}

impl Transform {
    /// Identity transform
    pub const IDENTITY: Self = Self {
        position: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    /// Create a new transform with the given position
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Self::IDENTITY
        }
    }

    /// Create a new transform with a uniform scale
    pub fn from_scale(scale: f32) -> Self {
        Self {
            scale: Vec3::splat(scale),
            ..Self::IDENTITY
        }
    }

    /// Create a new transform from all components
    pub fn new(position: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self {
            position,
            rotation,
            scale,
        }
    }

    /// Get the local transformation matrix
    pub fn local_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Node handle within one scene graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mesh component of a node
#[derive(Debug, Clone, Default)]
pub struct MeshSlot {
    /// Assigned mesh, `None` when the reference is missing
    pub mesh: Option<Arc<MeshGeometry>>,
}

impl MeshSlot {
    /// Slot holding a mesh
    pub fn new(mesh: Arc<MeshGeometry>) -> Self {
        Self { mesh: Some(mesh) }
    }

    /// Slot with a missing mesh reference
    pub fn missing() -> Self {
        Self { mesh: None }
    }
}

/// Scene graph node containing hierarchy information
#[derive(Debug, Clone)]
pub struct Node {
    /// Node handle
    pub id: NodeId,
    /// Node name for identification
    pub name: String,
    /// Local transform
    pub local_transform: Transform,
    /// Parent node
    pub parent: Option<NodeId>,
    /// Child nodes
    pub children: SmallVec<[NodeId; 8]>,
    /// Whether this node is active itself
    pub active: bool,
    /// Mesh component, if the node renders one
    pub mesh: Option<MeshSlot>,
}

impl Node {
    /// Create a new node
    pub fn new(id: NodeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            local_transform: Transform::IDENTITY,
            parent: None,
            children: SmallVec::new(),
            active: true,
            mesh: None,
        }
    }

    /// Add a child node
    pub fn add_child(&mut self, child: NodeId) {
        if !self.children.contains(&child) {
            self.children.push(child);
        }
    }

    /// Remove a child node
    pub fn remove_child(&mut self, child: NodeId) {
        self.children.retain(|c| *c != child);
    }
}

/// Scene graph managing the hierarchy of nodes
#[derive(Debug, Default)]
pub struct SceneGraph {
    /// All nodes in the scene
    nodes: HashMap<NodeId, Node>,
    /// Root nodes (no parent), in insertion order
    roots: Vec<NodeId>,
    /// Next handle to hand out
    next_id: u32,
}

impl SceneGraph {
    /// Create a new empty scene graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a new root node to the scene
    pub fn add_node(&mut self, name: impl Into<String>) -> &mut Node {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.roots.push(id);
        self.nodes.entry(id).or_insert_with(|| Node::new(id, name))
    }

    /// Add a new node under `parent`
    pub fn add_child(&mut self, parent: NodeId, name: impl Into<String>) -> Result<NodeId, SceneError> {
        if !self.nodes.contains_key(&parent) {
            return Err(SceneError::NodeNotFound(parent));
        }
        let id = self.add_node(name).id;
        self.attach(id, Some(parent));
        Ok(id)
    }

    /// Get a node
    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    /// Get a mutable node
    pub fn get_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    /// Set the parent of a node
    ///
    /// Fails when either node is unknown, or when `parent` is `child` itself
    /// or one of its descendants.
    pub fn set_parent(&mut self, child: NodeId, parent: Option<NodeId>) -> Result<(), SceneError> {
        if !self.nodes.contains_key(&child) {
            return Err(SceneError::NodeNotFound(child));
        }
        if let Some(parent_id) = parent {
            if !self.nodes.contains_key(&parent_id) {
                return Err(SceneError::NodeNotFound(parent_id));
            }
            if parent_id == child || self.is_ancestor_of(child, parent_id) {
                return Err(SceneError::CyclicParent { child, parent: parent_id });
            }
        }
        self.attach(child, parent);
        Ok(())
    }

    fn is_ancestor_of(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.nodes.get(&id).and_then(|n| n.parent);
        while let Some(parent) = current {
            if parent == ancestor {
                return true;
            }
            current = self.nodes.get(&parent).and_then(|n| n.parent);
        }
        false
    }

    fn attach(&mut self, child: NodeId, parent: Option<NodeId>) {
        // Remove from old parent
        if let Some(old_parent) = self.nodes.get(&child).and_then(|n| n.parent) {
            if let Some(old_parent_node) = self.nodes.get_mut(&old_parent) {
                old_parent_node.remove_child(child);
            }
        }

        if let Some(parent_id) = parent {
            if let Some(parent_node) = self.nodes.get_mut(&parent_id) {
                parent_node.add_child(child);
            }
            self.roots.retain(|&e| e != child);
        } else if !self.roots.contains(&child) {
            self.roots.push(child);
        }

        if let Some(child_node) = self.nodes.get_mut(&child) {
            child_node.parent = parent;
        }
    }

    /// Get root nodes
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    /// Find the first root-level or nested node with the given name
    ///
    /// Search is depth-first from the roots in insertion order.
    pub fn find_by_name(&self, name: &str) -> Option<NodeId> {
        self.roots.iter().find_map(|&root| {
            std::iter::once(root)
                .chain(self.get_descendants(root))
                .find(|id| self.nodes.get(id).is_some_and(|n| n.name == name))
        })
    }

    /// World matrix of a node, composed from its ancestors
    pub fn world_matrix(&self, id: NodeId) -> Option<Mat4> {
        let node = self.nodes.get(&id)?;
        let local = node.local_transform.local_matrix();
        match node.parent {
            Some(parent) => Some(self.world_matrix(parent)? * local),
            None => Some(local),
        }
    }

    /// Whether a node and all its ancestors are active
    pub fn is_active_in_hierarchy(&self, id: NodeId) -> bool {
        let mut current = Some(id);
        while let Some(node) = current.and_then(|id| self.nodes.get(&id)) {
            if !node.active {
                return false;
            }
            current = node.parent;
        }
        current.is_none()
    }

    /// Get all descendants of a node, depth-first
    pub fn get_descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut descendants = Vec::new();
        self.collect_descendants(id, &mut descendants);
        descendants
    }

    fn collect_descendants(&self, id: NodeId, result: &mut Vec<NodeId>) {
        if let Some(node) = self.nodes.get(&id) {
            for &child in &node.children {
                result.push(child);
                self.collect_descendants(child, result);
            }
        }
    }

    /// Mesh items under `root`, the root included
    ///
    /// Without `include_inactive`, an inactive node hides its whole subtree,
    /// and an inactive ancestor of `root` hides everything.
    pub fn mesh_items(&self, root: NodeId, include_inactive: bool) -> Result<Vec<MeshItem>, SceneError> {
        let node = self.nodes.get(&root).ok_or(SceneError::NodeNotFound(root))?;

        let mut items = Vec::new();
        if !include_inactive && !self.is_active_in_hierarchy(root) {
            return Ok(items);
        }

        let parent_world = match node.parent {
            Some(parent) => self.world_matrix(parent).ok_or(SceneError::NodeNotFound(parent))?,
            None => Mat4::IDENTITY,
        };
        self.collect_mesh_items(root, parent_world, include_inactive, &mut items);
        Ok(items)
    }

    fn collect_mesh_items(&self, id: NodeId, parent_world: Mat4, include_inactive: bool, items: &mut Vec<MeshItem>) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !include_inactive && !node.active {
            return;
        }

        let world = parent_world * node.local_transform.local_matrix();
        if let Some(slot) = &node.mesh {
            items.push(MeshItem {
                name: node.name.clone(),
                geometry: slot.mesh.clone(),
                world,
            });
        }

        for &child in &node.children {
            self.collect_mesh_items(child, world, include_inactive, items);
        }
    }

    /// Instantiate a prefab as a new root, resolving mesh references by name
    ///
    /// Unresolved references become missing mesh slots.
    pub fn instantiate<F>(&mut self, prefab: &Prefab, mut resolve_mesh: F) -> NodeId
    where
        F: FnMut(&str) -> Option<Arc<MeshGeometry>>,
    {
        let root = self.spawn(&prefab.root, &mut resolve_mesh);
        if let Some(node) = self.nodes.get_mut(&root) {
            node.name = prefab.name.clone();
        }
        root
    }

    fn spawn<F>(&mut self, template: &PrefabNode, resolve_mesh: &mut F) -> NodeId
    where
        F: FnMut(&str) -> Option<Arc<MeshGeometry>>,
    {
        let mesh = template.mesh.as_deref().map(|name| MeshSlot {
            mesh: resolve_mesh(name),
        });

        let id = {
            let node = self.add_node(template.name.clone());
            node.local_transform = template.transform;
            node.active = template.active;
            node.mesh = mesh;
            node.id
        };

        for child in &template.children {
            let child_id = self.spawn(child, resolve_mesh);
            self.attach(child_id, Some(id));
        }
        id
    }

    /// Get the number of nodes in the scene
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the scene is empty
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl MeshEnumerator<NodeId> for SceneGraph {
    fn enumerate_mesh_items(&self, root: &NodeId, include_inactive: bool) -> anyhow::Result<Vec<MeshItem>> {
        Ok(self.mesh_items(*root, include_inactive)?)
    }
}

/// Prefab definition for instantiating hierarchies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prefab {
    /// Prefab name
    pub name: String,
    /// Root node template
    pub root: PrefabNode,
}

/// Node within a prefab
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrefabNode {
    /// Node name
    pub name: String,
    /// Local transform
    #[serde(default)]
    pub transform: Transform,
    /// Whether the node starts active
    #[serde(default = "default_active")]
    pub active: bool,
    /// Mesh asset name, if the node renders a mesh
    #[serde(default)]
    pub mesh: Option<String>,
    /// Child nodes
    #[serde(default)]
    pub children: Vec<PrefabNode>,
}

fn default_active() -> bool {
    true
}

impl PrefabNode {
    /// Create an empty active node
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            transform: Transform::IDENTITY,
            active: true,
            mesh: None,
            children: Vec::new(),
        }
    }

    /// Set the mesh reference
    pub fn with_mesh(mut self, mesh: impl Into<String>) -> Self {
        self.mesh = Some(mesh.into());
        self
    }

    /// Set the local transform
    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    /// Set the active flag
    pub fn with_active(mut self, active: bool) -> Self {
        self.active = active;
        self
    }

    /// Append a child
    pub fn with_child(mut self, child: PrefabNode) -> Self {
        self.children.push(child);
        self
    }
}

impl Prefab {
    /// Create a new prefab with an empty root
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            root: PrefabNode::new(name.clone()),
            name,
        }
    }

    /// Create a prefab from a root template
    pub fn from_root(name: impl Into<String>, root: PrefabNode) -> Self {
        Self {
            name: name.into(),
            root,
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;

    fn unit_quad() -> Arc<MeshGeometry> {
        Arc::new(MeshGeometry::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            vec![Vec2::ZERO, Vec2::X, Vec2::ONE, Vec2::Y],
            vec![0, 1, 2, 0, 2, 3],
        ))
    }

    #[test]
    fn test_transform_identity() {
        let t = Transform::IDENTITY;
        assert_eq!(t.position, Vec3::ZERO);
        assert_eq!(t.rotation, Quat::IDENTITY);
        assert_eq!(t.scale, Vec3::ONE);
    }

    #[test]
    fn test_transform_matrix() {
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        let matrix = t.local_matrix();
        let translation = matrix.w_axis.truncate();
        assert!((translation - Vec3::new(1.0, 2.0, 3.0)).length() < 0.001);
    }

    #[test]
    fn test_scene_graph_parenting() {
        let mut sg = SceneGraph::new();
        let parent = sg.add_node("Parent").id;
        let child = sg.add_child(parent, "Child").unwrap();

        assert!(sg.get_node(parent).unwrap().children.contains(&child));
        assert_eq!(sg.get_node(child).unwrap().parent, Some(parent));
        assert!(!sg.roots().contains(&child));
    }

    #[test]
    fn test_set_parent_rejects_cycles() {
        let mut sg = SceneGraph::new();
        let a = sg.add_node("A").id;
        let b = sg.add_child(a, "B").unwrap();
        let c = sg.add_child(b, "C").unwrap();

        assert_eq!(sg.set_parent(a, Some(c)), Err(SceneError::CyclicParent { child: a, parent: c }));
        assert_eq!(sg.set_parent(b, Some(b)), Err(SceneError::CyclicParent { child: b, parent: b }));
        assert_eq!(sg.set_parent(c, Some(NodeId(99))), Err(SceneError::NodeNotFound(NodeId(99))));
        assert_eq!(sg.get_node(a).unwrap().parent, None);
        assert!(sg.world_matrix(c).is_some());

        sg.set_parent(c, None).unwrap();
        assert!(sg.roots().contains(&c));
        sg.set_parent(a, Some(c)).unwrap();
        assert_eq!(sg.get_descendants(c), vec![a, b]);
        assert!(!sg.roots().contains(&a));
    }

    #[test]
    fn test_add_child_unknown_parent() {
        let mut sg = SceneGraph::new();
        assert_eq!(sg.add_child(NodeId(7), "Orphan"), Err(SceneError::NodeNotFound(NodeId(7))));
    }

    #[test]
    fn test_world_matrix_composes_parents() {
        let mut sg = SceneGraph::new();
        let parent = sg.add_node("Parent").id;
        sg.get_node_mut(parent).unwrap().local_transform = Transform::from_position(Vec3::new(10.0, 0.0, 0.0));
        let child = sg.add_child(parent, "Child").unwrap();
        sg.get_node_mut(child).unwrap().local_transform = Transform::from_position(Vec3::new(5.0, 0.0, 0.0));

        let world = sg.world_matrix(child).unwrap();
        assert!((world.w_axis.x - 15.0).abs() < 0.001);
    }

    #[test]
    fn test_find_by_name_nested() {
        let mut sg = SceneGraph::new();
        let root = sg.add_node("Root").id;
        let child = sg.add_child(root, "Lamp").unwrap();

        assert_eq!(sg.find_by_name("Lamp"), Some(child));
        assert_eq!(sg.find_by_name("NonExistent"), None);
    }

    #[test]
    fn test_mesh_items_apply_parent_scale() {
        let mut sg = SceneGraph::new();
        let root = sg.add_node("Root").id;
        sg.get_node_mut(root).unwrap().local_transform = Transform::from_scale(2.0);
        let child = sg.add_child(root, "Panel").unwrap();
        sg.get_node_mut(child).unwrap().mesh = Some(MeshSlot::new(unit_quad()));

        let items = sg.mesh_items(root, false).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Panel");
        let corner = items[0].world.transform_point3(Vec3::ONE);
        assert!((corner - Vec3::splat(2.0)).length() < 1e-5);
    }

    #[test]
    fn test_mesh_items_activation() {
        let mut sg = SceneGraph::new();
        let root = sg.add_node("Root").id;
        sg.get_node_mut(root).unwrap().mesh = Some(MeshSlot::new(unit_quad()));
        let hidden = sg.add_child(root, "Hidden").unwrap();
        sg.get_node_mut(hidden).unwrap().active = false;
        let nested = sg.add_child(hidden, "Nested").unwrap();
        sg.get_node_mut(nested).unwrap().mesh = Some(MeshSlot::new(unit_quad()));
        let missing = sg.add_child(root, "Missing").unwrap();
        sg.get_node_mut(missing).unwrap().mesh = Some(MeshSlot::missing());

        let active: Vec<_> = sg.mesh_items(root, false).unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(active, vec!["Root", "Missing"]);

        let all: Vec<_> = sg.mesh_items(root, true).unwrap().into_iter().map(|i| i.name).collect();
        assert_eq!(all, vec!["Root", "Nested", "Missing"]);

        assert!(sg.mesh_items(nested, false).unwrap().is_empty());
        assert_eq!(sg.mesh_items(nested, true).unwrap().len(), 1);
    }

    #[test]
    fn test_mesh_items_unknown_root() {
        let sg = SceneGraph::new();
        assert_eq!(sg.mesh_items(NodeId(3), true).unwrap_err(), SceneError::NodeNotFound(NodeId(3)));
    }

    #[test]
    fn test_instantiate_prefab() {
        let prefab = Prefab::from_root(
            "Crate",
            PrefabNode::new("Root")
                .with_mesh("quad")
                .with_child(PrefabNode::new("Lid").with_mesh("lid").with_active(false)),
        );

        let mut sg = SceneGraph::new();
        let quad = unit_quad();
        let root = sg.instantiate(&prefab, |name| (name == "quad").then(|| quad.clone()));

        assert_eq!(sg.node_count(), 2);
        assert_eq!(sg.get_node(root).unwrap().name, "Crate");

        let items = sg.mesh_items(root, true).unwrap();
        assert_eq!(items.len(), 2);
        assert!(items[0].geometry.is_some());
        assert!(items[1].geometry.is_none());
    }
}
