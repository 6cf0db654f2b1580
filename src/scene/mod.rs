//! Retained scene data handed to the shared surface on the default render
//! path.
//!
//! A [`Scene`] is a flat list of [`SceneNode`]s, each holding point-sprite or
//! mesh geometry plus a transform and tint. Geometry edits bump the node's
//! revision so the GPU cache knows to re-upload; transforms and tints are
//! cheap per-frame uniforms.

pub mod primitives;

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use glam::Mat4;
use serde::{Deserialize, Serialize};

use crate::error::CosmoError;

/// Process-unique identifier of a scene node. Used as the GPU cache key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// One star (or any camera-facing sprite).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct StarPoint {
    /// World-space position (before the node transform).
    pub position: [f32; 3],
    /// Sprite radius in world units.
    pub size: f32,
    /// Linear RGBA color.
    pub color: [f32; 4],
}

/// Camera-facing sprites, drawn additively.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    /// The sprites.
    pub points: Vec<StarPoint>,
}

/// Mesh vertex with per-vertex color.
#[repr(C)]
#[derive(
    Debug, Clone, Copy, PartialEq, bytemuck::Pod, bytemuck::Zeroable, Serialize, Deserialize,
)]
pub struct MeshVertex {
    /// Object-space position.
    pub position: [f32; 3],
    /// Object-space normal.
    pub normal: [f32; 3],
    /// Linear RGBA color.
    pub color: [f32; 4],
}

/// Indexed triangle mesh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Vertex data.
    pub vertices: Vec<MeshVertex>,
    /// Triangle list indices into `vertices`.
    pub indices: Vec<u32>,
    /// Shade with the directional light (`false` = emissive).
    #[serde(default = "default_lit")]
    pub lit: bool,
}

fn default_lit() -> bool {
    true
}

impl Mesh {
    /// Parse a mesh from JSON (`{"vertices": [...], "indices": [...]}`).
    pub fn from_json(content: &str) -> Result<Self, CosmoError> {
        let mesh: Self = serde_json::from_str(content)
            .map_err(|e| CosmoError::AssetLoad(e.to_string()))?;
        mesh.validate()?;
        Ok(mesh)
    }

    /// Load a JSON mesh file.
    pub fn load_json(path: &Path) -> Result<Self, CosmoError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            CosmoError::AssetLoad(format!("{}: {e}", path.display()))
        })?;
        Self::from_json(&content)
    }

    /// Reject meshes that would index out of bounds or are not triangles.
    pub fn validate(&self) -> Result<(), CosmoError> {
        if self.vertices.is_empty() || self.indices.is_empty() {
            return Err(CosmoError::AssetLoad("mesh is empty".into()));
        }
        if self.indices.len() % 3 != 0 {
            return Err(CosmoError::AssetLoad(format!(
                "index count {} is not a multiple of 3",
                self.indices.len()
            )));
        }
        let count = self.vertices.len() as u32;
        if let Some(bad) = self.indices.iter().find(|&&i| i >= count) {
            return Err(CosmoError::AssetLoad(format!(
                "index {bad} out of range for {count} vertices"
            )));
        }
        Ok(())
    }
}

/// What a node draws.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry {
    /// Additive camera-facing sprites.
    Points(PointCloud),
    /// Depth-tested triangles.
    Mesh(Mesh),
}

/// A drawable entry in a [`Scene`].
#[derive(Debug, Clone)]
pub struct SceneNode {
    id: NodeId,
    /// Object-to-world transform.
    pub transform: Mat4,
    /// Color multiplier applied on top of per-vertex colors.
    pub tint: [f32; 4],
    /// Hidden nodes are skipped.
    pub visible: bool,
    revision: u64,
    geometry: Geometry,
}

impl SceneNode {
    /// Wrap geometry in a visible, untransformed node.
    #[must_use]
    pub fn new(geometry: Geometry) -> Self {
        Self {
            id: NodeId::next(),
            transform: Mat4::IDENTITY,
            tint: [1.0; 4],
            visible: true,
            revision: 0,
            geometry,
        }
    }

    /// Stable identifier.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Bumped on every mutable geometry access.
    #[must_use]
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Read the geometry.
    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    /// Edit the geometry; marks the node for re-upload.
    pub fn geometry_mut(&mut self) -> &mut Geometry {
        self.revision += 1;
        &mut self.geometry
    }
}

/// Ordered collection of nodes plus the background color.
#[derive(Debug, Clone)]
pub struct Scene {
    /// Linear RGBA color the screen is cleared to.
    pub clear_color: [f32; 4],
    nodes: Vec<SceneNode>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    /// Empty scene on a black background.
    #[must_use]
    pub fn new() -> Self {
        Self {
            clear_color: [0.0, 0.0, 0.0, 1.0],
            nodes: Vec::new(),
        }
    }

    /// Append a node and return its id.
    pub fn add(&mut self, geometry: Geometry) -> NodeId {
        let node = SceneNode::new(geometry);
        let id = node.id();
        self.nodes.push(node);
        id
    }

    /// Look up a node.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Look up a node for editing.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// All nodes in draw order.
    #[must_use]
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the scene has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_ids_are_unique() {
        let mut scene = Scene::new();
        let a = scene.add(Geometry::Points(PointCloud::default()));
        let b = scene.add(Geometry::Points(PointCloud::default()));
        assert_ne!(a, b);
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn geometry_edits_bump_revision() {
        let mut scene = Scene::new();
        let id = scene.add(Geometry::Mesh(primitives::cube(1.0, [1.0; 4])));
        let node = scene.node_mut(id).unwrap();
        assert_eq!(node.revision(), 0);
        node.transform = Mat4::from_scale(glam::Vec3::splat(2.0));
        assert_eq!(node.revision(), 0);
        if let Geometry::Mesh(mesh) = node.geometry_mut() {
            mesh.lit = false;
        }
        assert_eq!(node.revision(), 1);
    }

    #[test]
    fn json_mesh_validation() {
        let ok = r#"{
            "vertices": [
                {"position": [0,0,0], "normal": [0,0,1], "color": [1,1,1,1]},
                {"position": [1,0,0], "normal": [0,0,1], "color": [1,1,1,1]},
                {"position": [0,1,0], "normal": [0,0,1], "color": [1,1,1,1]}
            ],
            "indices": [0, 1, 2]
        }"#;
        let mesh = Mesh::from_json(ok).unwrap();
        assert!(mesh.lit);

        let bad = ok.replace("[0, 1, 2]", "[0, 1, 7]");
        assert!(matches!(Mesh::from_json(&bad), Err(CosmoError::AssetLoad(_))));
        assert!(Mesh::from_json("not json").is_err());
    }
}
