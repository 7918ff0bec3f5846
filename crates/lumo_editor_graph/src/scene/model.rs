// SPDX-License-Identifier: MIT OR Apache-2.0
//! Models.

use super::SceneGroup;
use std::cell::RefCell;

/// How a mesh's vertices are assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PrimitiveType {
    /// Point cloud
    Points,
    /// Line strips
    Curves,
    /// Triangles
    #[default]
    Faces,
}

/// GPU-side description of one mesh
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeshInfo {
    /// Primitive assembly
    pub primitive: PrimitiveType,
    /// Vertex count
    pub vertex_count: u32,
    /// Index count, 0 for non-indexed meshes
    pub index_count: u32,
    /// Backend vertex buffer handle
    pub vertex_buffer: u64,
    /// Backend index buffer handle
    pub index_buffer: u64,
}

/// A model: a named list of meshes
#[derive(Debug, Default)]
pub struct SceneModel {
    /// Display name
    pub name: String,
    meshes: RefCell<Vec<MeshInfo>>,
}

impl SceneModel {
    /// Create an empty model
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            meshes: RefCell::new(Vec::new()),
        }
    }

    /// Append a mesh
    pub fn add_mesh(&self, mesh: MeshInfo) {
        self.meshes.borrow_mut().push(mesh);
    }

    /// Meshes of the model
    pub fn meshes(&self) -> Vec<MeshInfo> {
        self.meshes.borrow().clone()
    }

    /// Number of meshes
    pub fn len(&self) -> usize {
        self.meshes.borrow().len()
    }

    /// Whether the model has no mesh
    pub fn is_empty(&self) -> bool {
        self.meshes.borrow().is_empty()
    }

    /// Drop every mesh
    pub fn clear(&self) {
        self.meshes.borrow_mut().clear();
    }
}

/// Ordered group of models
pub type SceneModelGroup = SceneGroup<SceneModel>;
