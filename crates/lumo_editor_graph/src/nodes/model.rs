// SPDX-License-Identifier: MIT OR Apache-2.0
//! Model source.

use super::next_handle;
use crate::behavior::{Capability, NodeBehavior, OutputProvider, Payload};
use crate::node::{NodeCategory, NodeParams, NodeType};
use crate::scene::{MeshInfo, PrimitiveType, SceneModel};
use crate::slot::{Slot, SlotKind};
use std::rc::Rc;

/// Type id
pub const MODEL: &str = "MODEL";

/// Node type definition
pub fn node_type() -> NodeType {
    NodeType {
        id: MODEL.to_string(),
        name: "Model".to_string(),
        category: NodeCategory::Assets,
        description: "Model loaded from a file".to_string(),
        inputs: vec![],
        outputs: vec![Slot::output("Model", SlotKind::Model)],
    }
}

/// Owns one model
#[derive(Debug)]
pub struct ModelNode {
    file: String,
    model: Rc<SceneModel>,
}

impl Default for ModelNode {
    fn default() -> Self {
        Self {
            file: String::new(),
            model: Rc::new(SceneModel::new("Model")),
        }
    }
}

impl ModelNode {
    /// Replace the model content with `count` placeholder meshes
    pub fn load_meshes(&mut self, count: usize) {
        self.model.clear();
        for _ in 0..count {
            self.model.add_mesh(MeshInfo {
                primitive: PrimitiveType::Faces,
                vertex_count: 3,
                index_count: 3,
                vertex_buffer: next_handle(),
                index_buffer: next_handle(),
            });
        }
    }

    /// Owned model
    pub fn model(&self) -> &Rc<SceneModel> {
        &self.model
    }
}

impl OutputProvider for ModelNode {
    fn output(&self, _slot: &Slot) -> Option<Payload> {
        Some(Payload::Model(Rc::downgrade(&self.model)))
    }
}

impl NodeBehavior for ModelNode {
    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::OutputProvider]
    }

    fn save_params(&self, params: &mut NodeParams) {
        params.insert("file".to_string(), self.file.clone());
        params.insert("meshes".to_string(), self.model.len().to_string());
    }

    fn load_params(&mut self, params: &NodeParams) -> bool {
        if let Some(file) = params.get("file") {
            self.file = file.clone();
        }
        match params.get("meshes").map(|m| m.parse::<usize>()) {
            Some(Ok(count)) => {
                self.load_meshes(count);
                true
            }
            Some(Err(_)) => false,
            None => true,
        }
    }

    fn as_output(&self) -> Option<&dyn OutputProvider> {
        Some(self)
    }
}
