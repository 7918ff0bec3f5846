// SPDX-License-Identifier: MIT OR Apache-2.0
//! 2D texture source.

use super::{next_handle, parse_size};
use crate::behavior::{
    Capability, NodeBehavior, OutputProvider, Payload, Resizable, TextureInfo,
};
use crate::node::{NodeCategory, NodeParams, NodeType};
use crate::slot::{Slot, SlotKind};

/// Type id
pub const TEXTURE_2D: &str = "TEXTURE_2D";

/// Node type definition
pub fn node_type() -> NodeType {
    NodeType {
        id: TEXTURE_2D.to_string(),
        name: "Texture 2D".to_string(),
        category: NodeCategory::Assets,
        description: "Texture whose size follows the viewport".to_string(),
        inputs: vec![],
        outputs: vec![Slot::output("Output", SlotKind::Texture2D).hide_name()],
    }
}

/// Texture owned by the node
#[derive(Debug)]
pub struct Texture2DNode {
    file: String,
    texture: TextureInfo,
}

impl Default for Texture2DNode {
    fn default() -> Self {
        Self {
            file: String::new(),
            texture: TextureInfo {
                handle: next_handle(),
                size: [512, 512],
            },
        }
    }
}

impl Texture2DNode {
    /// Current texture
    pub fn texture(&self) -> TextureInfo {
        self.texture
    }
}

impl Resizable for Texture2DNode {
    fn need_resize(&mut self, size: [u32; 2]) -> bool {
        if size == self.texture.size || size.contains(&0) {
            return false;
        }
        self.texture = TextureInfo {
            handle: next_handle(),
            size,
        };
        true
    }
}

impl OutputProvider for Texture2DNode {
    fn output(&self, _slot: &Slot) -> Option<Payload> {
        Some(Payload::Texture(self.texture))
    }
}

impl NodeBehavior for Texture2DNode {
    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::OutputProvider, Capability::Resizable]
    }

    fn save_params(&self, params: &mut NodeParams) {
        params.insert("file".to_string(), self.file.clone());
        params.insert(
            "size".to_string(),
            format!("{}x{}", self.texture.size[0], self.texture.size[1]),
        );
    }

    fn load_params(&mut self, params: &NodeParams) -> bool {
        if let Some(file) = params.get("file") {
            self.file = file.clone();
        }
        match params.get("size").map(String::as_str).map(parse_size) {
            Some(Some(size)) => {
                self.need_resize(size);
                true
            }
            Some(None) => false,
            None => true,
        }
    }

    fn as_output(&self) -> Option<&dyn OutputProvider> {
        Some(self)
    }

    fn as_resizable_mut(&mut self) -> Option<&mut dyn Resizable> {
        Some(self)
    }
}
