// SPDX-License-Identifier: MIT OR Apache-2.0
//! Built-in node library.
//!
//! Sources (texture, model, lights, widget variables), a blur effect, a
//! scene merger and the viewport output. GPU work is represented by opaque
//! handles and labels written to the host's command recorder.

pub mod blur;
pub mod light_group;
pub mod model;
pub mod output;
pub mod scene_merger;
pub mod texture;
pub mod variable;

pub use blur::BlurNode;
pub use light_group::LightGroupNode;
pub use model::ModelNode;
pub use output::Output3DNode;
pub use scene_merger::SceneMergerNode;
pub use texture::Texture2DNode;
pub use variable::VariableNode;

use crate::node::NodeRegistry;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_HANDLE: AtomicU64 = AtomicU64::new(1);

/// Fresh opaque backend handle
pub(crate) fn next_handle() -> u64 {
    NEXT_HANDLE.fetch_add(1, Ordering::Relaxed)
}

/// Parse `"WIDTHxHEIGHT"`
pub(crate) fn parse_size(text: &str) -> Option<[u32; 2]> {
    let (w, h) = text.trim().split_once('x')?;
    Some([w.trim().parse().ok()?, h.trim().parse().ok()?])
}

/// Create the registry of built-in node types
pub fn create_core_registry() -> NodeRegistry {
    let mut registry = NodeRegistry::new();

    // Sources
    registry.register(texture::node_type(), || Box::<Texture2DNode>::default());
    registry.register(model::node_type(), || Box::<ModelNode>::default());
    registry.register(light_group::node_type(), || Box::<LightGroupNode>::default());
    for ty in variable::VARIABLE_TYPES {
        registry.register(variable::node_type(ty), move || Box::new(VariableNode::new(ty)));
    }

    // Effects and renderers
    registry.register(blur::node_type(), || Box::<BlurNode>::default());
    registry.register(scene_merger::node_type(), || Box::<SceneMergerNode>::default());

    // Output
    registry.register(output::node_type(), || Box::<Output3DNode>::default());

    registry
}
