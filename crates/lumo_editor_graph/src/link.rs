// SPDX-License-Identifier: MIT OR Apache-2.0
//! Link (edge) definitions for the graph.

use crate::node::NodeId;
use crate::slot::{SlotId, SlotRef};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkId(pub Uuid);

impl LinkId {
    /// Create a new random link ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LinkId {
    fn default() -> Self {
        Self::new()
    }
}

/// A link from one output slot to one input slot.
///
/// Owns no data. Color and thickness are drawing hints only.
#[derive(Debug, Clone)]
pub struct Link {
    /// Unique link ID
    pub id: LinkId,
    /// Upstream output slot
    pub output: SlotRef,
    /// Downstream input slot
    pub input: SlotRef,
    /// Line color (RGBA)
    pub color: [u8; 4],
    /// Line thickness
    pub thickness: f32,
}

impl Link {
    /// Create a new link
    pub fn new(output: SlotRef, input: SlotRef) -> Self {
        Self {
            id: LinkId::new(),
            output,
            input,
            color: [255, 255, 255, 255],
            thickness: 2.0,
        }
    }

    /// Set the drawing hint
    pub fn with_style(mut self, color: [u8; 4], thickness: f32) -> Self {
        self.color = color;
        self.thickness = thickness;
        self
    }

    /// Check if this link involves a specific node
    pub fn involves_node(&self, node_id: NodeId) -> bool {
        self.output.node == node_id || self.input.node == node_id
    }

    /// Check if this link involves a specific slot
    pub fn involves_slot(&self, slot_id: SlotId) -> bool {
        self.output.slot == slot_id || self.input.slot == slot_id
    }

    /// The endpoint opposite to `slot`, if `slot` is one of the endpoints
    pub fn other_end(&self, slot: SlotRef) -> Option<SlotRef> {
        if self.output == slot {
            Some(self.input)
        } else if self.input == slot {
            Some(self.output)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_other_end() {
        let out = SlotRef::new(NodeId::new(), SlotId::new());
        let input = SlotRef::new(NodeId::new(), SlotId::new());
        let link = Link::new(out, input);

        assert_eq!(link.other_end(out), Some(input));
        assert_eq!(link.other_end(input), Some(out));
        assert_eq!(link.other_end(SlotRef::new(NodeId::new(), SlotId::new())), None);
        assert!(link.involves_node(out.node));
        assert!(link.involves_slot(input.slot));
    }
}
