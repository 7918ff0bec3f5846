// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node definitions for the graph framework.

use crate::behavior::{Capability, NodeBehavior, Payload};
use crate::frame::FrameGate;
use crate::graph::Graph;
use crate::slot::{Slot, SlotDirection, SlotId, SlotRef};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Create a new random node ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The nil ID, carried by template slots not yet owned by a node
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

/// Free-form per-node parameters persisted alongside the node
pub type NodeParams = IndexMap<String, String>;

/// Node type category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeCategory {
    /// Asset sources (textures, models)
    Assets,
    /// Lights and light groups
    Lighting,
    /// Renderers
    Renderers,
    /// Post processing
    PostPro,
    /// Widget variables
    Widgets,
    /// Graph outputs
    Output,
    /// Utility nodes
    Misc,
    /// Provided by a plugin
    Plugin,
}

/// Node type definition
#[derive(Debug, Clone)]
pub struct NodeType {
    /// Unique type identifier
    pub id: String,
    /// Display name
    pub name: String,
    /// Category
    pub category: NodeCategory,
    /// Description
    pub description: String,
    /// Default input slots
    pub inputs: Vec<Slot>,
    /// Default output slots
    pub outputs: Vec<Slot>,
}

/// A node instance in the graph
pub struct Node {
    pub(crate) id: NodeId,
    /// Node type ID
    pub node_type: String,
    /// Display name (can be customized)
    pub name: String,
    /// Position in the graph UI
    pub position: [f32; 2],
    /// Whether the node is collapsed in the UI
    pub collapsed: bool,
    inputs: Vec<Slot>,
    outputs: Vec<Slot>,
    pub(crate) gate: FrameGate,
    child: Option<Box<Graph>>,
    pub(crate) behavior: Box<dyn NodeBehavior>,
}

impl Node {
    /// Create a new node from a type definition and its behavior
    pub fn new(node_type: &NodeType, behavior: Box<dyn NodeBehavior>) -> Self {
        let mut node = Self {
            id: NodeId::new(),
            node_type: node_type.id.clone(),
            name: node_type.name.clone(),
            position: [0.0, 0.0],
            collapsed: false,
            inputs: Vec::new(),
            outputs: Vec::new(),
            gate: FrameGate::default(),
            child: None,
            behavior,
        };
        for slot in node_type.inputs.iter().chain(node_type.outputs.iter()) {
            node.add_slot(slot.clone());
        }
        node
    }

    /// Unique instance ID; fixed once the node is in a graph
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Set the position
    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = [x, y];
        self
    }

    /// Attach a sub-graph owned by this node
    pub fn with_child_graph(mut self, graph: Graph) -> Self {
        self.child = Some(Box::new(graph));
        self
    }

    /// Add a slot. Returns `None` when a slot with the same name already
    /// exists in that direction.
    pub fn add_slot(&mut self, slot: Slot) -> Option<SlotId> {
        if self.find_slot(&slot.name, slot.direction).is_some() {
            return None;
        }
        let mut slot = slot.instantiate(self.id);
        let list = match slot.direction {
            SlotDirection::Input => &mut self.inputs,
            SlotDirection::Output => &mut self.outputs,
        };
        slot.index = list.len() as u32;
        let id = slot.id;
        list.push(slot);
        Some(id)
    }

    /// Get an input slot by index
    pub fn input(&self, index: usize) -> Option<&Slot> {
        self.inputs.get(index)
    }

    /// Get an output slot by index
    pub fn output(&self, index: usize) -> Option<&Slot> {
        self.outputs.get(index)
    }

    /// All input slots, in order
    pub fn inputs(&self) -> &[Slot] {
        &self.inputs
    }

    /// All output slots, in order
    pub fn outputs(&self) -> &[Slot] {
        &self.outputs
    }

    /// Get a slot by ID
    pub fn slot(&self, slot_id: SlotId) -> Option<&Slot> {
        self.slots().find(|s| s.id == slot_id)
    }

    pub(crate) fn slot_mut(&mut self, slot_id: SlotId) -> Option<&mut Slot> {
        self.inputs
            .iter_mut()
            .chain(self.outputs.iter_mut())
            .find(|s| s.id == slot_id)
    }

    /// Find a slot by name and direction
    pub fn find_slot(&self, name: &str, direction: SlotDirection) -> Option<&Slot> {
        let list = match direction {
            SlotDirection::Input => &self.inputs,
            SlotDirection::Output => &self.outputs,
        };
        list.iter().find(|s| s.name == name)
    }

    /// Handle to a slot by name and direction
    pub fn slot_ref(&self, name: &str, direction: SlotDirection) -> Option<SlotRef> {
        self.find_slot(name, direction).map(Slot::slot_ref)
    }

    /// Get all slots
    pub fn slots(&self) -> impl Iterator<Item = &Slot> {
        self.inputs.iter().chain(self.outputs.iter())
    }

    /// Behavior of this node
    pub fn behavior(&self) -> &dyn NodeBehavior {
        self.behavior.as_ref()
    }

    /// Mutable behavior of this node
    pub fn behavior_mut(&mut self) -> &mut dyn NodeBehavior {
        self.behavior.as_mut()
    }

    /// Whether the node declares a capability
    pub fn supports(&self, capability: Capability) -> bool {
        self.behavior.capabilities().contains(&capability)
    }

    /// Frame this node last executed in
    pub fn last_executed_frame(&self) -> Option<u32> {
        self.gate.last_executed_frame()
    }

    /// Sub-graph owned by this node
    pub fn child_graph(&self) -> Option<&Graph> {
        self.child.as_deref()
    }

    /// Mutable sub-graph owned by this node
    pub fn child_graph_mut(&mut self) -> Option<&mut Graph> {
        self.child.as_deref_mut()
    }

    pub(crate) fn take_child_graph(&mut self) -> Option<Box<Graph>> {
        self.child.take()
    }

    pub(crate) fn set_child_graph(&mut self, graph: Option<Box<Graph>>) {
        self.child = graph;
    }

    /// Replace a slot's id with a persisted one
    pub(crate) fn adopt_slot_id(&mut self, slot_id: SlotId, persisted: SlotId) -> bool {
        if slot_id != persisted && self.slot(persisted).is_some() {
            return false;
        }
        match self.slot_mut(slot_id) {
            Some(slot) => {
                slot.id = persisted;
                true
            }
            None => false,
        }
    }

    /// Replace this node's id; slot owner references follow
    pub(crate) fn adopt_id(&mut self, id: NodeId) {
        self.id = id;
        for slot in self.inputs.iter_mut().chain(self.outputs.iter_mut()) {
            slot.node = id;
        }
    }

    pub(crate) fn output_payload(&self, slot_id: SlotId) -> Option<Payload> {
        let slot = self.outputs.iter().find(|s| s.id == slot_id)?;
        self.behavior.as_output()?.output(slot)
    }

    pub(crate) fn bind_input(&mut self, slot_id: SlotId, payload: Option<Payload>) {
        let Some(slot) = self.inputs.iter().find(|s| s.id == slot_id) else {
            return;
        };
        if let Some(consumer) = self.behavior.as_input_mut() {
            consumer.bind_input(slot, payload);
        }
    }

    pub(crate) fn connection_changed(&mut self, slot_id: SlotId, other: SlotRef, connected: bool) {
        let Some(slot) = self.inputs.iter().chain(self.outputs.iter()).find(|s| s.id == slot_id) else {
            return;
        };
        if connected {
            self.behavior.on_connect(slot, other);
        } else {
            self.behavior.on_disconnect(slot, other);
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("node_type", &self.node_type)
            .field("name", &self.name)
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .field("last_executed_frame", &self.gate.last_executed_frame())
            .finish_non_exhaustive()
    }
}

type NodeFactory = Box<dyn Fn() -> Box<dyn NodeBehavior>>;

struct RegisteredType {
    node_type: NodeType,
    factory: NodeFactory,
}

/// Registry of available node types
pub struct NodeRegistry {
    /// Registered node types by ID
    types: IndexMap<String, RegisteredType>,
}

impl NodeRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            types: IndexMap::new(),
        }
    }

    /// Register a node type with the factory building its behavior.
    /// A later registration under the same ID replaces the earlier one.
    pub fn register<F>(&mut self, node_type: NodeType, factory: F)
    where
        F: Fn() -> Box<dyn NodeBehavior> + 'static,
    {
        let id = node_type.id.clone();
        let registered = RegisteredType {
            node_type,
            factory: Box::new(factory),
        };
        if self.types.insert(id.clone(), registered).is_some() {
            tracing::debug!("node type {id} re-registered");
        }
    }

    /// Move in every type of `other` that is not registered yet. Existing
    /// types win. Returns how many types were added.
    pub fn merge(&mut self, other: NodeRegistry) -> usize {
        let mut added = 0;
        for (id, registered) in other.types {
            if self.types.contains_key(&id) {
                tracing::warn!("node type {id} already registered, keeping the existing one");
                continue;
            }
            self.types.insert(id, registered);
            added += 1;
        }
        added
    }

    /// Get a node type by ID
    pub fn get(&self, id: &str) -> Option<&NodeType> {
        self.types.get(id).map(|r| &r.node_type)
    }

    /// Whether a node type is registered
    pub fn contains(&self, id: &str) -> bool {
        self.types.contains_key(id)
    }

    /// Get all registered types
    pub fn types(&self) -> impl Iterator<Item = &NodeType> {
        self.types.values().map(|r| &r.node_type)
    }

    /// Get types by category
    pub fn types_in_category(&self, category: NodeCategory) -> impl Iterator<Item = &NodeType> {
        self.types().filter(move |t| t.category == category)
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Whether nothing is registered
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Create a node from a type ID
    pub fn create_node(&self, type_id: &str) -> Option<Node> {
        let registered = self.types.get(type_id)?;
        Some(Node::new(&registered.node_type, (registered.factory)()))
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::SlotKind;
    use crate::testing::Recorder;

    fn texture_type() -> NodeType {
        NodeType {
            id: "pass".to_string(),
            name: "Pass".to_string(),
            category: NodeCategory::Misc,
            description: String::new(),
            inputs: vec![Slot::input("Input", SlotKind::Texture2D)],
            outputs: vec![
                Slot::output("Output", SlotKind::Texture2D),
                Slot::output("Depth", SlotKind::Texture2D).with_binding(1),
            ],
        }
    }

    #[test]
    fn test_node_slots_are_owned_and_indexed() {
        let node = Node::new(&texture_type(), Box::new(Recorder::default()));
        assert_eq!(node.inputs().len(), 1);
        assert_eq!(node.outputs().len(), 2);
        assert!(node.slots().all(|s| s.node == node.id));
        assert_eq!(node.output(1).map(|s| s.index), Some(1));
        assert_eq!(node.output(1).map(|s| s.binding), Some(1));
    }

    #[test]
    fn test_instances_get_fresh_slot_ids() {
        let ty = texture_type();
        let a = Node::new(&ty, Box::new(Recorder::default()));
        let b = Node::new(&ty, Box::new(Recorder::default()));
        assert_ne!(a.inputs()[0].id, b.inputs()[0].id);
        assert_ne!(a.inputs()[0].id, ty.inputs[0].id);
    }

    #[test]
    fn test_slot_names_unique_per_direction() {
        let mut node = Node::new(&texture_type(), Box::new(Recorder::default()));
        assert!(node.add_slot(Slot::input("Input", SlotKind::Model)).is_none());
        // Same name on the other side is fine
        assert!(node.add_slot(Slot::output("Input", SlotKind::Model)).is_some());
        assert_eq!(node.outputs().len(), 3);
    }

    #[test]
    fn test_registry_creates_nodes() {
        let mut registry = NodeRegistry::new();
        registry.register(texture_type(), || Box::new(Recorder::default()));

        assert!(registry.contains("pass"));
        assert_eq!(registry.types_in_category(NodeCategory::Misc).count(), 1);
        let node = registry.create_node("pass").unwrap();
        assert_eq!(node.node_type, "pass");
        assert!(registry.create_node("missing").is_none());
    }
}
