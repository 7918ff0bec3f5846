// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph persistence.
//!
//! A [`GraphDocument`] is the serializable form of a [`Graph`]. Links are
//! stored as pairs of (node id, slot id) addresses and rebuilt once every
//! node is loaded.

use crate::graph::{ConnectionError, Graph};
use crate::node::{NodeId, NodeParams, NodeRegistry};
use crate::notify::NotifyEvent;
use crate::settings::GraphSettings;
use crate::slot::{Slot, SlotDirection, SlotId, SlotKind, SlotRef};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Persisted address of a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotAddress {
    /// Owning node
    pub node: NodeId,
    /// Slot
    pub slot: SlotId,
}

impl From<SlotRef> for SlotAddress {
    fn from(slot: SlotRef) -> Self {
        Self {
            node: slot.node,
            slot: slot.slot,
        }
    }
}

impl From<SlotAddress> for SlotRef {
    fn from(address: SlotAddress) -> Self {
        SlotRef::new(address.node, address.slot)
    }
}

/// Persisted slot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SlotRecord {
    /// Slot id
    pub id: SlotId,
    /// Ordinal among the slots of the same direction
    pub index: u32,
    /// Name
    pub name: String,
    /// Data kind
    pub kind: SlotKind,
    /// Direction
    pub direction: SlotDirection,
    /// Descriptor binding
    #[serde(default)]
    pub binding: u32,
}

impl From<&Slot> for SlotRecord {
    fn from(slot: &Slot) -> Self {
        Self {
            id: slot.id,
            index: slot.index,
            name: slot.name.clone(),
            kind: slot.kind.clone(),
            direction: slot.direction,
            binding: slot.binding,
        }
    }
}

/// Persisted node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Node id
    pub id: NodeId,
    /// Display name
    pub name: String,
    /// Registered type id
    pub node_type: String,
    /// Editor position
    #[serde(default)]
    pub position: [f32; 2],
    /// Behavior parameters
    #[serde(default)]
    pub params: NodeParams,
    /// Slots
    #[serde(default)]
    pub slots: Vec<SlotRecord>,
    /// Sub-graph owned by the node
    #[serde(default)]
    pub child: Option<GraphDocument>,
}

/// Persisted link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Downstream input
    pub input: SlotAddress,
    /// Upstream output
    pub output: SlotAddress,
}

/// Persisted graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Graph name
    pub name: String,
    /// Nodes
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    /// Links
    #[serde(default)]
    pub links: Vec<LinkRecord>,
}

impl GraphDocument {
    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String, DocumentError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Parse from RON
    pub fn from_ron(text: &str) -> Result<Self, DocumentError> {
        Ok(ron::from_str(text)?)
    }
}

/// Error reading or writing a document
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    /// Malformed RON
    #[error("Failed to parse graph document: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization failed
    #[error("Failed to serialize graph document: {0}")]
    Serialize(#[from] ron::Error),
}

/// Something in a document that could not be loaded. Loading goes on
/// without it.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadIssue {
    /// No registered type for a node
    #[error("Node {node:?} has unknown type {node_type}")]
    UnknownNodeType {
        /// Skipped node
        node: NodeId,
        /// Unknown type id
        node_type: String,
    },

    /// Two nodes share an id
    #[error("Duplicate node id {0:?}")]
    DuplicateNode(NodeId),

    /// The behavior refused its parameters
    #[error("Node {0:?} rejected its parameters")]
    RejectedParams(NodeId),

    /// A slot record no longer matches the node type's slot at its index;
    /// it was restored as an extra slot
    #[error("Slot {slot:?} of node {node:?} does not match its node type")]
    SlotMismatch {
        /// Owning node
        node: NodeId,
        /// Persisted slot id
        slot: SlotId,
    },

    /// A link could not be rebuilt
    #[error("Link {output:?} -> {input:?} dropped: {reason}")]
    UnresolvedLink {
        /// Upstream address
        output: SlotAddress,
        /// Downstream address
        input: SlotAddress,
        /// Why the link was refused
        reason: ConnectionError,
    },
}

impl Graph {
    /// Capture the graph as a document
    pub fn to_document(&self) -> GraphDocument {
        let nodes = self
            .nodes()
            .map(|node| {
                let mut params = NodeParams::new();
                node.behavior().save_params(&mut params);
                NodeRecord {
                    id: node.id,
                    name: node.name.clone(),
                    node_type: node.node_type.clone(),
                    position: node.position,
                    params,
                    slots: node.slots().map(SlotRecord::from).collect(),
                    child: node.child_graph().map(Graph::to_document),
                }
            })
            .collect();
        let links = self
            .links()
            .map(|link| LinkRecord {
                input: link.input.into(),
                output: link.output.into(),
            })
            .collect();
        GraphDocument {
            name: self.name.clone(),
            nodes,
            links,
        }
    }

    /// Rebuild a graph from a document.
    ///
    /// Nodes are created first through the registry, adopting their
    /// persisted ids. Slot records are matched to the type's slots by
    /// direction and index, and must agree on kind and name; records with no
    /// match become extra slots.
    /// Links are rebuilt second. Whatever cannot be resolved is skipped and
    /// reported. Every loaded node then receives
    /// [`NotifyEvent::GraphIsLoaded`].
    pub fn from_document(
        document: &GraphDocument,
        registry: &NodeRegistry,
        settings: GraphSettings,
    ) -> (Graph, Vec<LoadIssue>) {
        let mut graph = Graph::with_settings(document.name.clone(), settings.clone());
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for record in &document.nodes {
            if !seen.insert(record.id) {
                tracing::warn!("graph({}) duplicate node {:?} skipped", graph.name, record.id);
                issues.push(LoadIssue::DuplicateNode(record.id));
                continue;
            }
            let Some(mut node) = registry.create_node(&record.node_type) else {
                tracing::warn!(
                    "graph({}) node {:?} has unknown type {}, skipped",
                    graph.name,
                    record.id,
                    record.node_type
                );
                issues.push(LoadIssue::UnknownNodeType {
                    node: record.id,
                    node_type: record.node_type.clone(),
                });
                continue;
            };

            node.adopt_id(record.id);
            node.name = record.name.clone();
            node.position = record.position;

            for slot in &record.slots {
                let template = match slot.direction {
                    SlotDirection::Input => node.input(slot.index as usize),
                    SlotDirection::Output => node.output(slot.index as usize),
                };
                let template = match template {
                    Some(t) if t.kind == slot.kind && t.name == slot.name => Some(t.id),
                    Some(t) => {
                        tracing::warn!(
                            "graph({}) slot {} ({}) of node {:?} no longer matches {} ({}), kept as an extra slot",
                            graph.name,
                            slot.name,
                            slot.kind,
                            record.id,
                            t.name,
                            t.kind
                        );
                        issues.push(LoadIssue::SlotMismatch {
                            node: record.id,
                            slot: slot.id,
                        });
                        None
                    }
                    None => None,
                };
                let adopted = match template {
                    Some(id) => node.adopt_slot_id(id, slot.id),
                    None => {
                        let extra = Slot::new(slot.name.clone(), slot.kind.clone(), slot.direction)
                            .with_binding(slot.binding);
                        node.add_slot(extra)
                            .is_some_and(|id| node.adopt_slot_id(id, slot.id))
                    }
                };
                if !adopted {
                    tracing::warn!(
                        "graph({}) slot {} of node {:?} could not be restored",
                        graph.name,
                        slot.name,
                        record.id
                    );
                }
            }

            if !node.behavior_mut().load_params(&record.params) {
                tracing::warn!("graph({}) node {:?} rejected its parameters", graph.name, record.id);
                issues.push(LoadIssue::RejectedParams(record.id));
            }

            if let Some(child) = &record.child {
                let (child, child_issues) = Graph::from_document(child, registry, settings.clone());
                issues.extend(child_issues);
                node.set_child_graph(Some(Box::new(child)));
            }

            graph.add_node(node);
        }

        for link in &document.links {
            if let Err(reason) = graph.connect(link.output.into(), link.input.into()) {
                tracing::warn!(
                    "graph({}) link {:?} -> {:?} dropped: {reason}",
                    graph.name,
                    link.output,
                    link.input
                );
                issues.push(LoadIssue::UnresolvedLink {
                    output: link.output,
                    input: link.input,
                    reason,
                });
            }
        }

        graph.broadcast(NotifyEvent::GraphIsLoaded);
        tracing::info!(
            "graph({}) loaded: {} nodes, {} links, {} issues",
            graph.name,
            graph.node_count(),
            graph.link_count(),
            issues.len()
        );
        (graph, issues)
    }
}
