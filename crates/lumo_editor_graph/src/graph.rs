// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph data structure containing nodes and links.

use crate::behavior::{CameraState, Payload};
use crate::link::{Link, LinkId};
use crate::node::{Node, NodeId};
use crate::notify::{NotifyEvent, Outbox};
use crate::settings::GraphSettings;
use crate::slot::{Slot, SlotDirection, SlotId, SlotKind, SlotRef};
use indexmap::IndexMap;
use std::collections::HashSet;

/// A node graph.
///
/// The graph owns its nodes, nodes own their slots, and the graph owns the
/// links between slots. Every other reference (slot handles, link
/// endpoints, notification targets) is a [`SlotRef`] or [`NodeId`] that is
/// resolved through the graph and may turn out stale.
#[derive(Debug)]
pub struct Graph {
    /// Graph name
    pub name: String,
    /// Nodes in the graph
    nodes: IndexMap<NodeId, Node>,
    /// Links between slots
    links: IndexMap<LinkId, Link>,
    settings: GraphSettings,
}

impl Graph {
    /// Create a new empty graph
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(name, GraphSettings::default())
    }

    /// Create a new empty graph with explicit settings
    pub fn with_settings(name: impl Into<String>, settings: GraphSettings) -> Self {
        Self {
            name: name.into(),
            nodes: IndexMap::new(),
            links: IndexMap::new(),
            settings,
        }
    }

    /// Settings in effect
    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    /// Replace the settings
    pub fn set_settings(&mut self, settings: GraphSettings) {
        self.settings = settings;
    }

    /// Add a node to the graph
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        if self.nodes.contains_key(&id) {
            tracing::warn!("node {id:?} added twice, replacing the previous one");
            self.remove_node(id);
        }
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node and its links.
    ///
    /// Each incident link is detached first; every surviving endpoint then
    /// receives one [`NotifyEvent::NodeLinkIsBreaked`].
    pub fn remove_node(&mut self, node_id: NodeId) -> Option<Node> {
        if !self.nodes.contains_key(&node_id) {
            return None;
        }
        let incident: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| l.involves_node(node_id))
            .map(|l| l.id)
            .collect();

        let mut survivors = Vec::new();
        for link_id in incident {
            let Some(link) = self.detach_link(link_id) else {
                continue;
            };
            if link.output.node != node_id {
                survivors.push((link.input, link.output));
            }
            if link.input.node != node_id {
                survivors.push((link.output, link.input));
            }
        }

        let node = self.nodes.shift_remove(&node_id);
        for (emitter, receiver) in survivors {
            self.notify(NotifyEvent::NodeLinkIsBreaked, emitter, Some(receiver));
        }
        tracing::debug!("graph({}) removed node {node_id:?}", self.name);
        node
    }

    /// Get a node by ID
    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.get(&node_id)
    }

    /// Get a mutable node by ID
    pub fn node_mut(&mut self, node_id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&node_id)
    }

    /// Get all nodes
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    /// Get all node IDs
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Get the number of nodes
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Resolve a slot handle
    pub fn slot(&self, slot: SlotRef) -> Option<&Slot> {
        self.nodes.get(&slot.node)?.slot(slot.slot)
    }

    fn slot_mut(&mut self, slot: SlotRef) -> Option<&mut Slot> {
        self.nodes.get_mut(&slot.node)?.slot_mut(slot.slot)
    }

    /// Handle to a named slot of a node
    pub fn find_slot(&self, node_id: NodeId, name: &str, direction: SlotDirection) -> Option<SlotRef> {
        self.node(node_id)?.slot_ref(name, direction)
    }

    /// Check that two slots could be linked, ignoring whether the input is
    /// already occupied. Returns the endpoints ordered output first.
    pub fn validate_connection(&self, a: SlotRef, b: SlotRef) -> Result<(SlotRef, SlotRef), ConnectionError> {
        let slot_a = self.checked_slot(a)?;
        let slot_b = self.checked_slot(b)?;

        if slot_a.direction == slot_b.direction {
            return Err(ConnectionError::DirectionMismatch);
        }
        let (output, input) = if slot_a.is_output() {
            (slot_a, slot_b)
        } else {
            (slot_b, slot_a)
        };

        if !output.kind.is_compatible(&input.kind) {
            return Err(ConnectionError::IncompatibleKind {
                output: output.kind.clone(),
                input: input.kind.clone(),
            });
        }

        if output.node == input.node && !self.allows_feedback(output.node) {
            return Err(ConnectionError::SelfLoop);
        }

        let (output, input) = (output.slot_ref(), input.slot_ref());
        if self.links.values().any(|l| l.output == output && l.input == input) {
            return Err(ConnectionError::AlreadyLinked);
        }
        Ok((output, input))
    }

    /// Link two slots. The endpoints may be given in either order.
    ///
    /// An input that already has a link rejects the new one with
    /// [`ConnectionError::EndpointBusy`] unless it accepts many inputs; use
    /// [`Graph::replace_connection`] to swap the upstream explicitly. A
    /// failed call leaves the graph untouched.
    pub fn connect(&mut self, a: SlotRef, b: SlotRef) -> Result<LinkId, ConnectionError> {
        let (output, input) = self
            .validate_connection(a, b)
            .inspect_err(|e| tracing::debug!("graph({}) can't connect slots: {e}", self.name))?;

        if self.slot(input).is_some_and(Slot::is_busy) {
            tracing::debug!("graph({}) can't connect slots: input {input:?} is busy", self.name);
            return Err(ConnectionError::EndpointBusy(input.slot));
        }

        Ok(self.attach_link(output, input))
    }

    /// Link two slots, first breaking the links already attached to the
    /// input. Nothing is broken when the new link would be rejected.
    pub fn replace_connection(&mut self, a: SlotRef, b: SlotRef) -> Result<LinkId, ConnectionError> {
        let (output, input) = self.validate_connection(a, b)?;
        let existing: Vec<LinkId> = self
            .slot(input)
            .map(|s| s.links.clone())
            .unwrap_or_default();
        for link_id in existing {
            self.disconnect(link_id);
        }
        Ok(self.attach_link(output, input))
    }

    fn attach_link(&mut self, output: SlotRef, input: SlotRef) -> LinkId {
        let color = self.slot(output).map_or([255; 4], |s| s.kind.color());
        let link = Link::new(output, input).with_style(color, 2.0);
        let id = link.id;
        self.links.insert(id, link);

        for end in [output, input] {
            if let Some(slot) = self.slot_mut(end) {
                slot.links.push(id);
                slot.invalidate_upstream();
            }
        }

        let payload = self.output_payload(output);
        if let Some(node) = self.nodes.get_mut(&output.node) {
            node.connection_changed(output.slot, input, true);
        }
        if let Some(node) = self.nodes.get_mut(&input.node) {
            node.bind_input(input.slot, payload);
            node.connection_changed(input.slot, output, true);
        }

        tracing::debug!("graph({}) linked {output:?} -> {input:?}", self.name);
        id
    }

    /// Remove a link. Both former endpoints receive one
    /// [`NotifyEvent::NodeLinkIsBreaked`].
    pub fn disconnect(&mut self, link_id: LinkId) -> Option<Link> {
        let link = self.detach_link(link_id)?;
        self.notify(NotifyEvent::NodeLinkIsBreaked, link.input, Some(link.output));
        self.notify(NotifyEvent::NodeLinkIsBreaked, link.output, Some(link.input));
        Some(link)
    }

    /// Remove every link attached to a slot. Returns how many were removed.
    pub fn disconnect_slot(&mut self, slot: SlotRef) -> usize {
        let links: Vec<LinkId> = self.slot(slot).map(|s| s.links.clone()).unwrap_or_default();
        links
            .into_iter()
            .filter_map(|id| self.disconnect(id))
            .count()
    }

    /// Take a link out of the graph and out of its endpoints, without
    /// notifying.
    fn detach_link(&mut self, link_id: LinkId) -> Option<Link> {
        let link = self.links.shift_remove(&link_id)?;

        for end in [link.output, link.input] {
            if let Some(slot) = self.slot_mut(end) {
                slot.links.retain(|l| *l != link_id);
                slot.invalidate_upstream();
            }
        }

        if let Some(node) = self.nodes.get_mut(&link.output.node) {
            node.connection_changed(link.output.slot, link.input, false);
        }
        if let Some(node) = self.nodes.get_mut(&link.input.node) {
            let still_linked = node.slot(link.input.slot).is_some_and(Slot::is_connected);
            if !still_linked {
                node.bind_input(link.input.slot, None);
            }
            node.connection_changed(link.input.slot, link.output, false);
        }

        tracing::debug!("graph({}) unlinked {:?} -> {:?}", self.name, link.output, link.input);
        Some(link)
    }

    /// Remove links with an endpoint that no longer resolves. Surviving
    /// endpoints are notified. Returns how many links were pruned.
    pub fn prune_broken_links(&mut self) -> usize {
        let broken: Vec<LinkId> = self
            .links
            .values()
            .filter(|l| self.slot(l.output).is_none() || self.slot(l.input).is_none())
            .map(|l| l.id)
            .collect();

        for link_id in &broken {
            let Some(link) = self.detach_link(*link_id) else {
                continue;
            };
            tracing::warn!("graph({}) pruned broken link {link_id:?}", self.name);
            if self.slot(link.output).is_some() {
                self.notify(NotifyEvent::NodeLinkIsBreaked, link.input, Some(link.output));
            }
            if self.slot(link.input).is_some() {
                self.notify(NotifyEvent::NodeLinkIsBreaked, link.output, Some(link.input));
            }
        }
        broken.len()
    }

    /// Get a link by ID
    pub fn link(&self, link_id: LinkId) -> Option<&Link> {
        self.links.get(&link_id)
    }

    /// Get all links
    pub fn links(&self) -> impl Iterator<Item = &Link> {
        self.links.values()
    }

    /// Get the number of links
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Links attached to a slot
    pub fn links_of_slot(&self, slot: SlotRef) -> impl Iterator<Item = &Link> {
        self.links
            .values()
            .filter(move |l| l.output == slot || l.input == slot)
    }

    /// Links involving a node
    pub fn links_for_node(&self, node_id: NodeId) -> impl Iterator<Item = &Link> {
        self.links.values().filter(move |l| l.involves_node(node_id))
    }

    /// Slots at the other end of the links attached to `slot`
    pub fn linked_slots(&self, slot: SlotRef) -> Vec<SlotRef> {
        let Some(resolved) = self.slot(slot) else {
            return Vec::new();
        };
        resolved
            .links
            .iter()
            .filter_map(|id| self.links.get(id))
            .filter_map(|l| l.other_end(slot))
            .collect()
    }

    /// Upstream output feeding an input slot.
    ///
    /// The answer is cached on the slot and dropped whenever a link is
    /// attached to or detached from it, so it is recomputed on the next
    /// call after any rewiring.
    pub fn resolve_upstream(&self, input: SlotRef) -> Option<SlotRef> {
        let slot = self.slot(input)?;
        if !slot.is_input() {
            return None;
        }
        if let Some(cached) = slot.upstream.get() {
            if self.slot(cached).is_some() {
                return Some(cached);
            }
        }
        let resolved = slot
            .links
            .iter()
            .filter_map(|id| self.links.get(id))
            .map(|l| l.output)
            .find(|out| self.slot(*out).is_some());
        slot.upstream.set(resolved);
        resolved
    }

    pub(crate) fn output_payload(&self, output: SlotRef) -> Option<Payload> {
        self.nodes.get(&output.node)?.output_payload(output.slot)
    }

    /// Payload currently flowing into an input slot
    pub fn input_payload(&self, input: SlotRef) -> Option<Payload> {
        self.output_payload(self.resolve_upstream(input)?)
    }

    /// Distinct nodes feeding this node's inputs
    pub fn upstream_nodes(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        self.links
            .values()
            .filter(|l| l.input.node == node_id)
            .map(|l| l.output.node)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Distinct nodes fed by this node's outputs
    pub fn downstream_nodes(&self, node_id: NodeId) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        self.links
            .values()
            .filter(|l| l.output.node == node_id)
            .map(|l| l.input.node)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Nodes with no linked output: the ends the host pulls from
    pub fn sink_nodes(&self) -> Vec<NodeId> {
        self.nodes
            .values()
            .filter(|n| !n.outputs().iter().any(Slot::is_connected))
            .map(|n| n.id)
            .collect()
    }

    fn allows_feedback(&self, node_id: NodeId) -> bool {
        self.settings.allow_feedback_loops
            || self.nodes.get(&node_id).is_some_and(|n| n.behavior.allows_feedback())
    }

    fn checked_slot(&self, slot: SlotRef) -> Result<&Slot, ConnectionError> {
        let node = self
            .nodes
            .get(&slot.node)
            .ok_or(ConnectionError::NodeNotFound(slot.node))?;
        node.slot(slot.slot).ok_or(ConnectionError::SlotNotFound(slot.slot))
    }

    /// Get nodes in topological order (upstream first)
    pub fn topological_order(&self) -> Result<Vec<NodeId>, CycleError> {
        let mut visited = HashSet::new();
        let mut temp_mark = HashSet::new();
        let mut order = Vec::new();

        for node_id in self.nodes.keys() {
            if !visited.contains(node_id) {
                self.visit(*node_id, &mut visited, &mut temp_mark, &mut order, false)?;
            }
        }

        Ok(order)
    }

    /// Order used to execute a frame: topological, with the back edges of
    /// feedback loops ignored.
    pub fn execution_order(&self) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut temp_mark = HashSet::new();
        let mut order = Vec::new();

        for node_id in self.nodes.keys() {
            if !visited.contains(node_id) {
                // Cannot fail when back edges are tolerated
                let _ = self.visit(*node_id, &mut visited, &mut temp_mark, &mut order, true);
            }
        }
        order
    }

    fn visit(
        &self,
        node_id: NodeId,
        visited: &mut HashSet<NodeId>,
        temp_mark: &mut HashSet<NodeId>,
        order: &mut Vec<NodeId>,
        tolerate_cycles: bool,
    ) -> Result<(), CycleError> {
        if temp_mark.contains(&node_id) {
            if tolerate_cycles {
                return Ok(());
            }
            return Err(CycleError);
        }
        if visited.contains(&node_id) {
            return Ok(());
        }

        temp_mark.insert(node_id);

        // Visit all nodes that this node depends on
        for upstream in self.upstream_nodes(node_id) {
            if upstream == node_id {
                continue;
            }
            self.visit(upstream, visited, temp_mark, order, tolerate_cycles)?;
        }

        temp_mark.remove(&node_id);
        visited.insert(node_id);
        order.push(node_id);

        Ok(())
    }

    /// Resize every resizable node; nodes whose targets changed announce it
    /// from their texture outputs. Returns how many nodes changed.
    pub fn resize(&mut self, size: [u32; 2]) -> usize {
        let ids: Vec<NodeId> = self.node_ids().collect();
        let mut changed = 0;
        for id in ids {
            let resized = self
                .nodes
                .get_mut(&id)
                .and_then(|n| n.behavior.as_resizable_mut())
                .is_some_and(|r| r.need_resize(size));
            if resized {
                changed += 1;
                self.announce_outputs(id, |kind| {
                    matches!(kind, SlotKind::Texture2D | SlotKind::Texture3D | SlotKind::TextureCube)
                });
            }
        }
        tracing::debug!("graph({}) resized to {size:?}, {changed} nodes changed", self.name);
        changed
    }

    /// Forward a camera change to camera-driven nodes. Nodes that changed
    /// announce their outputs; they are returned.
    pub fn update_camera(&mut self, camera: &CameraState) -> Vec<NodeId> {
        let dirty: Vec<NodeId> = self
            .nodes
            .values_mut()
            .filter_map(|n| {
                let dirty = n
                    .behavior
                    .as_camera_driven_mut()
                    .is_some_and(|c| c.camera_updated(camera));
                dirty.then_some(n.id)
            })
            .collect();
        for id in &dirty {
            self.announce_outputs(*id, |_| true);
        }
        dirty
    }

    /// Forward a gizmo change to gizmo-driven nodes. Nodes that changed
    /// announce their outputs; they are returned.
    pub fn update_gizmo(&mut self, transform: &[[f32; 4]; 4]) -> Vec<NodeId> {
        let dirty: Vec<NodeId> = self
            .nodes
            .values_mut()
            .filter_map(|n| {
                let dirty = n
                    .behavior
                    .as_gizmo_driven_mut()
                    .is_some_and(|g| g.gizmo_moved(transform));
                dirty.then_some(n.id)
            })
            .collect();
        for id in &dirty {
            self.announce_outputs(*id, |_| true);
        }
        dirty
    }

    /// Send, from each linked output of a node whose kind passes `filter`,
    /// the update event of that kind
    pub fn announce_outputs(&mut self, node_id: NodeId, filter: impl Fn(&SlotKind) -> bool) {
        let Some(node) = self.nodes.get(&node_id) else {
            return;
        };
        let mut outbox = Outbox::default();
        for slot in node.outputs().iter().filter(|s| filter(&s.kind)) {
            if let Some(event) = NotifyEvent::update_for(&slot.kind) {
                outbox.emit(slot.id, event);
            }
        }
        self.dispatch_outbox(node_id, outbox);
    }

    /// Check the ownership invariants: every link endpoint resolves, and
    /// every slot's link list matches the link table, and every node is
    /// stored under its own id.
    pub fn is_consistent(&self) -> bool {
        let endpoints_ok = self.links.values().all(|l| {
            self.slot(l.output).is_some_and(|s| s.links.contains(&l.id))
                && self.slot(l.input).is_some_and(|s| s.links.contains(&l.id))
        });
        let slots_ok = self
            .nodes
            .values()
            .flat_map(Node::slots)
            .all(|s| s.links.iter().all(|id| self.links.contains_key(id)));
        let ids_ok = self
            .nodes
            .iter()
            .all(|(key, node)| node.id == *key && node.slots().all(|s| s.node == *key));
        endpoints_ok && slots_ok && ids_ok
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new("Untitled")
    }
}

/// Error when creating a link
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectionError {
    /// Node not found
    #[error("Node not found: {0:?}")]
    NodeNotFound(NodeId),

    /// Slot not found
    #[error("Slot not found: {0:?}")]
    SlotNotFound(SlotId),

    /// Both slots have the same direction
    #[error("Both slots are inputs or both are outputs")]
    DirectionMismatch,

    /// Slot kinds differ
    #[error("Incompatible slot kinds: {output} -> {input}")]
    IncompatibleKind {
        /// Output slot kind
        output: SlotKind,
        /// Input slot kind
        input: SlotKind,
    },

    /// Input already has its single upstream link
    #[error("Input slot already connected: {0:?}")]
    EndpointBusy(SlotId),

    /// The same two slots are already linked
    #[error("Slots are already linked")]
    AlreadyLinked,

    /// Output and input belong to the same node
    #[error("Self-loop not allowed")]
    SelfLoop,
}

/// Error when graph contains a cycle
#[derive(Debug, thiserror::Error)]
#[error("Graph contains a cycle")]
pub struct CycleError;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{add_recorder, recorder_type, Journal, Recorder};

    fn out(graph: &Graph, node: NodeId) -> SlotRef {
        graph.find_slot(node, "Output", SlotDirection::Output).unwrap()
    }

    fn input(graph: &Graph, node: NodeId) -> SlotRef {
        graph.find_slot(node, "Input", SlotDirection::Input).unwrap()
    }

    fn breaks(journal: &Journal, node: NodeId) -> usize {
        journal
            .received_by(node)
            .iter()
            .filter(|n| n.event == NotifyEvent::NodeLinkIsBreaked)
            .count()
    }

    #[test]
    fn test_prune_broken_links_notifies_survivor() {
        let mut graph = Graph::new("test");
        let journal = Journal::default();
        let a = add_recorder(&mut graph, &journal);
        let b = add_recorder(&mut graph, &journal);
        graph.connect(out(&graph, a), input(&graph, b)).unwrap();
        assert_eq!(graph.prune_broken_links(), 0);

        // Same node id, fresh slot ids: the link's input no longer resolves
        let mut fresh = Node::new(&recorder_type(), Box::new(Recorder::new(&journal)));
        fresh.adopt_id(b);
        *graph.node_mut(b).unwrap() = fresh;
        assert!(!graph.is_consistent());
        journal.clear();

        assert_eq!(graph.prune_broken_links(), 1);

        assert_eq!(graph.link_count(), 0);
        assert!(graph.is_consistent());
        assert_eq!(breaks(&journal, a), 1);
        assert_eq!(breaks(&journal, b), 0);
        assert!(!graph.slot(out(&graph, a)).unwrap().is_connected());
        assert_eq!(graph.prune_broken_links(), 0);
    }

    #[test]
    fn test_disconnect_slot_clears_fan_out() {
        let mut graph = Graph::new("test");
        let journal = Journal::default();
        let source = add_recorder(&mut graph, &journal);
        let sinks: Vec<NodeId> = (0..3).map(|_| add_recorder(&mut graph, &journal)).collect();
        for sink in &sinks {
            graph.connect(out(&graph, source), input(&graph, *sink)).unwrap();
        }
        journal.clear();

        assert_eq!(graph.disconnect_slot(out(&graph, source)), 3);

        assert_eq!(graph.link_count(), 0);
        assert!(graph.is_consistent());
        assert!(!graph.slot(out(&graph, source)).unwrap().is_connected());
        for sink in &sinks {
            assert!(!graph.slot(input(&graph, *sink)).unwrap().is_connected());
            assert_eq!(breaks(&journal, *sink), 1);
        }
        assert_eq!(breaks(&journal, source), 3);
        assert_eq!(graph.disconnect_slot(out(&graph, source)), 0);
    }

    #[test]
    fn test_node_keys_match_node_ids() {
        let mut graph = Graph::new("test");
        let journal = Journal::default();
        let a = add_recorder(&mut graph, &journal);
        assert_eq!(graph.node(a).unwrap().id(), a);
        assert!(graph.is_consistent());

        // A node swapped in under another key is caught
        let stray = Node::new(&recorder_type(), Box::new(Recorder::new(&journal)));
        *graph.node_mut(a).unwrap() = stray;
        assert!(!graph.is_consistent());
    }

    #[test]
    fn test_connect_and_disconnect() {
        let mut graph = Graph::new("test");
        let journal = Journal::default();
        let a = add_recorder(&mut graph, &journal);
        let b = add_recorder(&mut graph, &journal);

        let link = graph.connect(out(&graph, a), input(&graph, b)).unwrap();
        assert_eq!(graph.link_count(), 1);
        assert!(graph.slot(out(&graph, a)).unwrap().is_connected());
        assert!(graph.is_consistent());
        journal.clear();

        let removed = graph.disconnect(link).unwrap();
        assert_eq!(removed.id, link);
        assert_eq!(graph.link_count(), 0);
        assert!(!graph.slot(out(&graph, a)).unwrap().is_connected());
        assert!(!graph.slot(input(&graph, b)).unwrap().is_connected());

        // Exactly one break notification per endpoint
        let to_a = journal.received_by(a);
        let to_b = journal.received_by(b);
        assert_eq!(to_a.len(), 1);
        assert_eq!(to_b.len(), 1);
        assert_eq!(to_a[0].event, NotifyEvent::NodeLinkIsBreaked);
        assert_eq!(to_b[0].event, NotifyEvent::NodeLinkIsBreaked);
        assert_eq!(to_b[0].receiver, Some(input(&graph, b)));
        assert!(graph.disconnect(link).is_none());
    }

    #[test]
    fn test_endpoints_are_normalized() {
        let mut graph = Graph::new("test");
        let journal = Journal::default();
        let a = add_recorder(&mut graph, &journal);
        let b = add_recorder(&mut graph, &journal);

        let link = graph.connect(input(&graph, b), out(&graph, a)).unwrap();
        let link = graph.link(link).unwrap();
        assert_eq!(link.output, out(&graph, a));
        assert_eq!(link.input, input(&graph, b));
    }

    #[test]
    fn test_rejections_leave_graph_untouched() {
        let mut graph = Graph::new("test");
        let journal = Journal::default();
        let a = add_recorder(&mut graph, &journal);
        let b = add_recorder(&mut graph, &journal);
        let c = add_recorder(&mut graph, &journal);
        graph.connect(out(&graph, a), input(&graph, b)).unwrap();

        // Busy input
        assert_eq!(
            graph.connect(out(&graph, c), input(&graph, b)),
            Err(ConnectionError::EndpointBusy(input(&graph, b).slot))
        );
        // Same direction
        assert_eq!(
            graph.connect(out(&graph, a), out(&graph, c)),
            Err(ConnectionError::DirectionMismatch)
        );
        // Self loop
        assert_eq!(
            graph.connect(out(&graph, c), input(&graph, c)),
            Err(ConnectionError::SelfLoop)
        );
        // Kind mismatch
        let model_in = graph.find_slot(c, "Model", SlotDirection::Input).unwrap();
        assert!(matches!(
            graph.connect(out(&graph, a), model_in),
            Err(ConnectionError::IncompatibleKind { .. })
        ));
        // Duplicate
        assert_eq!(
            graph.connect(out(&graph, a), input(&graph, b)),
            Err(ConnectionError::AlreadyLinked)
        );

        assert_eq!(graph.link_count(), 1);
        assert!(!graph.slot(input(&graph, c)).unwrap().is_connected());
        assert!(!graph.slot(model_in).unwrap().is_connected());
        assert_eq!(graph.slot(input(&graph, b)).unwrap().links().len(), 1);
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_connect_succeeds_iff_compatible_and_free() {
        let mut graph = Graph::new("test");
        let journal = Journal::default();
        let a = add_recorder(&mut graph, &journal);
        let b = add_recorder(&mut graph, &journal);

        let outputs: Vec<SlotRef> = graph.node(a).unwrap().outputs().iter().map(Slot::slot_ref).collect();
        let inputs: Vec<SlotRef> = graph.node(b).unwrap().inputs().iter().map(Slot::slot_ref).collect();
        for o in &outputs {
            for i in &inputs {
                let compatible = graph
                    .slot(*o)
                    .unwrap()
                    .kind
                    .is_compatible(&graph.slot(*i).unwrap().kind);
                let busy = graph.slot(*i).unwrap().is_busy();
                let result = graph.connect(*o, *i);
                assert_eq!(result.is_ok(), compatible && !busy);
            }
        }
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_self_loop_allowed_by_settings() {
        let settings = GraphSettings {
            allow_feedback_loops: true,
            ..GraphSettings::default()
        };
        let mut graph = Graph::with_settings("feedback", settings);
        let journal = Journal::default();
        let a = add_recorder(&mut graph, &journal);
        assert!(graph.connect(out(&graph, a), input(&graph, a)).is_ok());
        assert_eq!(graph.execution_order(), vec![a]);
    }

    #[test]
    fn test_replace_connection() {
        let mut graph = Graph::new("test");
        let journal = Journal::default();
        let a = add_recorder(&mut graph, &journal);
        let b = add_recorder(&mut graph, &journal);
        let c = add_recorder(&mut graph, &journal);
        graph.connect(out(&graph, a), input(&graph, c)).unwrap();
        journal.clear();

        graph.replace_connection(out(&graph, b), input(&graph, c)).unwrap();

        assert_eq!(graph.link_count(), 1);
        assert_eq!(graph.resolve_upstream(input(&graph, c)), Some(out(&graph, b)));
        assert_eq!(journal.received_by(a).len(), 1);
        assert!(graph.is_consistent());

        // A rejected replacement breaks nothing
        let model_in = graph.find_slot(c, "Model", SlotDirection::Input).unwrap();
        assert!(graph.replace_connection(out(&graph, a), model_in).is_err());
        assert_eq!(graph.link_count(), 1);
    }

    #[test]
    fn test_resolve_upstream_follows_rewiring() {
        let mut graph = Graph::new("test");
        let journal = Journal::default();
        let a = add_recorder(&mut graph, &journal);
        let b = add_recorder(&mut graph, &journal);
        let c = add_recorder(&mut graph, &journal);

        assert_eq!(graph.resolve_upstream(input(&graph, c)), None);
        let link = graph.connect(out(&graph, a), input(&graph, c)).unwrap();
        assert_eq!(graph.resolve_upstream(input(&graph, c)), Some(out(&graph, a)));
        // Cached now
        assert_eq!(graph.slot(input(&graph, c)).unwrap().upstream.get(), Some(out(&graph, a)));

        graph.disconnect(link);
        assert_eq!(graph.slot(input(&graph, c)).unwrap().upstream.get(), None);
        graph.connect(out(&graph, b), input(&graph, c)).unwrap();
        assert_eq!(graph.resolve_upstream(input(&graph, c)), Some(out(&graph, b)));
        // Outputs have no upstream
        assert_eq!(graph.resolve_upstream(out(&graph, b)), None);
    }

    #[test]
    fn test_remove_node_notifies_survivors() {
        let mut graph = Graph::new("test");
        let journal = Journal::default();
        let hub = add_recorder(&mut graph, &journal);
        let up = add_recorder(&mut graph, &journal);
        let down: Vec<NodeId> = (0..3).map(|_| add_recorder(&mut graph, &journal)).collect();

        graph.connect(out(&graph, up), input(&graph, hub)).unwrap();
        for d in &down {
            graph.connect(out(&graph, hub), input(&graph, *d)).unwrap();
        }
        journal.clear();

        let removed = graph.remove_node(hub).unwrap();
        assert_eq!(removed.id, hub);

        // Four incident links, four notifications, all to survivors
        assert_eq!(journal.len(), 4);
        assert!(journal
            .all()
            .iter()
            .all(|n| n.event == NotifyEvent::NodeLinkIsBreaked));
        assert!(journal.received_by(hub).is_empty());
        assert_eq!(graph.link_count(), 0);
        assert!(graph
            .nodes()
            .flat_map(Node::slots)
            .all(|s| s.links().is_empty() && s.upstream.get().is_none()));
        assert!(graph.is_consistent());
    }

    #[test]
    fn test_topological_order() {
        let mut graph = Graph::new("test");
        let journal = Journal::default();
        let a = add_recorder(&mut graph, &journal);
        let b = add_recorder(&mut graph, &journal);
        let c = add_recorder(&mut graph, &journal);
        graph.connect(out(&graph, b), input(&graph, c)).unwrap();
        graph.connect(out(&graph, a), input(&graph, b)).unwrap();

        let order = graph.topological_order().unwrap();
        let pos = |id| order.iter().position(|n| *n == id).unwrap();
        assert!(pos(a) < pos(b));
        assert!(pos(b) < pos(c));
        assert_eq!(graph.sink_nodes(), vec![c]);
    }

    #[test]
    fn test_cycle_detection() {
        let mut graph = Graph::new("test");
        let journal = Journal::default();
        let a = add_recorder(&mut graph, &journal);
        let b = add_recorder(&mut graph, &journal);
        graph.connect(out(&graph, a), input(&graph, b)).unwrap();
        let back_in = graph.find_slot(a, "Feedback", SlotDirection::Input).unwrap();
        graph.connect(out(&graph, b), back_in).unwrap();

        assert!(graph.topological_order().is_err());
        assert_eq!(graph.execution_order().len(), 2);
    }
}
