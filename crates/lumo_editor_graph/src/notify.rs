// SPDX-License-Identifier: MIT OR Apache-2.0
//! Notification bus between linked slots.
//!
//! Notifications are messages: an event, the slot that emitted it, and an
//! optional receiving slot. Dispatch is synchronous and breadth-first.
//! Each propagation pass keeps visited sets so a feedback path cannot loop:
//!
//! - an input slot re-pulls the emitter's payload at most once per
//!   (slot, event, emitter)
//! - a node treats at most one notification per (node, event, emitter)
//!
//! Messages deeper than [`GraphSettings::max_propagation_depth`] are dropped.
//!
//! [`GraphSettings::max_propagation_depth`]: crate::GraphSettings

use crate::graph::Graph;
use crate::node::NodeId;
use crate::slot::{SlotDirection, SlotId, SlotKind, SlotRef};
use std::collections::{HashSet, VecDeque};

/// Kinds of notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotifyEvent {
    /// A model output changed
    ModelUpdateDone,
    /// A texture output changed (resized, recreated)
    TextureUpdateDone,
    /// A texture group output changed
    TextureGroupUpdateDone,
    /// A light changed
    LightUpdateDone,
    /// A light group changed
    LightGroupUpdateDone,
    /// A variable changed
    VariableUpdateDone,
    /// A texel buffer changed
    TexelBufferUpdateDone,
    /// A storage buffer changed
    StorageBufferUpdateDone,
    /// An acceleration structure changed
    AccelStructureUpdateDone,
    /// A shader pass chain changed
    SomeTasksWasUpdated,
    /// A link attached to the receiving slot was removed
    NodeLinkIsBreaked,
    /// The project finished loading
    GraphIsLoaded,
    /// A node produced a new frame
    NewFrameAvailable,
}

impl NotifyEvent {
    /// Global events travel the whole chain: forwarded to the outputs when
    /// they arrive on an input, to the inputs when they arrive on an output.
    pub fn is_global(self) -> bool {
        matches!(
            self,
            Self::GraphIsLoaded | Self::NewFrameAvailable | Self::SomeTasksWasUpdated
        )
    }

    /// Update event announcing a change of data of `kind`
    pub fn update_for(kind: &SlotKind) -> Option<Self> {
        match kind {
            SlotKind::Texture2D | SlotKind::Texture3D | SlotKind::TextureCube => {
                Some(Self::TextureUpdateDone)
            }
            SlotKind::TextureGroup => Some(Self::TextureGroupUpdateDone),
            SlotKind::Model => Some(Self::ModelUpdateDone),
            SlotKind::Light => Some(Self::LightUpdateDone),
            SlotKind::LightGroup => Some(Self::LightGroupUpdateDone),
            SlotKind::Task => Some(Self::SomeTasksWasUpdated),
            SlotKind::Variable(_) => Some(Self::VariableUpdateDone),
            SlotKind::TexelBuffer => Some(Self::TexelBufferUpdateDone),
            SlotKind::StorageBuffer => Some(Self::StorageBufferUpdateDone),
            SlotKind::AccelStructure => Some(Self::AccelStructureUpdateDone),
            SlotKind::Custom(_) => None,
        }
    }

    /// Whether an input slot of `kind` must re-pull its payload on this event
    pub fn refreshes(self, kind: &SlotKind) -> bool {
        Self::update_for(kind) == Some(self)
    }
}

/// A delivered notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// What happened
    pub event: NotifyEvent,
    /// Slot that emitted it (may already be gone)
    pub emitter: Option<SlotRef>,
    /// Slot it arrived on
    pub receiver: Option<SlotRef>,
}

#[derive(Debug, Clone)]
enum Emission {
    Front { kind: Option<SlotKind>, event: NotifyEvent },
    Back { kind: Option<SlotKind>, event: NotifyEvent },
    From { slot: SlotId, event: NotifyEvent },
}

/// Follow-up notifications a node asks for while treating a notification
/// or executing. They are dispatched once the node hook returns.
#[derive(Debug, Clone, Default)]
pub struct Outbox {
    emissions: Vec<Emission>,
}

impl Outbox {
    /// Emit from every linked output
    pub fn send_front(&mut self, event: NotifyEvent) {
        self.emissions.push(Emission::Front { kind: None, event });
    }

    /// Emit from every linked output of `kind`
    pub fn send_front_of_kind(&mut self, kind: SlotKind, event: NotifyEvent) {
        self.emissions.push(Emission::Front {
            kind: Some(kind),
            event,
        });
    }

    /// Emit from every linked input
    pub fn send_back(&mut self, event: NotifyEvent) {
        self.emissions.push(Emission::Back { kind: None, event });
    }

    /// Emit from every linked input of `kind`
    pub fn send_back_of_kind(&mut self, kind: SlotKind, event: NotifyEvent) {
        self.emissions.push(Emission::Back {
            kind: Some(kind),
            event,
        });
    }

    /// Emit from one slot of this node
    pub fn emit(&mut self, slot: SlotId, event: NotifyEvent) {
        self.emissions.push(Emission::From { slot, event });
    }

    /// Whether nothing was requested
    pub fn is_empty(&self) -> bool {
        self.emissions.is_empty()
    }

    /// Number of requested emissions
    pub fn len(&self) -> usize {
        self.emissions.len()
    }
}

#[derive(Debug)]
struct Message {
    event: NotifyEvent,
    emitter: SlotRef,
    receiver: Option<SlotRef>,
    depth: usize,
}

#[derive(Debug, Default)]
struct Propagation {
    queue: VecDeque<Message>,
    slots_seen: HashSet<(SlotRef, NotifyEvent, SlotRef)>,
    nodes_seen: HashSet<(NodeId, NotifyEvent, SlotRef)>,
}

impl Graph {
    /// Notify from `emitter`. With no `receiver`, every slot linked to the
    /// emitter receives it. Stale slots are skipped.
    pub fn notify(&mut self, event: NotifyEvent, emitter: SlotRef, receiver: Option<SlotRef>) {
        let mut pass = Propagation::default();
        pass.queue.push_back(Message {
            event,
            emitter,
            receiver,
            depth: 0,
        });
        self.propagate(pass);
    }

    /// Emit `event` from the linked outputs of a node, optionally only those
    /// of `kind`
    pub fn send_front_notification(&mut self, node: NodeId, kind: Option<SlotKind>, event: NotifyEvent) {
        let mut outbox = Outbox::default();
        outbox.emissions.push(Emission::Front { kind, event });
        self.dispatch_outbox(node, outbox);
    }

    /// Emit `event` from the linked inputs of a node, optionally only those
    /// of `kind`
    pub fn send_back_notification(&mut self, node: NodeId, kind: Option<SlotKind>, event: NotifyEvent) {
        let mut outbox = Outbox::default();
        outbox.emissions.push(Emission::Back { kind, event });
        self.dispatch_outbox(node, outbox);
    }

    /// Deliver an event to every node directly, without going through links
    pub fn broadcast(&mut self, event: NotifyEvent) {
        let ids: Vec<NodeId> = self.node_ids().collect();
        for id in ids {
            let mut outbox = Outbox::default();
            let notification = Notification {
                event,
                emitter: None,
                receiver: None,
            };
            if let Some(node) = self.node_mut(id) {
                node.behavior.treat_notification(&notification, &mut outbox);
            }
            self.dispatch_outbox(id, outbox);
        }
    }

    pub(crate) fn dispatch_outbox(&mut self, node: NodeId, outbox: Outbox) {
        if outbox.is_empty() {
            return;
        }
        let mut pass = Propagation::default();
        self.enqueue(node, outbox, 0, &mut pass);
        self.propagate(pass);
    }

    fn propagate(&mut self, mut pass: Propagation) {
        let max_depth = self.settings().max_propagation_depth;
        while let Some(message) = pass.queue.pop_front() {
            if message.depth > max_depth {
                tracing::warn!(
                    "dropping {:?} from {:?}: propagation deeper than {max_depth}",
                    message.event,
                    message.emitter
                );
                continue;
            }
            let receivers = match message.receiver {
                Some(receiver) => vec![receiver],
                None => self.linked_slots(message.emitter),
            };
            for receiver in receivers {
                self.deliver(&message, receiver, &mut pass);
            }
        }
    }

    fn deliver(&mut self, message: &Message, receiver: SlotRef, pass: &mut Propagation) {
        let Some(slot) = self.slot(receiver) else {
            tracing::trace!("stale receiver {receiver:?} for {:?}", message.event);
            return;
        };
        let direction = slot.direction;

        if direction == SlotDirection::Input
            && message.event.refreshes(&slot.kind)
            && pass.slots_seen.insert((receiver, message.event, message.emitter))
        {
            let payload = self.output_payload(message.emitter);
            if let Some(node) = self.node_mut(receiver.node) {
                node.bind_input(receiver.slot, payload);
            }
        }

        if !pass
            .nodes_seen
            .insert((receiver.node, message.event, message.emitter))
        {
            return;
        }

        let notification = Notification {
            event: message.event,
            emitter: Some(message.emitter),
            receiver: Some(receiver),
        };
        let mut outbox = Outbox::default();
        if let Some(node) = self.node_mut(receiver.node) {
            node.behavior.treat_notification(&notification, &mut outbox);
        }
        if message.event.is_global() {
            match direction {
                SlotDirection::Input => outbox.send_front(message.event),
                SlotDirection::Output => outbox.send_back(message.event),
            }
        }
        self.enqueue(receiver.node, outbox, message.depth + 1, pass);
    }

    fn enqueue(&self, node_id: NodeId, outbox: Outbox, depth: usize, pass: &mut Propagation) {
        let Some(node) = self.node(node_id) else {
            return;
        };
        for emission in outbox.emissions {
            let (slots, event) = match emission {
                Emission::Front { kind, event } => (
                    node.outputs()
                        .iter()
                        .filter(|s| kind.as_ref().map_or(true, |k| *k == s.kind))
                        .collect::<Vec<_>>(),
                    event,
                ),
                Emission::Back { kind, event } => (
                    node.inputs()
                        .iter()
                        .filter(|s| kind.as_ref().map_or(true, |k| *k == s.kind))
                        .collect::<Vec<_>>(),
                    event,
                ),
                Emission::From { slot, event } => (node.slot(slot).into_iter().collect(), event),
            };
            for slot in slots.into_iter().filter(|s| s.is_connected()) {
                pass.queue.push_back(Message {
                    event,
                    emitter: slot.slot_ref(),
                    receiver: None,
                    depth,
                });
            }
        }
    }
}
