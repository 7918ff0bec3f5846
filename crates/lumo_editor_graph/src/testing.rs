// SPDX-License-Identifier: MIT OR Apache-2.0
//! Test behaviors shared by the unit tests.

use crate::behavior::{
    Capability, ExecuteContext, NodeBehavior, OutputProvider, Payload, Task, TextureInfo,
};
use crate::graph::Graph;
use crate::node::{Node, NodeCategory, NodeId, NodeType};
use crate::notify::{Notification, Outbox};
use crate::slot::{Slot, SlotKind};
use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Shared log of delivered notifications
#[derive(Debug, Clone, Default)]
pub(crate) struct Journal {
    entries: Rc<RefCell<Vec<Notification>>>,
}

impl Journal {
    pub(crate) fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Notifications that arrived on a slot of `node`
    pub(crate) fn received_by(&self, node: NodeId) -> Vec<Notification> {
        self.entries
            .borrow()
            .iter()
            .filter(|n| n.receiver.is_some_and(|r| r.node == node))
            .cloned()
            .collect()
    }

    pub(crate) fn all(&self) -> Vec<Notification> {
        self.entries.borrow().clone()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

/// Behavior that only writes what it receives to a journal
#[derive(Debug, Default)]
pub(crate) struct Recorder {
    journal: Journal,
}

impl Recorder {
    pub(crate) fn new(journal: &Journal) -> Self {
        Self {
            journal: journal.clone(),
        }
    }
}

impl NodeBehavior for Recorder {
    fn treat_notification(&mut self, notification: &Notification, _outbox: &mut Outbox) {
        self.journal.entries.borrow_mut().push(notification.clone());
    }
}

pub(crate) fn recorder_type() -> NodeType {
    NodeType {
        id: "RECORDER".to_string(),
        name: "Recorder".to_string(),
        category: NodeCategory::Misc,
        description: String::new(),
        inputs: vec![
            Slot::input("Input", SlotKind::Texture2D),
            Slot::input("Feedback", SlotKind::Texture2D),
            Slot::input("Model", SlotKind::Model),
        ],
        outputs: vec![Slot::output("Output", SlotKind::Texture2D)],
    }
}

pub(crate) fn add_recorder(graph: &mut Graph, journal: &Journal) -> NodeId {
    graph.add_node(Node::new(&recorder_type(), Box::new(Recorder::new(journal))))
}

/// Counters observed by a [`Counter`]
#[derive(Debug, Clone, Default)]
pub(crate) struct CounterStats {
    pub(crate) runs: Rc<Cell<u32>>,
    pub(crate) inputs_seen: Rc<Cell<usize>>,
}

/// Task that counts its executions and always produces a texture
#[derive(Debug, Default)]
pub(crate) struct Counter {
    stats: CounterStats,
}

impl Task for Counter {
    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> bool {
        self.stats.runs.set(self.stats.runs.get() + 1);
        self.stats.inputs_seen.set(ctx.inputs().len());
        ctx.record("counter");
        true
    }
}

impl OutputProvider for Counter {
    fn output(&self, _slot: &Slot) -> Option<Payload> {
        Some(Payload::Texture(TextureInfo {
            handle: 7,
            size: [4, 4],
        }))
    }
}

impl NodeBehavior for Counter {
    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Task, Capability::OutputProvider]
    }

    fn as_task_mut(&mut self) -> Option<&mut dyn Task> {
        Some(self)
    }

    fn as_output(&self) -> Option<&dyn OutputProvider> {
        Some(self)
    }
}

pub(crate) fn add_counter(graph: &mut Graph) -> (NodeId, CounterStats) {
    let counter = Counter::default();
    let stats = counter.stats.clone();
    let ty = NodeType {
        id: "COUNTER".to_string(),
        ..recorder_type()
    };
    (graph.add_node(Node::new(&ty, Box::new(counter))), stats)
}
