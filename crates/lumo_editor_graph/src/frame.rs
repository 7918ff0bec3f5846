// SPDX-License-Identifier: MIT OR Apache-2.0
//! Frame execution: per-node frame gates and the frame scheduler.

use crate::behavior::{ExecuteContext, InputValue};
use crate::graph::Graph;
use crate::node::NodeId;
use crate::notify::NotifyEvent;
use std::collections::{HashSet, VecDeque};

/// Records which logical frame a node or pass last executed in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameGate {
    last_executed_frame: Option<u32>,
}

impl FrameGate {
    /// Frame of the last execution, `None` before the first one
    pub fn last_executed_frame(&self) -> Option<u32> {
        self.last_executed_frame
    }

    /// Whether the work for `frame` is already done
    pub fn executed_in(&self, frame: u32) -> bool {
        self.last_executed_frame == Some(frame)
    }

    /// Record an execution for `frame`
    pub fn mark(&mut self, frame: u32) {
        self.last_executed_frame = Some(frame);
    }
}

/// Sink for the commands nodes record while executing.
///
/// The rendering backend lives outside this crate; the host hands one of
/// these to [`Graph::execute_frame`].
pub trait CommandRecorder {
    /// Record one command
    fn record(&mut self, label: &str);
}

/// Recorder that drops every command
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRecorder;

impl CommandRecorder for NullRecorder {
    fn record(&mut self, _label: &str) {}
}

/// Recorder that keeps command labels in order
#[derive(Debug, Clone, Default)]
pub struct CommandLog {
    commands: Vec<String>,
}

impl CommandLog {
    /// Recorded commands
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// Forget recorded commands
    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl CommandRecorder for CommandLog {
    fn record(&mut self, label: &str) {
        self.commands.push(label.to_string());
    }
}

/// Outcome of one [`Graph::execute_frame`] call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameReport {
    /// Frame executed
    pub frame: u32,
    /// Task nodes that ran, in execution order
    pub executed: Vec<NodeId>,
    /// Task nodes that reported new output
    pub produced: Vec<NodeId>,
    /// Task nodes skipped because they already ran this frame
    pub skipped: usize,
}

impl FrameReport {
    /// Empty report for `frame`
    pub fn new(frame: u32) -> Self {
        Self {
            frame,
            ..Self::default()
        }
    }

    /// Fold a child graph's report into this one
    pub fn merge(&mut self, other: FrameReport) {
        self.executed.extend(other.executed);
        self.produced.extend(other.produced);
        self.skipped += other.skipped;
    }
}

impl Graph {
    /// Whether the work of `frame` is already done for this node: the node
    /// itself, or any node transitively upstream of it, executed in
    /// `frame`. Does not modify any gate.
    pub fn is_the_good_frame(&self, node_id: NodeId, frame: u32) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([node_id]);
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id) {
                continue;
            }
            let Some(node) = self.node(id) else {
                continue;
            };
            if node.gate.executed_in(frame) {
                return true;
            }
            queue.extend(self.upstream_nodes(id));
        }
        false
    }

    /// Execute one logical frame.
    ///
    /// Child graphs run first, then every task node in dependency order,
    /// each at most once per frame. A node that reports new output sends
    /// [`NotifyEvent::NewFrameAvailable`] from its linked outputs.
    pub fn execute_frame(&mut self, frame: u32, recorder: &mut dyn CommandRecorder) -> FrameReport {
        let mut report = FrameReport::new(frame);
        let order = self.execution_order();

        for id in &order {
            let Some(mut child) = self.node_mut(*id).and_then(|n| n.take_child_graph()) else {
                continue;
            };
            report.merge(child.execute_frame(frame, recorder));
            if let Some(node) = self.node_mut(*id) {
                node.set_child_graph(Some(child));
            }
        }

        for id in order {
            let Some(node) = self.node(id) else {
                continue;
            };
            if node.gate.executed_in(frame) {
                report.skipped += 1;
                continue;
            }
            let inputs = self.pull_inputs(id);

            let Some(node) = self.node_mut(id) else {
                continue;
            };
            let Some(task) = node.behavior.as_task_mut() else {
                continue;
            };
            let mut ctx = ExecuteContext::new(frame, inputs, &mut *recorder);
            let produced = task.execute(&mut ctx);
            let outbox = ctx.into_outbox();
            node.gate.mark(frame);

            tracing::trace!("graph({}) executed {id:?} for frame {frame}", self.name);
            report.executed.push(id);
            self.dispatch_outbox(id, outbox);
            if produced {
                report.produced.push(id);
                self.send_front_notification(id, None, NotifyEvent::NewFrameAvailable);
            }
        }

        report
    }

    /// Payloads currently reaching a node's inputs. Many-input slots yield
    /// one value per link.
    fn pull_inputs(&self, node_id: NodeId) -> Vec<InputValue> {
        let Some(node) = self.node(node_id) else {
            return Vec::new();
        };
        let mut values = Vec::new();
        for slot in node.inputs() {
            let upstream: Vec<_> = if slot.accept_many_inputs {
                slot.links()
                    .iter()
                    .filter_map(|id| self.link(*id))
                    .map(|l| l.output)
                    .collect()
            } else {
                self.resolve_upstream(slot.slot_ref()).into_iter().collect()
            };
            values.extend(upstream.into_iter().filter_map(|out| {
                let payload = self.output_payload(out)?;
                Some(InputValue {
                    slot: slot.id,
                    name: slot.name.clone(),
                    payload,
                })
            }));
        }
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Node;
    use crate::slot::SlotDirection;
    use crate::testing::{add_counter, add_recorder, recorder_type, Journal, Recorder};

    fn link(graph: &mut Graph, from: NodeId, to: NodeId) {
        let out = graph.find_slot(from, "Output", SlotDirection::Output).unwrap();
        let input = graph.find_slot(to, "Input", SlotDirection::Input).unwrap();
        graph.connect(out, input).unwrap();
    }

    #[test]
    fn test_fresh_gate_matches_no_frame() {
        let mut gate = FrameGate::default();
        assert!(!gate.executed_in(0));
        gate.mark(0);
        assert!(gate.executed_in(0));
        assert!(!gate.executed_in(1));
        assert_eq!(gate.last_executed_frame(), Some(0));
    }

    #[test]
    fn test_tasks_run_once_per_frame() {
        let mut graph = Graph::new("frames");
        let (a, runs_a) = add_counter(&mut graph);
        let (b, runs_b) = add_counter(&mut graph);
        link(&mut graph, a, b);
        let mut log = CommandLog::default();

        let report = graph.execute_frame(1, &mut log);
        assert_eq!(report.executed, vec![a, b]);
        assert_eq!(runs_a.runs.get(), 1);
        assert_eq!(runs_b.runs.get(), 1);
        // b pulled a's texture through the link
        assert_eq!(runs_b.inputs_seen.get(), 1);
        assert_eq!(runs_a.inputs_seen.get(), 0);
        assert_eq!(log.commands().len(), 2);

        let again = graph.execute_frame(1, &mut log);
        assert!(again.executed.is_empty());
        assert_eq!(again.skipped, 2);
        assert_eq!(runs_a.runs.get(), 1);

        graph.execute_frame(2, &mut NullRecorder);
        assert_eq!(runs_a.runs.get(), 2);
        assert_eq!(graph.node(b).unwrap().last_executed_frame(), Some(2));
    }

    #[test]
    fn test_is_the_good_frame_is_idempotent() {
        let mut graph = Graph::new("gate");
        let (a, _) = add_counter(&mut graph);
        let (b, _) = add_counter(&mut graph);
        let (c, _) = add_counter(&mut graph);
        link(&mut graph, a, b);
        link(&mut graph, b, c);
        graph.node_mut(a).unwrap().gate.mark(5);

        assert!(graph.is_the_good_frame(c, 5));
        assert!(graph.is_the_good_frame(c, 5));
        assert!(!graph.is_the_good_frame(c, 6));
        assert!(!graph.is_the_good_frame(a, 6));
        assert_eq!(graph.node(c).unwrap().last_executed_frame(), None);
        assert_eq!(graph.node(a).unwrap().last_executed_frame(), Some(5));
    }

    #[test]
    fn test_is_the_good_frame_survives_feedback() {
        let mut graph = Graph::new("loop");
        let (a, _) = add_counter(&mut graph);
        let (b, _) = add_counter(&mut graph);
        link(&mut graph, a, b);
        let out = graph.find_slot(b, "Output", SlotDirection::Output).unwrap();
        let back = graph.find_slot(a, "Feedback", SlotDirection::Input).unwrap();
        graph.connect(out, back).unwrap();

        assert!(!graph.is_the_good_frame(b, 3));
        graph.execute_frame(3, &mut NullRecorder);
        assert!(graph.is_the_good_frame(b, 3));
    }

    #[test]
    fn test_production_notifies_downstream() {
        let mut graph = Graph::new("notify");
        let journal = Journal::default();
        let (counter, _) = add_counter(&mut graph);
        let sink = add_recorder(&mut graph, &journal);
        link(&mut graph, counter, sink);
        journal.clear();

        let report = graph.execute_frame(0, &mut NullRecorder);

        assert_eq!(report.produced, vec![counter]);
        let received = journal.received_by(sink);
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].event, NotifyEvent::NewFrameAvailable);
    }

    #[test]
    fn test_child_graphs_run_first() {
        let mut child = Graph::new("child");
        let (inner, inner_runs) = add_counter(&mut child);

        let mut graph = Graph::new("parent");
        let (outer, _) = add_counter(&mut graph);
        let host = Node::new(&recorder_type(), Box::new(Recorder::default())).with_child_graph(child);
        let host = graph.add_node(host);

        let report = graph.execute_frame(4, &mut NullRecorder);
        assert_eq!(report.executed, vec![inner, outer]);
        assert_eq!(inner_runs.runs.get(), 1);
        let child = graph.node(host).unwrap().child_graph().unwrap();
        assert_eq!(child.node(inner).unwrap().last_executed_frame(), Some(4));
    }
}
