// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node graph core for the Lumo real-time VFX editor.
//!
//! This crate provides the data model and runtime behind a Lumo graph:
//! - Typed slots and the links between them
//! - A notification bus between linked slots
//! - Per-frame execution gating and scheduling
//! - Deferred frame actions
//! - Scene containers shared between nodes
//! - Persistence and the plugin boundary
//!
//! ## Architecture
//!
//! A [`Graph`] owns its nodes and links; a [`Node`] owns its slots. Every
//! other reference is a non-owning handle ([`NodeId`], [`SlotRef`], `Weak`)
//! resolved with a liveness check:
//! - Node behaviors are trait objects composed of capabilities
//! - Notifications are messages dispatched breadth-first with visited sets
//! - Rendering is left to the host through [`CommandRecorder`]

pub mod actions;
pub mod behavior;
pub mod document;
pub mod frame;
pub mod graph;
pub mod link;
pub mod node;
pub mod nodes;
pub mod notify;
pub mod plugin;
pub mod scene;
pub mod settings;
pub mod slot;

#[cfg(test)]
mod testing;

pub use actions::FrameActionQueue;
pub use behavior::{
    CameraDriven, CameraState, Capability, ExecuteContext, GizmoDriven, InputConsumer, InputValue,
    NodeBehavior, OutputProvider, Payload, Resizable, Task, TextureInfo,
};
pub use document::{DocumentError, GraphDocument, LoadIssue};
pub use frame::{CommandLog, CommandRecorder, FrameGate, FrameReport, NullRecorder};
pub use graph::{ConnectionError, CycleError, Graph};
pub use link::{Link, LinkId};
pub use node::{Node, NodeCategory, NodeId, NodeParams, NodeRegistry, NodeType};
pub use nodes::create_core_registry;
pub use notify::{Notification, NotifyEvent, Outbox};
pub use plugin::{NodePlugin, PluginAllocator, PluginManager};
pub use settings::GraphSettings;
pub use slot::{Slot, SlotDirection, SlotId, SlotKind, SlotRef};
