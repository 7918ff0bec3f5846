// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node behaviors and the capability traits they can implement.
//!
//! A node's data (slots, position, frame bookkeeping) lives in
//! [`Node`](crate::Node); what the node *does* lives behind
//! [`NodeBehavior`]. Capabilities are independent traits, queried through
//! the `as_*` accessors instead of downcasting:
//!
//! - [`Task`]: executes once per frame
//! - [`OutputProvider`]: hands out payloads for output slots
//! - [`InputConsumer`]: receives payloads bound to input slots
//! - [`Resizable`], [`CameraDriven`], [`GizmoDriven`]: react to host services

use crate::frame::CommandRecorder;
use crate::node::NodeParams;
use crate::notify::{Notification, Outbox};
use crate::scene::{
    SceneLight, SceneLightGroup, SceneModel, SceneShaderPassGroup, SceneVariable,
};
use crate::slot::{Slot, SlotId, SlotKind, SlotRef};
use std::rc::Weak;

/// Capability tags a node type declares
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Executes every frame
    Task,
    /// Renders into its own target
    Renderer,
    /// Provides output payloads
    OutputProvider,
    /// Consumes input payloads
    InputConsumer,
    /// Follows the viewport size
    Resizable,
    /// Follows the host camera
    CameraDriven,
    /// Follows the host gizmo
    GizmoDriven,
}

/// Opaque GPU texture descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextureInfo {
    /// Backend handle
    pub handle: u64,
    /// Size in pixels
    pub size: [u32; 2],
}

/// Opaque GPU buffer descriptor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferInfo {
    /// Backend handle
    pub handle: u64,
    /// Size in bytes
    pub size: u64,
}

/// Data handed across a link.
///
/// Scene resources travel as `Weak` handles: the producing node keeps
/// ownership, consumers must check liveness before use.
#[derive(Debug, Clone)]
pub enum Payload {
    /// 2D/3D/cube texture
    Texture(TextureInfo),
    /// Ordered textures
    TextureGroup(Vec<TextureInfo>),
    /// Model
    Model(Weak<SceneModel>),
    /// Single light
    Light(Weak<SceneLight>),
    /// Light group
    LightGroup(Weak<SceneLightGroup>),
    /// Shader pass chain
    ShaderPasses(Weak<SceneShaderPassGroup>),
    /// Widget variable
    Variable(Weak<SceneVariable>),
    /// Texel, storage or acceleration buffer
    Buffer(BufferInfo),
}

impl Payload {
    /// Texture descriptor, if this is a texture
    pub fn as_texture(&self) -> Option<&TextureInfo> {
        match self {
            Self::Texture(info) => Some(info),
            _ => None,
        }
    }

    /// Whether this payload can travel through a slot of `kind`
    pub fn fits(&self, kind: &SlotKind) -> bool {
        match self {
            Self::Texture(_) => matches!(
                kind,
                SlotKind::Texture2D | SlotKind::Texture3D | SlotKind::TextureCube
            ),
            Self::TextureGroup(_) => *kind == SlotKind::TextureGroup,
            Self::Model(_) => *kind == SlotKind::Model,
            Self::Light(_) => *kind == SlotKind::Light,
            Self::LightGroup(_) => *kind == SlotKind::LightGroup,
            Self::ShaderPasses(_) => *kind == SlotKind::Task,
            Self::Variable(_) => matches!(kind, SlotKind::Variable(_)),
            Self::Buffer(_) => matches!(
                kind,
                SlotKind::TexelBuffer | SlotKind::StorageBuffer | SlotKind::AccelStructure
            ),
        }
    }
}

/// Host camera snapshot
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// View matrix (column major)
    pub view: [[f32; 4]; 4],
    /// Projection matrix (column major)
    pub projection: [[f32; 4]; 4],
}

impl Default for CameraState {
    fn default() -> Self {
        let identity = [
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];
        Self {
            view: identity,
            projection: identity,
        }
    }
}

/// One input value pulled through a link for execution
#[derive(Debug, Clone)]
pub struct InputValue {
    /// Receiving slot
    pub slot: SlotId,
    /// Receiving slot name
    pub name: String,
    /// Upstream payload
    pub payload: Payload,
}

/// Everything a [`Task`] sees while executing
pub struct ExecuteContext<'a> {
    /// Logical frame being executed
    pub frame: u32,
    /// Host command sink
    pub recorder: &'a mut dyn CommandRecorder,
    /// Follow-up notifications requested by the node
    pub outbox: Outbox,
    inputs: Vec<InputValue>,
}

impl<'a> ExecuteContext<'a> {
    /// Create a context for one node execution
    pub fn new(frame: u32, inputs: Vec<InputValue>, recorder: &'a mut dyn CommandRecorder) -> Self {
        Self {
            frame,
            recorder,
            outbox: Outbox::default(),
            inputs,
        }
    }

    /// First payload connected to the named input
    pub fn input(&self, name: &str) -> Option<&Payload> {
        self.inputs.iter().find(|i| i.name == name).map(|i| &i.payload)
    }

    /// Every payload connected to the named input (many-input slots)
    pub fn inputs_named<'s>(&'s self, name: &'s str) -> impl Iterator<Item = &'s Payload> + 's {
        self.inputs.iter().filter(move |i| i.name == name).map(|i| &i.payload)
    }

    /// All pulled inputs
    pub fn inputs(&self) -> &[InputValue] {
        &self.inputs
    }

    /// Record a command through the host recorder
    pub fn record(&mut self, label: &str) {
        self.recorder.record(label);
    }

    pub(crate) fn into_outbox(self) -> Outbox {
        self.outbox
    }
}

/// A node that executes once per frame
pub trait Task {
    /// Run this frame's work. Returns whether new output was produced.
    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> bool;
}

/// A node that exposes payloads on its output slots
pub trait OutputProvider {
    /// Payload currently available on `slot`
    fn output(&self, slot: &Slot) -> Option<Payload>;
}

/// A node that caches payloads bound to its input slots
pub trait InputConsumer {
    /// Bind (or unbind with `None`) the payload of an input slot
    fn bind_input(&mut self, slot: &Slot, payload: Option<Payload>);
}

/// A node whose targets follow the viewport size
pub trait Resizable {
    /// Resize to `size`. Returns whether the outputs changed.
    fn need_resize(&mut self, size: [u32; 2]) -> bool;
}

/// A node driven by the host camera
pub trait CameraDriven {
    /// Camera moved. Returns whether the node needs to re-render.
    fn camera_updated(&mut self, camera: &CameraState) -> bool;
}

/// A node driven by the host gizmo
pub trait GizmoDriven {
    /// Gizmo transform changed. Returns whether the node needs to re-render.
    fn gizmo_moved(&mut self, transform: &[[f32; 4]; 4]) -> bool;
}

/// Behavior behind a node.
///
/// Every hook has a no-op default, so a plugin node only overrides what
/// it needs.
pub trait NodeBehavior {
    /// Capabilities this node type implements
    fn capabilities(&self) -> &'static [Capability] {
        &[]
    }

    /// A notification reached one of this node's slots. Follow-up
    /// notifications go into `outbox`.
    fn treat_notification(&mut self, _notification: &Notification, _outbox: &mut Outbox) {}

    /// `own` was just linked to `other`
    fn on_connect(&mut self, _own: &Slot, _other: SlotRef) {}

    /// `own` was just unlinked from `other`
    fn on_disconnect(&mut self, _own: &Slot, _other: SlotRef) {}

    /// Whether an output of this node may feed one of its own inputs
    fn allows_feedback(&self) -> bool {
        false
    }

    /// Write persisted parameters
    fn save_params(&self, _params: &mut NodeParams) {}

    /// Read persisted parameters. Returns `false` when they are unusable.
    fn load_params(&mut self, _params: &NodeParams) -> bool {
        true
    }

    /// Task capability
    fn as_task_mut(&mut self) -> Option<&mut dyn Task> {
        None
    }

    /// Output capability
    fn as_output(&self) -> Option<&dyn OutputProvider> {
        None
    }

    /// Input capability
    fn as_input_mut(&mut self) -> Option<&mut dyn InputConsumer> {
        None
    }

    /// Resize capability
    fn as_resizable_mut(&mut self) -> Option<&mut dyn Resizable> {
        None
    }

    /// Camera capability
    fn as_camera_driven_mut(&mut self) -> Option<&mut dyn CameraDriven> {
        None
    }

    /// Gizmo capability
    fn as_gizmo_driven_mut(&mut self) -> Option<&mut dyn GizmoDriven> {
        None
    }
}
