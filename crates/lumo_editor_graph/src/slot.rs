// SPDX-License-Identifier: MIT OR Apache-2.0
//! Slot definitions for node inputs/outputs.

use crate::link::LinkId;
use crate::node::NodeId;
use crate::scene::VariableType;
use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotId(pub Uuid);

impl SlotId {
    /// Create a new random slot ID
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SlotId {
    fn default() -> Self {
        Self::new()
    }
}

/// Non-owning handle to a slot: the owning node plus the slot itself.
///
/// Resolving it always goes through the [`Graph`](crate::Graph); a handle
/// whose node or slot is gone is stale and resolves to `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    /// Owning node
    pub node: NodeId,
    /// Slot on that node
    pub slot: SlotId,
}

impl SlotRef {
    /// Create a new slot reference
    pub fn new(node: NodeId, slot: SlotId) -> Self {
        Self { node, slot }
    }
}

/// Slot direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SlotDirection {
    /// Input slot
    Input,
    /// Output slot
    Output,
}

impl SlotDirection {
    /// The opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

/// Kind of data that flows through a slot
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum SlotKind {
    /// 2D texture
    Texture2D,
    /// 3D texture
    Texture3D,
    /// Cube map
    TextureCube,
    /// Ordered group of 2D textures
    TextureGroup,
    /// Model (mesh collection)
    Model,
    /// Single light
    Light,
    /// Light group
    LightGroup,
    /// Shader pass chain
    Task,
    /// Typed widget variable
    Variable(VariableType),
    /// Texel buffer
    TexelBuffer,
    /// Storage buffer
    StorageBuffer,
    /// Ray tracing acceleration structure
    AccelStructure,
    /// Plugin-defined kind
    Custom(String),
}

impl SlotKind {
    /// Stable tag used in project files
    pub fn as_str(&self) -> &str {
        match self {
            Self::Texture2D => "TEXTURE_2D",
            Self::Texture3D => "TEXTURE_3D",
            Self::TextureCube => "TEXTURE_CUBE",
            Self::TextureGroup => "TEXTURE_2D_GROUP",
            Self::Model => "MESH",
            Self::Light => "LIGHT",
            Self::LightGroup => "LIGHT_GROUP",
            Self::Task => "TASK",
            Self::Variable(ty) => ty.as_str(),
            Self::TexelBuffer => "TEXEL_BUFFER",
            Self::StorageBuffer => "STORAGE_BUFFER",
            Self::AccelStructure => "RTX_ACCEL_STRUCTURE",
            Self::Custom(tag) => tag,
        }
    }

    /// Parse a tag; unknown tags become [`SlotKind::Custom`]
    pub fn parse(tag: &str) -> Self {
        match tag {
            "TEXTURE_2D" => Self::Texture2D,
            "TEXTURE_3D" => Self::Texture3D,
            "TEXTURE_CUBE" => Self::TextureCube,
            "TEXTURE_2D_GROUP" => Self::TextureGroup,
            "MESH" => Self::Model,
            "LIGHT" => Self::Light,
            "LIGHT_GROUP" => Self::LightGroup,
            "TASK" => Self::Task,
            "TEXEL_BUFFER" => Self::TexelBuffer,
            "STORAGE_BUFFER" => Self::StorageBuffer,
            "RTX_ACCEL_STRUCTURE" => Self::AccelStructure,
            other => match VariableType::parse(other) {
                Some(ty) => Self::Variable(ty),
                None => Self::Custom(other.to_string()),
            },
        }
    }

    /// Two slots can be linked only when their kinds match exactly
    pub fn is_compatible(&self, other: &SlotKind) -> bool {
        self == other
    }

    /// Get the color for this kind (for UI)
    pub fn color(&self) -> [u8; 4] {
        match self {
            Self::Texture2D => [230, 128, 25, 255],
            Self::Texture3D => [230, 204, 76, 255],
            Self::TextureCube => [204, 153, 51, 255],
            Self::TextureGroup => [51, 230, 51, 255],
            Self::Model => [128, 128, 230, 255],
            Self::Light | Self::LightGroup => [230, 230, 25, 255],
            Self::Task => [255, 255, 255, 255],
            Self::Variable(_) => [204, 178, 153, 255],
            Self::TexelBuffer | Self::StorageBuffer => [153, 76, 204, 255],
            Self::AccelStructure => [76, 178, 204, 255],
            Self::Custom(_) => [204, 204, 0, 255],
        }
    }
}

impl fmt::Display for SlotKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<SlotKind> for String {
    fn from(kind: SlotKind) -> Self {
        kind.as_str().to_string()
    }
}

impl From<String> for SlotKind {
    fn from(tag: String) -> Self {
        SlotKind::parse(&tag)
    }
}

/// A slot on a node
#[derive(Debug, Clone)]
pub struct Slot {
    /// Unique slot ID
    pub id: SlotId,
    /// Owning node (set when the node is built)
    pub node: NodeId,
    /// Slot name, unique per direction within a node
    pub name: String,
    /// Slot direction
    pub direction: SlotDirection,
    /// Data kind
    pub kind: SlotKind,
    /// Ordinal of the slot within its direction, used to match persisted slots
    pub index: u32,
    /// Descriptor binding point on the owning node
    pub binding: u32,
    /// Present but not drawn
    pub hidden: bool,
    /// Name not drawn next to the slot
    pub hide_name: bool,
    /// Draw an inline widget
    pub show_widget: bool,
    /// Input accepts more than one upstream link
    pub accept_many_inputs: bool,
    pub(crate) links: Vec<LinkId>,
    pub(crate) upstream: Cell<Option<SlotRef>>,
}

impl Slot {
    /// Create a new slot
    pub fn new(name: impl Into<String>, kind: SlotKind, direction: SlotDirection) -> Self {
        Self {
            id: SlotId::new(),
            node: NodeId::nil(),
            name: name.into(),
            direction,
            kind,
            index: 0,
            binding: 0,
            hidden: false,
            hide_name: false,
            show_widget: false,
            accept_many_inputs: false,
            links: Vec::new(),
            upstream: Cell::new(None),
        }
    }

    /// Create a new input slot
    pub fn input(name: impl Into<String>, kind: SlotKind) -> Self {
        Self::new(name, kind, SlotDirection::Input)
    }

    /// Create a new output slot
    pub fn output(name: impl Into<String>, kind: SlotKind) -> Self {
        Self::new(name, kind, SlotDirection::Output)
    }

    /// Set the descriptor binding
    pub fn with_binding(mut self, binding: u32) -> Self {
        self.binding = binding;
        self
    }

    /// Allow several upstream links on this input
    pub fn many_inputs(mut self) -> Self {
        self.accept_many_inputs = true;
        self
    }

    /// Hide the slot name in the editor
    pub fn hide_name(mut self) -> Self {
        self.hide_name = true;
        self
    }

    /// Handle to this slot
    pub fn slot_ref(&self) -> SlotRef {
        SlotRef::new(self.node, self.id)
    }

    /// Whether this is an input slot
    pub fn is_input(&self) -> bool {
        self.direction == SlotDirection::Input
    }

    /// Whether this is an output slot
    pub fn is_output(&self) -> bool {
        self.direction == SlotDirection::Output
    }

    /// Whether at least one link is attached
    pub fn is_connected(&self) -> bool {
        !self.links.is_empty()
    }

    /// Links attached to this slot
    pub fn links(&self) -> &[LinkId] {
        &self.links
    }

    /// Whether a new link to this slot would break the single-link input rule
    pub fn is_busy(&self) -> bool {
        self.is_input() && !self.accept_many_inputs && !self.links.is_empty()
    }

    /// Check if a link to another slot is valid, ignoring occupancy
    pub fn can_connect(&self, other: &Slot) -> bool {
        self.direction != other.direction && self.kind.is_compatible(&other.kind)
    }

    /// A fresh copy of a template slot: new id, no links, no cached upstream.
    pub(crate) fn instantiate(&self, node: NodeId) -> Self {
        let mut slot = self.clone();
        slot.id = SlotId::new();
        slot.node = node;
        slot.links.clear();
        slot.upstream.set(None);
        slot
    }

    pub(crate) fn invalidate_upstream(&self) {
        self.upstream.set(None);
    }
}
