// SPDX-License-Identifier: MIT OR Apache-2.0
//! 3D viewport output.

use crate::behavior::{
    CameraDriven, CameraState, Capability, ExecuteContext, InputConsumer, NodeBehavior, Payload,
    Task, TextureInfo,
};
use crate::node::{NodeCategory, NodeType};
use crate::slot::{Slot, SlotKind};

/// Type id
pub const OUTPUT_3D: &str = "OUTPUT_3D";

/// Node type definition
pub fn node_type() -> NodeType {
    NodeType {
        id: OUTPUT_3D.to_string(),
        name: "Output 3D".to_string(),
        category: NodeCategory::Output,
        description: "Presents a texture in the 3D viewport".to_string(),
        inputs: vec![Slot::input("Input", SlotKind::Texture2D)],
        outputs: vec![],
    }
}

/// Sink presenting its input
#[derive(Debug, Default)]
pub struct Output3DNode {
    texture: Option<TextureInfo>,
    camera: CameraState,
    presented: u64,
}

impl Output3DNode {
    /// Texture currently bound
    pub fn texture(&self) -> Option<TextureInfo> {
        self.texture
    }

    /// Number of presented frames
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl Task for Output3DNode {
    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> bool {
        let Some(texture) = ctx.input("Input").and_then(Payload::as_texture).copied() else {
            return false;
        };
        ctx.record(&format!("present {}x{}", texture.size[0], texture.size[1]));
        self.presented += 1;
        // Nothing downstream of a sink
        false
    }
}

impl InputConsumer for Output3DNode {
    fn bind_input(&mut self, _slot: &Slot, payload: Option<Payload>) {
        self.texture = payload.as_ref().and_then(Payload::as_texture).copied();
    }
}

impl CameraDriven for Output3DNode {
    fn camera_updated(&mut self, camera: &CameraState) -> bool {
        if self.camera == *camera {
            return false;
        }
        self.camera = *camera;
        true
    }
}

impl NodeBehavior for Output3DNode {
    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::Task, Capability::InputConsumer, Capability::CameraDriven]
    }

    fn as_task_mut(&mut self) -> Option<&mut dyn Task> {
        Some(self)
    }

    fn as_input_mut(&mut self) -> Option<&mut dyn InputConsumer> {
        Some(self)
    }

    fn as_camera_driven_mut(&mut self) -> Option<&mut dyn CameraDriven> {
        Some(self)
    }
}
