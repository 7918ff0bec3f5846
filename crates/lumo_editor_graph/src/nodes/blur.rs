// SPDX-License-Identifier: MIT OR Apache-2.0
//! Two-pass separable blur.

use super::next_handle;
use crate::behavior::{
    Capability, ExecuteContext, InputConsumer, NodeBehavior, OutputProvider, Payload, Task,
    TextureInfo,
};
use crate::node::{NodeCategory, NodeParams, NodeType};
use crate::notify::{Notification, NotifyEvent, Outbox};
use crate::scene::{SceneShaderPassGroup, ShaderPass};
use crate::slot::{Slot, SlotKind};
use std::rc::Rc;

/// Type id
pub const BLUR: &str = "BLUR";

/// Node type definition
pub fn node_type() -> NodeType {
    NodeType {
        id: BLUR.to_string(),
        name: "Blur".to_string(),
        category: NodeCategory::PostPro,
        description: "Separable blur, horizontal then vertical".to_string(),
        inputs: vec![Slot::input("Input", SlotKind::Texture2D)],
        outputs: vec![
            Slot::output("Output", SlotKind::Texture2D),
            Slot::output("Passes", SlotKind::Task),
        ],
    }
}

/// Blur node: its target follows the input size
#[derive(Debug)]
pub struct BlurNode {
    radius: u32,
    input: Option<TextureInfo>,
    target: Option<TextureInfo>,
    target_changed: bool,
    passes: Vec<Rc<ShaderPass>>,
    group: Rc<SceneShaderPassGroup>,
}

impl Default for BlurNode {
    fn default() -> Self {
        let horizontal = ShaderPass::create("blur horizontal");
        let vertical = ShaderPass::create("blur vertical");
        vertical.depends_on(&horizontal);
        let group = SceneShaderPassGroup::create();
        group.add(&horizontal);
        group.add(&vertical);
        Self {
            radius: 4,
            input: None,
            target: None,
            target_changed: false,
            passes: vec![horizontal, vertical],
            group,
        }
    }
}

impl BlurNode {
    /// Current target
    pub fn target(&self) -> Option<TextureInfo> {
        self.target
    }

    fn match_input_size(&mut self) {
        let size = self.input.map(|t| t.size);
        if self.target.map(|t| t.size) == size {
            return;
        }
        self.target = size.map(|size| TextureInfo {
            handle: next_handle(),
            size,
        });
        self.target_changed = true;
    }
}

impl Task for BlurNode {
    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> bool {
        if self.input.is_none() || self.target.is_none() {
            return false;
        }
        let mut ran = false;
        for pass in &self.passes {
            if pass.last_executed_frame() == Some(ctx.frame) {
                continue;
            }
            ctx.record(&format!("{} r={}", pass.name, self.radius));
            pass.set_last_executed_frame(ctx.frame);
            ran = true;
        }
        ran
    }
}

impl InputConsumer for BlurNode {
    fn bind_input(&mut self, _slot: &Slot, payload: Option<Payload>) {
        self.input = payload.as_ref().and_then(Payload::as_texture).copied();
        self.match_input_size();
    }
}

impl OutputProvider for BlurNode {
    fn output(&self, slot: &Slot) -> Option<Payload> {
        match slot.kind {
            SlotKind::Task => Some(Payload::ShaderPasses(self.group.weak())),
            _ => self.target.map(Payload::Texture),
        }
    }
}

impl NodeBehavior for BlurNode {
    fn capabilities(&self) -> &'static [Capability] {
        &[
            Capability::Task,
            Capability::Renderer,
            Capability::OutputProvider,
            Capability::InputConsumer,
        ]
    }

    fn treat_notification(&mut self, notification: &Notification, outbox: &mut Outbox) {
        match notification.event {
            NotifyEvent::TextureUpdateDone | NotifyEvent::NodeLinkIsBreaked
                if self.target_changed =>
            {
                self.target_changed = false;
                outbox.send_front_of_kind(SlotKind::Texture2D, NotifyEvent::TextureUpdateDone);
            }
            _ => {}
        }
    }

    fn save_params(&self, params: &mut NodeParams) {
        params.insert("radius".to_string(), self.radius.to_string());
    }

    fn load_params(&mut self, params: &NodeParams) -> bool {
        let Some(radius) = params.get("radius") else {
            return true;
        };
        match radius.parse() {
            Ok(radius) => {
                self.radius = radius;
                true
            }
            Err(_) => false,
        }
    }

    fn as_task_mut(&mut self) -> Option<&mut dyn Task> {
        Some(self)
    }

    fn as_output(&self) -> Option<&dyn OutputProvider> {
        Some(self)
    }

    fn as_input_mut(&mut self) -> Option<&mut dyn InputConsumer> {
        Some(self)
    }
}
