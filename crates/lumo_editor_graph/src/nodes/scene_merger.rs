// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene merger: runs several shader pass chains into one target.

use super::next_handle;
use crate::behavior::{
    Capability, ExecuteContext, NodeBehavior, OutputProvider, Payload, Resizable, Task,
    TextureInfo,
};
use crate::node::{NodeCategory, NodeType};
use crate::slot::{Slot, SlotKind};

/// Type id
pub const SCENE_MERGER: &str = "SCENE_MERGER";

/// Node type definition
pub fn node_type() -> NodeType {
    NodeType {
        id: SCENE_MERGER.to_string(),
        name: "Scene Merger".to_string(),
        category: NodeCategory::Renderers,
        description: "Merges shader pass chains into one texture".to_string(),
        inputs: vec![Slot::input("Passes", SlotKind::Task).many_inputs()],
        outputs: vec![Slot::output("Output", SlotKind::Texture2D)],
    }
}

/// Merger node
#[derive(Debug, Default)]
pub struct SceneMergerNode {
    target: Option<TextureInfo>,
}

impl Task for SceneMergerNode {
    fn execute(&mut self, ctx: &mut ExecuteContext<'_>) -> bool {
        let Some(target) = self.target else {
            return false;
        };
        let groups: Vec<_> = ctx
            .inputs_named("Passes")
            .filter_map(|p| match p {
                Payload::ShaderPasses(group) => group.upgrade(),
                _ => None,
            })
            .collect();

        for group in &groups {
            let passes: Vec<_> = group.iter().collect();
            // A chain that already ran this frame upstream is reused as is
            if passes.last().is_some_and(|p| p.is_the_good_frame(ctx.frame)) {
                continue;
            }
            for pass in passes {
                ctx.record(&pass.name);
                pass.set_last_executed_frame(ctx.frame);
            }
        }
        ctx.record(&format!("merge {} chains into {:?}", groups.len(), target.size));
        true
    }
}

impl Resizable for SceneMergerNode {
    fn need_resize(&mut self, size: [u32; 2]) -> bool {
        if self.target.is_some_and(|t| t.size == size) || size.contains(&0) {
            return false;
        }
        self.target = Some(TextureInfo {
            handle: next_handle(),
            size,
        });
        true
    }
}

impl OutputProvider for SceneMergerNode {
    fn output(&self, _slot: &Slot) -> Option<Payload> {
        self.target.map(Payload::Texture)
    }
}

impl NodeBehavior for SceneMergerNode {
    fn capabilities(&self) -> &'static [Capability] {
        &[
            Capability::Task,
            Capability::Renderer,
            Capability::OutputProvider,
            Capability::Resizable,
        ]
    }

    fn as_task_mut(&mut self) -> Option<&mut dyn Task> {
        Some(self)
    }

    fn as_output(&self) -> Option<&dyn OutputProvider> {
        Some(self)
    }

    fn as_resizable_mut(&mut self) -> Option<&mut dyn Resizable> {
        Some(self)
    }
}
