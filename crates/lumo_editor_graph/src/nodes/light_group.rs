// SPDX-License-Identifier: MIT OR Apache-2.0
//! Light group source.

use crate::behavior::{Capability, GizmoDriven, NodeBehavior, OutputProvider, Payload};
use crate::node::{NodeCategory, NodeParams, NodeType};
use crate::scene::{SceneLight, SceneLightGroup};
use crate::slot::{Slot, SlotKind};
use std::rc::Rc;

/// Type id
pub const LIGHT_GROUP: &str = "LIGHT_GROUP";

/// Node type definition
pub fn node_type() -> NodeType {
    NodeType {
        id: LIGHT_GROUP.to_string(),
        name: "Lights".to_string(),
        category: NodeCategory::Lighting,
        description: "Group of lights moved with the gizmo".to_string(),
        inputs: vec![],
        outputs: vec![Slot::output("Lights", SlotKind::LightGroup)],
    }
}

/// Owns its lights; the group only points at them
#[derive(Debug)]
pub struct LightGroupNode {
    lights: Vec<Rc<SceneLight>>,
    group: Rc<SceneLightGroup>,
}

impl Default for LightGroupNode {
    fn default() -> Self {
        let mut node = Self {
            lights: Vec::new(),
            group: SceneLightGroup::create(),
        };
        node.set_count(1);
        node
    }
}

impl LightGroupNode {
    /// Rebuild the group with `count` default lights
    pub fn set_count(&mut self, count: usize) {
        self.group.clear();
        self.lights = (0..count)
            .map(|i| Rc::new(SceneLight::new(format!("Light {i}"))))
            .collect();
        for light in &self.lights {
            self.group.add(light);
        }
    }

    /// Shared group
    pub fn group(&self) -> &Rc<SceneLightGroup> {
        &self.group
    }
}

impl GizmoDriven for LightGroupNode {
    fn gizmo_moved(&mut self, transform: &[[f32; 4]; 4]) -> bool {
        // The gizmo edits the first light
        let Some(light) = self.lights.first() else {
            return false;
        };
        if light.data().transform == *transform {
            return false;
        }
        light.set_transform(*transform);
        true
    }
}

impl OutputProvider for LightGroupNode {
    fn output(&self, _slot: &Slot) -> Option<Payload> {
        Some(Payload::LightGroup(self.group.weak()))
    }
}

impl NodeBehavior for LightGroupNode {
    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::OutputProvider, Capability::GizmoDriven]
    }

    fn save_params(&self, params: &mut NodeParams) {
        params.insert("count".to_string(), self.lights.len().to_string());
    }

    fn load_params(&mut self, params: &NodeParams) -> bool {
        let Some(count) = params.get("count") else {
            return true;
        };
        match count.parse() {
            Ok(count) => {
                self.set_count(count);
                true
            }
            Err(_) => false,
        }
    }

    fn as_output(&self) -> Option<&dyn OutputProvider> {
        Some(self)
    }

    fn as_gizmo_driven_mut(&mut self) -> Option<&mut dyn GizmoDriven> {
        Some(self)
    }
}
