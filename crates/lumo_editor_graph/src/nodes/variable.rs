// SPDX-License-Identifier: MIT OR Apache-2.0
//! Widget variables.

use crate::behavior::{Capability, NodeBehavior, OutputProvider, Payload};
use crate::node::{NodeCategory, NodeParams, NodeType};
use crate::scene::{SceneVariable, VariableType, VariableValue};
use crate::slot::{Slot, SlotKind};
use std::rc::Rc;

/// Variable types with a node
pub const VARIABLE_TYPES: [VariableType; 4] = [
    VariableType::Boolean,
    VariableType::Float,
    VariableType::Int,
    VariableType::UInt,
];

/// Node type definition for a variable type. The type id is the variable
/// tag, e.g. `WIDGET_FLOAT`.
pub fn node_type(ty: VariableType) -> NodeType {
    let name = match ty {
        VariableType::Boolean => "Boolean",
        VariableType::Float => "Float",
        VariableType::Int => "Int",
        VariableType::UInt => "UInt",
    };
    NodeType {
        id: ty.as_str().to_string(),
        name: name.to_string(),
        category: NodeCategory::Widgets,
        description: format!("{name} widget variable"),
        inputs: vec![],
        outputs: vec![Slot::output("Output", SlotKind::Variable(ty)).hide_name()],
    }
}

/// Owns one variable
#[derive(Debug)]
pub struct VariableNode {
    variable: Rc<SceneVariable>,
}

impl VariableNode {
    /// Create a zero-valued variable node
    pub fn new(ty: VariableType) -> Self {
        Self {
            variable: SceneVariable::with_type(ty),
        }
    }

    /// Owned variable
    pub fn variable(&self) -> &Rc<SceneVariable> {
        &self.variable
    }
}

impl OutputProvider for VariableNode {
    fn output(&self, _slot: &Slot) -> Option<Payload> {
        Some(Payload::Variable(self.variable.weak()))
    }
}

impl NodeBehavior for VariableNode {
    fn capabilities(&self) -> &'static [Capability] {
        &[Capability::OutputProvider]
    }

    fn save_params(&self, params: &mut NodeParams) {
        params.insert("value".to_string(), self.variable.value().to_string());
    }

    fn load_params(&mut self, params: &NodeParams) -> bool {
        let Some(text) = params.get("value") else {
            return true;
        };
        VariableValue::parse(self.variable.variable_type(), text)
            .is_some_and(|value| self.variable.set(value))
    }

    fn as_output(&self) -> Option<&dyn OutputProvider> {
        Some(self)
    }
}
