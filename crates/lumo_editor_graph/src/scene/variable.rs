// SPDX-License-Identifier: MIT OR Apache-2.0
//! Typed widget variables.

use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};

/// The closed set of variable types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableType {
    /// `WIDGET_BOOLEAN`
    Boolean,
    /// `WIDGET_FLOAT`
    Float,
    /// `WIDGET_INT`
    Int,
    /// `WIDGET_UINT`
    UInt,
}

impl VariableType {
    /// Persisted tag
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Boolean => "WIDGET_BOOLEAN",
            Self::Float => "WIDGET_FLOAT",
            Self::Int => "WIDGET_INT",
            Self::UInt => "WIDGET_UINT",
        }
    }

    /// Parse a persisted tag
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "WIDGET_BOOLEAN" => Some(Self::Boolean),
            "WIDGET_FLOAT" => Some(Self::Float),
            "WIDGET_INT" => Some(Self::Int),
            "WIDGET_UINT" => Some(Self::UInt),
            _ => None,
        }
    }
}

/// Value held by a variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariableValue {
    /// Boolean
    Boolean(bool),
    /// 32-bit float
    Float(f32),
    /// Signed integer
    Int(i32),
    /// Unsigned integer
    UInt(u32),
}

impl VariableValue {
    /// Zero value of a type
    pub fn default_for(ty: VariableType) -> Self {
        match ty {
            VariableType::Boolean => Self::Boolean(false),
            VariableType::Float => Self::Float(0.0),
            VariableType::Int => Self::Int(0),
            VariableType::UInt => Self::UInt(0),
        }
    }

    /// Type of this value
    pub fn variable_type(&self) -> VariableType {
        match self {
            Self::Boolean(_) => VariableType::Boolean,
            Self::Float(_) => VariableType::Float,
            Self::Int(_) => VariableType::Int,
            Self::UInt(_) => VariableType::UInt,
        }
    }

    /// Parse text written by [`fmt::Display`] as a value of `ty`
    pub fn parse(ty: VariableType, text: &str) -> Option<Self> {
        let text = text.trim();
        match ty {
            VariableType::Boolean => text.parse().ok().map(Self::Boolean),
            VariableType::Float => text.parse().ok().map(Self::Float),
            VariableType::Int => text.parse().ok().map(Self::Int),
            VariableType::UInt => text.parse().ok().map(Self::UInt),
        }
    }
}

impl fmt::Display for VariableValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::UInt(v) => write!(f, "{v}"),
        }
    }
}

/// A widget variable shared with consumers through weak handles
#[derive(Debug)]
pub struct SceneVariable {
    this: Weak<SceneVariable>,
    value: Cell<VariableValue>,
}

impl SceneVariable {
    /// Create a variable from a persisted type tag. Unknown tags give
    /// `None`.
    pub fn create(tag: &str) -> Option<Rc<Self>> {
        VariableType::parse(tag).map(Self::with_type)
    }

    /// Create a zero-valued variable of `ty`
    pub fn with_type(ty: VariableType) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            value: Cell::new(VariableValue::default_for(ty)),
        })
    }

    /// Weak handle to this variable
    pub fn weak(&self) -> Weak<Self> {
        self.this.clone()
    }

    /// Current value
    pub fn value(&self) -> VariableValue {
        self.value.get()
    }

    /// Type of the variable
    pub fn variable_type(&self) -> VariableType {
        self.value.get().variable_type()
    }

    /// Set the value. A value of another type is refused.
    pub fn set(&self, value: VariableValue) -> bool {
        if value.variable_type() != self.variable_type() {
            return false;
        }
        self.value.set(value);
        true
    }
}
