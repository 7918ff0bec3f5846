// SPDX-License-Identifier: MIT OR Apache-2.0
//! Lights.

use super::SceneGroup;
use std::cell::Cell;

/// Light shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightKind {
    /// Omni light
    #[default]
    Point,
    /// Infinitely distant light
    Directional,
    /// Cone light
    Spot,
}

/// Light parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightData {
    /// Shape
    pub kind: LightKind,
    /// Linear RGBA color
    pub color: [f32; 4],
    /// Intensity multiplier
    pub intensity: f32,
    /// World transform (column major)
    pub transform: [[f32; 4]; 4],
}

impl Default for LightData {
    fn default() -> Self {
        Self {
            kind: LightKind::Point,
            color: [1.0; 4],
            intensity: 1.0,
            transform: [
                [1.0, 0.0, 0.0, 0.0],
                [0.0, 1.0, 0.0, 0.0],
                [0.0, 0.0, 1.0, 0.0],
                [0.0, 0.0, 0.0, 1.0],
            ],
        }
    }
}

/// A light owned by a lighting node
#[derive(Debug, Default)]
pub struct SceneLight {
    /// Display name
    pub name: String,
    data: Cell<LightData>,
}

impl SceneLight {
    /// Create a light with default parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data: Cell::new(LightData::default()),
        }
    }

    /// Current parameters
    pub fn data(&self) -> LightData {
        self.data.get()
    }

    /// Replace the parameters
    pub fn set_data(&self, data: LightData) {
        self.data.set(data);
    }

    /// Move the light (gizmo)
    pub fn set_transform(&self, transform: [[f32; 4]; 4]) {
        let mut data = self.data.get();
        data.transform = transform;
        self.data.set(data);
    }
}

/// Ordered group of lights
pub type SceneLightGroup = SceneGroup<SceneLight>;
