// SPDX-License-Identifier: MIT OR Apache-2.0
//! Graph settings.

use serde::{Deserialize, Serialize};

/// Tunables of a graph, persisted with the project
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    /// Notifications further than this many hops from their origin are
    /// dropped
    pub max_propagation_depth: usize,
    /// Let any node feed its own inputs
    pub allow_feedback_loops: bool,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            max_propagation_depth: 64,
            allow_feedback_loops: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_use_defaults() {
        let settings: GraphSettings = ron::from_str("(allow_feedback_loops: true)").unwrap();
        assert!(settings.allow_feedback_loops);
        assert_eq!(settings.max_propagation_depth, 64);
    }
}
