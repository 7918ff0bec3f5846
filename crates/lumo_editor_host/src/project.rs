// SPDX-License-Identifier: MIT OR Apache-2.0
//! Project files: host settings plus the persisted graph.

use lumo_editor_graph::{GraphDocument, GraphSettings};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Current project format version
pub const PROJECT_FORMAT_VERSION: u32 = 1;

/// Host loop settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostSettings {
    /// Frames to run
    pub frames: u32,
    /// Viewport size in pixels
    pub viewport_size: [u32; 2],
    /// Graph tunables
    pub graph: GraphSettings,
}

impl Default for HostSettings {
    fn default() -> Self {
        Self {
            frames: 3,
            viewport_size: [1280, 720],
            graph: GraphSettings::default(),
        }
    }
}

/// A saved project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectFile {
    /// Format version
    pub version: u32,
    /// Host settings
    #[serde(default)]
    pub settings: HostSettings,
    /// Root graph
    pub graph: GraphDocument,
}

/// Project loading and saving errors
#[derive(Debug, Error)]
pub enum ProjectError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed project file
    #[error("Failed to parse project: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serialization failed
    #[error("Failed to serialize project: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer host
    #[error("Project version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Highest version this host reads
        supported: u32,
    },
}

/// Result type for project operations
pub type Result<T> = std::result::Result<T, ProjectError>;

impl ProjectFile {
    /// Wrap a graph document with default settings
    pub fn new(graph: GraphDocument) -> Self {
        Self {
            version: PROJECT_FORMAT_VERSION,
            settings: HostSettings::default(),
            graph,
        }
    }

    /// Parse from RON
    pub fn from_ron(text: &str) -> Result<Self> {
        let project: ProjectFile = ron::from_str(text)?;
        if project.version > PROJECT_FORMAT_VERSION {
            return Err(ProjectError::UnsupportedVersion {
                found: project.version,
                supported: PROJECT_FORMAT_VERSION,
            });
        }
        Ok(project)
    }

    /// Serialize to pretty RON
    pub fn to_ron(&self) -> Result<String> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load a project file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Save to a project file
    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ron_round_trip() {
        let mut project = ProjectFile::new(GraphDocument {
            name: "empty".to_string(),
            ..GraphDocument::default()
        });
        project.settings.frames = 10;
        project.settings.graph.allow_feedback_loops = true;

        let text = project.to_ron().unwrap();
        assert_eq!(ProjectFile::from_ron(&text).unwrap(), project);
    }

    #[test]
    fn test_missing_settings_use_defaults() {
        let project = ProjectFile::from_ron("(version: 1, graph: (name: \"g\"))").unwrap();
        assert_eq!(project.settings, HostSettings::default());
        assert!(project.graph.nodes.is_empty());
    }

    #[test]
    fn test_newer_version_is_refused() {
        let result = ProjectFile::from_ron("(version: 99, graph: (name: \"g\"))");
        assert!(matches!(
            result,
            Err(ProjectError::UnsupportedVersion { found: 99, .. })
        ));
    }

    #[test]
    fn test_save_and_load() {
        let path = std::env::temp_dir().join(format!("lumo_project_{}.ron", std::process::id()));
        let project = ProjectFile::new(GraphDocument::default());
        project.save(&path).unwrap();
        let loaded = ProjectFile::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(loaded, project);
    }
}
