// SPDX-License-Identifier: MIT OR Apache-2.0
//! Node plugins.
//!
//! A plugin contributes node types to a [`NodeRegistry`]. Dynamic loading
//! is the host's business: a shared library exports an [`ALLOCATE_SYMBOL`]
//! function of type [`PluginAllocator`], and the host hands the returned
//! plugin to a [`PluginManager`].

use crate::node::NodeRegistry;
use indexmap::IndexMap;
use std::fmt;

/// Entry point exported by a plugin library
pub const ALLOCATE_SYMBOL: &str = "allocate";

/// Release point exported by a plugin library
pub const DEALLOCATE_SYMBOL: &str = "deallocate";

/// Signature of the [`ALLOCATE_SYMBOL`] entry point
pub type PluginAllocator = fn() -> Box<dyn NodePlugin>;

/// A provider of node types
pub trait NodePlugin {
    /// Unique plugin name
    fn name(&self) -> &str;

    /// Plugin version
    fn version(&self) -> &str {
        "0.0.0"
    }

    /// Register the plugin's node types
    fn register_nodes(&self, registry: &mut NodeRegistry);
}

/// Set of loaded plugins
#[derive(Default)]
pub struct PluginManager {
    plugins: IndexMap<String, Box<dyn NodePlugin>>,
}

impl PluginManager {
    /// Create an empty manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plugin. A plugin with the same name is refused.
    pub fn add_plugin(&mut self, plugin: Box<dyn NodePlugin>) -> bool {
        let name = plugin.name().to_string();
        if self.plugins.contains_key(&name) {
            tracing::warn!("plugin {name} already loaded");
            return false;
        }
        tracing::info!("plugin {name} v{} loaded", plugin.version());
        self.plugins.insert(name, plugin);
        true
    }

    /// Add a plugin through its entry point
    pub fn add_allocator(&mut self, allocate: PluginAllocator) -> bool {
        self.add_plugin(allocate())
    }

    /// Remove a plugin. Its node types stay in registries it was installed
    /// into.
    pub fn remove_plugin(&mut self, name: &str) -> Option<Box<dyn NodePlugin>> {
        self.plugins.shift_remove(name)
    }

    /// Register every plugin's node types into `registry`. Types already
    /// present, built-in ones included, keep their first registration.
    /// Returns how many types were added.
    pub fn install_into(&self, registry: &mut NodeRegistry) -> usize {
        self.plugins
            .values()
            .map(|plugin| {
                let mut contributed = NodeRegistry::new();
                plugin.register_nodes(&mut contributed);
                let added = registry.merge(contributed);
                tracing::debug!("plugin {} installed {added} node types", plugin.name());
                added
            })
            .sum()
    }

    /// Loaded plugin names
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.plugins.keys().map(String::as_str)
    }

    /// Number of plugins
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Whether no plugin is loaded
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }
}

impl fmt::Debug for PluginManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginManager")
            .field("plugins", &self.plugins.keys().collect::<Vec<_>>())
            .finish()
    }
}
