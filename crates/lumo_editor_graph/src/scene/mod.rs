// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene containers handed between nodes.
//!
//! A producing node owns its scene resources through `Rc`. Everything else
//! (groups, payloads crossing links) holds `Weak` handles and must check
//! liveness before use.

mod light;
mod model;
mod shader_pass;
mod variable;

pub use light::{LightData, LightKind, SceneLight, SceneLightGroup};
pub use model::{MeshInfo, PrimitiveType, SceneModel, SceneModelGroup};
pub use shader_pass::{SceneShaderPassGroup, ShaderPass};
pub use variable::{SceneVariable, VariableType, VariableValue};

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

/// Ordered group of weak references to resources owned elsewhere
pub struct SceneGroup<T> {
    this: Weak<SceneGroup<T>>,
    entries: RefCell<Vec<Weak<T>>>,
}

impl<T> SceneGroup<T> {
    /// Create an empty group that can hand out weak handles to itself
    pub fn create() -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            this: this.clone(),
            entries: RefCell::new(Vec::new()),
        })
    }

    /// Weak handle to this group
    pub fn weak(&self) -> Weak<Self> {
        self.this.clone()
    }

    /// Append an entry. The group does not keep it alive.
    pub fn add(&self, entry: &Rc<T>) {
        self.entries.borrow_mut().push(Rc::downgrade(entry));
    }

    /// Entry at `index`, if it is still alive
    pub fn get(&self, index: usize) -> Option<Rc<T>> {
        self.entries.borrow().get(index)?.upgrade()
    }

    /// Number of entries, dead ones included
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether the group has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Remove every entry
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Live entries, in order
    pub fn iter(&self) -> std::vec::IntoIter<Rc<T>> {
        self.entries
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Drop entries whose resource is gone. Returns how many were dropped.
    pub fn prune(&self) -> usize {
        let mut entries = self.entries.borrow_mut();
        let before = entries.len();
        entries.retain(|e| e.strong_count() > 0);
        before - entries.len()
    }

    /// Whether `entry` is in the group
    pub fn contains(&self, entry: &Rc<T>) -> bool {
        self.entries
            .borrow()
            .iter()
            .any(|e| std::ptr::eq(e.as_ptr(), Rc::as_ptr(entry)))
    }
}

impl<T> fmt::Debug for SceneGroup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let entries = self.entries.borrow();
        let alive = entries.iter().filter(|e| e.strong_count() > 0).count();
        f.debug_struct("SceneGroup")
            .field("len", &entries.len())
            .field("alive", &alive)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_does_not_own_entries() {
        let group = SceneGroup::<String>::create();
        let kept = Rc::new("kept".to_string());
        let dropped = Rc::new("dropped".to_string());
        group.add(&kept);
        group.add(&dropped);
        drop(dropped);

        assert_eq!(group.len(), 2);
        assert_eq!(group.get(0).as_deref().map(String::as_str), Some("kept"));
        assert!(group.get(1).is_none());
        assert_eq!(group.iter().count(), 1);
        assert!(group.contains(&kept));

        assert_eq!(group.prune(), 1);
        assert_eq!(group.len(), 1);
        group.clear();
        assert!(group.is_empty());
    }

    #[test]
    fn test_weak_self_handle() {
        let group = SceneGroup::<u32>::create();
        let handle = group.weak();
        assert!(handle.upgrade().is_some_and(|g| Rc::ptr_eq(&g, &group)));
        drop(group);
        assert!(handle.upgrade().is_none());
    }
}
