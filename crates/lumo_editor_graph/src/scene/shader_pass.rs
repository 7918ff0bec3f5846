// SPDX-License-Identifier: MIT OR Apache-2.0
//! Shader passes and their frame bookkeeping.

use super::SceneGroup;
use crate::frame::FrameGate;
use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::{Rc, Weak};

/// One pass of a multi-pass effect.
///
/// A pass depends on earlier passes through weak handles. Its frame check
/// walks them so a shared sub-pass runs once per frame whichever branch
/// reaches it first.
#[derive(Debug)]
pub struct ShaderPass {
    /// Pass name
    pub name: String,
    this: Weak<ShaderPass>,
    gate: Cell<FrameGate>,
    dependencies: RefCell<Vec<Weak<ShaderPass>>>,
}

impl ShaderPass {
    /// Create a pass
    pub fn create(name: impl Into<String>) -> Rc<Self> {
        let name = name.into();
        Rc::new_cyclic(|this| Self {
            name,
            this: this.clone(),
            gate: Cell::new(FrameGate::default()),
            dependencies: RefCell::new(Vec::new()),
        })
    }

    /// Weak handle to this pass
    pub fn weak(&self) -> Weak<Self> {
        self.this.clone()
    }

    /// Declare that this pass consumes the result of `upstream`
    pub fn depends_on(&self, upstream: &Rc<ShaderPass>) {
        self.dependencies.borrow_mut().push(Rc::downgrade(upstream));
    }

    /// Record an execution for `frame`
    pub fn set_last_executed_frame(&self, frame: u32) {
        let mut gate = self.gate.get();
        gate.mark(frame);
        self.gate.set(gate);
    }

    /// Frame of the last execution
    pub fn last_executed_frame(&self) -> Option<u32> {
        self.gate.get().last_executed_frame()
    }

    /// Whether this pass, or any pass it transitively depends on, already
    /// ran in `frame`. Dead dependencies are skipped.
    pub fn is_the_good_frame(&self, frame: u32) -> bool {
        if self.gate.get().executed_in(frame) {
            return true;
        }
        let mut visited: HashSet<*const ShaderPass> = HashSet::from([self as *const _]);
        let mut stack: Vec<Rc<ShaderPass>> = self.live_dependencies();
        while let Some(pass) = stack.pop() {
            if !visited.insert(Rc::as_ptr(&pass)) {
                continue;
            }
            if pass.gate.get().executed_in(frame) {
                return true;
            }
            stack.extend(pass.live_dependencies());
        }
        false
    }

    fn live_dependencies(&self) -> Vec<Rc<ShaderPass>> {
        self.dependencies
            .borrow()
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}

/// Ordered chain of shader passes
pub type SceneShaderPassGroup = SceneGroup<ShaderPass>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_pass_satisfies_frame() {
        let first = ShaderPass::create("horizontal");
        let second = ShaderPass::create("vertical");
        second.depends_on(&first);

        assert!(!second.is_the_good_frame(7));
        first.set_last_executed_frame(7);
        assert!(second.is_the_good_frame(7));
        assert!(second.is_the_good_frame(7));
        assert_eq!(second.last_executed_frame(), None);
        assert!(!first.is_the_good_frame(8));
    }

    #[test]
    fn test_dependency_cycle_terminates() {
        let a = ShaderPass::create("a");
        let b = ShaderPass::create("b");
        a.depends_on(&b);
        b.depends_on(&a);
        assert!(!a.is_the_good_frame(1));
        b.set_last_executed_frame(1);
        assert!(a.is_the_good_frame(1));
    }

    #[test]
    fn test_dead_dependency_is_ignored() {
        let pass = ShaderPass::create("pass");
        {
            let gone = ShaderPass::create("gone");
            gone.set_last_executed_frame(2);
            pass.depends_on(&gone);
        }
        assert!(!pass.is_the_good_frame(2));
        assert!(pass.weak().upgrade().is_some());
    }
}
