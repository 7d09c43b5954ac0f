//! Reusable bundles of commands, hooks and state.
//!
//! A module attaches itself to a [`Shell`] in [`Module::load`]: it binds
//! commands with [`Shell::add_command`], registers hooks, and keeps whatever
//! private state it needs inside the closures it hands over. The shell loads a
//! given module type at most once.
//!
//! Conventions for module authors:
//!
//! - share state between a module's commands and hooks with `Rc<RefCell<_>>`,
//! - grab an [`Output`](crate::Output) handle with [`Shell::output`] instead of
//!   writing to stdout directly, so the shell can be captured in tests,
//! - a failing `load` may leave part of the module attached; keep the steps
//!   that can fail first.

use std::any::TypeId;
use std::collections::HashMap;

use crate::interpreter::Shell;

/// A capability bundle that can be attached to a [`Shell`].
pub trait Module: 'static {
    /// Attach commands, hooks and state to the shell.
    fn load(&self, shell: &mut Shell) -> anyhow::Result<()>;
}

/// The set of module types loaded into one shell.
#[derive(Debug, Default)]
pub(crate) struct ModuleSet {
    loaded: HashMap<TypeId, &'static str>,
}

impl ModuleSet {
    pub(crate) fn contains<M: Module>(&self) -> bool {
        self.loaded.contains_key(&TypeId::of::<M>())
    }

    pub(crate) fn insert<M: Module>(&mut self) {
        self.loaded.insert(TypeId::of::<M>(), std::any::type_name::<M>());
    }

    pub(crate) fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.loaded.values().copied().collect();
        names.sort_unstable();
        names
    }
}
