use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::runtime::{queue_after_commit, remember};
use crate::scope::current_scope;

#[derive(Clone)]
pub struct Dispose(Rc<RefCell<Option<Box<dyn FnOnce()>>>>);

impl Dispose {
    pub fn new(f: impl FnOnce() + 'static) -> Self {
        Self(Rc::new(RefCell::new(Some(Box::new(f)))))
    }

    pub fn noop() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }

    /// Runs at most once (safe to call multiple times).
    pub fn run(&self) {
        let f = self.0.borrow_mut().take();
        if let Some(f) = f {
            f()
        }
    }
}

/// Helper to build the cleanup returned from an effect.
pub fn on_unmount(f: impl FnOnce() + 'static) -> Dispose {
    Dispose::new(f)
}

/// Runs `effect` once for the enclosing group, after the pass that first
/// composes it has committed. The returned `Dispose` runs when the group
/// unmounts.
///
/// Outside a composition the effect runs immediately and its cleanup is
/// leaked.
pub fn on_mount<F>(effect: F)
where
    F: FnOnce() -> Dispose + 'static,
{
    let installed = remember(|| Cell::new(false));
    if installed.replace(true) {
        return;
    }

    let Some(scope) = current_scope() else {
        log::trace!("on_mount outside a composition; running now");
        let _ = effect();
        return;
    };

    queue_after_commit(Box::new(move || {
        let cleanup = effect();
        scope.add_disposer(move || cleanup.run());
    }));
}
