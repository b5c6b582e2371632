use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

thread_local! {
    static CURRENT_SCOPE: RefCell<Option<Weak<ScopeInner>>> = const { RefCell::new(None) };
}

/// Lifetime of one mounted component group.
///
/// Disposers registered on a scope run exactly once, when the owning group
/// is unmounted (or the whole composition is torn down).
pub struct Scope {
    inner: Rc<ScopeInner>,
}

struct ScopeInner {
    label: Rc<str>,
    disposers: RefCell<Vec<Box<dyn FnOnce()>>>,
    disposed: Cell<bool>,
}

impl Scope {
    pub fn new(label: impl Into<Rc<str>>) -> Self {
        Self {
            inner: Rc::new(ScopeInner {
                label: label.into(),
                disposers: RefCell::new(Vec::new()),
                disposed: Cell::new(false),
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.inner.label
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Runs `f` with this scope installed as the current one.
    pub fn run<R>(&self, f: impl FnOnce() -> R) -> R {
        // Restores the previous scope even if `f` unwinds.
        struct Restore(Option<Weak<ScopeInner>>);
        impl Drop for Restore {
            fn drop(&mut self) {
                let prev = self.0.take();
                CURRENT_SCOPE.with(|current| *current.borrow_mut() = prev);
            }
        }

        let prev = CURRENT_SCOPE.with(|current| {
            current.borrow_mut().replace(Rc::downgrade(&self.inner))
        });
        let _restore = Restore(prev);
        f()
    }

    pub fn add_disposer(&self, disposer: impl FnOnce() + 'static) {
        if self.is_disposed() {
            log::warn!(
                "scope '{}' already disposed; running disposer immediately",
                self.inner.label
            );
            disposer();
            return;
        }
        self.inner.disposers.borrow_mut().push(Box::new(disposer));
    }

    /// Runs every registered disposer in registration order. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.replace(true) {
            return;
        }
        let disposers = std::mem::take(&mut *self.inner.disposers.borrow_mut());
        log::trace!(
            "disposing scope '{}' ({} disposers)",
            self.inner.label,
            disposers.len()
        );
        for disposer in disposers {
            disposer();
        }
    }
}

impl Clone for Scope {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl std::fmt::Debug for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scope")
            .field("label", &self.inner.label)
            .field("disposed", &self.inner.disposed.get())
            .finish()
    }
}

pub fn current_scope() -> Option<Scope> {
    CURRENT_SCOPE.with(|current| {
        current
            .borrow()
            .as_ref()
            .and_then(|weak| weak.upgrade().map(|inner| Scope { inner }))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispose_runs_disposers_once() {
        let runs = Rc::new(Cell::new(0));
        let scope = Scope::new("test");
        let r = runs.clone();
        scope.add_disposer(move || r.set(r.get() + 1));

        assert_eq!(runs.get(), 0);
        scope.dispose();
        scope.dispose();
        assert_eq!(runs.get(), 1);
        assert!(scope.is_disposed());
    }

    #[test]
    fn run_installs_and_restores_current() {
        assert!(current_scope().is_none());
        let outer = Scope::new("outer");
        let inner = Scope::new("inner");
        outer.run(|| {
            assert_eq!(current_scope().map(|s| s.label().to_owned()).as_deref(), Some("outer"));
            inner.run(|| {
                assert_eq!(current_scope().map(|s| s.label().to_owned()).as_deref(), Some("inner"));
            });
            assert_eq!(current_scope().map(|s| s.label().to_owned()).as_deref(), Some("outer"));
        });
        assert!(current_scope().is_none());
    }

    #[test]
    fn disposer_added_after_dispose_runs_immediately() {
        let ran = Rc::new(Cell::new(false));
        let scope = Scope::new("late");
        scope.dispose();
        let r = ran.clone();
        scope.add_disposer(move || r.set(true));
        assert!(ran.get());
    }
}
