//! # Context handles
//!
//! A `Context<T>` publishes a value to everything composed inside
//! `provide`. Unlike type-keyed locals, every handle carries its own id, so
//! two contexts of the same `T` never shadow each other:
//!
//! ```rust
//! use stead_core::*;
//!
//! let user: Context<String> = Context::new();
//! let team: Context<String> = Context::new();
//!
//! user.provide("ada".to_string(), || {
//!     team.provide("core".to_string(), || {
//!         assert_eq!(user.read().as_deref(), Some("ada"));
//!         assert_eq!(team.read().as_deref(), Some("core"));
//!     })
//! });
//! assert!(user.read().is_none());
//! ```

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::marker::PhantomData;
use std::rc::Rc;

use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

thread_local! {
    static NEXT_ID: Cell<u64> = const { Cell::new(1) };
    static CONTEXT_STACK: RefCell<SmallVec<[(ContextId, Rc<dyn Any>); 8]>> =
        RefCell::new(SmallVec::new());
    static TRACKERS: RefCell<SmallVec<[Tracker; 4]>> = RefCell::new(SmallVec::new());
}

/// A context read made while a tracker was open.
#[derive(Clone)]
pub(crate) struct ContextRead {
    id: ContextId,
    unchanged: Rc<dyn Fn() -> bool>,
}

impl ContextRead {
    /// Whether reading the same context here would still give the value seen.
    pub(crate) fn unchanged(&self) -> bool {
        (self.unchanged)()
    }
}

struct Tracker {
    /// Stack depth when tracking began; providers at or above it are internal.
    base: usize,
    reads: Vec<ContextRead>,
}

fn provider_position(id: ContextId) -> Option<usize> {
    CONTEXT_STACK.with(|st| st.borrow().iter().rposition(|(entry, _)| *entry == id))
}

fn report(read: &ContextRead) {
    let position = provider_position(read.id);
    TRACKERS.with(|trackers| {
        for tracker in trackers.borrow_mut().iter_mut() {
            if position.is_none_or(|p| p < tracker.base) {
                tracker.reads.push(read.clone());
            }
        }
    });
}

/// Runs `f` and collects the reads it made of contexts provided outside it.
pub(crate) fn track_reads<R>(f: impl FnOnce() -> R) -> (R, Vec<ContextRead>) {
    struct Pop;
    impl Drop for Pop {
        fn drop(&mut self) {
            TRACKERS.with(|trackers| {
                trackers.borrow_mut().pop();
            });
        }
    }

    let base = CONTEXT_STACK.with(|st| st.borrow().len());
    TRACKERS.with(|trackers| {
        trackers.borrow_mut().push(Tracker {
            base,
            reads: Vec::new(),
        })
    });
    let _pop = Pop;
    let out = f();
    let reads = TRACKERS.with(|trackers| {
        trackers
            .borrow_mut()
            .last_mut()
            .map(|tracker| std::mem::take(&mut tracker.reads))
            .unwrap_or_default()
    });
    (out, reads)
}

/// Re-reports reads recorded earlier, for a subtree that was not re-run.
pub(crate) fn replay_reads(reads: &[ContextRead]) {
    for read in reads {
        report(read);
    }
}

pub struct Context<T> {
    id: ContextId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Context<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for Context<T> {}

impl<T> std::fmt::Debug for Context<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Context").field(&self.id.0).finish()
    }
}

impl<T: Clone + PartialEq + 'static> Default for Context<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq + 'static> Context<T> {
    pub fn new() -> Self {
        let id = NEXT_ID.with(|next| {
            let id = next.get();
            next.set(id + 1);
            id
        });
        Self {
            id: ContextId(id),
            _marker: PhantomData,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    /// Publishes `value` for the duration of `f`.
    pub fn provide<R>(&self, value: T, f: impl FnOnce() -> R) -> R {
        // Non-panicking frame guard (ensures pop on unwind)
        struct Guard;
        impl Drop for Guard {
            fn drop(&mut self) {
                CONTEXT_STACK.with(|st| {
                    st.borrow_mut().pop();
                });
            }
        }

        CONTEXT_STACK.with(|st| st.borrow_mut().push((self.id, Rc::new(value))));
        let _guard = Guard;
        f()
    }

    /// Nearest published value, or `None` outside any `provide`.
    ///
    /// Inside a memoized render the read is recorded, so the memo renders
    /// again once the value published here stops comparing equal.
    pub fn read(&self) -> Option<T> {
        let value = Self::lookup(self.id);
        if TRACKERS.with(|trackers| !trackers.borrow().is_empty()) {
            let id = self.id;
            let seen = value.clone();
            report(&ContextRead {
                id,
                unchanged: Rc::new(move || Self::lookup(id) == seen),
            });
        }
        value
    }

    fn lookup(id: ContextId) -> Option<T> {
        CONTEXT_STACK.with(|st| {
            st.borrow()
                .iter()
                .rev()
                .find(|(entry, _)| *entry == id)
                .and_then(|(_, value)| value.downcast_ref::<T>().cloned())
        })
    }
}
