//! # Composition, Slots, and Effects
//!
//! Stead's host runtime is immediate-mode: a root component is called once
//! per pass and returns a `View` tree. State that must survive between
//! passes lives in `remember` slots owned by component groups.
//!
//! - `group`: opens a component instance, identified by its position.
//! - `remember*`: lifecycle-aware storage bound to the enclosing group.
//! - `on_mount`: side-effects with cleanup, run after the pass commits.
//! - `Context<T>`: explicit handles for publishing values to a subtree.
//! - `memo`: skips a component's render while its props compare equal.
//!
//! ## Driving a composition
//!
//! ```rust
//! use std::cell::Cell;
//! use stead_core::*;
//!
//! let mut composition = Composition::new(|| {
//!     let count = remember(|| Cell::new(0));
//!     let invalidate = invalidator();
//!     let on_click = {
//!         let count = count.clone();
//!         move || {
//!             count.set(count.get() + 1);
//!             if let Some(inv) = &invalidate {
//!                 inv.invalidate();
//!             }
//!         }
//!     };
//!     Fragment(vec![
//!         Text(format!("Count = {}", count.get())),
//!         Button("+", on_click),
//!     ])
//! });
//!
//! composition.settle().unwrap();
//! let view = composition.click("+").unwrap();
//! assert_eq!(view.texts(), vec!["Count = 1"]);
//! ```
//!
//! ## Groups and unmounting
//!
//! Every group entered during a pass is live. A group that a pass does not
//! enter is unmounted when the pass ends: its scope is disposed, running the
//! cleanups returned from `on_mount`. `Composition::unmount` tears the whole
//! tree down the same way.

pub mod context;
pub mod effects;
pub mod error;
pub mod memo;
pub mod runtime;
pub mod scope;
pub mod view;

pub use context::{Context, ContextId};
pub use effects::{Dispose, on_mount, on_unmount};
pub use error::ComposeError;
pub use memo::memo;
pub use runtime::{
    Composition, CompositionConfig, Invalidator, group, invalidator, remember, remember_state,
};
pub use scope::{Scope, current_scope};
pub use view::{Button, Callback, Empty, Fragment, Text, View, ViewKind};
