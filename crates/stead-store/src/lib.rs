//! # Scoped Stores
//!
//! A scoped store exposes a piece of state, and the named mutations that
//! change it, to every component composed inside a boundary.
//!
//! - `record!`: declares a state struct and its patch type.
//! - `ActionDefs`: named actions: constant updates or argument factories.
//! - `create_scope`: ties a state factory to its actions.
//! - `ScopedStore::boundary`: builds the store once and publishes its
//!   `Service` to the subtree.
//! - `ScopedStore::adapter`: wraps components so they receive a projection
//!   of the service and skip rendering while it is unchanged.
//!
//! ## Example
//!
//! ```rust
//! use stead_core::*;
//! use stead_store::*;
//!
//! record! {
//!     pub struct Toggle => TogglePatch {
//!         pub is_on: bool,
//!         pub is_disabled: bool,
//!     }
//! }
//!
//! #[derive(Default)]
//! struct ToggleConfig {
//!     on: bool,
//! }
//!
//! let toggle = create_scope(
//!     |cfg: &ToggleConfig| Toggle { is_on: cfg.on, is_disabled: false },
//!     ActionDefs::<Toggle>::new()
//!         .patch("on", TogglePatch::default().is_on(true))
//!         .factory("disable", |is_on: bool| {
//!             Update::with(move |_| Some(TogglePatch::default().is_on(is_on).is_disabled(true)))
//!         }),
//! );
//!
//! let status = toggle.adapter().identity().wrap(|service: &Option<Service<Toggle>>| {
//!     match service {
//!         Some(s) => Fragment(vec![
//!             Text(format!("on: {}", s.is_on)),
//!             Button("on", { let s = s.clone(); move || s.fire("on") }),
//!         ]),
//!         None => Empty(),
//!     }
//! });
//!
//! let mut composition = Composition::new(move || {
//!     toggle.boundary(Boundary::new(ToggleConfig::default()), || status.show())
//! });
//!
//! assert_eq!(composition.settle().unwrap().texts(), vec!["on: false"]);
//! assert_eq!(composition.click("on").unwrap().texts(), vec!["on: true"]);
//! ```
//!
//! ## Updates
//!
//! An `Update` is either a patch merged over the current state or a function
//! of the current state returning an optional patch. A function returning
//! `None` (and `Update::Skip`) leaves the state untouched, keeping its
//! identity, so adapters downstream do not render.

pub mod adapter;
pub mod live_ref;
pub mod mutation;
pub mod provider;
pub mod record;
pub mod reducer;
pub mod service;
pub mod store;


pub use adapter::{
    Adapter, AdapterFactory, Equality, Wrapped, create_adapter, map_props, shallow_equal,
};
pub use live_ref::{Acquire, CallbackRef, LiveCell, LiveRef};
pub use mutation::{ActionDef, ActionDefs, Dispatch, Factory, Mutation, Mutations, compile};
pub use provider::{Boundary, ScopedStore, create_scope};
pub use record::Record;
pub use reducer::{Update, reduce};
pub use service::Service;
pub use store::{Store, use_store};
