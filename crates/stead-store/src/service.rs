use std::ops::Deref;
use std::rc::Rc;

use crate::mutation::{Mutation, Mutations};
use crate::record::Record;

/// Current state plus the compiled mutations of one store.
///
/// State fields are reached through `Deref`; mutations by name. Two
/// services are `==` when they share the same state allocation and the same
/// mutation set, i.e. nothing was dispatched in between that changed state.
pub struct Service<S: Record> {
    state: Rc<S>,
    mutations: Rc<Mutations>,
}

impl<S: Record> Service<S> {
    pub(crate) fn new(state: Rc<S>, mutations: Rc<Mutations>) -> Self {
        Self { state, mutations }
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn state_rc(&self) -> &Rc<S> {
        &self.state
    }

    pub fn mutations(&self) -> &Mutations {
        &self.mutations
    }

    pub fn mutation(&self, name: &str) -> Option<&Mutation> {
        self.mutations.get(name)
    }

    /// Invokes the named mutation without arguments.
    pub fn fire(&self, name: &str) {
        match self.mutation(name) {
            Some(mutation) => mutation.fire(),
            None => log::warn!("no mutation named '{name}'"),
        }
    }

    /// Invokes the named mutation with `args`.
    pub fn call<A: 'static>(&self, name: &str, args: A) {
        match self.mutation(name) {
            Some(mutation) => mutation.call(args),
            None => log::warn!("no mutation named '{name}'"),
        }
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state) && Rc::ptr_eq(&self.mutations, &other.mutations)
    }
}

impl<S: Record> Clone for Service<S> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            mutations: self.mutations.clone(),
        }
    }
}

impl<S: Record> Deref for Service<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.state
    }
}

impl<S: Record> PartialEq for Service<S> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<S: Record + std::fmt::Debug> std::fmt::Debug for Service<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Service")
            .field("state", &self.state)
            .field("mutations", &self.mutations)
            .finish()
    }
}

/// A service merges like its state; the mutation set is carried over as is.
/// An empty patch returns the same service.
impl<S: Record> Record for Service<S> {
    type Patch = S::Patch;

    const FIELDS: &'static [&'static str] = S::FIELDS;

    fn merge(&self, patch: &S::Patch) -> Self {
        if *patch == S::Patch::default() {
            return self.clone();
        }
        Self {
            state: Rc::new(self.state.merge(patch)),
            mutations: self.mutations.clone(),
        }
    }

    /// A detached service: the patched state and no mutations.
    fn from_patch(patch: &S::Patch) -> Option<Self> {
        S::from_patch(patch).map(|state| Self::new(Rc::new(state), Rc::new(Mutations::default())))
    }

    fn shallow_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.mutations, &other.mutations)
            && (Rc::ptr_eq(&self.state, &other.state) || self.state.shallow_eq(&other.state))
    }

    /// State field names followed by mutation names.
    fn keys(&self) -> Vec<String> {
        let mut keys = self.state.keys();
        keys.extend(self.mutations.names().map(str::to_owned));
        keys
    }
}
