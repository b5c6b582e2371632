use std::cell::RefCell;
use std::rc::Rc;

use stead_core::{Invalidator, invalidator, remember};

use crate::mutation::{ActionDefs, Dispatch, Mutations, compile};
use crate::reducer::{Update, reduce};
use crate::record::Record;
use crate::service::Service;

struct StoreCell<S: Record> {
    state: RefCell<Rc<S>>,
    invalidator: Option<Invalidator>,
}

impl<S: Record> StoreCell<S> {
    fn dispatch(&self, update: Update<S>) {
        let current = Rc::clone(&self.state.borrow());
        let next = reduce(&current, &update);
        if Rc::ptr_eq(&current, &next) {
            log::trace!("dispatch: no-op update, state unchanged");
            return;
        }

        *self.state.borrow_mut() = next;
        log::trace!("dispatch: state replaced");
        if let Some(invalidator) = &self.invalidator {
            invalidator.invalidate();
        }
    }
}

/// Reducer loop over one piece of state.
///
/// The mutation set is compiled once, against a dispatch that reaches the
/// state through a weak handle, so mutations outliving the store are inert.
pub struct Store<S: Record> {
    cell: Rc<StoreCell<S>>,
    mutations: Rc<Mutations>,
}

impl<S: Record> Store<S> {
    pub fn new(initial: S, actions: &ActionDefs<S>, invalidator: Option<Invalidator>) -> Self {
        let cell = Rc::new(StoreCell {
            state: RefCell::new(Rc::new(initial)),
            invalidator,
        });

        let weak = Rc::downgrade(&cell);
        let dispatch: Dispatch<S> = Rc::new(move |update: Update<S>| match weak.upgrade() {
            Some(cell) => cell.dispatch(update),
            None => log::debug!("dispatch after the store was dropped; ignoring"),
        });

        Self {
            cell,
            mutations: Rc::new(compile(actions, &dispatch)),
        }
    }

    pub fn dispatch(&self, update: Update<S>) {
        self.cell.dispatch(update);
    }

    pub fn state(&self) -> Rc<S> {
        self.cell.state.borrow().clone()
    }

    pub fn service(&self) -> Service<S> {
        Service::new(self.state(), self.mutations.clone())
    }
}

/// Builds the store on the first pass of the enclosing group and returns
/// its current service on every pass. `config` is only read the first time.
pub fn use_store<S: Record, C>(
    config: C,
    factory: &dyn Fn(&C) -> S,
    actions: &ActionDefs<S>,
) -> Service<S> {
    let store = remember(|| {
        log::debug!(
            "building store for {} with {} action(s)",
            std::any::type_name::<S>(),
            actions.len()
        );
        Store::new(factory(&config), actions, invalidator())
    });
    store.service()
}
