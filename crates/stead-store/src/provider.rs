use std::rc::Rc;

use stead_core::{Context, View, group, on_mount, on_unmount};

use crate::adapter::{AdapterFactory, create_adapter};
use crate::live_ref::{Acquire, LiveRef};
use crate::mutation::ActionDefs;
use crate::record::Record;
use crate::service::Service;
use crate::store::use_store;

/// One store definition: a state factory, its actions and the context its
/// boundaries publish into.
///
/// Each call to `create_scope` gets its own context handle, so scopes over
/// the same state type never see each other's services.
pub struct ScopedStore<S: Record, C> {
    factory: Rc<dyn Fn(&C) -> S>,
    actions: Rc<ActionDefs<S>>,
    context: Context<Service<S>>,
}

impl<S: Record, C> Clone for ScopedStore<S, C> {
    fn clone(&self) -> Self {
        Self {
            factory: self.factory.clone(),
            actions: self.actions.clone(),
            context: self.context,
        }
    }
}

pub fn create_scope<S: Record, C: 'static>(
    factory: impl Fn(&C) -> S + 'static,
    actions: ActionDefs<S>,
) -> ScopedStore<S, C> {
    for name in actions.names() {
        if S::FIELDS.iter().any(|field| *field == name) {
            log::warn!(
                "action '{name}' shares its name with a field of {}",
                std::any::type_name::<S>()
            );
        }
    }

    ScopedStore {
        factory: Rc::new(factory),
        actions: Rc::new(actions),
        context: Context::new(),
    }
}

/// Props of a boundary: the init-only configuration and an optional live
/// reference target.
pub struct Boundary<S: Record, C> {
    config: C,
    live_ref: Option<LiveRef<Service<S>>>,
}

impl<S: Record, C> Boundary<S, C> {
    pub fn new(config: C) -> Self {
        Self {
            config,
            live_ref: None,
        }
    }

    /// The service is handed to `target` once after mount and released once
    /// on unmount.
    pub fn live_ref(mut self, target: impl Acquire<Service<S>>) -> Self {
        self.live_ref = Some(Rc::new(target));
        self
    }
}

impl<S: Record, C: 'static> ScopedStore<S, C> {
    /// The service published by the nearest enclosing boundary of this
    /// scope, or `None` outside any.
    pub fn read(&self) -> Option<Service<S>> {
        self.context.read()
    }

    pub fn context(&self) -> Context<Service<S>> {
        self.context
    }

    /// Mounts (or re-renders) a boundary around `content`.
    ///
    /// The store is built from `props.config` on the first pass only; later
    /// configurations are ignored for the lifetime of this boundary.
    pub fn boundary(&self, props: Boundary<S, C>, content: impl FnOnce() -> View) -> View {
        group("Boundary", move || {
            let Boundary { config, live_ref } = props;
            let service = use_store(config, &*self.factory, &self.actions);

            if let Some(target) = live_ref {
                let mounted = service.clone();
                on_mount(move || {
                    log::debug!("boundary mounted; forwarding service");
                    target.acquire(mounted);
                    on_unmount(move || target.release())
                });
            }

            self.context.provide(service, content)
        })
    }

    /// Adapter factory reading from this scope.
    pub fn adapter(&self) -> AdapterFactory<Option<Service<S>>> {
        let context = self.context;
        create_adapter(move || context.read())
    }
}
