use std::any::Any;
use std::borrow::Cow;
use std::rc::Rc;

use smallvec::SmallVec;

use crate::reducer::Update;
use crate::record::Record;

/// Sink a compiled mutation hands its update to.
pub type Dispatch<S> = Rc<dyn Fn(Update<S>)>;

/// Call-time arguments of a mutation.
pub(crate) enum Args {
    /// No arguments supplied; factories fall back to `Default`.
    Default,
    Given(Box<dyn Any>),
}

/// How a named action produces its update.
pub enum ActionDef<S: Record> {
    /// Fires the same update on every call, ignoring arguments.
    Constant(Update<S>),
    /// Builds the update from call-time arguments.
    Factory(Factory<S>),
}

pub struct Factory<S: Record> {
    arg_type: &'static str,
    build: Rc<dyn Fn(Args) -> Option<Update<S>>>,
}

impl<S: Record> Clone for Factory<S> {
    fn clone(&self) -> Self {
        Self {
            arg_type: self.arg_type,
            build: self.build.clone(),
        }
    }
}

impl<S: Record> Clone for ActionDef<S> {
    fn clone(&self) -> Self {
        match self {
            ActionDef::Constant(update) => ActionDef::Constant(update.clone()),
            ActionDef::Factory(factory) => ActionDef::Factory(factory.clone()),
        }
    }
}

impl<S: Record> ActionDef<S> {
    pub fn patch(patch: S::Patch) -> Self {
        ActionDef::Constant(Update::Patch(patch))
    }

    pub fn update(update: Update<S>) -> Self {
        ActionDef::Constant(update)
    }

    /// `A` is the argument type (use a tuple for several arguments). Calling
    /// the compiled mutation without arguments passes `A::default()`.
    pub fn factory<A, F>(f: F) -> Self
    where
        A: Default + 'static,
        F: Fn(A) -> Update<S> + 'static,
    {
        let build = move |args: Args| {
            let args = match args {
                Args::Default => A::default(),
                Args::Given(boxed) => *boxed.downcast::<A>().ok()?,
            };
            Some(f(args))
        };
        ActionDef::Factory(Factory {
            arg_type: std::any::type_name::<A>(),
            build: Rc::new(build),
        })
    }
}

/// Ordered, named action definitions.
pub struct ActionDefs<S: Record> {
    entries: Vec<(Cow<'static, str>, ActionDef<S>)>,
}

impl<S: Record> Default for ActionDefs<S> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<S: Record> Clone for ActionDefs<S> {
    fn clone(&self) -> Self {
        Self {
            entries: self.entries.clone(),
        }
    }
}

impl<S: Record> ActionDefs<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `def` under `name`, replacing an earlier definition of the same
    /// name in place.
    pub fn with(mut self, name: impl Into<Cow<'static, str>>, def: ActionDef<S>) -> Self {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = def,
            None => self.entries.push((name, def)),
        }
        self
    }

    pub fn patch(self, name: impl Into<Cow<'static, str>>, patch: S::Patch) -> Self {
        self.with(name, ActionDef::patch(patch))
    }

    pub fn update(self, name: impl Into<Cow<'static, str>>, update: Update<S>) -> Self {
        self.with(name, ActionDef::update(update))
    }

    pub fn factory<A, F>(self, name: impl Into<Cow<'static, str>>, f: F) -> Self
    where
        A: Default + 'static,
        F: Fn(A) -> Update<S> + 'static,
    {
        self.with(name, ActionDef::factory(f))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_ref())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// A callable bound to one action definition and a dispatch sink.
/// Invoking it dispatches exactly one update and returns nothing.
#[derive(Clone)]
pub struct Mutation {
    name: Cow<'static, str>,
    invoke: Rc<dyn Fn(Args)>,
}

impl Mutation {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Calls with no arguments.
    pub fn fire(&self) {
        (self.invoke)(Args::Default)
    }

    /// Calls with `args`. A constant action ignores them; a factory expects
    /// exactly the argument type it was declared with.
    pub fn call<A: 'static>(&self, args: A) {
        (self.invoke)(Args::Given(Box::new(args)))
    }

    pub fn ptr_eq(&self, other: &Mutation) -> bool {
        Rc::ptr_eq(&self.invoke, &other.invoke)
    }
}

impl std::fmt::Debug for Mutation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Mutation").field(&self.name).finish()
    }
}

/// The compiled mutation set of one store, in definition order.
#[derive(Clone, Default)]
pub struct Mutations {
    entries: SmallVec<[Mutation; 8]>,
}

impl Mutations {
    pub fn get(&self, name: &str) -> Option<&Mutation> {
        self.entries.iter().find(|m| m.name() == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Mutation> {
        self.entries.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(Mutation::name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for Mutations {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Turns action definitions into mutations that forward to `dispatch`.
pub fn compile<S: Record>(defs: &ActionDefs<S>, dispatch: &Dispatch<S>) -> Mutations {
    let entries = defs
        .entries
        .iter()
        .map(|(name, def)| {
            let dispatch = dispatch.clone();
            let invoke: Rc<dyn Fn(Args)> = match def.clone() {
                ActionDef::Constant(update) => Rc::new(move |_args: Args| dispatch(update.clone())),
                ActionDef::Factory(Factory { arg_type, build }) => {
                    let name = name.clone();
                    Rc::new(move |args: Args| match build(args) {
                        Some(update) => dispatch(update),
                        None => log::warn!(
                            "mutation '{name}' called with arguments of the wrong type \
                             (expected {arg_type}); nothing dispatched"
                        ),
                    })
                }
            };
            Mutation {
                name: name.clone(),
                invoke,
            }
        })
        .collect();

    Mutations { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    crate::record! {
        struct Light => LightPatch {
            on: bool,
            disabled: bool,
        }
    }

    fn recorder() -> (Dispatch<Light>, Rc<RefCell<Vec<Update<Light>>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        (Rc::new(move |u: Update<Light>| l.borrow_mut().push(u)), log)
    }

    fn patch_of(update: &Update<Light>, state: &Light) -> Option<LightPatch> {
        match update {
            Update::Patch(patch) => Some(patch.clone()),
            Update::With(f) => f(state),
            Update::Skip => None,
        }
    }

    fn dark() -> Light {
        Light {
            on: false,
            disabled: false,
        }
    }

    #[test]
    fn constant_patch_ignores_arguments() {
        let (dispatch, log) = recorder();
        let defs = ActionDefs::<Light>::new().patch("on", LightPatch::default().on(true));
        let mutations = compile(&defs, &dispatch);
        let on = mutations.get("on").expect("on");

        on.fire();
        on.call(42_u8);
        on.call("ignored");

        let log = log.borrow();
        assert_eq!(log.len(), 3);
        for update in log.iter() {
            assert_eq!(
                patch_of(update, &dark()),
                Some(LightPatch::default().on(true))
            );
        }
    }

    #[test]
    fn factory_dispatches_what_it_builds() {
        let (dispatch, log) = recorder();
        let defs = ActionDefs::<Light>::new().factory("disable", |on: bool| {
            Update::with(move |_| Some(LightPatch::default().on(on).disabled(true)))
        });
        let mutations = compile(&defs, &dispatch);
        let disable = mutations.get("disable").expect("disable");

        disable.call(true);
        disable.fire();

        let log = log.borrow();
        assert_eq!(
            patch_of(&log[0], &dark()),
            Some(LightPatch::default().on(true).disabled(true))
        );
        assert_eq!(
            patch_of(&log[1], &dark()),
            Some(LightPatch::default().on(false).disabled(true))
        );
    }

    #[test]
    fn wrong_argument_type_dispatches_nothing() {
        let (dispatch, log) = recorder();
        let defs = ActionDefs::<Light>::new().factory("set", |on: bool| {
            Update::patch(LightPatch::default().on(on))
        });
        let mutations = compile(&defs, &dispatch);
        mutations.get("set").expect("set").call("yes");
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn compile_preserves_definition_order() {
        let (dispatch, _) = recorder();
        let defs = ActionDefs::<Light>::new()
            .patch("on", LightPatch::default().on(true))
            .factory("off", |(): ()| Update::patch(LightPatch::default().on(false)))
            .patch("on", LightPatch::default().on(true).disabled(false));
        let mutations = compile(&defs, &dispatch);
        assert_eq!(mutations.names().collect::<Vec<_>>(), vec!["on", "off"]);
        assert!(mutations.get("missing").is_none());
    }
}
