use std::any::Any;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

use slotmap::{SlotMap, new_key_type};
use smallvec::SmallVec;

use crate::error::ComposeError;
use crate::scope::Scope;
use crate::view::{Callback, View};

thread_local! {
    static ACTIVE: RefCell<Option<Rc<Composer>>> = const { RefCell::new(None) };
}

new_key_type! {
    struct GroupKey;
}

/// One component instance: its remembered slots and its lifetime scope.
struct Group {
    path: Rc<str>,
    depth: usize,
    slots: Vec<Box<dyn Any>>,
    scope: Scope,
    epoch: u64,
}

struct Frame {
    group: GroupKey,
    path: Rc<str>,
    depth: usize,
    cursor: usize,
    children: usize,
}

#[derive(Default)]
struct Composer {
    groups: RefCell<SlotMap<GroupKey, Group>>,
    index: RefCell<HashMap<Rc<str>, GroupKey>>,
    frames: RefCell<SmallVec<[Frame; 16]>>,
    after_commit: RefCell<Vec<Box<dyn FnOnce()>>>,
    epoch: Cell<u64>,
    dirty: Rc<Cell<bool>>,
}

impl Composer {
    fn pass(self: &Rc<Self>, root: &dyn Fn() -> View) -> View {
        let epoch = self.epoch.get() + 1;
        self.epoch.set(epoch);
        self.dirty.set(false);
        self.frames.borrow_mut().clear();
        log::trace!("composition pass {epoch}");

        let view = with_active(self, || group("root", root));

        self.sweep();
        self.flush_after_commit();
        view
    }

    fn enter(&self, label: &str) -> Scope {
        let mut frames = self.frames.borrow_mut();
        let (path, depth): (Rc<str>, usize) = match frames.last_mut() {
            Some(parent) => {
                let index = parent.children;
                parent.children += 1;
                (
                    format!("{}/{index}:{label}", parent.path).into(),
                    parent.depth + 1,
                )
            }
            None => (label.into(), 0),
        };

        let epoch = self.epoch.get();
        let mut groups = self.groups.borrow_mut();
        let existing = self
            .index
            .borrow()
            .get(&path)
            .copied()
            .filter(|key| groups.contains_key(*key));

        let key = match existing {
            Some(key) => key,
            None => {
                log::debug!("mount {path}");
                let key = groups.insert(Group {
                    path: path.clone(),
                    depth,
                    slots: Vec::new(),
                    scope: Scope::new(path.clone()),
                    epoch,
                });
                self.index.borrow_mut().insert(path.clone(), key);
                key
            }
        };

        let scope = match groups.get_mut(key) {
            Some(group) => {
                group.epoch = epoch;
                group.scope.clone()
            }
            None => Scope::new(path.clone()),
        };

        frames.push(Frame {
            group: key,
            path,
            depth,
            cursor: 0,
            children: 0,
        });
        scope
    }

    fn exit(&self) {
        self.frames.borrow_mut().pop();
    }

    fn remember<T: 'static>(&self, init: impl FnOnce() -> T) -> Rc<T> {
        let position = {
            let mut frames = self.frames.borrow_mut();
            frames.last_mut().map(|frame| {
                let cursor = frame.cursor;
                frame.cursor += 1;
                (frame.group, cursor)
            })
        };
        let Some((key, cursor)) = position else {
            return Rc::new(init());
        };

        if let Some(group) = self.groups.borrow().get(key)
            && let Some(slot) = group.slots.get(cursor)
        {
            if let Some(rc) = slot.downcast_ref::<Rc<T>>() {
                return rc.clone();
            }
            log::warn!(
                "remember: slot {cursor} of {} changed type; replacing. \
                 If this is due to conditional composition, wrap the branch in its own group.",
                group.path
            );
        }

        // `init` may itself compose, so no borrow is held while it runs.
        let rc = Rc::new(init());
        if let Some(group) = self.groups.borrow_mut().get_mut(key) {
            match group.slots.get_mut(cursor) {
                Some(slot) => *slot = Box::new(rc.clone()),
                None => group.slots.push(Box::new(rc.clone())),
            }
        }
        rc
    }

    /// Keeps every group below the current one alive for this pass.
    fn retain_descendants(&self) {
        let Some((prefix, depth)) = self
            .frames
            .borrow()
            .last()
            .map(|frame| (format!("{}/", frame.path), frame.depth))
        else {
            return;
        };
        let epoch = self.epoch.get();
        for (_, group) in self.groups.borrow_mut().iter_mut() {
            if group.depth > depth && group.path.starts_with(&prefix) {
                group.epoch = epoch;
            }
        }
    }

    fn sweep(&self) {
        let epoch = self.epoch.get();
        let mut stale: Vec<Group> = {
            let mut groups = self.groups.borrow_mut();
            let keys: Vec<GroupKey> = groups
                .iter()
                .filter(|(_, group)| group.epoch != epoch)
                .map(|(key, _)| key)
                .collect();
            keys.into_iter().filter_map(|key| groups.remove(key)).collect()
        };
        if stale.is_empty() {
            return;
        }

        // Children before parents.
        stale.sort_by(|a, b| b.depth.cmp(&a.depth));
        {
            let mut index = self.index.borrow_mut();
            for group in &stale {
                index.remove(&group.path);
            }
        }
        for group in &stale {
            log::debug!("unmount {}", group.path);
            group.scope.dispose();
        }
    }

    fn unmount_all(&self) {
        self.epoch.set(self.epoch.get() + 1);
        self.after_commit.borrow_mut().clear();
        self.sweep();
    }

    fn flush_after_commit(&self) {
        loop {
            let effects = std::mem::take(&mut *self.after_commit.borrow_mut());
            if effects.is_empty() {
                break;
            }
            for effect in effects {
                effect();
            }
        }
    }
}

fn active() -> Option<Rc<Composer>> {
    ACTIVE.with(|a| a.borrow().clone())
}

fn with_active<R>(composer: &Rc<Composer>, f: impl FnOnce() -> R) -> R {
    struct Restore(Option<Rc<Composer>>);
    impl Drop for Restore {
        fn drop(&mut self) {
            let prev = self.0.take();
            ACTIVE.with(|a| *a.borrow_mut() = prev);
        }
    }

    let prev = ACTIVE.with(|a| a.borrow_mut().replace(composer.clone()));
    let _restore = Restore(prev);
    f()
}

/// Opens a component group. Groups are identified by their position under
/// the parent plus `label`; a group that is not entered during a pass is
/// unmounted at the end of it.
pub fn group<R>(label: &str, f: impl FnOnce() -> R) -> R {
    let Some(composer) = active() else {
        return f();
    };

    struct Exit(Rc<Composer>);
    impl Drop for Exit {
        fn drop(&mut self) {
            self.0.exit();
        }
    }

    let scope = composer.enter(label);
    let _exit = Exit(composer);
    scope.run(f)
}

/// Slot-based remember (sequential composition only): the Nth call inside a
/// group always refers to the Nth stored value.
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Rc<T> {
    match active() {
        Some(composer) => composer.remember(init),
        None => {
            log::trace!("remember outside a composition; value is not retained");
            Rc::new(init())
        }
    }
}

pub fn remember_state<T: 'static>(init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
    remember(|| RefCell::new(init()))
}

pub(crate) fn retain_descendants() {
    if let Some(composer) = active() {
        composer.retain_descendants();
    }
}

pub(crate) fn queue_after_commit(effect: Box<dyn FnOnce()>) {
    match active() {
        Some(composer) => composer.after_commit.borrow_mut().push(effect),
        None => effect(),
    }
}

/// Marks the composition that created it as needing another pass.
#[derive(Clone)]
pub struct Invalidator {
    dirty: Weak<Cell<bool>>,
}

impl Invalidator {
    pub fn invalidate(&self) {
        match self.dirty.upgrade() {
            Some(dirty) => dirty.set(true),
            None => log::trace!("invalidate: composition already dropped"),
        }
    }
}

impl std::fmt::Debug for Invalidator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invalidator")
            .field("live", &(self.dirty.strong_count() > 0))
            .finish()
    }
}

/// Invalidation handle for the composition currently running, if any.
pub fn invalidator() -> Option<Invalidator> {
    active().map(|composer| Invalidator {
        dirty: Rc::downgrade(&composer.dirty),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompositionConfig {
    /// Upper bound on passes `settle` runs before giving up.
    pub max_passes: usize,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self { max_passes: 16 }
    }
}

impl CompositionConfig {
    pub fn max_passes(mut self, max_passes: usize) -> Self {
        self.max_passes = max_passes;
        self
    }
}

/// A mounted component tree driven by repeated composition passes.
pub struct Composition {
    composer: Rc<Composer>,
    root: Box<dyn Fn() -> View>,
    config: CompositionConfig,
    view: Option<View>,
}

impl Composition {
    pub fn new(root: impl Fn() -> View + 'static) -> Self {
        Self {
            composer: Rc::new(Composer::default()),
            root: Box::new(root),
            config: CompositionConfig::default(),
            view: None,
        }
    }

    pub fn with_config(mut self, config: CompositionConfig) -> Self {
        self.config = config;
        self
    }

    /// Runs one pass unconditionally.
    pub fn compose(&mut self) -> &View {
        let view = self.composer.pass(&*self.root);
        self.view.insert(view)
    }

    /// Recomposes until nothing is invalidated. Fails with
    /// `ComposeError::Reentrant` when called from inside a pass.
    pub fn settle(&mut self) -> Result<&View, ComposeError> {
        if active().is_some() {
            return Err(ComposeError::Reentrant);
        }
        let mut passes = 0;
        while self.view.is_none() || self.is_dirty() {
            if passes == self.config.max_passes {
                return Err(ComposeError::Unsettled { passes });
            }
            self.compose();
            passes += 1;
        }
        self.view.as_ref().ok_or(ComposeError::NothingComposed)
    }

    pub fn is_dirty(&self) -> bool {
        self.composer.dirty.get()
    }

    pub fn view(&self) -> Option<&View> {
        self.view.as_ref()
    }

    /// Clicks the first button labelled `label` in the last composed view,
    /// then settles.
    pub fn click(&mut self, label: &str) -> Result<&View, ComposeError> {
        let on_click: Callback = self
            .view
            .as_ref()
            .ok_or(ComposeError::NothingComposed)?
            .find_button(label)
            .ok_or_else(|| ComposeError::NoSuchTarget(label.to_owned()))?;
        on_click();
        self.settle()
    }

    /// Unmounts every group, running all pending cleanups.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.view = None;
        self.composer.unmount_all();
    }
}

impl Drop for Composition {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::view::{Fragment, Text};

    #[test]
    fn remember_is_stable_across_passes() {
        let inits = Rc::new(Cell::new(0));
        let seen = Rc::new(RefCell::new(Vec::new()));
        let (i, s) = (inits.clone(), seen.clone());
        let mut composition = Composition::new(move || {
            let value = remember(|| {
                i.set(i.get() + 1);
                Cell::new(0)
            });
            value.set(value.get() + 1);
            s.borrow_mut().push(value.get());
            Text("x")
        });

        composition.compose();
        composition.compose();
        composition.compose();
        assert_eq!(inits.get(), 1);
        assert_eq!(*seen.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn groups_unmount_when_skipped() {
        let show = Rc::new(Cell::new(true));
        let unmounted = Rc::new(Cell::new(0));
        let (sh, u) = (show.clone(), unmounted.clone());
        let mut composition = Composition::new(move || {
            if sh.get() {
                let u = u.clone();
                group("child", move || {
                    crate::on_mount(move || crate::on_unmount(move || u.set(u.get() + 1)));
                    Text("child")
                })
            } else {
                Fragment(Vec::new())
            }
        });

        composition.compose();
        composition.compose();
        assert_eq!(unmounted.get(), 0);
        show.set(false);
        composition.compose();
        assert_eq!(unmounted.get(), 1);
    }

    #[test]
    fn mount_effects_run_after_the_pass() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let l = log.clone();
        let mut composition = Composition::new(move || {
            let l = l.clone();
            group("leaf", move || {
                let inner = l.clone();
                crate::on_mount(move || {
                    inner.borrow_mut().push("mounted");
                    crate::Dispose::noop()
                });
                l.borrow_mut().push("rendered");
                Text("leaf")
            })
        });

        composition.compose();
        composition.compose();
        assert_eq!(*log.borrow(), vec!["rendered", "mounted", "rendered"]);
    }

    #[test]
    fn settle_stops_at_max_passes() {
        let mut composition = Composition::new(|| {
            if let Some(inv) = invalidator() {
                inv.invalidate();
            }
            Text("loop")
        })
        .with_config(CompositionConfig::default().max_passes(3));

        assert!(matches!(
            composition.settle(),
            Err(ComposeError::Unsettled { passes: 3 })
        ));
    }

    #[test]
    fn settling_inside_a_pass_is_reentrant() {
        let outcome = Rc::new(Cell::new(None));
        let o = outcome.clone();
        let mut outer = Composition::new(move || {
            let mut inner = Composition::new(|| Text("inner"));
            o.set(Some(matches!(inner.settle(), Err(ComposeError::Reentrant))));
            Text("outer")
        });
        outer.compose();
        assert_eq!(outcome.get(), Some(true));
        assert!(outer.settle().is_ok());
    }

    #[test]
    fn click_without_target_errors() {
        let mut composition = Composition::new(|| Text("no buttons"));
        assert!(matches!(
            composition.click("go"),
            Err(ComposeError::NothingComposed)
        ));
        composition.compose();
        assert!(matches!(
            composition.click("go"),
            Err(ComposeError::NoSuchTarget(label)) if label == "go"
        ));
    }

    #[test]
    fn unmount_disposes_everything() {
        let cleaned = Rc::new(Cell::new(false));
        let c = cleaned.clone();
        let mut composition = Composition::new(move || {
            let c = c.clone();
            crate::on_mount(move || crate::on_unmount(move || c.set(true)));
            Text("root")
        });
        composition.compose();
        assert!(!cleaned.get());
        composition.unmount();
        assert!(cleaned.get());
    }
}
