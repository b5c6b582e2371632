use std::cell::RefCell;
use std::rc::Rc;

/// Receiver of a live instance: acquired once after mount, released once
/// on unmount.
pub trait Acquire<T>: 'static {
    fn acquire(&self, value: T);
    fn release(&self);
}

pub type LiveRef<T> = Rc<dyn Acquire<T>>;

/// Mutable holder; empty before mount and after unmount.
pub struct LiveCell<T>(Rc<RefCell<Option<T>>>);

impl<T> Clone for LiveCell<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> Default for LiveCell<T> {
    fn default() -> Self {
        Self(Rc::new(RefCell::new(None)))
    }
}

impl<T: Clone> LiveCell<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<T> {
        self.0.borrow().clone()
    }

    pub fn is_set(&self) -> bool {
        self.0.borrow().is_some()
    }
}

impl<T: 'static> Acquire<T> for LiveCell<T> {
    fn acquire(&self, value: T) {
        *self.0.borrow_mut() = Some(value);
    }

    fn release(&self) {
        self.0.borrow_mut().take();
    }
}

/// Callback receiver: called with `Some(value)` on acquire and `None` on
/// release.
pub struct CallbackRef<T>(Rc<dyn Fn(Option<T>)>);

impl<T> Clone for CallbackRef<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> CallbackRef<T> {
    pub fn new(f: impl Fn(Option<T>) + 'static) -> Self {
        Self(Rc::new(f))
    }
}

impl<T: 'static> Acquire<T> for CallbackRef<T> {
    fn acquire(&self, value: T) {
        (self.0)(Some(value))
    }

    fn release(&self) {
        (self.0)(None)
    }
}
