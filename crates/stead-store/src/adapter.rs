use std::rc::Rc;

use stead_core::{View, memo};

use crate::record::Record;

/// Decides whether a wrapped component may skip rendering.
pub type Equality<P> = Rc<dyn Fn(&P, &P) -> bool>;

/// Default equality: field-by-field comparison of the merged props.
pub fn shallow_equal<P: Record>(a: &P, b: &P) -> bool {
    a.shallow_eq(b)
}

/// Entry point for adapters over one source reader.
pub struct AdapterFactory<T> {
    reader: Rc<dyn Fn() -> T>,
}

impl<T> Clone for AdapterFactory<T> {
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
        }
    }
}

pub fn create_adapter<T: 'static>(reader: impl Fn() -> T + 'static) -> AdapterFactory<T> {
    AdapterFactory {
        reader: Rc::new(reader),
    }
}

/// Identity adapter over `reader`: the wrapped component gets the source
/// value itself, with its own props layered on top.
pub fn map_props<T: Record>(reader: impl Fn() -> T + 'static) -> Adapter<T, T> {
    create_adapter(reader).identity()
}

impl<T: 'static> AdapterFactory<T> {
    pub fn identity(&self) -> Adapter<T, T>
    where
        T: Record,
    {
        self.project(|source: &T, _own: &T::Patch| source.clone())
    }

    /// `projector(source, own)` computes the props to inject.
    pub fn project<P: Record>(
        &self,
        projector: impl Fn(&T, &P::Patch) -> P + 'static,
    ) -> Adapter<T, P> {
        Adapter {
            reader: self.reader.clone(),
            projector: Rc::new(projector),
            equality: Rc::new(shallow_equal::<P>),
        }
    }
}

/// Projects a source value into a component's props.
///
/// The component's own props are a `P::Patch`: whatever fields the caller
/// supplies win over the injected ones.
pub struct Adapter<T, P: Record> {
    reader: Rc<dyn Fn() -> T>,
    projector: Rc<dyn Fn(&T, &P::Patch) -> P>,
    equality: Equality<P>,
}

impl<T, P: Record> Clone for Adapter<T, P> {
    fn clone(&self) -> Self {
        Self {
            reader: self.reader.clone(),
            projector: self.projector.clone(),
            equality: self.equality.clone(),
        }
    }
}

impl<T: 'static, P: Record> Adapter<T, P> {
    pub fn with_equality(mut self, equality: impl Fn(&P, &P) -> bool + 'static) -> Self {
        self.equality = Rc::new(equality);
        self
    }

    /// Injected props with `own` layered on top.
    pub fn props(&self, own: &P::Patch) -> P {
        let source = (self.reader)();
        (self.projector)(&source, own).merge(own)
    }

    pub fn wrap(&self, component: impl Fn(&P) -> View + 'static) -> Wrapped<T, P> {
        Wrapped {
            adapter: self.clone(),
            component: Rc::new(component),
        }
    }
}

/// A component bound to an adapter. Each call composes a memoized group
/// that renders only when the merged props change under the adapter's
/// equality.
pub struct Wrapped<T, P: Record> {
    adapter: Adapter<T, P>,
    component: Rc<dyn Fn(&P) -> View>,
}

impl<T, P: Record> Clone for Wrapped<T, P> {
    fn clone(&self) -> Self {
        Self {
            adapter: self.adapter.clone(),
            component: self.component.clone(),
        }
    }
}

impl<T: 'static, P: Record> Wrapped<T, P> {
    pub fn render(&self, own: P::Patch) -> View {
        let props = self.adapter.props(&own);
        let component = self.component.clone();
        memo("Adapter", props, &*self.adapter.equality, move |props| {
            component(props)
        })
    }

    /// Renders with no own props.
    pub fn show(&self) -> View {
        self.render(P::Patch::default())
    }
}
