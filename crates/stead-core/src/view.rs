#![allow(non_snake_case)]
use std::rc::Rc;

pub type Callback = Rc<dyn Fn()>;

#[derive(Clone)]
pub enum ViewKind {
    Empty,
    Fragment,
    Text(String),
    Button {
        label: String,
        on_click: Option<Callback>,
    },
}

impl std::fmt::Debug for ViewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewKind::Empty => write!(f, "Empty"),
            ViewKind::Fragment => write!(f, "Fragment"),
            ViewKind::Text(text) => f.debug_tuple("Text").field(text).finish(),
            ViewKind::Button { label, on_click } => f
                .debug_struct("Button")
                .field("label", label)
                .field("on_click", &on_click.as_ref().map(|_| "<callback>"))
                .finish(),
        }
    }
}

/// Render node produced by a component.
#[derive(Clone, Debug)]
pub struct View {
    pub kind: ViewKind,
    pub children: Vec<View>,
}

impl View {
    pub fn new(kind: ViewKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    pub fn with_children(mut self, children: Vec<View>) -> Self {
        self.children = children;
        self
    }

    /// Depth-first search for the first button with this label.
    pub fn find_button(&self, label: &str) -> Option<Callback> {
        if let ViewKind::Button {
            label: l,
            on_click: Some(cb),
        } = &self.kind
            && l == label
        {
            return Some(cb.clone());
        }
        self.children.iter().find_map(|c| c.find_button(label))
    }

    /// All text content in depth-first order.
    pub fn texts(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_texts(&mut out);
        out
    }

    fn collect_texts<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let ViewKind::Text(text) = &self.kind {
            out.push(text);
        }
        for child in &self.children {
            child.collect_texts(out);
        }
    }
}

pub fn Empty() -> View {
    View::new(ViewKind::Empty)
}

pub fn Fragment(children: Vec<View>) -> View {
    View::new(ViewKind::Fragment).with_children(children)
}

pub fn Text(text: impl Into<String>) -> View {
    View::new(ViewKind::Text(text.into()))
}

pub fn Button(label: impl Into<String>, on_click: impl Fn() + 'static) -> View {
    View::new(ViewKind::Button {
        label: label.into(),
        on_click: Some(Rc::new(on_click)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn find_button_searches_depth_first() {
        let hits = Rc::new(Cell::new(0));
        let h = hits.clone();
        let view = Fragment(vec![
            Text("title"),
            Fragment(vec![Button("go", move || h.set(h.get() + 1))]),
        ]);

        let cb = view.find_button("go").expect("button");
        cb();
        assert_eq!(hits.get(), 1);
        assert!(view.find_button("stop").is_none());
        assert_eq!(view.texts(), vec!["title"]);
    }
}
