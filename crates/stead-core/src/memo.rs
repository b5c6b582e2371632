use crate::context::{ContextRead, replay_reads, track_reads};
use crate::runtime::{group, remember_state, retain_descendants};
use crate::view::View;

struct Cached<P> {
    props: P,
    view: View,
    reads: Vec<ContextRead>,
}

/// Memoized component call.
///
/// `render` runs on first composition, whenever `equality(previous, next)`
/// returns false, and whenever a context the last render read from an
/// enclosing provider now holds a different value. Otherwise the cached view
/// is returned and the subtree the last render produced stays mounted.
pub fn memo<P: 'static>(
    label: &str,
    props: P,
    equality: &dyn Fn(&P, &P) -> bool,
    render: impl FnOnce(&P) -> View,
) -> View {
    group(label, move || {
        let cache = remember_state(|| None::<Cached<P>>);

        let fresh = match cache.borrow().as_ref() {
            Some(cached)
                if equality(&cached.props, &props)
                    && cached.reads.iter().all(ContextRead::unchanged) =>
            {
                Some((cached.view.clone(), cached.reads.clone()))
            }
            _ => None,
        };
        if let Some((view, reads)) = fresh {
            log::trace!("memo '{label}': props unchanged, skipping render");
            retain_descendants();
            replay_reads(&reads);
            return view;
        }

        let (view, reads) = track_reads(|| render(&props));
        *cache.borrow_mut() = Some(Cached {
            props,
            view: view.clone(),
            reads,
        });
        view
    })
}
