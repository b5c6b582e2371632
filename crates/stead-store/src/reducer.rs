use std::borrow::Cow;
use std::rc::Rc;

use crate::record::Record;

/// A state transition request.
///
/// `With` computes its patch from the current state at dispatch time;
/// returning `None` makes the update a no-op.
pub enum Update<S: Record> {
    Patch(S::Patch),
    With(Rc<dyn Fn(&S) -> Option<S::Patch>>),
    Skip,
}

impl<S: Record> Update<S> {
    pub fn patch(patch: S::Patch) -> Self {
        Update::Patch(patch)
    }

    pub fn with(f: impl Fn(&S) -> Option<S::Patch> + 'static) -> Self {
        Update::With(Rc::new(f))
    }

    pub fn skip() -> Self {
        Update::Skip
    }
}

impl<S: Record> Clone for Update<S> {
    fn clone(&self) -> Self {
        match self {
            Update::Patch(patch) => Update::Patch(patch.clone()),
            Update::With(f) => Update::With(f.clone()),
            Update::Skip => Update::Skip,
        }
    }
}

impl<S: Record> std::fmt::Debug for Update<S>
where
    S::Patch: std::fmt::Debug,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Update::Patch(patch) => f.debug_tuple("Patch").field(patch).finish(),
            Update::With(_) => write!(f, "With(<fn>)"),
            Update::Skip => write!(f, "Skip"),
        }
    }
}

/// Merge reducer.
///
/// Returns the same `Rc` when the update yields no patch, and a fresh one
/// holding `state` with the patch's fields overwritten otherwise.
pub fn reduce<S: Record>(state: &Rc<S>, update: &Update<S>) -> Rc<S> {
    let candidate = match update {
        Update::Patch(patch) => Some(Cow::Borrowed(patch)),
        Update::With(f) => f(&**state).map(Cow::Owned),
        Update::Skip => None,
    };

    match candidate {
        Some(patch) => Rc::new(state.merge(&patch)),
        None => Rc::clone(state),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::record! {
        #[derive(PartialEq)]
        struct Flags => FlagsPatch {
            on: bool,
            disabled: bool,
            hits: u32,
        }
    }

    fn initial() -> Rc<Flags> {
        Rc::new(Flags {
            on: false,
            disabled: false,
            hits: 0,
        })
    }

    #[test]
    fn skip_keeps_identity() {
        let state = initial();
        assert!(Rc::ptr_eq(&state, &reduce(&state, &Update::skip())));
    }

    #[test]
    fn function_returning_none_keeps_identity() {
        let state = initial();
        let next = reduce(&state, &Update::<Flags>::with(|_| None));
        assert!(Rc::ptr_eq(&state, &next));
    }

    #[test]
    fn patch_overwrites_keys_and_makes_new_reference() {
        let state = initial();
        let next = reduce(&state, &Update::patch(FlagsPatch::default().on(true)));
        assert!(!Rc::ptr_eq(&state, &next));
        assert_eq!(
            *next,
            Flags {
                on: true,
                disabled: false,
                hits: 0
            }
        );
        assert_eq!(*state, *initial());
    }

    #[test]
    fn empty_patch_still_makes_new_reference() {
        let state = initial();
        let next = reduce(&state, &Update::patch(FlagsPatch::default()));
        assert!(!Rc::ptr_eq(&state, &next));
        assert_eq!(*next, *state);
    }

    #[test]
    fn function_update_matches_its_patch() {
        let state = Rc::new(Flags {
            on: true,
            disabled: false,
            hits: 4,
        });
        let bump = |s: &Flags| Some(FlagsPatch::default().hits(s.hits + 1).on(!s.on));

        let via_fn = reduce(&state, &Update::with(bump));
        let via_patch = match bump(&*state) {
            Some(patch) => reduce(&state, &Update::patch(patch)),
            None => state.clone(),
        };
        assert_eq!(*via_fn, *via_patch);
        assert_eq!(via_fn.hits, 5);
        assert!(!via_fn.on);
    }
}
