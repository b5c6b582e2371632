use std::collections::BTreeMap;

/// A value that can be updated by shallow key overwrite.
///
/// `Patch` carries any subset of the record's fields; `merge` copies the
/// present ones over a clone of `self` and keeps the rest. `shallow_eq`
/// compares field by field, which is what adapters use by default to decide
/// whether a consumer needs to render again.
pub trait Record: Clone + 'static {
    type Patch: Clone + Default + PartialEq + 'static;

    const FIELDS: &'static [&'static str];

    fn merge(&self, patch: &Self::Patch) -> Self;

    /// Builds a record from a patch alone, with nothing to merge over.
    fn from_patch(patch: &Self::Patch) -> Option<Self>;

    fn shallow_eq(&self, other: &Self) -> bool;

    fn keys(&self) -> Vec<String> {
        Self::FIELDS.iter().map(|f| (*f).to_owned()).collect()
    }
}

/// Declares a record struct together with its patch type.
///
/// ```rust
/// use stead_store::{Record, record};
///
/// record! {
///     #[derive(PartialEq)]
///     pub struct Toggle => TogglePatch {
///         pub is_on: bool,
///         pub is_disabled: bool,
///     }
/// }
///
/// let state = Toggle { is_on: false, is_disabled: false };
/// let next = state.merge(&TogglePatch::default().is_on(true));
/// assert_eq!(next, Toggle { is_on: true, is_disabled: false });
/// assert_eq!(Toggle::FIELDS, ["is_on", "is_disabled"]);
/// ```
///
/// The struct derives `Clone` and `Debug`; the patch additionally derives
/// `Default` and `PartialEq` and gets one builder method per field. Field
/// types must implement `Default`: a record built from a patch alone
/// starts every missing field from its default.
#[macro_export]
macro_rules! record {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident => $patch:ident {
            $( $(#[$fmeta:meta])* $fvis:vis $field:ident : $ty:ty ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Debug)]
        $vis struct $name {
            $( $(#[$fmeta])* $fvis $field: $ty, )*
        }

        #[doc = concat!("Partial update for [`", stringify!($name), "`]; `None` fields are left untouched.")]
        #[derive(Clone, Debug, Default, PartialEq)]
        $vis struct $patch {
            $( $fvis $field: ::core::option::Option<$ty>, )*
        }

        impl $patch {
            $(
                #[must_use]
                $fvis fn $field(mut self, value: $ty) -> Self {
                    self.$field = ::core::option::Option::Some(value);
                    self
                }
            )*
        }

        impl $crate::Record for $name {
            type Patch = $patch;

            const FIELDS: &'static [&'static str] = &[$(stringify!($field)),*];

            fn merge(&self, patch: &$patch) -> Self {
                Self {
                    $(
                        $field: match &patch.$field {
                            ::core::option::Option::Some(value) => ::core::clone::Clone::clone(value),
                            ::core::option::Option::None => ::core::clone::Clone::clone(&self.$field),
                        },
                    )*
                }
            }

            fn from_patch(patch: &$patch) -> ::core::option::Option<Self> {
                ::core::option::Option::Some(Self {
                    $( $field: ::core::clone::Clone::clone(&patch.$field).unwrap_or_default(), )*
                })
            }

            fn shallow_eq(&self, other: &Self) -> bool {
                true $( && self.$field == other.$field )*
            }
        }
    };
}

impl Record for () {
    type Patch = ();

    const FIELDS: &'static [&'static str] = &[];

    fn merge(&self, _patch: &()) -> Self {}

    fn from_patch(_patch: &()) -> Option<Self> {
        Some(())
    }

    fn shallow_eq(&self, _other: &Self) -> bool {
        true
    }
}

/// `None` stands for "nothing published". An empty patch leaves it `None`;
/// any other patch builds the record from the patch alone.
impl<R: Record> Record for Option<R> {
    type Patch = R::Patch;

    const FIELDS: &'static [&'static str] = R::FIELDS;

    fn merge(&self, patch: &R::Patch) -> Self {
        match self {
            Some(record) => Some(record.merge(patch)),
            None if *patch == R::Patch::default() => None,
            None => R::from_patch(patch),
        }
    }

    fn from_patch(patch: &R::Patch) -> Option<Self> {
        Some(Self::merge(&None, patch))
    }

    fn shallow_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Some(a), Some(b)) => a.shallow_eq(b),
            (None, None) => true,
            _ => false,
        }
    }

    fn keys(&self) -> Vec<String> {
        self.as_ref().map(Record::keys).unwrap_or_default()
    }
}

/// Dynamic records: every key of the patch map overwrites the same key.
impl<K, V> Record for BTreeMap<K, V>
where
    K: Ord + Clone + ToString + 'static,
    V: Clone + PartialEq + 'static,
{
    type Patch = BTreeMap<K, V>;

    const FIELDS: &'static [&'static str] = &[];

    fn merge(&self, patch: &Self::Patch) -> Self {
        let mut next = self.clone();
        next.extend(patch.iter().map(|(k, v)| (k.clone(), v.clone())));
        next
    }

    fn from_patch(patch: &Self::Patch) -> Option<Self> {
        Some(patch.clone())
    }

    fn shallow_eq(&self, other: &Self) -> bool {
        self == other
    }

    fn keys(&self) -> Vec<String> {
        BTreeMap::keys(self).map(ToString::to_string).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::record! {
        #[derive(PartialEq)]
        struct Point => PointPatch {
            x: i32,
            y: i32,
            label: String,
        }
    }

    #[test]
    fn merge_overwrites_only_patched_fields() {
        let p = Point {
            x: 1,
            y: 2,
            label: "a".into(),
        };
        let q = p.merge(&PointPatch::default().y(5));
        assert_eq!(
            q,
            Point {
                x: 1,
                y: 5,
                label: "a".into()
            }
        );
        assert_eq!(p.merge(&PointPatch::default()), p);
    }

    #[test]
    fn shallow_eq_compares_fields() {
        let p = Point {
            x: 1,
            y: 2,
            label: "a".into(),
        };
        assert!(p.shallow_eq(&p.clone()));
        assert!(!p.shallow_eq(&p.merge(&PointPatch::default().label("b".into()))));
        assert_eq!(p.keys(), vec!["x", "y", "label"]);
    }

    #[test]
    fn option_records_stay_empty_under_an_empty_patch() {
        let none: Option<Point> = None;
        assert!(none.merge(&PointPatch::default()).is_none());
        assert!(none.shallow_eq(&None));
        assert!(none.keys().is_empty());
    }

    #[test]
    fn patch_alone_builds_an_option_record() {
        let none: Option<Point> = None;
        assert_eq!(
            none.merge(&PointPatch::default().x(3)),
            Some(Point {
                x: 3,
                y: 0,
                label: String::new()
            })
        );
    }

    #[test]
    fn map_records_merge_by_key() {
        let mut state = BTreeMap::new();
        state.insert("a", 1);
        state.insert("b", 2);
        let mut patch = BTreeMap::new();
        patch.insert("b", 20);
        patch.insert("c", 30);

        let next = state.merge(&patch);
        assert_eq!(Record::keys(&next), vec!["a", "b", "c"]);
        assert_eq!(next.get("b"), Some(&20));
        assert_eq!(next.get("a"), Some(&1));
    }
}
