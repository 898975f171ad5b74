use std::any::Any;
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::collections::FastMap;
use crate::composition::with_current_composer;

pub(crate) type LocalKey = usize;

static NEXT_LOCAL_KEY: AtomicUsize = AtomicUsize::new(1);

fn next_local_key() -> LocalKey {
    NEXT_LOCAL_KEY.fetch_add(1, Ordering::Relaxed)
}

#[derive(Clone)]
pub(crate) struct LocalEntry {
    value: Rc<dyn Any>,
    same: fn(&dyn Any, &dyn Any) -> bool,
}

fn same_value<T: PartialEq + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<T>(), b.downcast_ref::<T>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

/// The composition locals visible at one point of the tree.
#[derive(Clone, Default)]
pub(crate) struct LocalMap {
    values: Rc<FastMap<LocalKey, LocalEntry>>,
}

impl LocalMap {
    fn get<T: Clone + 'static>(&self, key: LocalKey) -> Option<T> {
        self.values
            .get(&key)
            .and_then(|entry| entry.value.downcast_ref::<T>())
            .cloned()
    }

    pub(crate) fn extended(&self, provided: Vec<ProvidedValue>) -> LocalMap {
        let mut values = (*self.values).clone();
        for ProvidedValue { key, entry } in provided {
            values.insert(key, entry);
        }
        LocalMap {
            values: Rc::new(values),
        }
    }

    pub(crate) fn same_as(&self, other: &LocalMap) -> bool {
        if Rc::ptr_eq(&self.values, &other.values) {
            return true;
        }
        self.values.len() == other.values.len()
            && self.values.iter().all(|(key, entry)| {
                other
                    .values
                    .get(key)
                    .is_some_and(|theirs| (entry.same)(&*entry.value, &*theirs.value))
            })
    }
}

pub struct ProvidedValue {
    key: LocalKey,
    entry: LocalEntry,
}

/// A value propagated implicitly to every scope composed beneath a
/// [`CompositionLocalProvider`]. Reads outside any provider fall back to the
/// local's default.
///
/// Scopes whose visible locals change are re-rendered even when their element
/// is unchanged; equality of provided values decides what counts as a change.
pub struct CompositionLocal<T: Clone + PartialEq + 'static> {
    key: LocalKey,
    default: Rc<dyn Fn() -> T>,
}

impl<T: Clone + PartialEq + 'static> Clone for CompositionLocal<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            default: Rc::clone(&self.default),
        }
    }
}

impl<T: Clone + PartialEq + 'static> PartialEq for CompositionLocal<T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl<T: Clone + PartialEq + 'static> Eq for CompositionLocal<T> {}

impl<T: Clone + PartialEq + 'static> CompositionLocal<T> {
    pub fn provides(&self, value: T) -> ProvidedValue {
        ProvidedValue {
            key: self.key,
            entry: LocalEntry {
                value: Rc::new(value),
                same: same_value::<T>,
            },
        }
    }

    pub fn current(&self) -> T {
        with_current_composer(|composer| composer.read_composition_local(self))
    }

    pub fn default_value(&self) -> T {
        (self.default)()
    }

    pub(crate) fn lookup(&self, locals: &LocalMap) -> T {
        locals
            .get::<T>(self.key)
            .unwrap_or_else(|| self.default_value())
    }
}

#[allow(non_snake_case)]
pub fn compositionLocalOf<T: Clone + PartialEq + 'static>(
    default: impl Fn() -> T + 'static,
) -> CompositionLocal<T> {
    CompositionLocal {
        key: next_local_key(),
        default: Rc::new(default),
    }
}

#[allow(non_snake_case)]
pub fn CompositionLocalProvider(
    values: impl IntoIterator<Item = ProvidedValue>,
    content: impl FnOnce(),
) {
    let provided: Vec<ProvidedValue> = values.into_iter().collect();
    with_current_composer(|composer| composer.with_composition_locals(provided, content));
}
