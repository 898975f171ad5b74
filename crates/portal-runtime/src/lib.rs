//! Single-threaded component runtime: scopes, remembered state, composition
//! locals and effects.

extern crate self as portal_runtime;

pub mod collections;
pub mod composition;
pub mod effect;
pub mod element;
pub mod error;
pub mod local;
pub mod owned;
pub mod platform;
pub mod runtime;
mod scope;
pub mod state;

pub use composition::{with_current_composer, Composer, Composition};
pub use effect::{
    LayoutEffect, SideEffect, __disposable_effect_impl, DisposableEffectResult,
    DisposableEffectScope,
};
pub use element::Element;
pub use error::RuntimeError;
pub use local::{compositionLocalOf, CompositionLocal, CompositionLocalProvider, ProvidedValue};
pub use owned::Owned;
pub use platform::RuntimeScheduler;
pub use runtime::{DefaultScheduler, Runtime, RuntimeConfig, RuntimeHandle};
pub use scope::ChildKey;
pub use state::{MutableState, SetStateAction};

/// Keep a value across renders of the current scope. `init` runs on the
/// first render only.
pub fn remember<T: 'static>(init: impl FnOnce() -> T) -> Owned<T> {
    with_current_composer(|composer| composer.remember(init))
}

/// State owned by the current scope. Writes re-render that scope.
#[allow(non_snake_case)]
pub fn mutableStateOf<T: 'static>(initial: T) -> MutableState<T> {
    with_current_composer(|composer| {
        MutableState::owned_by(initial, &composer.owner_scope(), composer.runtime_handle())
    })
}

#[allow(non_snake_case)]
pub fn useState<T: 'static>(init: impl FnOnce() -> T) -> MutableState<T> {
    remember(|| mutableStateOf(init())).get()
}

/// Emit a text leaf into the current scope.
#[allow(non_snake_case)]
pub fn Text(label: impl Into<String>) {
    let label = label.into();
    with_current_composer(|composer| composer.emit_text(label));
}

#[cfg(test)]
#[path = "tests/composition_tests.rs"]
mod tests;
