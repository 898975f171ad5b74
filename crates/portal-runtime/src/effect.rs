use std::hash::Hash;

use crate::collections::stable_hash;
use crate::composition::with_current_composer;
use crate::remember;

type Cleanup = Box<dyn FnOnce()>;

/// Keys and outstanding cleanup of one `DisposableEffect!` call site.
/// Dropping the slot, which happens when its scope leaves the composition,
/// runs the cleanup.
#[derive(Default)]
struct EffectSlot {
    keys: Option<u64>,
    cleanup: Option<Cleanup>,
}

impl EffectSlot {
    /// Store `keys` and report whether they differ from the previous run.
    fn rekey(&mut self, keys: u64) -> bool {
        self.keys.replace(keys) != Some(keys)
    }
}

impl Drop for EffectSlot {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

/// Handed to a `DisposableEffect!` body to build its result.
#[derive(Debug)]
pub struct DisposableEffectScope {
    _private: (),
}

impl DisposableEffectScope {
    pub fn on_dispose(&self, cleanup: impl FnOnce() + 'static) -> DisposableEffectResult {
        DisposableEffectResult(Some(Box::new(cleanup)))
    }
}

/// What a `DisposableEffect!` body leaves behind. The default value has no
/// cleanup.
#[derive(Default)]
pub struct DisposableEffectResult(Option<Cleanup>);

/// Run `effect` after the current render pass commits.
#[allow(non_snake_case)]
pub fn SideEffect(effect: impl FnOnce() + 'static) {
    with_current_composer(|composer| composer.register_side_effect(effect));
}

/// Run `effect` after the current render pass commits, before any
/// [`SideEffect`] registered in the same pass.
#[allow(non_snake_case)]
pub fn LayoutEffect(effect: impl FnOnce() + 'static) {
    with_current_composer(|composer| composer.register_layout_effect(effect));
}

#[doc(hidden)]
pub fn __disposable_effect_impl<K, F>(keys: K, effect: F)
where
    K: Hash,
    F: FnOnce(DisposableEffectScope) -> DisposableEffectResult + 'static,
{
    let keys = stable_hash(&keys);
    let slot = remember(EffectSlot::default);
    if !slot.update(|slot| slot.rekey(keys)) {
        return;
    }
    with_current_composer(|composer| {
        composer.register_side_effect(move || {
            let previous = slot.update(|slot| slot.cleanup.take());
            if let Some(previous) = previous {
                previous();
            }
            let DisposableEffectResult(cleanup) = effect(DisposableEffectScope { _private: () });
            slot.update(|slot| slot.cleanup = cleanup);
        })
    });
}

/// Run an effect whenever `keys` change and its `on_dispose` cleanup when the
/// keys change again or the calling scope leaves the composition.
#[macro_export]
macro_rules! DisposableEffect {
    ($keys:expr, $effect:expr) => {
        $crate::__disposable_effect_impl($keys, $effect)
    };
}
