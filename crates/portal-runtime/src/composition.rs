use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::collections::{fast_set, FastSet};
use crate::element::Element;
use crate::error::RuntimeError;
use crate::local::{CompositionLocal, LocalMap, ProvidedValue};
use crate::owned::Owned;
use crate::runtime::{DefaultScheduler, Runtime, RuntimeConfig, RuntimeHandle};
use crate::scope::{ChildKey, Output, ScopeId, ScopeInner, StaleSlots};

thread_local! {
    static CURRENT_COMPOSER: RefCell<Vec<Rc<Composer>>> = RefCell::new(Vec::new());
}

pub fn with_current_composer<R>(f: impl FnOnce(&Composer) -> R) -> R {
    let composer = CURRENT_COMPOSER
        .with(|stack| stack.borrow().last().cloned())
        .expect("no composer installed");
    f(&composer)
}

/// The scope whose body is executing right now, if any.
pub(crate) fn current_scope_id() -> Option<ScopeId> {
    CURRENT_COMPOSER
        .with(|stack| stack.borrow().last().cloned())
        .and_then(|composer| composer.current_scope())
        .map(|scope| scope.id())
}

struct Frame {
    scope: Rc<ScopeInner>,
    locals: LocalMap,
    next_ordinal: usize,
    visited: FastSet<ChildKey>,
}

type Effect = Box<dyn FnOnce()>;

/// Drives one render pass: tracks the scope being rendered and collects
/// everything that must happen when the pass commits.
pub struct Composer {
    runtime: RuntimeHandle,
    frames: RefCell<Vec<Frame>>,
    layout_effects: RefCell<Vec<Effect>>,
    side_effects: RefCell<Vec<Effect>>,
    removed: RefCell<Vec<Rc<ScopeInner>>>,
    stale_slots: RefCell<Vec<StaleSlots>>,
}

struct InstallGuard;

impl Drop for InstallGuard {
    fn drop(&mut self) {
        CURRENT_COMPOSER.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

impl Composer {
    fn new(runtime: RuntimeHandle) -> Rc<Self> {
        Rc::new(Self {
            runtime,
            frames: RefCell::new(Vec::new()),
            layout_effects: RefCell::new(Vec::new()),
            side_effects: RefCell::new(Vec::new()),
            removed: RefCell::new(Vec::new()),
            stale_slots: RefCell::new(Vec::new()),
        })
    }

    fn install<R>(self: &Rc<Self>, f: impl FnOnce(&Composer) -> R) -> R {
        CURRENT_COMPOSER.with(|stack| stack.borrow_mut().push(Rc::clone(self)));
        let _guard = InstallGuard;
        f(self.as_ref())
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.clone()
    }

    pub(crate) fn current_scope(&self) -> Option<Rc<ScopeInner>> {
        self.frames
            .borrow()
            .last()
            .map(|frame| Rc::clone(&frame.scope))
    }

    fn expect_scope(&self) -> Rc<ScopeInner> {
        self.current_scope()
            .expect("composable called outside of a component scope")
    }

    pub fn remember<T: 'static>(&self, init: impl FnOnce() -> T) -> Owned<T> {
        self.expect_scope().remember(init)
    }

    pub(crate) fn owner_scope(&self) -> Rc<ScopeInner> {
        self.expect_scope()
    }

    /// Compose `element` as the next child of the current scope, reusing the
    /// child scope that matches its key.
    pub fn compose_element(&self, element: &Element) {
        let resolved = {
            let mut frames = self.frames.borrow_mut();
            match frames.last_mut() {
                None => None,
                Some(frame) => {
                    let key = match element.key() {
                        Some(key) => ChildKey::Keyed(key.to_owned()),
                        None => {
                            let ordinal = frame.next_ordinal;
                            frame.next_ordinal += 1;
                            ChildKey::Ordinal(ordinal)
                        }
                    };
                    let fresh = frame.visited.insert(key.clone());
                    Some((Rc::clone(&frame.scope), frame.locals.clone(), key, fresh))
                }
            }
        };
        let Some((parent, locals, key, fresh)) = resolved else {
            log::warn!("element composed outside of a component scope was ignored");
            return;
        };
        if !fresh {
            self.runtime.record_warning(format!(
                "duplicate child key `{key}` in scope {}; later element ignored",
                parent.id()
            ));
            return;
        }
        parent.push_output(Output::Child(key.clone()));
        let child = match parent.child(&key) {
            Some(child) => child,
            None => {
                let child = ScopeInner::new(self.runtime.clone(), parent.depth() + 1);
                log::trace!("mounting scope {} at <{key}>", child.id());
                parent.insert_child(key, Rc::clone(&child));
                child
            }
        };
        if child.can_skip(element, &locals) {
            return;
        }
        self.render_scope(&child, element, locals);
    }

    fn render_scope(&self, scope: &Rc<ScopeInner>, element: &Element, locals: LocalMap) {
        log::trace!("rendering scope {}", scope.id());
        scope.begin_render(element, locals.clone());
        self.frames.borrow_mut().push(Frame {
            scope: Rc::clone(scope),
            locals,
            next_ordinal: 0,
            visited: fast_set(),
        });
        element.invoke();
        let frame = self.frames.borrow_mut().pop();
        self.stale_slots.borrow_mut().push(scope.trim_slots());
        if let Some(frame) = frame {
            for removed in scope.retain_children(&frame.visited) {
                removed.deactivate();
                self.removed.borrow_mut().push(removed);
            }
        }
    }

    fn rerender_scope(&self, scope: &Rc<ScopeInner>) {
        match scope.element() {
            Some(element) => self.render_scope(scope, &element, scope.locals()),
            None => log::trace!("scope {} has nothing to re-render", scope.id()),
        }
    }

    pub fn read_composition_local<T: Clone + PartialEq + 'static>(
        &self,
        local: &CompositionLocal<T>,
    ) -> T {
        let locals = self
            .frames
            .borrow()
            .last()
            .map(|frame| frame.locals.clone());
        match locals {
            Some(locals) => local.lookup(&locals),
            None => local.default_value(),
        }
    }

    pub fn with_composition_locals<R>(
        &self,
        provided: Vec<ProvidedValue>,
        content: impl FnOnce() -> R,
    ) -> R {
        let previous = {
            let mut frames = self.frames.borrow_mut();
            frames.last_mut().map(|frame| {
                let extended = frame.locals.extended(provided);
                std::mem::replace(&mut frame.locals, extended)
            })
        };
        let result = content();
        if let Some(previous) = previous {
            if let Some(frame) = self.frames.borrow_mut().last_mut() {
                frame.locals = previous;
            }
        }
        result
    }

    pub fn register_side_effect(&self, effect: impl FnOnce() + 'static) {
        self.side_effects.borrow_mut().push(Box::new(effect));
    }

    pub fn register_layout_effect(&self, effect: impl FnOnce() + 'static) {
        self.layout_effects.borrow_mut().push(Box::new(effect));
    }

    pub fn emit_text(&self, label: String) {
        self.expect_scope().push_output(Output::Text(label));
    }

    fn finish(&self) -> PendingCommit {
        PendingCommit {
            removed: std::mem::take(&mut *self.removed.borrow_mut()),
            stale_slots: std::mem::take(&mut *self.stale_slots.borrow_mut()),
            layout_effects: std::mem::take(&mut *self.layout_effects.borrow_mut()),
            side_effects: std::mem::take(&mut *self.side_effects.borrow_mut()),
        }
    }
}

struct PendingCommit {
    removed: Vec<Rc<ScopeInner>>,
    stale_slots: Vec<StaleSlots>,
    layout_effects: Vec<Effect>,
    side_effects: Vec<Effect>,
}

impl PendingCommit {
    fn apply(self) {
        for scope in self.removed {
            scope.dispose();
        }
        drop(self.stale_slots);
        for effect in self.layout_effects {
            effect();
        }
        for effect in self.side_effects {
            effect();
        }
    }
}

/// A tree of component scopes rooted at one content closure.
pub struct Composition {
    runtime: Runtime,
    root: Rc<ScopeInner>,
}

impl Composition {
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self::with_runtime(Runtime::with_config(Arc::new(DefaultScheduler), config))
    }

    pub fn with_runtime(runtime: Runtime) -> Self {
        let root = ScopeInner::new(runtime.handle(), 0);
        Self { runtime, root }
    }

    /// Render `content` as the root, commit, then settle every scope the
    /// pass invalidated.
    pub fn render(&mut self, content: impl Fn() + 'static) -> Result<(), RuntimeError> {
        let element = Element::new(content);
        let composer = Composer::new(self.runtime.handle());
        composer.install(|composer| {
            composer.render_scope(&self.root, &element, LocalMap::default())
        });
        composer.finish().apply();
        self.process_invalid_scopes()
    }

    /// Re-render invalidated scopes until none remain.
    pub fn process_invalid_scopes(&mut self) -> Result<(), RuntimeError> {
        let handle = self.runtime.handle();
        let max_passes = self.runtime.config().max_passes;
        let mut passes = 0;
        loop {
            let mut scopes = Vec::new();
            for weak in handle.take_invalidated_scopes() {
                if let Some(scope) = weak.upgrade() {
                    scope.mark_dequeued();
                    if scope.is_invalid() && scope.is_active() {
                        scopes.push(scope);
                    }
                }
            }
            if scopes.is_empty() {
                break;
            }
            passes += 1;
            if passes > max_passes {
                log::warn!("giving up after {max_passes} recomposition passes");
                // Leave the unsettled scopes queued for the next flush.
                for scope in &scopes {
                    scope.invalidate();
                }
                return Err(RuntimeError::RecompositionLimit { passes: max_passes });
            }
            scopes.sort_by_key(|scope| scope.depth());
            let composer = Composer::new(handle.clone());
            composer.install(|composer| {
                for scope in &scopes {
                    // An ancestor earlier in this pass may already have
                    // re-rendered or removed it.
                    if scope.is_invalid() && scope.is_active() {
                        composer.rerender_scope(scope);
                    }
                }
            });
            composer.finish().apply();
        }
        self.runtime.set_needs_frame(false);
        Ok(())
    }

    pub fn should_render(&self) -> bool {
        self.runtime.needs_frame() || self.runtime.handle().has_invalid_scopes()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.runtime.warnings()
    }

    pub fn take_warnings(&self) -> Vec<String> {
        self.runtime.take_warnings()
    }

    /// Indented outline of the rendered tree: child scopes as `<key>` and
    /// text leaves as their labels.
    pub fn dump_tree(&self) -> String {
        let mut out = String::new();
        self.root.dump(0, &mut out);
        out
    }

    /// Every text leaf in render order.
    pub fn rendered_text(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.root.collect_text(&mut out);
        out
    }
}

impl Default for Composition {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Composition {
    fn drop(&mut self) {
        self.root.deactivate();
        self.root.dispose();
    }
}
