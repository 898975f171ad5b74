use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::RuntimeScheduler;
use crate::scope::ScopeInner;

/// Tunables shared by every composition driven from one [`Runtime`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeConfig {
    /// Render passes a single flush may run before it reports
    /// [`RuntimeError::RecompositionLimit`](crate::RuntimeError::RecompositionLimit).
    pub max_passes: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self { max_passes: 64 }
    }
}

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    config: RuntimeConfig,
    needs_frame: Cell<bool>,
    scope_queue: RefCell<Vec<Weak<ScopeInner>>>,
    warnings: RefCell<Vec<String>>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>, config: RuntimeConfig) -> Self {
        Self {
            scheduler,
            config,
            needs_frame: Cell::new(false),
            scope_queue: RefCell::new(Vec::new()),
            warnings: RefCell::new(Vec::new()),
        }
    }

    fn schedule(&self) {
        self.needs_frame.set(true);
        self.scheduler.schedule_frame();
    }

    fn register_invalid_scope(&self, scope: Weak<ScopeInner>) {
        self.scope_queue.borrow_mut().push(scope);
        self.schedule();
    }

    fn take_invalidated_scopes(&self) -> Vec<Weak<ScopeInner>> {
        self.scope_queue.borrow_mut().drain(..).collect()
    }

    fn has_invalid_scopes(&self) -> bool {
        !self.scope_queue.borrow().is_empty()
    }

    fn record_warning(&self, message: String) {
        log::warn!("{message}");
        self.warnings.borrow_mut().push(message);
    }
}

#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self::with_config(scheduler, RuntimeConfig::default())
    }

    pub fn with_config(scheduler: Arc<dyn RuntimeScheduler>, config: RuntimeConfig) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler, config)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn config(&self) -> RuntimeConfig {
        self.inner.config
    }

    pub fn needs_frame(&self) -> bool {
        self.inner.needs_frame.get()
    }

    pub fn set_needs_frame(&self, value: bool) {
        self.inner.needs_frame.set(value);
    }

    /// Warnings recorded so far, oldest first.
    pub fn warnings(&self) -> Vec<String> {
        self.inner.warnings.borrow().clone()
    }

    pub fn take_warnings(&self) -> Vec<String> {
        std::mem::take(&mut *self.inner.warnings.borrow_mut())
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn schedule_frame(&self) {}
}

#[derive(Clone)]
pub struct RuntimeHandle(pub(crate) Weak<RuntimeInner>);

impl RuntimeHandle {
    pub fn schedule(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.schedule();
        }
    }

    pub fn has_invalid_scopes(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.has_invalid_scopes())
            .unwrap_or(false)
    }

    pub(crate) fn register_invalid_scope(&self, scope: Weak<ScopeInner>) {
        if let Some(inner) = self.0.upgrade() {
            inner.register_invalid_scope(scope);
        }
    }

    pub(crate) fn take_invalidated_scopes(&self) -> Vec<Weak<ScopeInner>> {
        self.0
            .upgrade()
            .map(|inner| inner.take_invalidated_scopes())
            .unwrap_or_default()
    }

    pub(crate) fn record_warning(&self, message: String) {
        match self.0.upgrade() {
            Some(inner) => inner.record_warning(message),
            None => log::warn!("{message}"),
        }
    }
}
