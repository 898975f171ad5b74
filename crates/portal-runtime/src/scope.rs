use std::any::Any;
use std::cell::{Cell, RefCell};
use std::fmt::{self, Write as _};
use std::rc::Rc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::collections::{fast_map, FastMap, FastSet};
use crate::element::Element;
use crate::local::LocalMap;
use crate::owned::Owned;
use crate::runtime::RuntimeHandle;

pub(crate) type ScopeId = usize;

static NEXT_SCOPE_ID: AtomicUsize = AtomicUsize::new(1);

fn next_scope_id() -> ScopeId {
    NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed)
}

/// Identifies a child scope within its parent.
///
/// Keyed elements match by key across renders; unkeyed elements match by
/// their position among the unkeyed siblings.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ChildKey {
    Keyed(String),
    Ordinal(usize),
}

impl fmt::Display for ChildKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChildKey::Keyed(key) => write!(f, "{key}"),
            ChildKey::Ordinal(index) => write!(f, "#{index}"),
        }
    }
}

#[derive(Clone, Debug)]
pub(crate) enum Output {
    Text(String),
    Child(ChildKey),
}

pub(crate) type StaleSlots = Vec<Box<dyn Any>>;

#[derive(Default)]
struct SlotTable {
    slots: Vec<Box<dyn Any>>,
    cursor: usize,
}

impl SlotTable {
    fn read<T: 'static>(&mut self) -> Option<Owned<T>> {
        let existing = self.slots.get(self.cursor)?.downcast_ref::<Owned<T>>()?.clone();
        self.cursor += 1;
        Some(existing)
    }

    fn insert<T: 'static>(&mut self, owned: Owned<T>) -> StaleSlots {
        let stale = self.trim_to_cursor();
        self.slots.push(Box::new(owned));
        self.cursor += 1;
        stale
    }

    fn reset(&mut self) {
        self.cursor = 0;
    }

    fn trim_to_cursor(&mut self) -> StaleSlots {
        let cursor = self.cursor.min(self.slots.len());
        self.slots.split_off(cursor)
    }

    fn take_all(&mut self) -> StaleSlots {
        self.cursor = 0;
        std::mem::take(&mut self.slots)
    }
}

/// One component instance: its remembered slots, its children and the
/// element and locals it was last rendered with.
pub(crate) struct ScopeInner {
    id: ScopeId,
    depth: usize,
    runtime: RuntimeHandle,
    invalid: Cell<bool>,
    enqueued: Cell<bool>,
    active: Cell<bool>,
    disposed: Cell<bool>,
    element: RefCell<Option<Element>>,
    locals: RefCell<LocalMap>,
    slots: RefCell<SlotTable>,
    children: RefCell<FastMap<ChildKey, Rc<ScopeInner>>>,
    output: RefCell<Vec<Output>>,
}

impl ScopeInner {
    pub(crate) fn new(runtime: RuntimeHandle, depth: usize) -> Rc<Self> {
        Rc::new(Self {
            id: next_scope_id(),
            depth,
            runtime,
            invalid: Cell::new(false),
            enqueued: Cell::new(false),
            active: Cell::new(true),
            disposed: Cell::new(false),
            element: RefCell::new(None),
            locals: RefCell::new(LocalMap::default()),
            slots: RefCell::new(SlotTable::default()),
            children: RefCell::new(fast_map()),
            output: RefCell::new(Vec::new()),
        })
    }

    pub(crate) fn id(&self) -> ScopeId {
        self.id
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    pub(crate) fn is_invalid(&self) -> bool {
        self.invalid.get()
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.get()
    }

    pub(crate) fn invalidate(self: &Rc<Self>) {
        if !self.active.get() {
            return;
        }
        self.invalid.set(true);
        if !self.enqueued.replace(true) {
            self.runtime.register_invalid_scope(Rc::downgrade(self));
        }
    }

    pub(crate) fn mark_dequeued(&self) {
        self.enqueued.set(false);
    }

    pub(crate) fn begin_render(&self, element: &Element, locals: LocalMap) {
        self.invalid.set(false);
        *self.element.borrow_mut() = Some(element.clone());
        *self.locals.borrow_mut() = locals;
        self.slots.borrow_mut().reset();
        self.output.borrow_mut().clear();
    }

    pub(crate) fn element(&self) -> Option<Element> {
        self.element.borrow().clone()
    }

    pub(crate) fn locals(&self) -> LocalMap {
        self.locals.borrow().clone()
    }

    /// A valid scope last rendered from the same element under equal locals
    /// has nothing new to render.
    pub(crate) fn can_skip(&self, element: &Element, locals: &LocalMap) -> bool {
        !self.invalid.get()
            && self
                .element
                .borrow()
                .as_ref()
                .is_some_and(|rendered| rendered.ptr_eq(element))
            && self.locals.borrow().same_as(locals)
    }

    pub(crate) fn remember<T: 'static>(&self, init: impl FnOnce() -> T) -> Owned<T> {
        let existing = self.slots.borrow_mut().read::<T>();
        if let Some(existing) = existing {
            return existing;
        }
        let owned = Owned::new(init());
        let stale = self.slots.borrow_mut().insert(owned.clone());
        drop(stale);
        owned
    }

    pub(crate) fn trim_slots(&self) -> StaleSlots {
        self.slots.borrow_mut().trim_to_cursor()
    }

    pub(crate) fn push_output(&self, output: Output) {
        self.output.borrow_mut().push(output);
    }

    pub(crate) fn child(&self, key: &ChildKey) -> Option<Rc<ScopeInner>> {
        self.children.borrow().get(key).cloned()
    }

    pub(crate) fn insert_child(&self, key: ChildKey, child: Rc<ScopeInner>) {
        self.children.borrow_mut().insert(key, child);
    }

    /// Detach every child that was not composed during the last render.
    pub(crate) fn retain_children(&self, visited: &FastSet<ChildKey>) -> Vec<Rc<ScopeInner>> {
        let mut children = self.children.borrow_mut();
        let stale: Vec<ChildKey> = children
            .keys()
            .filter(|key| !visited.contains(*key))
            .cloned()
            .collect();
        stale
            .into_iter()
            .filter_map(|key| children.remove(&key))
            .collect()
    }

    /// Children in the order they were composed, followed by any that no
    /// longer appear in the output.
    fn ordered_children(&self) -> Vec<Rc<ScopeInner>> {
        let children = self.children.borrow();
        let mut ordered: Vec<Rc<ScopeInner>> = Vec::with_capacity(children.len());
        for output in self.output.borrow().iter() {
            if let Output::Child(key) = output {
                if let Some(child) = children.get(key) {
                    if !ordered.iter().any(|seen| Rc::ptr_eq(seen, child)) {
                        ordered.push(Rc::clone(child));
                    }
                }
            }
        }
        for child in children.values() {
            if !ordered.iter().any(|seen| Rc::ptr_eq(seen, child)) {
                ordered.push(Rc::clone(child));
            }
        }
        ordered
    }

    /// Stop accepting invalidations for this scope and its subtree.
    pub(crate) fn deactivate(&self) {
        if !self.active.replace(false) {
            return;
        }
        self.invalid.set(false);
        for child in self.ordered_children() {
            child.deactivate();
        }
    }

    /// Tear the subtree down. Remembered values are dropped here, which is
    /// where disposable effects run their cleanups.
    pub(crate) fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.active.set(false);
        log::trace!("disposing scope {}", self.id);
        let children = self.ordered_children();
        self.children.borrow_mut().clear();
        for child in children {
            child.dispose();
        }
        let slots = self.slots.borrow_mut().take_all();
        drop(slots);
        self.output.borrow_mut().clear();
        self.element.borrow_mut().take();
    }

    pub(crate) fn dump(&self, depth: usize, out: &mut String) {
        let indent = "  ".repeat(depth);
        for output in self.output.borrow().iter() {
            match output {
                Output::Text(label) => {
                    let _ = writeln!(out, "{indent}{label}");
                }
                Output::Child(key) => {
                    let _ = writeln!(out, "{indent}<{key}>");
                    if let Some(child) = self.child(key) {
                        child.dump(depth + 1, out);
                    }
                }
            }
        }
    }

    pub(crate) fn collect_text(&self, out: &mut Vec<String>) {
        for output in self.output.borrow().iter() {
            match output {
                Output::Text(label) => out.push(label.clone()),
                Output::Child(key) => {
                    if let Some(child) = self.child(key) {
                        child.collect_text(out);
                    }
                }
            }
        }
    }
}
