//! State that other components may write while a render pass is running.
//!
//! A write that lands while the owning component is rendering is parked in a
//! FIFO queue and replayed once that component's render commits. Writes at
//! any other time go straight to the underlying state.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fmt;
use std::rc::{Rc, Weak};

use portal_runtime::{mutableStateOf, remember, MutableState, SetStateAction, SideEffect};

/// The get/set primitive a [`StateQueue`] defers writes to.
pub trait StateContainer<T> {
    fn get(&self) -> T;
    fn set(&self, action: SetStateAction<T>);
}

impl<T: Clone + PartialEq + 'static> StateContainer<T> for MutableState<T> {
    fn get(&self) -> T {
        self.value()
    }

    fn set(&self, action: SetStateAction<T>) {
        self.dispatch(action);
    }
}

pub struct StateQueue<T, C = MutableState<T>> {
    container: C,
    rendering: Cell<bool>,
    pending: RefCell<VecDeque<SetStateAction<T>>>,
    applying: Cell<bool>,
    reentrant: RefCell<VecDeque<SetStateAction<T>>>,
}

impl<T, C: StateContainer<T>> StateQueue<T, C> {
    pub fn new(container: C) -> Self {
        Self {
            container,
            rendering: Cell::new(false),
            pending: RefCell::new(VecDeque::new()),
            applying: Cell::new(false),
            reentrant: RefCell::new(VecDeque::new()),
        }
    }

    pub fn read(&self) -> T {
        self.container.get()
    }

    pub fn write(&self, action: SetStateAction<T>) {
        if self.rendering.get() {
            let mut pending = self.pending.borrow_mut();
            pending.push_back(action);
            log::trace!("deferred state write ({} pending)", pending.len());
        } else {
            self.apply(action);
        }
    }

    /// Hand `action` to the container. A write issued while another action
    /// is being applied runs right after that action is stored.
    fn apply(&self, action: SetStateAction<T>) {
        if self.applying.get() {
            self.reentrant.borrow_mut().push_back(action);
            return;
        }
        self.applying.set(true);
        self.container.set(action);
        loop {
            let next = self.reentrant.borrow_mut().pop_front();
            match next {
                Some(next) => self.container.set(next),
                None => break,
            }
        }
        self.applying.set(false);
    }

    pub fn set(&self, value: T) {
        self.write(SetStateAction::Value(value));
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.write(SetStateAction::update(f));
    }

    /// Mark the owner as rendering. Called at the start of every render of
    /// the owning component.
    pub fn begin_render(&self) {
        self.rendering.set(true);
    }

    /// Leave the rendering phase and apply every parked write in arrival
    /// order. Writes issued by a replayed action apply right after it.
    pub fn commit(&self) {
        self.rendering.set(false);
        let pending: Vec<SetStateAction<T>> = self.pending.borrow_mut().drain(..).collect();
        if pending.is_empty() {
            return;
        }
        log::debug!("applying {} deferred state writes", pending.len());
        for action in pending {
            self.apply(action);
        }
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering.get()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.borrow().len()
    }
}

impl<T, C> fmt::Debug for StateQueue<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateQueue")
            .field("rendering", &self.rendering.get())
            .field("pending", &self.pending.borrow().len())
            .finish()
    }
}

/// Remember a [`StateQueue`] for the current component and wire it into the
/// component's render/commit cycle.
pub fn use_state_queue<T: Clone + PartialEq + 'static>(
    init: impl FnOnce() -> T,
) -> Rc<StateQueue<T>> {
    let queue = remember(|| Rc::new(StateQueue::new(mutableStateOf(init()))));
    let queue = queue.get();
    queue.begin_render();
    let committed = Rc::clone(&queue);
    SideEffect(move || committed.commit());
    queue
}

/// Setter returned by [`use_safe_state`]. The same setter is returned on
/// every render of a component.
pub struct SafeSetter<T> {
    queue: Rc<Weak<StateQueue<T>>>,
}

impl<T: Clone + PartialEq + 'static> SafeSetter<T> {
    fn new(queue: &Rc<StateQueue<T>>) -> Self {
        Self {
            queue: Rc::new(Rc::downgrade(queue)),
        }
    }

    pub fn call(&self, action: impl Into<SetStateAction<T>>) {
        match self.queue.upgrade() {
            Some(queue) => queue.write(action.into()),
            None => log::trace!("state write after its component left the composition"),
        }
    }

    pub fn set(&self, value: T) {
        self.call(value);
    }

    pub fn update(&self, f: impl FnOnce(&T) -> T + 'static) {
        self.call(SetStateAction::update(f));
    }
}

impl<T> SafeSetter<T> {
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.queue, &other.queue)
    }
}

impl<T> Clone for SafeSetter<T> {
    fn clone(&self) -> Self {
        Self {
            queue: Rc::clone(&self.queue),
        }
    }
}

impl<T> PartialEq for SafeSetter<T> {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl<T> Eq for SafeSetter<T> {}

impl<T> fmt::Debug for SafeSetter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SafeSetter")
            .field("ptr", &Rc::as_ptr(&self.queue))
            .finish()
    }
}

/// Component state whose setter is safe to call while any component is
/// rendering. `init` runs on the first render only.
pub fn use_safe_state<T: Clone + PartialEq + 'static>(
    init: impl FnOnce() -> T,
) -> (T, SafeSetter<T>) {
    let queue = use_state_queue(init);
    let setter = remember(|| SafeSetter::new(&queue)).get();
    (queue.read(), setter)
}

#[cfg(test)]
#[path = "tests/safe_state_tests.rs"]
mod tests;
