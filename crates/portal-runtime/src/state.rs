use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use crate::composition::current_scope_id;
use crate::runtime::RuntimeHandle;
use crate::scope::ScopeInner;

/// A state write: either the next value or a function of the latest value.
pub enum SetStateAction<T> {
    Value(T),
    Update(Box<dyn FnOnce(&T) -> T>),
}

impl<T> SetStateAction<T> {
    pub fn update(f: impl FnOnce(&T) -> T + 'static) -> Self {
        SetStateAction::Update(Box::new(f))
    }

    pub fn resolve(self, current: &T) -> T {
        match self {
            SetStateAction::Value(value) => value,
            SetStateAction::Update(f) => f(current),
        }
    }
}

impl<T> From<T> for SetStateAction<T> {
    fn from(value: T) -> Self {
        SetStateAction::Value(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for SetStateAction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetStateAction::Value(value) => f.debug_tuple("Value").field(value).finish(),
            SetStateAction::Update(_) => f.write_str("Update(..)"),
        }
    }
}

struct MutableStateInner<T> {
    value: RefCell<T>,
    owner: Weak<ScopeInner>,
    runtime: RuntimeHandle,
}

/// Component state. Writes invalidate the scope that owns the state.
pub struct MutableState<T> {
    inner: Rc<MutableStateInner<T>>,
}

impl<T> PartialEq for MutableState<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T> Eq for MutableState<T> {}

impl<T> Clone for MutableState<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> MutableState<T> {
    /// State that belongs to no scope. Writes only request a frame.
    pub fn with_runtime(value: T, runtime: RuntimeHandle) -> Self {
        Self {
            inner: Rc::new(MutableStateInner {
                value: RefCell::new(value),
                owner: Weak::new(),
                runtime,
            }),
        }
    }

    pub(crate) fn owned_by(value: T, owner: &Rc<ScopeInner>, runtime: RuntimeHandle) -> Self {
        Self {
            inner: Rc::new(MutableStateInner {
                value: RefCell::new(value),
                owner: Rc::downgrade(owner),
                runtime,
            }),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.value.borrow())
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        let result = {
            let mut value = self.inner.value.borrow_mut();
            f(&mut value)
        };
        self.notify_owner();
        result
    }

    pub fn replace(&self, value: T) {
        *self.inner.value.borrow_mut() = value;
        self.notify_owner();
    }

    pub fn set(&self, value: T) {
        self.replace(value);
    }

    fn notify_owner(&self) {
        let owner = self.inner.owner.upgrade();
        if let (Some(owner), Some(rendering)) = (owner.as_ref(), current_scope_id()) {
            if owner.id() != rendering {
                self.inner.runtime.record_warning(format!(
                    "cannot update scope {} while rendering a different scope ({rendering})",
                    owner.id()
                ));
            }
        }
        match owner {
            Some(owner) => owner.invalidate(),
            None => self.inner.runtime.schedule(),
        }
    }
}

impl<T: Clone> MutableState<T> {
    pub fn value(&self) -> T {
        self.inner.value.borrow().clone()
    }

    pub fn get(&self) -> T {
        self.value()
    }
}

impl<T: Clone + PartialEq> MutableState<T> {
    /// Store `value` unless it equals the current value. Returns whether the
    /// owner was invalidated.
    pub fn set_if_changed(&self, value: T) -> bool {
        if *self.inner.value.borrow() == value {
            return false;
        }
        self.replace(value);
        true
    }

    /// Apply a [`SetStateAction`] with the same-value bail-out as
    /// [`set_if_changed`](Self::set_if_changed).
    pub fn dispatch(&self, action: SetStateAction<T>) -> bool {
        let current = self.value();
        let next = action.resolve(&current);
        self.set_if_changed(next)
    }
}

impl<T: fmt::Debug> fmt::Debug for MutableState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MutableState")
            .field("value", &*self.inner.value.borrow())
            .finish()
    }
}
