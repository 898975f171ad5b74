use std::fmt;
use std::rc::Rc;

use crate::composition::with_current_composer;

struct ElementInner {
    key: Option<String>,
    content: Rc<dyn Fn()>,
}

/// A renderable description of one component instance.
///
/// `Element` is a reference: cloning it keeps the same identity, and equality
/// is identity, never content. [`Element::with_key`] is the only way to derive
/// a new element from an existing one and always yields a fresh identity.
#[derive(Clone)]
pub struct Element {
    inner: Rc<ElementInner>,
}

impl Element {
    pub fn new(content: impl Fn() + 'static) -> Self {
        Self {
            inner: Rc::new(ElementInner {
                key: None,
                content: Rc::new(content),
            }),
        }
    }

    /// An element that renders nothing.
    pub fn empty() -> Self {
        Self::new(|| {})
    }

    pub fn key(&self) -> Option<&str> {
        self.inner.key.as_deref()
    }

    /// Clone this element under `key`. The clone shares the render closure
    /// but has its own identity.
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self {
            inner: Rc::new(ElementInner {
                key: Some(key.into()),
                content: Rc::clone(&self.inner.content),
            }),
        }
    }

    pub fn ptr_eq(&self, other: &Element) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Compose this element as a child of the scope that is currently rendering.
    pub fn render(&self) {
        with_current_composer(|composer| composer.compose_element(self));
    }

    pub(crate) fn invoke(&self) {
        (self.inner.content)();
    }
}

impl PartialEq for Element {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Element {}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("key", &self.inner.key)
            .field("ptr", &Rc::as_ptr(&self.inner))
            .finish()
    }
}
