use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use portal_runtime::{remember, CompositionLocal, CompositionLocalProvider, Element};

use crate::context::PortalContext;
use crate::safe_state::{use_state_queue, StateQueue};

/// Key prefix given to every element placed in a portal registry.
pub const PORTAL_KEY_PREFIX: &str = "portal-element-";

type OverlayQueue = StateQueue<Vec<Element>>;

fn portal_key(id: u64) -> String {
    format!("{PORTAL_KEY_PREFIX}{id}")
}

/// Ordered list of overlay elements owned by one [`PortalProvider`].
///
/// Entries keep their arrival order. Only the last entry is displayed;
/// earlier entries stay registered underneath it.
pub struct PortalRegistry {
    next_id: Cell<u64>,
    queue: Rc<OverlayQueue>,
}

impl PortalRegistry {
    pub(crate) fn new(queue: Rc<OverlayQueue>) -> Self {
        Self {
            next_id: Cell::new(0),
            queue,
        }
    }

    /// Append `element` under a fresh id and return the handle that controls it.
    pub fn create(&self, element: Element) -> Portal {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        let key = portal_key(id);
        log::debug!("creating portal {key}");

        let current = Rc::new(RefCell::new(None));
        let slot = Rc::clone(&current);
        let tagged = element.with_key(key.clone());
        self.queue.update(move |elements: &Vec<Element>| {
            *slot.borrow_mut() = Some(tagged.clone());
            let mut next = elements.clone();
            next.push(tagged);
            next
        });

        Portal {
            id,
            key,
            current,
            queue: Rc::downgrade(&self.queue),
        }
    }

    /// Drop every entry in one write. Outstanding handles become no-ops.
    pub fn clear(&self) {
        log::debug!("clearing portals");
        self.queue.set(Vec::new());
    }

    pub fn len(&self) -> usize {
        self.queue.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The entry currently on display.
    pub fn topmost(&self) -> Option<Element> {
        self.queue.read().last().cloned()
    }

    pub fn entries(&self) -> Vec<Element> {
        self.queue.read()
    }
}

impl fmt::Debug for PortalRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalRegistry")
            .field("next_id", &self.next_id.get())
            .field("len", &self.len())
            .finish()
    }
}

/// Handle to one registry entry.
///
/// Once its entry has been removed, by [`unmount`](Portal::unmount), by
/// [`PortalRegistry::clear`] or because the provider is gone, every call is
/// a silent no-op.
#[derive(Clone)]
pub struct Portal {
    id: u64,
    key: String,
    current: Rc<RefCell<Option<Element>>>,
    queue: Weak<OverlayQueue>,
}

impl Portal {
    /// A handle with no entry behind it.
    pub(crate) fn detached() -> Self {
        Self {
            id: u64::MAX,
            key: String::new(),
            current: Rc::new(RefCell::new(None)),
            queue: Weak::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Replace this entry's element in place.
    pub fn update(&self, element: Element) {
        let Some(queue) = self.queue.upgrade() else {
            log::trace!("{} update ignored: provider is gone", self.key);
            return;
        };
        let current = Rc::clone(&self.current);
        let tagged = element.with_key(self.key.clone());
        queue.update(move |elements: &Vec<Element>| {
            let snapshot = current.borrow().clone();
            match snapshot.and_then(|snapshot| position_of(elements, &snapshot)) {
                Some(index) => {
                    *current.borrow_mut() = Some(tagged.clone());
                    let mut next = elements.clone();
                    next[index] = tagged;
                    next
                }
                None => {
                    log::trace!("stale portal update ignored");
                    current.borrow_mut().take();
                    elements.clone()
                }
            }
        });
    }

    /// Remove this entry. Calling it again has no effect.
    pub fn unmount(&self) {
        let Some(queue) = self.queue.upgrade() else {
            log::trace!("{} unmount ignored: provider is gone", self.key);
            return;
        };
        let current = Rc::clone(&self.current);
        queue.update(move |elements: &Vec<Element>| {
            let snapshot = current.borrow_mut().take();
            match snapshot.and_then(|snapshot| position_of(elements, &snapshot)) {
                Some(index) => {
                    let mut next = elements.clone();
                    next.remove(index);
                    next
                }
                None => {
                    log::trace!("stale portal unmount ignored");
                    elements.clone()
                }
            }
        });
    }
}

impl fmt::Debug for Portal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Portal")
            .field("id", &self.id)
            .field("current", &*self.current.borrow())
            .finish()
    }
}

fn position_of(elements: &[Element], snapshot: &Element) -> Option<usize> {
    elements.iter().position(|element| element.ptr_eq(snapshot))
}

/// Render `children` with a portal registry exposed through `context`,
/// followed by the registry's topmost entry.
#[allow(non_snake_case)]
pub fn PortalProvider(context: &CompositionLocal<PortalContext>, children: Element) {
    let context = context.clone();
    Element::new(move || portal_provider_body(&context, &children)).render();
}

fn portal_provider_body(context: &CompositionLocal<PortalContext>, children: &Element) {
    let queue = use_state_queue(Vec::<Element>::new);
    let registry = remember(|| Rc::new(PortalRegistry::new(Rc::clone(&queue))));
    let registry = registry.get();
    let topmost = registry.topmost();
    CompositionLocalProvider([context.provides(PortalContext::Provided(registry))], || {
        children.render();
        if let Some(topmost) = topmost {
            topmost.render();
        }
    });
}

/// Bind [`PortalProvider`] to one context.
pub fn create_portal_provider(
    context: CompositionLocal<PortalContext>,
) -> impl Fn(Element) + 'static {
    move |children| PortalProvider(&context, children)
}

#[cfg(test)]
#[path = "tests/provider_tests.rs"]
mod tests;
