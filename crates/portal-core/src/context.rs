use std::fmt;
use std::rc::{Rc, Weak};

use portal_runtime::{compositionLocalOf, CompositionLocal, Element};

use crate::error::{create_outside_provider_error, CapabilityAccessError};
use crate::provider::{Portal, PortalRegistry};

pub const DEFAULT_CONTEXT_NAME: &str = "PortalContext";

/// What a portal context resolves to at some point of the tree.
#[derive(Clone)]
pub enum PortalContext {
    /// Inside a [`PortalProvider`](crate::PortalProvider).
    Provided(Rc<PortalRegistry>),
    /// No provider above the reader. Every accessor fails.
    OutsideProvider { context: &'static str },
}

impl PortalContext {
    /// Resolve the `create` capability.
    pub fn create(&self) -> Result<CreatePortal, CapabilityAccessError> {
        match self {
            PortalContext::Provided(registry) => Ok(CreatePortal {
                registry: Rc::downgrade(registry),
            }),
            PortalContext::OutsideProvider { context } => {
                Err(create_outside_provider_error(*context, "create"))
            }
        }
    }

    /// Resolve the `clear` capability.
    pub fn clear(&self) -> Result<ClearPortals, CapabilityAccessError> {
        match self {
            PortalContext::Provided(registry) => Ok(ClearPortals {
                registry: Rc::downgrade(registry),
            }),
            PortalContext::OutsideProvider { context } => {
                Err(create_outside_provider_error(*context, "clear"))
            }
        }
    }

    pub fn registry(&self) -> Option<&Rc<PortalRegistry>> {
        match self {
            PortalContext::Provided(registry) => Some(registry),
            PortalContext::OutsideProvider { .. } => None,
        }
    }
}

impl PartialEq for PortalContext {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (PortalContext::Provided(a), PortalContext::Provided(b)) => Rc::ptr_eq(a, b),
            (
                PortalContext::OutsideProvider { context: a },
                PortalContext::OutsideProvider { context: b },
            ) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for PortalContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortalContext::Provided(registry) => f
                .debug_tuple("Provided")
                .field(&Rc::as_ptr(registry))
                .finish(),
            PortalContext::OutsideProvider { context } => f
                .debug_struct("OutsideProvider")
                .field("context", context)
                .finish(),
        }
    }
}

/// The `create` capability of a portal context.
#[derive(Clone)]
pub struct CreatePortal {
    registry: Weak<PortalRegistry>,
}

impl CreatePortal {
    pub fn call(&self, element: Element) -> Portal {
        match self.registry.upgrade() {
            Some(registry) => registry.create(element),
            None => {
                log::trace!("portal created after its provider left the composition");
                Portal::detached()
            }
        }
    }
}

impl fmt::Debug for CreatePortal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CreatePortal")
    }
}

/// The `clear` capability of a portal context.
#[derive(Clone)]
pub struct ClearPortals {
    registry: Weak<PortalRegistry>,
}

impl ClearPortals {
    pub fn call(&self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.clear();
        }
    }
}

impl fmt::Debug for ClearPortals {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClearPortals")
    }
}

/// A portal context whose default reports accesses under `PortalContext`.
pub fn create_portal_context() -> CompositionLocal<PortalContext> {
    create_portal_context_named(DEFAULT_CONTEXT_NAME)
}

pub fn create_portal_context_named(name: &'static str) -> CompositionLocal<PortalContext> {
    compositionLocalOf(move || PortalContext::OutsideProvider { context: name })
}

pub fn use_create_portal(
    context: &CompositionLocal<PortalContext>,
) -> Result<CreatePortal, CapabilityAccessError> {
    context.current().create()
}

pub fn use_clear_portal(
    context: &CompositionLocal<PortalContext>,
) -> Result<ClearPortals, CapabilityAccessError> {
    context.current().clear()
}
