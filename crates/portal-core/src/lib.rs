#![doc = r"Overlay portals and render-safe component state for Portal-RS."]

pub mod context;
pub mod error;
pub mod modal;
pub mod provider;
pub mod safe_state;

pub use context::{
    create_portal_context, create_portal_context_named, use_clear_portal, use_create_portal,
    ClearPortals, CreatePortal, PortalContext, DEFAULT_CONTEXT_NAME,
};
pub use error::{create_outside_provider_error, CapabilityAccessError};
pub use modal::{create_modal_component, Modal};
pub use provider::{
    create_portal_provider, Portal, PortalProvider, PortalRegistry, PORTAL_KEY_PREFIX,
};
pub use safe_state::{use_safe_state, use_state_queue, SafeSetter, StateContainer, StateQueue};

#[cfg(test)]
#[path = "tests/context_tests.rs"]
mod tests;
