use thiserror::Error;

/// Raised when a capability exposed through a composition local is read
/// without its provider above the reading component.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Can not access `{context}.{getter}` outside {context}Provider")]
pub struct CapabilityAccessError {
    pub context: String,
    pub getter: String,
}

pub fn create_outside_provider_error(
    context: impl Into<String>,
    getter: impl Into<String>,
) -> CapabilityAccessError {
    CapabilityAccessError {
        context: context.into(),
        getter: getter.into(),
    }
}
