use portal_runtime::{remember, CompositionLocal, DisposableEffect, Element, LayoutEffect};

use crate::context::{CreatePortal, PortalContext};
use crate::error::CapabilityAccessError;
use crate::provider::Portal;

/// Show `children` in the nearest portal provider for as long as this modal
/// stays in the composition.
///
/// Fails when no provider for `context` is above the caller.
#[allow(non_snake_case)]
pub fn Modal(
    context: &CompositionLocal<PortalContext>,
    children: Element,
) -> Result<(), CapabilityAccessError> {
    let create = context.current().create()?;
    Element::new(move || modal_body(&create, &children)).render();
    Ok(())
}

fn modal_body(create: &CreatePortal, children: &Element) {
    let portal = remember(|| None::<Portal>);
    let content = {
        let children = children.clone();
        Element::new(move || children.render())
    };

    {
        let portal = portal.clone();
        let create = create.clone();
        LayoutEffect(move || {
            let existing = portal.with(|portal| portal.clone());
            match existing {
                Some(existing) => existing.update(content),
                None => {
                    portal.replace(Some(create.call(content)));
                }
            }
        });
    }

    DisposableEffect!((), move |scope| {
        scope.on_dispose(move || {
            let existing = portal.with(|portal| portal.clone());
            if let Some(existing) = existing {
                existing.unmount();
            }
        })
    });
}

/// Bind [`Modal`] to one context.
pub fn create_modal_component(
    context: CompositionLocal<PortalContext>,
) -> impl Fn(Element) -> Result<(), CapabilityAccessError> + 'static {
    move |children| Modal(&context, children)
}
