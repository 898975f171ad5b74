use super::*;
use portal_runtime::{Composition, Element};
use std::cell::RefCell;
use std::rc::Rc;

#[test]
fn outside_provider_error_names_context_and_getter() {
    let error = create_outside_provider_error("PortalContext", "create");
    assert_eq!(
        error.to_string(),
        "Can not access `PortalContext.create` outside PortalContextProvider"
    );
}

#[test]
fn default_context_rejects_every_accessor() {
    let context = create_portal_context_named("DialogContext");
    let messages: Rc<RefCell<Vec<String>>> = Rc::default();
    let mut composition = Composition::new();
    {
        let messages = Rc::clone(&messages);
        composition
            .render(move || {
                if let Err(error) = use_create_portal(&context) {
                    messages.borrow_mut().push(error.to_string());
                }
                if let Err(error) = use_clear_portal(&context) {
                    messages.borrow_mut().push(error.to_string());
                }
            })
            .expect("render");
    }
    assert_eq!(
        *messages.borrow(),
        vec![
            "Can not access `DialogContext.create` outside DialogContextProvider",
            "Can not access `DialogContext.clear` outside DialogContextProvider",
        ]
    );
}

#[test]
fn accessors_resolve_inside_provider() {
    let context = create_portal_context();
    let resolved = Rc::new(RefCell::new(None));
    let mut composition = Composition::new();
    {
        let resolved = Rc::clone(&resolved);
        composition
            .render(move || {
                let reader = context.clone();
                let resolved = Rc::clone(&resolved);
                PortalProvider(
                    &context,
                    Element::new(move || {
                        let outcome =
                            use_create_portal(&reader).is_ok() && use_clear_portal(&reader).is_ok();
                        *resolved.borrow_mut() = Some(outcome);
                    }),
                );
            })
            .expect("render");
    }
    assert_eq!(*resolved.borrow(), Some(true));
}

#[test]
fn modal_outside_provider_reports_create_access() {
    let context = create_portal_context();
    let outcome = Rc::new(RefCell::new(None));
    let mut composition = Composition::new();
    {
        let outcome = Rc::clone(&outcome);
        composition
            .render(move || {
                *outcome.borrow_mut() = Some(Modal(&context, Element::empty()));
            })
            .expect("render");
    }
    let error = outcome
        .borrow()
        .clone()
        .expect("modal rendered")
        .expect_err("no provider");
    assert_eq!(error.getter, "create");
    assert_eq!(error.context, DEFAULT_CONTEXT_NAME);
}
