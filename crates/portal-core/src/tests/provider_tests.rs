use super::*;
use crate::context::{create_portal_context, use_create_portal};
use portal_runtime::{Composition, Text};

struct Fixture {
    composition: Composition,
    registry: Rc<PortalRegistry>,
}

impl Fixture {
    fn mount() -> Self {
        let context = create_portal_context();
        let slot: Rc<RefCell<Option<Rc<PortalRegistry>>>> = Rc::default();
        let mut composition = Composition::new();
        {
            let slot = Rc::clone(&slot);
            composition
                .render(move || {
                    let reader = context.clone();
                    let slot = Rc::clone(&slot);
                    PortalProvider(
                        &context,
                        Element::new(move || {
                            Text("app");
                            *slot.borrow_mut() = reader.current().registry().cloned();
                        }),
                    );
                })
                .expect("render");
        }
        let registry = slot.borrow().clone().expect("registry provided");
        Self {
            composition,
            registry,
        }
    }

    fn flush(&mut self) {
        self.composition
            .process_invalid_scopes()
            .expect("composition settles");
    }

    fn text(&self) -> Vec<String> {
        self.composition.rendered_text()
    }

    fn keys(&self) -> Vec<String> {
        self.registry
            .entries()
            .iter()
            .map(|element| element.key().unwrap_or_default().to_string())
            .collect()
    }
}

fn label(text: &'static str) -> Element {
    Element::new(move || Text(text))
}

#[test]
fn only_the_last_entry_is_displayed() {
    let mut fixture = Fixture::mount();
    fixture.registry.create(label("first"));
    fixture.registry.create(label("second"));
    fixture.flush();

    assert_eq!(fixture.registry.len(), 2);
    assert_eq!(fixture.text(), vec!["app", "second"]);
}

#[test]
fn unmounting_the_top_entry_reveals_the_one_below() {
    let mut fixture = Fixture::mount();
    fixture.registry.create(label("a"));
    let b = fixture.registry.create(label("b"));
    fixture.flush();
    b.unmount();
    fixture.flush();

    assert_eq!(fixture.text(), vec!["app", "a"]);
}

#[test]
fn update_replaces_entry_in_place() {
    let mut fixture = Fixture::mount();
    let a = fixture.registry.create(label("a"));
    let b = fixture.registry.create(label("b"));
    let c = fixture.registry.create(label("c"));
    fixture.flush();

    a.update(label("a2"));
    fixture.flush();
    assert_eq!(
        fixture.keys(),
        vec!["portal-element-0", "portal-element-1", "portal-element-2"]
    );
    assert_eq!(fixture.text(), vec!["app", "c"]);

    c.unmount();
    b.unmount();
    fixture.flush();
    assert_eq!(fixture.text(), vec!["app", "a2"]);
}

#[test]
fn creating_from_the_same_element_adds_distinct_entries() {
    let mut fixture = Fixture::mount();
    let shared = label("shared");
    let first = fixture.registry.create(shared.clone());
    fixture.registry.create(label("other"));
    let again = fixture.registry.create(shared);
    fixture.flush();

    assert_ne!(first.id(), again.id());
    assert_eq!(fixture.registry.len(), 3);
    assert_eq!(fixture.text(), vec!["app", "shared"]);
}

#[test]
fn unmount_twice_is_a_no_op() {
    let mut fixture = Fixture::mount();
    let keep = fixture.registry.create(label("keep"));
    let portal = fixture.registry.create(label("gone"));
    fixture.flush();

    portal.unmount();
    portal.unmount();
    fixture.flush();

    assert_eq!(fixture.keys(), vec![keep.key().to_string()]);
    assert_eq!(fixture.text(), vec!["app", "keep"]);
}

#[test]
fn update_after_unmount_is_ignored() {
    let mut fixture = Fixture::mount();
    let portal = fixture.registry.create(label("modal"));
    fixture.flush();

    portal.unmount();
    portal.update(label("revived"));
    fixture.flush();

    assert!(fixture.registry.is_empty());
    assert_eq!(fixture.text(), vec!["app"]);
}

#[test]
fn clear_detaches_every_handle() {
    let mut fixture = Fixture::mount();
    let first = fixture.registry.create(label("first"));
    let second = fixture.registry.create(label("second"));
    fixture.flush();

    fixture.registry.clear();
    fixture.flush();
    assert!(fixture.registry.is_empty());
    assert_eq!(fixture.text(), vec!["app"]);

    first.update(label("again"));
    second.unmount();
    fixture.flush();
    assert!(fixture.registry.is_empty());
    assert_eq!(fixture.text(), vec!["app"]);
}

#[test]
fn portal_created_during_render_appears_after_commit() {
    let context = create_portal_context();
    let mut composition = Composition::new();
    composition
        .render(move || {
            let reader = context.clone();
            PortalProvider(
                &context,
                Element::new(move || {
                    let created = portal_runtime::remember(|| false);
                    if !created.get() {
                        created.replace(true);
                        if let Ok(create) = use_create_portal(&reader) {
                            create.call(label("overlay"));
                        }
                    }
                }),
            );
        })
        .expect("render");

    assert_eq!(composition.rendered_text(), vec!["overlay"]);
    assert!(composition.warnings().is_empty());
}
