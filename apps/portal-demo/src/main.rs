use std::cell::RefCell;
use std::rc::Rc;

use portal_core::{
    create_portal_context, use_create_portal, CreatePortal, Modal, PortalContext, PortalProvider,
};
use portal_runtime::{useState, Composition, CompositionLocal, Element, MutableState, Text};

#[derive(Default)]
struct Handles {
    stage: Option<MutableState<usize>>,
    create: Option<CreatePortal>,
}

fn main() {
    env_logger::init();

    println!("=== Portal-RS Console Example ===");
    println!("Stacks modals through a portal provider and prints the tree after");
    println!("every step. Set RUST_LOG=trace to follow renders and disposals.");

    let context = create_portal_context();
    let handles: Rc<RefCell<Handles>> = Rc::default();

    let mut composition = Composition::new();
    {
        let handles = Rc::clone(&handles);
        let content = move || {
            let reader = context.clone();
            let handles = Rc::clone(&handles);
            PortalProvider(&context, Element::new(move || inbox(&reader, &handles)));
        };
        if let Err(err) = composition.render(content) {
            log::error!("initial render failed: {err}");
        }
    }
    print_step("initial", &composition);

    let stage = handles.borrow().stage.clone();
    if let Some(stage) = stage {
        for (next, label) in [
            (1, "confirm opened"),
            (2, "progress on top"),
            (1, "progress closed"),
        ] {
            stage.set(next);
            flush(&mut composition);
            print_step(label, &composition);
        }
    }

    let create = handles.borrow().create.clone();
    if let Some(create) = create {
        let toast = create.call(Element::new(|| Text("Saved")));
        flush(&mut composition);
        print_step("toast created", &composition);

        toast.update(Element::new(|| Text("Saved to archive")));
        flush(&mut composition);
        print_step("toast updated", &composition);

        toast.unmount();
        toast.unmount();
        flush(&mut composition);
        print_step("toast unmounted twice", &composition);
    }

    let warnings = composition.take_warnings();
    if warnings.is_empty() {
        println!("no render warnings");
    }
    for warning in warnings {
        println!("warning: {warning}");
    }
}

fn inbox(context: &CompositionLocal<PortalContext>, handles: &Rc<RefCell<Handles>>) {
    let stage = useState(|| 0usize);
    Text("Inbox (3 unread)");
    {
        let mut handles = handles.borrow_mut();
        handles.stage = Some(stage.clone());
        match use_create_portal(context) {
            Ok(create) => handles.create = Some(create),
            Err(err) => log::error!("{err}"),
        }
    }
    if stage.value() >= 1 {
        show(context, "Confirm: archive 3 messages?");
    }
    if stage.value() >= 2 {
        show(context, "Archiving...");
    }
}

fn show(context: &CompositionLocal<PortalContext>, message: &'static str) {
    if let Err(err) = Modal(context, Element::new(move || Text(message))) {
        log::error!("modal could not open: {err}");
    }
}

fn flush(composition: &mut Composition) {
    if let Err(err) = composition.process_invalid_scopes() {
        log::error!("recomposition failed: {err}");
    }
}

fn print_step(label: &str, composition: &Composition) {
    println!("--- {label} ---");
    print!("{}", composition.dump_tree());
}
