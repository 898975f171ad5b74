use std::cell::{Cell, RefCell};
use std::rc::Rc;

use portal_core::use_safe_state;
use portal_runtime::{remember, Element, Text};
use portal_testing::{render_hook, run_test_composition};

#[test]
fn starts_with_initial_state() {
    let hook = render_hook(|| use_safe_state(|| "a".to_string()));
    assert_eq!(hook.current().0, "a");
}

#[test]
fn lazy_initializer_runs_once() {
    let calls = Rc::new(Cell::new(0));
    let mut hook = {
        let calls = Rc::clone(&calls);
        render_hook(move || {
            let calls = Rc::clone(&calls);
            use_safe_state(move || {
                calls.set(calls.get() + 1);
                "a".to_string()
            })
        })
    };
    hook.rerender().expect("rerender");
    hook.rerender().expect("rerender");

    assert_eq!(hook.current().0, "a");
    assert_eq!(calls.get(), 1);
}

#[test]
fn setter_accepts_values_and_updaters() {
    let mut hook = render_hook(|| use_safe_state(|| "a".to_string()));

    hook.current().1.set("b".to_string());
    hook.rerender().expect("rerender");
    assert_eq!(hook.current().0, "b");

    let seen: Rc<RefCell<Vec<String>>> = Rc::default();
    {
        let seen = Rc::clone(&seen);
        hook.current().1.update(move |previous| {
            seen.borrow_mut().push(previous.clone());
            "c".to_string()
        });
    }
    hook.rerender().expect("rerender");

    assert_eq!(hook.current().0, "c");
    assert_eq!(*seen.borrow(), vec!["b"]);
}

#[test]
fn setter_is_stable_across_renders() {
    let mut hook = render_hook(|| use_safe_state(|| 0));
    let first = hook.current().1;
    hook.rerender().expect("rerender");
    let second = hook.current().1;

    assert!(first.ptr_eq(&second));
    assert_eq!(first, second);
    assert_eq!(hook.render_count(), 2);
}

#[test]
fn write_outside_render_rerenders_owner() {
    let mut hook = render_hook(|| use_safe_state(|| 1));
    hook.current().1.set(2);
    hook.flush().expect("flush");

    assert_eq!(hook.current().0, 2);
    assert_eq!(hook.render_count(), 2);
}

#[test]
fn child_writes_during_render_apply_in_order_after_commit() {
    run_test_composition(|rule| {
        let parent_renders = Rc::new(Cell::new(0));
        let renders = Rc::clone(&parent_renders);
        rule.set_content(move || {
            renders.set(renders.get() + 1);
            let (value, set_value) = use_safe_state(|| "a".to_string());
            Text(value);
            for suffix in ["x", "y"] {
                let set_value = set_value.clone();
                Element::new(move || {
                    let written = remember(|| false);
                    if !written.get() {
                        written.replace(true);
                        set_value.update(move |previous| format!("{previous}{suffix}"));
                    }
                })
                .render();
            }
        })
        .expect("render");

        assert_eq!(rule.rendered_text(), vec!["axy"]);
        assert_eq!(parent_renders.get(), 2);
        assert!(rule.warnings().is_empty());
    });
}
