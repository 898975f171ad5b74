use super::*;
use portal_runtime::{Composition, DefaultScheduler, Element, Runtime, Text};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

#[derive(Clone, Default)]
struct RecordingContainer {
    value: Rc<RefCell<i32>>,
    applied: Rc<RefCell<Vec<i32>>>,
}

impl StateContainer<i32> for RecordingContainer {
    fn get(&self) -> i32 {
        *self.value.borrow()
    }

    fn set(&self, action: SetStateAction<i32>) {
        let next = action.resolve(&self.get());
        *self.value.borrow_mut() = next;
        self.applied.borrow_mut().push(next);
    }
}

#[test]
fn writes_outside_render_apply_immediately() {
    let container = RecordingContainer::default();
    let queue = StateQueue::new(container.clone());

    queue.set(3);

    assert_eq!(queue.read(), 3);
    assert_eq!(queue.pending_len(), 0);
    assert_eq!(*container.applied.borrow(), vec![3]);
}

#[test]
fn writes_during_render_wait_for_commit_in_order() {
    let container = RecordingContainer::default();
    let queue = StateQueue::new(container.clone());

    queue.begin_render();
    queue.set(1);
    queue.update(|value| value + 10);
    queue.set(7);

    assert!(queue.is_rendering());
    assert_eq!(queue.pending_len(), 3);
    assert_eq!(queue.read(), 0);
    assert!(container.applied.borrow().is_empty());

    queue.commit();

    assert!(!queue.is_rendering());
    assert_eq!(*container.applied.borrow(), vec![1, 11, 7]);
    assert_eq!(queue.read(), 7);
}

#[test]
fn updater_sees_latest_applied_value() {
    let container = RecordingContainer::default();
    let queue = StateQueue::new(container.clone());

    queue.begin_render();
    queue.update(|value| value + 1);
    queue.update(|value| value * 5);
    queue.commit();

    assert_eq!(queue.read(), 5);
}

#[test]
fn commit_without_pending_writes_only_clears_flag() {
    let container = RecordingContainer::default();
    let queue = StateQueue::new(container.clone());

    queue.begin_render();
    queue.commit();
    queue.set(2);

    assert!(!queue.is_rendering());
    assert_eq!(*container.applied.borrow(), vec![2]);
}

#[test]
fn write_issued_while_draining_applies_after_the_replayed_action() {
    let container = RecordingContainer::default();
    let queue = Rc::new(StateQueue::new(container.clone()));

    queue.begin_render();
    let nested = Rc::clone(&queue);
    queue.update(move |value| {
        nested.update(|value| value * 10);
        value + 1
    });
    queue.set(4);
    queue.commit();

    assert_eq!(*container.applied.borrow(), vec![1, 10, 4]);
    assert_eq!(queue.read(), 4);
    assert_eq!(queue.pending_len(), 0);
}

#[test]
fn nested_write_into_mutable_state_is_kept() {
    let runtime = Runtime::new(Arc::new(DefaultScheduler));
    let state = MutableState::with_runtime(Vec::<i32>::new(), runtime.handle());
    let queue = Rc::new(StateQueue::new(state.clone()));

    queue.begin_render();
    let nested = Rc::clone(&queue);
    queue.update(move |items: &Vec<i32>| {
        nested.update(|items: &Vec<i32>| {
            let mut next = items.clone();
            next.push(2);
            next
        });
        let mut next = items.clone();
        next.push(1);
        next
    });
    queue.commit();

    assert_eq!(state.value(), vec![1, 2]);
}

#[test]
fn nested_write_outside_render_is_kept() {
    let container = RecordingContainer::default();
    let queue = Rc::new(StateQueue::new(container.clone()));

    let nested = Rc::clone(&queue);
    queue.update(move |value| {
        nested.set(100);
        value + 1
    });

    assert_eq!(*container.applied.borrow(), vec![1, 100]);
    assert_eq!(queue.read(), 100);
}

#[test]
fn setter_defers_child_write_to_parent_commit() {
    let mut composition = Composition::new();
    let child_renders = Rc::new(RefCell::new(0));
    let observed = Rc::new(RefCell::new(Vec::new()));
    {
        let child_renders = Rc::clone(&child_renders);
        let observed = Rc::clone(&observed);
        composition
            .render(move || {
                let (value, set_value) = use_safe_state(|| "a".to_string());
                observed.borrow_mut().push(value.clone());
                Text(value);
                let child_renders = Rc::clone(&child_renders);
                Element::new(move || {
                    set_value.set("b".to_string());
                    *child_renders.borrow_mut() += 1;
                })
                .render();
            })
            .expect("render");
    }

    assert_eq!(*child_renders.borrow(), 2);
    assert_eq!(*observed.borrow(), vec!["a", "b"]);
    assert_eq!(composition.rendered_text(), vec!["b"]);
    assert!(composition.warnings().is_empty());
}
