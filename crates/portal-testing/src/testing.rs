use std::cell::{Cell, RefCell};
use std::rc::Rc;

use portal_core::{create_portal_context, Portal, PortalContext, PortalProvider, PortalRegistry};
use portal_runtime::{Composition, CompositionLocal, DisposableEffect, Element, RuntimeError};

/// Lifecycle observed by a [`StateMonitor`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MonitorState {
    pub mounted: bool,
    pub unmounted: bool,
    pub render_count: usize,
}

/// Builds elements that record how often they render and whether they are
/// currently mounted. Every element from one monitor reports to the same
/// [`MonitorState`].
#[derive(Clone, Default)]
pub struct StateMonitor {
    state: Rc<Cell<MonitorState>>,
}

impl StateMonitor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MonitorState {
        self.state.get()
    }

    /// A fresh element. Each call yields a new identity, like writing the
    /// component out again.
    pub fn element(&self) -> Element {
        let state = Rc::clone(&self.state);
        Element::new(move || {
            modify(&state, |s| s.render_count += 1);
            let state = Rc::clone(&state);
            DisposableEffect!((), move |scope| {
                modify(&state, |s| {
                    s.mounted = true;
                    s.unmounted = false;
                });
                scope.on_dispose(move || modify(&state, |s| s.unmounted = true))
            });
        })
    }
}

fn modify(state: &Cell<MonitorState>, f: impl FnOnce(&mut MonitorState)) {
    let mut next = state.get();
    f(&mut next);
    state.set(next);
}

/// Headless harness for driving a [`Composition`] from tests.
pub struct TestComposition {
    composition: Composition,
    content: Option<Rc<dyn Fn()>>,
}

impl TestComposition {
    pub fn new() -> Self {
        Self {
            composition: Composition::new(),
            content: None,
        }
    }

    /// Install `content` as the root and perform an initial render.
    pub fn set_content(&mut self, content: impl Fn() + 'static) -> Result<(), RuntimeError> {
        self.content = Some(Rc::new(content));
        self.render()
    }

    /// Render the installed content again from the root.
    pub fn recomposition(&mut self) -> Result<(), RuntimeError> {
        self.render()
    }

    /// Process invalidated scopes until the composition is idle.
    pub fn pump_until_idle(&mut self) -> Result<(), RuntimeError> {
        while self.composition.should_render() {
            self.composition.process_invalid_scopes()?;
        }
        Ok(())
    }

    pub fn rendered_text(&self) -> Vec<String> {
        self.composition.rendered_text()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.composition.warnings()
    }

    fn render(&mut self) -> Result<(), RuntimeError> {
        if let Some(content) = self.content.as_ref() {
            let content = Rc::clone(content);
            self.composition.render(move || content())?;
        }
        Ok(())
    }
}

impl Default for TestComposition {
    fn default() -> Self {
        Self::new()
    }
}

pub fn run_test_composition<R>(f: impl FnOnce(&mut TestComposition) -> R) -> R {
    let mut rule = TestComposition::new();
    f(&mut rule)
}

/// A hook rendered inside a throwaway root component.
pub struct RenderHook<R> {
    rule: TestComposition,
    result: Rc<RefCell<Option<R>>>,
    renders: Rc<Cell<usize>>,
}

impl<R: Clone + 'static> RenderHook<R> {
    /// The value the hook returned on its latest render.
    pub fn current(&self) -> R {
        self.result
            .borrow()
            .clone()
            .expect("hook has not rendered")
    }

    pub fn rerender(&mut self) -> Result<(), RuntimeError> {
        self.rule.recomposition()
    }

    pub fn flush(&mut self) -> Result<(), RuntimeError> {
        self.rule.pump_until_idle()
    }

    pub fn render_count(&self) -> usize {
        self.renders.get()
    }
}

fn mount_hook<R: 'static>(
    hook: impl Fn() -> R + 'static,
    wrap: impl Fn(Element) + 'static,
) -> RenderHook<R> {
    let hook = Rc::new(hook);
    let result = Rc::new(RefCell::new(None));
    let renders = Rc::new(Cell::new(0));
    let mut rule = TestComposition::new();
    {
        let result = Rc::clone(&result);
        let renders = Rc::clone(&renders);
        rule.set_content(move || {
            let hook = Rc::clone(&hook);
            let result = Rc::clone(&result);
            let renders = Rc::clone(&renders);
            wrap(Element::new(move || {
                renders.set(renders.get() + 1);
                let value = hook();
                *result.borrow_mut() = Some(value);
            }));
        })
        .expect("initial render succeeds");
    }
    RenderHook {
        rule,
        result,
        renders,
    }
}

/// Render `hook` in its own component.
pub fn render_hook<R: 'static>(hook: impl Fn() -> R + 'static) -> RenderHook<R> {
    mount_hook(hook, |component| component.render())
}

/// Render `hook` in a component wrapped by a [`PortalProvider`] for `context`.
pub fn render_hook_with_provider<R: 'static>(
    context: &CompositionLocal<PortalContext>,
    hook: impl Fn() -> R + 'static,
) -> RenderHook<R> {
    let context = context.clone();
    mount_hook(hook, move |component| PortalProvider(&context, component))
}

/// A mounted [`PortalProvider`] plus direct access to its capabilities.
pub struct PortalHarness {
    hook: RenderHook<PortalContext>,
}

impl PortalHarness {
    pub fn mount() -> Self {
        Self::with_context(create_portal_context())
    }

    pub fn with_context(context: CompositionLocal<PortalContext>) -> Self {
        let reader = context.clone();
        Self {
            hook: render_hook_with_provider(&context, move || reader.current()),
        }
    }

    pub fn context(&self) -> PortalContext {
        self.hook.current()
    }

    pub fn registry(&self) -> Rc<PortalRegistry> {
        self.context()
            .registry()
            .cloned()
            .expect("harness renders inside its provider")
    }

    pub fn create(&self, element: Element) -> Portal {
        self.context()
            .create()
            .expect("harness renders inside its provider")
            .call(element)
    }

    pub fn clear(&self) {
        self.context()
            .clear()
            .expect("harness renders inside its provider")
            .call();
    }

    /// Settle every write issued so far.
    pub fn flush(&mut self) {
        self.hook.flush().expect("composition settles");
    }
}
