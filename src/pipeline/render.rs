//! Render pass - reconcile the root element into the container.

use std::time::Instant;

use crate::engine::{reconciler, Engine};
use crate::state::hooks::cleanup_unused_hooks;

/// Path of the root instance.
pub const ROOT_PATH: &str = "root";

/// Run one render pass over the engine's root.
///
/// Does nothing until a root element and container are set. After the tree
/// is reconciled, state of instances that were not rendered is disposed and
/// an effect flush is queued.
pub(crate) fn render(engine: &Engine) {
    let (container, element, previous) = {
        let mut root = engine.root.borrow_mut();
        let (Some(container), Some(element)) = (root.container, root.element.clone()) else {
            log::trace!("render skipped: nothing mounted");
            return;
        };
        (container, element, root.instance.take())
    };

    let started = Instant::now();
    engine.hooks.borrow_mut().clear_visited();
    let instance = {
        let _scope = engine.enter();
        reconciler::reconcile(engine, container, previous, Some(&element), ROOT_PATH)
    };
    engine.root.borrow_mut().instance = instance;

    cleanup_unused_hooks(engine);
    engine.renders.set(engine.renders.get() + 1);
    engine.enqueue_effect_flush();

    log::debug!(
        "render #{} of {:?} took {:?} ({} effects queued)",
        engine.renders.get(),
        container,
        started.elapsed(),
        engine.pending_effects()
    );
}
