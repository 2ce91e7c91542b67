//! Render roots - the public entry points.
//!
//! ```ignore
//! use spark_dom::{attach, create_element, Document, Props};
//!
//! let document = Document::new();
//! let container = document.create_element("main");
//! let root = attach(&document, container)?;
//! root.render(create_element("h1", Props::new(), "Hello"))?;
//! ```

use std::cell::RefCell;
use std::collections::HashMap;

use super::render::render;
use crate::config::EngineConfig;
use crate::dom::{Document, DocumentId, NodeId};
use crate::engine::{reconciler, Engine};
use crate::error::{Error, Result};
use crate::primitives::Element;
use crate::state::hooks::cleanup_unused_hooks;

thread_local! {
    /// Engine attached to each container.
    static ROOTS: RefCell<HashMap<(DocumentId, NodeId), Engine>> = RefCell::new(HashMap::new());
}

/// A container with an engine attached.
#[derive(Clone, Debug)]
pub struct Root {
    engine: Engine,
    container: NodeId,
}

/// Attach to `container`, reusing the engine already attached there.
pub fn attach(document: &Document, container: NodeId) -> Result<Root> {
    attach_with_config(document, container, EngineConfig::default())
}

/// [`attach`] with explicit engine settings. `config` is ignored when an
/// engine is already attached to `container`.
pub fn attach_with_config(
    document: &Document,
    container: NodeId,
    config: EngineConfig,
) -> Result<Root> {
    if !document.is_element(container) {
        return Err(Error::InvalidContainer(container));
    }
    let key = (document.id(), container);
    let existing = ROOTS.with(|roots| {
        let mut roots = roots.borrow_mut();
        roots.retain(|&(doc, node), _| doc != key.0 || document.exists(node));
        roots.get(&key).cloned()
    });
    let engine = match existing {
        Some(engine) => engine,
        None => {
            log::debug!("attaching engine to {container:?}");
            let engine = Engine::with_config(document.clone(), config);
            engine.set_event_root(container);
            ROOTS.with(|roots| roots.borrow_mut().insert(key, engine.clone()));
            engine
        }
    };
    Ok(Root { engine, container })
}

impl Root {
    /// Replace whatever is mounted with `element`, then flush the effects and
    /// any renders they schedule.
    pub fn render(&self, element: Element) -> Result<()> {
        setup(&self.engine, Some(element), self.container)?;
        self.engine.flush()?;
        Ok(())
    }

    /// Run queued renders and effects.
    pub fn flush(&self) -> Result<usize> {
        self.engine.flush()
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn document(&self) -> &Document {
        self.engine.document()
    }

    /// Run every cleanup, empty the container and detach from it.
    pub fn unmount(self) {
        teardown(&self.engine);
        let document = self.engine.document();
        let removed = document.clear_children(self.container);
        self.engine.forget_nodes(&removed);
        self.engine.clear_event_root();
        self.engine.root.borrow_mut().container = None;
        self.engine.tasks.clear();
        self.engine.render_flag.reset();
        ROOTS.with(|roots| roots.borrow_mut().remove(&(document.id(), self.container)));
        log::debug!("unmounted {:?}", self.container);
    }
}

/// Mount `element` into `container` from scratch and render synchronously.
///
/// The previous tree (if any) is unmounted with its cleanups run, the
/// container is emptied and hook and effect state is reset. Effects of the new
/// tree are queued, not run; call [`Engine::flush`] to run them.
pub fn setup(engine: &Engine, element: Option<Element>, container: NodeId) -> Result<()> {
    let document = engine.document();
    if !document.is_element(container) {
        return Err(Error::InvalidContainer(container));
    }
    let element = element.ok_or(Error::MissingRootElement)?;

    teardown(engine);
    let removed = document.clear_children(container);
    engine.forget_nodes(&removed);

    engine.root.borrow_mut().reset(container, element);
    engine.hooks.borrow_mut().clear();
    engine.effects.borrow_mut().clear();
    engine.set_event_root(container);
    render(engine);
    Ok(())
}

/// Unmount the current tree, running every cleanup it owns.
fn teardown(engine: &Engine) {
    engine.hooks.borrow_mut().clear_visited();
    let previous = engine.root.borrow_mut().instance.take();
    if let Some(previous) = previous {
        reconciler::unmount(engine, previous);
    }
    cleanup_unused_hooks(engine);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::create_element;
    use crate::types::Props;

    #[test]
    fn test_attach_rejects_text_container() {
        let doc = Document::new();
        let node = doc.create_text("x");
        assert!(matches!(attach(&doc, node), Err(Error::InvalidContainer(n)) if n == node));
    }

    #[test]
    fn test_attach_reuses_engine() {
        let doc = Document::new();
        let container = doc.create_element("main");
        let a = attach(&doc, container).unwrap();
        let b = attach(&doc, container).unwrap();
        assert!(a.engine().ptr_eq(b.engine()));
        a.unmount();
        let c = attach(&doc, container).unwrap();
        assert!(!c.engine().ptr_eq(b.engine()));
    }

    #[test]
    fn test_attach_to_recycled_slot_gets_fresh_engine() {
        let doc = Document::new();
        let first = doc.create_element("main");
        let stale = attach(&doc, first).unwrap();
        stale
            .render(create_element("p", Props::new().on("click", |_| {}), "old"))
            .unwrap();
        doc.destroy(first);

        let second = std::iter::repeat_with(|| doc.create_element("main"))
            .take(8)
            .find(|node| node.index() == first.index())
            .unwrap();
        assert_ne!(second, first);

        let hits = std::rc::Rc::new(std::cell::Cell::new(0));
        let counter = hits.clone();
        let root = attach(&doc, second).unwrap();
        assert!(!root.engine().ptr_eq(stale.engine()));
        root.render(create_element(
            "button",
            Props::new().on("click", move |_| counter.set(counter.get() + 1)),
            "Buy",
        ))
        .unwrap();
        assert_eq!(doc.listener_count(second), 2);

        let button = doc.children(second)[0];
        doc.dispatch_event(button, &crate::dom::NativeEvent::new("click"));
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn test_setup_requires_element() {
        let engine = Engine::new(Document::new());
        let container = engine.document().create_element("main");
        assert!(matches!(
            setup(&engine, None, container),
            Err(Error::MissingRootElement)
        ));
    }

    #[test]
    fn test_render_replaces_existing_content() {
        let doc = Document::new();
        let container = doc.create_element("main");
        let stray = doc.create_element("p");
        doc.append_child(container, stray);

        let root = attach(&doc, container).unwrap();
        root.render(create_element("h1", Props::new(), "Hi")).unwrap();
        assert_eq!(doc.to_markup(container), "<main><h1>Hi</h1></main>");
        assert_eq!(root.engine().render_count(), 1);
    }

    #[test]
    fn test_unmount_clears_container() {
        let doc = Document::new();
        let container = doc.create_element("main");
        let root = attach(&doc, container).unwrap();
        root.render(create_element("h1", Props::new().on("click", |_| {}), "Hi"))
            .unwrap();
        let engine = root.engine().clone();
        assert_eq!(doc.listener_count(container), 2);

        root.unmount();
        assert!(doc.children(container).is_empty());
        assert_eq!(doc.listener_count(container), 0);
        assert_eq!(engine.event_root(), None);
    }
}
