//! Engine - everything one render root owns.
//!
//! Hook state, the effect queue, event handlers, the task queue and the root
//! context all hang off an [`Engine`]. Engines are cheap `Rc` handles; queued
//! tasks and native listeners hold weak ones so dropping the last handle
//! releases the whole root.
//!
//! Hooks reach the engine that is currently rendering through a thread-local
//! stack pushed by [`Engine::enter`].

use std::cell::{Cell, RefCell};
use std::ops::Deref;
use std::rc::{Rc, Weak};

use super::Instance;
use crate::config::EngineConfig;
use crate::dom::{Document, NodeId};
use crate::error::{Error, Result};
use crate::pipeline::render;
use crate::primitives::Element;
use crate::state::events::EventRegistry;
use crate::state::hooks::{EffectQueue, HooksContext};
use crate::state::scheduler::{self, ScheduleFlag, TaskQueue};

// =============================================================================
// Root context
// =============================================================================

/// What is mounted where.
#[derive(Default)]
pub(crate) struct RootContext {
    pub(crate) container: Option<NodeId>,
    pub(crate) element: Option<Element>,
    pub(crate) instance: Option<Instance>,
}

impl RootContext {
    /// Forget the previous tree and point at a new mount.
    pub(crate) fn reset(&mut self, container: NodeId, element: Element) {
        self.container = Some(container);
        self.element = Some(element);
        self.instance = None;
    }
}

// =============================================================================
// Engine
// =============================================================================

/// State behind an [`Engine`] handle.
#[doc(hidden)]
pub struct EngineState {
    pub(crate) document: Document,
    pub(crate) config: EngineConfig,
    pub(crate) root: RefCell<RootContext>,
    pub(crate) hooks: RefCell<HooksContext>,
    pub(crate) effects: RefCell<EffectQueue>,
    pub(crate) events: RefCell<EventRegistry>,
    pub(crate) tasks: TaskQueue,
    pub(crate) render_flag: Rc<ScheduleFlag>,
    pub(crate) renders: Cell<u64>,
}

/// Handle to one render root.
#[derive(Clone)]
pub struct Engine(Rc<EngineState>);

impl Deref for Engine {
    type Target = EngineState;

    fn deref(&self) -> &EngineState {
        &self.0
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("document", &self.document.id())
            .field("container", &self.container())
            .field("renders", &self.renders.get())
            .finish()
    }
}

/// Weak engine handle held by setters, tasks and native listeners.
#[derive(Clone)]
pub(crate) struct WeakEngine(Weak<EngineState>);

impl WeakEngine {
    pub(crate) fn upgrade(&self) -> Option<Engine> {
        self.0.upgrade().map(Engine)
    }
}

impl Engine {
    pub fn new(document: Document) -> Self {
        Self::with_config(document, EngineConfig::default())
    }

    pub fn with_config(document: Document, config: EngineConfig) -> Self {
        Self(Rc::new(EngineState {
            document,
            config,
            root: RefCell::new(RootContext::default()),
            hooks: RefCell::new(HooksContext::default()),
            effects: RefCell::new(EffectQueue::default()),
            events: RefCell::new(EventRegistry::default()),
            tasks: TaskQueue::new(),
            render_flag: Rc::new(ScheduleFlag::default()),
            renders: Cell::new(0),
        }))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Container of the current mount.
    pub fn container(&self) -> Option<NodeId> {
        self.root.borrow().container
    }

    /// Render passes completed so far.
    pub fn render_count(&self) -> u64 {
        self.renders.get()
    }

    pub fn pending_tasks(&self) -> usize {
        self.tasks.len()
    }

    pub fn pending_effects(&self) -> usize {
        self.effects.borrow().len()
    }

    pub fn is_render_pending(&self) -> bool {
        self.render_flag.is_scheduled()
    }

    /// Whether the instance at `path` currently owns hook state.
    pub fn has_hook_state(&self, path: &str) -> bool {
        self.hooks.borrow().has_state(path)
    }

    pub fn ptr_eq(&self, other: &Engine) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    pub(crate) fn downgrade(&self) -> WeakEngine {
        WeakEngine(Rc::downgrade(&self.0))
    }

    /// Request a render. Requests made before the queued render runs collapse
    /// into that one render.
    pub fn enqueue_render(&self) {
        let engine = self.downgrade();
        let queued = scheduler::enqueue_coalesced(&self.tasks, self.render_flag.clone(), move || {
            if let Some(engine) = engine.upgrade() {
                render::render(&engine);
            }
        });
        if !queued {
            log::trace!("render already pending");
        }
    }

    /// Queue the post-render effect flush.
    pub(crate) fn enqueue_effect_flush(&self) {
        let engine = self.downgrade();
        self.tasks.enqueue(move || {
            if let Some(engine) = engine.upgrade() {
                crate::state::hooks::flush_effects(&engine);
            }
        });
    }

    /// Drain the task queue: pending renders, then the effects they queued,
    /// then anything those effects scheduled.
    ///
    /// Returns the number of tasks run. Fails with
    /// [`Error::FlushLimitExceeded`] when the queue does not settle within
    /// `max_flush_tasks`; the remaining tasks are dropped.
    pub fn flush(&self) -> Result<usize> {
        let limit = self.config.max_flush_tasks;
        let (ran, settled) = scheduler::drain(&self.tasks, limit);
        if !settled {
            log::warn!("dropping {} tasks after {limit} ran without settling", self.tasks.len());
            self.tasks.clear();
            self.render_flag.reset();
            return Err(Error::FlushLimitExceeded { limit });
        }
        Ok(ran)
    }

    /// Make this engine the target of hook calls until the scope drops.
    pub(crate) fn enter(&self) -> RenderScope {
        RENDERING.with(|stack| stack.borrow_mut().push(self.clone()));
        RenderScope(())
    }
}

// =============================================================================
// Rendering engine stack
// =============================================================================

thread_local! {
    /// Engines currently rendering, innermost last.
    static RENDERING: RefCell<Vec<Engine>> = const { RefCell::new(Vec::new()) };
}

/// Pops the rendering stack on drop.
pub(crate) struct RenderScope(());

impl Drop for RenderScope {
    fn drop(&mut self) {
        RENDERING.with(|stack| {
            stack.borrow_mut().pop();
        });
    }
}

/// The engine whose render is in progress.
///
/// # Panics
///
/// Panics when no render is in progress.
pub(crate) fn current_engine() -> Engine {
    let engine = RENDERING.with(|stack| stack.borrow().last().cloned());
    match engine {
        Some(engine) => engine,
        None => panic!("hooks can only be called while a component is rendering"),
    }
}
