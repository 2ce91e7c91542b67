//! Hooks - persistent state for re-invoked component functions.
//!
//! A component is a plain function that runs on every render. Its state lives
//! in the engine, keyed by the instance path and the position of each hook
//! call (the cursor). The first `use_state` call of an instance is slot 0, the
//! next hook slot 1, and so on, so hooks must be called in the same order and
//! count on every render.
//!
//! # API
//!
//! - `use_state(initial)` / `use_state_with(init)` - Value + setter
//! - `use_effect(effect, deps)` / `use_effect_always(effect)` - Deferred side effects
//! - `use_ref(initial)` - Stable mutable cell
//! - `use_memo(factory, deps)` / `use_memo_with(factory, deps, equals)` - Cached values
//! - `use_callback(callback, deps)` - Cached closure identity
//! - `use_auto_callback(handler)` - Stable handler that calls the latest closure
//!
//! # Panics
//!
//! Every hook panics when called outside a component render, or when the hook
//! kind found at the current slot differs from the one requested (hook order
//! changed between renders).
//!
//! # Example
//!
//! ```ignore
//! use spark_dom::{create_element, deps, use_effect, use_state, cleanup, Props, Element};
//!
//! fn cart_badge(_: &Props) -> Element {
//!     let (count, set_count) = use_state(0);
//!
//!     use_effect(move || {
//!         log::info!("cart has {count} items");
//!         cleanup(|| log::info!("cart badge re-rendering"))
//!     }, deps![count]);
//!
//!     create_element(
//!         "button",
//!         Props::new().on("click", move |_| set_count.update(|n| n + 1)),
//!         format!("Cart ({count})"),
//!     )
//! }
//! ```

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::rc::Rc;

use crate::engine::{current_engine, Engine, WeakEngine};
use crate::state::SyntheticEvent;
use crate::types::EventHandler;

// =============================================================================
// TYPES
// =============================================================================

/// Cleanup function returned by an effect.
pub type Cleanup = Box<dyn FnOnce()>;

/// Box a closure as a [`Cleanup`].
pub fn cleanup(f: impl FnOnce() + 'static) -> Cleanup {
    Box::new(f)
}

/// What an effect body may return.
pub trait IntoCleanup {
    fn into_cleanup(self) -> Option<Cleanup>;
}

impl IntoCleanup for () {
    fn into_cleanup(self) -> Option<Cleanup> {
        None
    }
}

impl IntoCleanup for Cleanup {
    fn into_cleanup(self) -> Option<Cleanup> {
        Some(self)
    }
}

impl IntoCleanup for Option<Cleanup> {
    fn into_cleanup(self) -> Option<Cleanup> {
        self
    }
}

/// One dependency value, compared by `PartialEq` against a value of the same type.
pub trait Dependency: Any {
    fn same_as(&self, other: &dyn Dependency) -> bool;
    fn as_any(&self) -> &dyn Any;
}

impl<T: PartialEq + 'static> Dependency for T {
    fn same_as(&self, other: &dyn Dependency) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| self == other)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Dependency list for effects and memos. Build it with [`deps!`](crate::deps).
#[derive(Default)]
pub struct Deps(Vec<Box<dyn Dependency>>);

impl Deps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with<T: PartialEq + 'static>(mut self, value: T) -> Self {
        self.0.push(Box::new(value));
        self
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Element-wise equality; lists of different length never match.
    pub fn shallow_eq(&self, other: &Deps) -> bool {
        self.0.len() == other.0.len()
            && self
                .0
                .iter()
                .zip(other.0.iter())
                .all(|(a, b)| (**a).same_as(&**b))
    }
}

impl fmt::Debug for Deps {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Deps({})", self.0.len())
    }
}

/// Build a [`Deps`] list: `deps![]`, `deps![count, name.clone()]`.
#[macro_export]
macro_rules! deps {
    () => { $crate::Deps::new() };
    ($($dep:expr),+ $(,)?) => { $crate::Deps::new()$(.with($dep))+ };
}

type PendingEffect = Box<dyn FnOnce() -> Option<Cleanup>>;

pub(crate) struct EffectCell {
    deps: Option<Deps>,
    pending: Option<PendingEffect>,
    cleanup: Option<Cleanup>,
}

/// One hook slot.
pub(crate) enum HookCell {
    /// Shared `Rc<RefCell<T>>`, type-erased.
    State(Rc<dyn Any>),
    Effect(EffectCell),
}

// =============================================================================
// HOOKS CONTEXT
// =============================================================================

/// Per-engine hook bookkeeping.
#[derive(Default)]
pub(crate) struct HooksContext {
    state: HashMap<String, Vec<HookCell>>,
    cursor: HashMap<String, usize>,
    visited: HashSet<String>,
    stack: Vec<String>,
}

impl HooksContext {
    /// Start rendering the component at `path`.
    pub(crate) fn begin(&mut self, path: &str) {
        self.stack.push(path.to_string());
        self.cursor.insert(path.to_string(), 0);
        self.visited.insert(path.to_string());
    }

    pub(crate) fn end(&mut self) {
        self.stack.pop();
    }

    pub(crate) fn clear_visited(&mut self) {
        self.visited.clear();
    }

    pub(crate) fn is_visited(&self, path: &str) -> bool {
        self.visited.contains(path)
    }

    pub(crate) fn has_state(&self, path: &str) -> bool {
        self.state.get(path).is_some_and(|cells| !cells.is_empty())
    }

    /// Drop everything without running cleanups.
    pub(crate) fn clear(&mut self) {
        self.state.clear();
        self.cursor.clear();
        self.visited.clear();
        self.stack.clear();
    }

    fn next_slot(&mut self) -> Option<(String, usize)> {
        let path = self.stack.last()?.clone();
        let cursor = self.cursor.entry(path.clone()).or_insert(0);
        let slot = *cursor;
        *cursor += 1;
        Some((path, slot))
    }

    fn cell(&self, path: &str, index: usize) -> Option<&HookCell> {
        self.state.get(path).and_then(|cells| cells.get(index))
    }

    fn cell_mut(&mut self, path: &str, index: usize) -> Option<&mut HookCell> {
        self.state.get_mut(path).and_then(|cells| cells.get_mut(index))
    }

    fn put(&mut self, path: &str, index: usize, cell: HookCell) {
        let cells = self.state.entry(path.to_string()).or_default();
        if index < cells.len() {
            cells[index] = cell;
        } else {
            cells.push(cell);
        }
    }

    /// Remove all state for `path`, returning its effect cleanups in slot order.
    pub(crate) fn dispose(&mut self, path: &str) -> Vec<Cleanup> {
        self.cursor.remove(path);
        self.state
            .remove(path)
            .map(take_cleanups)
            .unwrap_or_default()
    }

    /// Dispose every path not visited in the current render.
    pub(crate) fn take_unvisited(&mut self) -> Vec<Cleanup> {
        let mut stale: Vec<String> = self
            .state
            .keys()
            .chain(self.cursor.keys())
            .filter(|path| !self.visited.contains(*path))
            .cloned()
            .collect();
        stale.sort();
        stale.dedup();
        stale.iter().flat_map(|path| self.dispose(path)).collect()
    }

    /// Dispose unvisited state at `path` or below it.
    pub(crate) fn take_stale_under(&mut self, path: &str) -> Vec<Cleanup> {
        let prefix = format!("{path}.");
        let mut stale: Vec<String> = self
            .state
            .keys()
            .filter(|p| (p.as_str() == path || p.starts_with(&prefix)) && !self.visited.contains(*p))
            .cloned()
            .collect();
        stale.sort();
        stale.iter().flat_map(|p| self.dispose(p)).collect()
    }
}

fn take_cleanups(cells: Vec<HookCell>) -> Vec<Cleanup> {
    cells
        .into_iter()
        .filter_map(|cell| match cell {
            HookCell::Effect(effect) => effect.cleanup,
            HookCell::State(_) => None,
        })
        .collect()
}

// =============================================================================
// EFFECT QUEUE
// =============================================================================

struct EffectRef {
    path: String,
    cursor: usize,
}

/// FIFO of effects waiting for the post-render flush.
#[derive(Default)]
pub(crate) struct EffectQueue {
    entries: VecDeque<EffectRef>,
}

impl EffectQueue {
    fn push(&mut self, path: String, cursor: usize) {
        self.entries.push_back(EffectRef { path, cursor });
    }

    fn pop(&mut self) -> Option<EffectRef> {
        self.entries.pop_front()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

// =============================================================================
// ENGINE-SIDE OPERATIONS
// =============================================================================

/// Run cleanups for, and forget, every instance not visited this render.
pub(crate) fn cleanup_unused_hooks(engine: &Engine) {
    let cleanups = engine.hooks.borrow_mut().take_unvisited();
    for cleanup in cleanups {
        cleanup();
    }
}

/// Run queued effects in order, storing the cleanups they return.
pub(crate) fn flush_effects(engine: &Engine) {
    let mut ran = 0usize;
    while let Some(entry) = next_effect(engine) {
        let pending = match engine.hooks.borrow_mut().cell_mut(&entry.path, entry.cursor) {
            Some(HookCell::Effect(cell)) => cell.pending.take(),
            _ => None,
        };
        let Some(effect) = pending else {
            log::trace!("skipping effect {}#{}: instance is gone", entry.path, entry.cursor);
            continue;
        };

        let cleanup = effect();
        ran += 1;

        let orphaned = match engine.hooks.borrow_mut().cell_mut(&entry.path, entry.cursor) {
            Some(HookCell::Effect(cell)) => {
                cell.cleanup = cleanup;
                None
            }
            _ => cleanup,
        };
        if let Some(cleanup) = orphaned {
            cleanup();
        }
    }
    log::trace!("flushed {ran} effects");
}

fn next_effect(engine: &Engine) -> Option<EffectRef> {
    engine.effects.borrow_mut().pop()
}

fn next_slot(engine: &Engine) -> (String, usize) {
    let slot = engine.hooks.borrow_mut().next_slot();
    match slot {
        Some(slot) => slot,
        None => panic!("hooks can only be called while a component is rendering"),
    }
}

fn hook_order_violation(path: &str, index: usize, expected: &str) -> ! {
    panic!(
        "hook #{index} of component at `{path}` is not a {expected} hook; \
         hooks must be called in the same order on every render"
    )
}

enum Slot<T> {
    Vacant,
    Occupied(T),
    Mismatch,
}

fn state_cell<T: 'static>(engine: &Engine, init: impl FnOnce() -> T) -> Rc<RefCell<T>> {
    let (path, index) = next_slot(engine);
    let slot = match engine.hooks.borrow().cell(&path, index) {
        None => Slot::Vacant,
        Some(HookCell::State(value)) => Slot::Occupied(value.clone()),
        Some(HookCell::Effect(_)) => Slot::Mismatch,
    };
    match slot {
        Slot::Occupied(value) => match value.downcast::<RefCell<T>>() {
            Ok(cell) => cell,
            Err(_) => hook_order_violation(&path, index, std::any::type_name::<T>()),
        },
        Slot::Mismatch => hook_order_violation(&path, index, "state"),
        Slot::Vacant => {
            let cell = Rc::new(RefCell::new(init()));
            engine
                .hooks
                .borrow_mut()
                .put(&path, index, HookCell::State(cell.clone()));
            cell
        }
    }
}

// =============================================================================
// STATE
// =============================================================================

/// Setter returned by [`use_state`].
///
/// Writes go straight into the shared slot; a render is requested only when
/// the new value differs from the stored one.
pub struct SetState<T> {
    cell: Rc<RefCell<T>>,
    engine: WeakEngine,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            cell: self.cell.clone(),
            engine: self.engine.clone(),
        }
    }
}

impl<T> PartialEq for SetState<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cell, &other.cell)
    }
}

impl<T> fmt::Debug for SetState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SetState")
    }
}

impl<T: Clone + PartialEq + 'static> SetState<T> {
    pub fn set(&self, value: T) {
        let changed = {
            let mut slot = self.cell.borrow_mut();
            if *slot == value {
                false
            } else {
                *slot = value;
                true
            }
        };
        if changed {
            match self.engine.upgrade() {
                Some(engine) => engine.enqueue_render(),
                None => log::trace!("state update after the engine was dropped"),
            }
        }
    }

    /// Set the value derived from the current one.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let current = self.get();
        self.set(f(&current));
    }

    /// Current value of the slot, including writes since the last render.
    pub fn get(&self) -> T {
        self.cell.borrow().clone()
    }
}

/// State hook. Returns the current value and its setter.
pub fn use_state<T: Clone + PartialEq + 'static>(initial: T) -> (T, SetState<T>) {
    use_state_with(move || initial)
}

/// State hook with a lazy initializer, evaluated on first render only.
pub fn use_state_with<T, F>(init: F) -> (T, SetState<T>)
where
    T: Clone + PartialEq + 'static,
    F: FnOnce() -> T,
{
    let engine = current_engine();
    let cell = state_cell(&engine, init);
    let value = cell.borrow().clone();
    let setter = SetState {
        cell,
        engine: engine.downgrade(),
    };
    (value, setter)
}

// =============================================================================
// EFFECTS
// =============================================================================

enum EffectSlot {
    Vacant,
    Unchanged,
    Changed(Option<Cleanup>),
    Mismatch,
}

/// Effect hook. Runs after the render commits, again whenever `deps`
/// changes; the previous cleanup runs first.
pub fn use_effect<F, C>(effect: F, deps: Deps)
where
    F: FnOnce() -> C + 'static,
    C: IntoCleanup,
{
    effect_hook(effect, Some(deps));
}

/// Effect hook without dependencies: runs after every render.
pub fn use_effect_always<F, C>(effect: F)
where
    F: FnOnce() -> C + 'static,
    C: IntoCleanup,
{
    effect_hook(effect, None);
}

fn effect_hook<F, C>(effect: F, deps: Option<Deps>)
where
    F: FnOnce() -> C + 'static,
    C: IntoCleanup,
{
    let engine = current_engine();
    let (path, index) = next_slot(&engine);

    let slot = match engine.hooks.borrow_mut().cell_mut(&path, index) {
        None => EffectSlot::Vacant,
        Some(HookCell::Effect(cell)) => {
            let changed = match (&cell.deps, &deps) {
                (Some(prev), Some(next)) => !prev.shallow_eq(next),
                _ => true,
            };
            if changed {
                EffectSlot::Changed(cell.cleanup.take())
            } else {
                EffectSlot::Unchanged
            }
        }
        Some(HookCell::State(_)) => EffectSlot::Mismatch,
    };

    let previous_cleanup = match slot {
        EffectSlot::Unchanged => return,
        EffectSlot::Mismatch => hook_order_violation(&path, index, "effect"),
        EffectSlot::Vacant => None,
        EffectSlot::Changed(cleanup) => cleanup,
    };
    if let Some(cleanup) = previous_cleanup {
        cleanup();
    }

    let pending: PendingEffect = Box::new(move || effect().into_cleanup());
    {
        let mut hooks = engine.hooks.borrow_mut();
        if let Some(HookCell::Effect(cell)) = hooks.cell_mut(&path, index) {
            cell.deps = deps;
            cell.pending = Some(pending);
        } else {
            hooks.put(
                &path,
                index,
                HookCell::Effect(EffectCell {
                    deps,
                    pending: Some(pending),
                    cleanup: None,
                }),
            );
        }
    }
    engine.effects.borrow_mut().push(path, index);
}

// =============================================================================
// REFS & MEMOIZATION
// =============================================================================

/// Stable mutable cell returned by [`use_ref`]. Writes never trigger renders.
pub struct MutRef<T>(Rc<RefCell<T>>);

impl<T> Clone for MutRef<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

impl<T> PartialEq for MutRef<T> {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl<T: fmt::Debug> fmt::Debug for MutRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutRef").field(&self.0.borrow()).finish()
    }
}

impl<T> MutRef<T> {
    pub fn borrow(&self) -> Ref<'_, T> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, T> {
        self.0.borrow_mut()
    }

    pub fn set(&self, value: T) {
        *self.0.borrow_mut() = value;
    }

    pub fn replace(&self, value: T) -> T {
        self.0.replace(value)
    }
}

impl<T: Clone> MutRef<T> {
    pub fn get(&self) -> T {
        self.0.borrow().clone()
    }
}

/// Ref hook: a cell created on first render and returned unchanged after.
pub fn use_ref<T: 'static>(initial: T) -> MutRef<T> {
    let engine = current_engine();
    MutRef(state_cell(&engine, move || initial))
}

/// Memo hook: recompute only when `deps` changed (shallow comparison).
pub fn use_memo<T, F>(factory: F, deps: Deps) -> T
where
    T: Clone + 'static,
    F: FnOnce() -> T,
{
    use_memo_with(factory, deps, Deps::shallow_eq)
}

/// Memo hook with a custom dependency comparison.
pub fn use_memo_with<T, F, E>(factory: F, deps: Deps, equals: E) -> T
where
    T: Clone + 'static,
    F: FnOnce() -> T,
    E: Fn(&Deps, &Deps) -> bool,
{
    let record = use_ref(None::<(T, Deps)>);
    let previous = record.borrow_mut().take();
    if let Some((value, prev_deps)) = previous {
        if equals(&prev_deps, &deps) {
            record.set(Some((value.clone(), prev_deps)));
            return value;
        }
    }
    let value = factory();
    record.set(Some((value.clone(), deps)));
    value
}

/// Callback hook: the same `Rc` until `deps` change.
pub fn use_callback<F: 'static>(callback: F, deps: Deps) -> Rc<F> {
    use_memo(move || Rc::new(callback), deps)
}

/// Handler whose identity never changes but which always runs the closure
/// from the latest render.
pub fn use_auto_callback<F>(handler: F) -> EventHandler
where
    F: Fn(&SyntheticEvent<'_>) + 'static,
{
    let latest: EventHandler = Rc::new(handler);
    let slot = use_ref(latest.clone());
    slot.set(latest);
    use_callback(
        move |event: &SyntheticEvent<'_>| {
            let current = slot.get();
            current(event)
        },
        Deps::new(),
    )
}
