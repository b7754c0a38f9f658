//! React-style hooks for keeping state across renders.
//!
//! # Overview
//!
//! Each [`Root`](crate::root::Root) owns a [`HookRegistry`]. While the root
//! renders, its registry is the *current* one and hooks read and write their
//! slot in it. Slots are identified by call order, so every render must call
//! the same hooks in the same order.
//!
//! # Available Hooks
//!
//! | Hook | Purpose |
//! |------|---------|
//! | [`use_signal`] | Reactive state that triggers re-renders |
//! | [`use_state`] | Simple state with a `(value, setter)` API |
//! | [`use_ref`] | Mutable reference that doesn't trigger re-renders |
//! | [`use_effect`] | Side effects that run at commit when dependencies change |
//! | [`use_effect_cleanup`] | Effects with cleanup functions |
//! | [`use_mount`] | One-time effect on first commit |
//! | [`use_memo`] | Memoized computations |
//! | [`use_callback`] | Memoized callbacks |
//! | [`use_sync_external_store`] | Tear-free reads of state that lives outside the renderer |
//!
//! # Effects and Commit
//!
//! Effects never run during render. They are queued and run when the render
//! commits, in the order their hooks were called. When an effect's
//! dependencies change, its previous cleanup runs before the new effect.
//! Unmounting a root runs every outstanding cleanup.
//!
//! # Server Rendering
//!
//! In [`RenderMode::Server`] nothing is committed: effects are skipped and
//! [`use_sync_external_store`] reads the store's server snapshot.
//!
//! # Rules of Hooks
//!
//! Hooks must be called in the **exact same order** on every render:
//!
//! - Don't call hooks inside conditionals or loops
//! - Don't call hooks after early returns
//! - Don't call hooks from event handlers or effects
//!
//! Violations panic with a diagnostic:
//!
//! ```text
//! casement hooks error: Hook order mismatch at index 1!
//! Previous render: `use_effect`
//! Current render: `use_signal`
//!
//! Hooks must be called in the exact same order every render.
//! ```

use crate::reactive::Signal;
use crate::subscription::Subscription;
use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

// ============================================================================
// Render mode and handle
// ============================================================================

/// Whether a render happens next to a live window or on a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// Rendering next to a live window: effects run and stores are subscribed.
    #[default]
    Client,
    /// One-shot render without a live window.
    Server,
}

/// Schedules a re-render of the root that owns it.
#[derive(Clone, Debug, Default)]
pub struct RenderHandle {
    dirty: Rc<Cell<bool>>,
}

impl RenderHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the root as needing another render.
    pub fn request_render(&self) {
        if !self.dirty.replace(true) {
            tracing::trace!("Re-render requested");
        }
    }

    pub fn needs_render(&self) -> bool {
        self.dirty.get()
    }

    pub(crate) fn clear(&self) {
        self.dirty.set(false);
    }
}

// ============================================================================
// Hook Registry
// ============================================================================

/// Metadata about a hook for debugging purposes.
#[derive(Debug, Clone)]
pub struct HookMeta {
    /// The hook function name (e.g., "use_signal", "use_effect")
    pub hook_type: &'static str,
    /// The type of value stored (from std::any::type_name)
    pub value_type: &'static str,
}

/// Internal storage for a single hook.
struct HookEntry {
    value: Box<dyn Any>,
    meta: HookMeta,
}

/// Hook state that holds resources released on unmount.
trait Teardown {
    fn teardown(&self);
}

/// Hook state that can tell whether what it rendered is already outdated.
trait CommitCheck {
    fn is_stale(&self) -> bool;
}

type QueuedEffect = Box<dyn FnOnce()>;

/// Registry that manages hook state across renders of one root.
pub struct HookRegistry {
    /// Stored hook values, indexed by call order
    hooks: Vec<HookEntry>,
    /// Current hook index during rendering (reset to 0 each render)
    current_index: usize,
    /// Whether we're currently inside a render cycle
    is_rendering: bool,
    /// Expected hook count from previous render (for mismatch detection)
    expected_count: Option<usize>,
    /// Number of completed renders (for debugging)
    render_count: usize,
    mode: RenderMode,
    handle: RenderHandle,
    /// Effects queued during the current render
    pending_effects: Vec<QueuedEffect>,
    teardowns: Vec<Rc<dyn Teardown>>,
    commit_checks: Vec<Rc<dyn CommitCheck>>,
}

impl HookRegistry {
    /// Create a new empty registry.
    pub fn new(mode: RenderMode, handle: RenderHandle) -> Self {
        Self {
            hooks: Vec::new(),
            current_index: 0,
            is_rendering: false,
            expected_count: None,
            render_count: 0,
            mode,
            handle,
            pending_effects: Vec::new(),
            teardowns: Vec::new(),
            commit_checks: Vec::new(),
        }
    }

    pub fn mode(&self) -> RenderMode {
        self.mode
    }

    pub fn render_count(&self) -> usize {
        self.render_count
    }

    /// Whether any hook has been created.
    pub fn has_hooks(&self) -> bool {
        !self.hooks.is_empty()
    }

    /// Reset hook index and begin a new render cycle.
    fn begin_render(&mut self) {
        self.current_index = 0;
        self.is_rendering = true;
    }

    /// Validate hook count, end the render cycle and hand back queued effects.
    fn end_render(&mut self) -> Vec<QueuedEffect> {
        // Check for hook count mismatch
        if let Some(expected) = self.expected_count
            && self.current_index != expected
        {
            panic!(
                "\n\n\x1b[1;31mcasement hooks error: Hook count mismatch!\x1b[0m\n\
                Previous render had {} hooks, current render has {} hooks.\n\
                Render number: {}\n\n\
                This usually happens when:\n\
                - A hook is called inside a conditional (if/match)\n\
                - A hook is called inside a loop with varying iterations\n\
                - A hook is called inside an early return\n\n\
                Hooks must be called in the exact same order every render.\n",
                expected, self.current_index, self.render_count
            );
        }

        // Remember hook count for next render
        self.expected_count = Some(self.current_index);
        self.is_rendering = false;
        self.render_count += 1;
        std::mem::take(&mut self.pending_effects)
    }

    /// Core hook implementation - gets or creates a hook at the current index.
    ///
    /// The second element of the result is `true` when the hook was created
    /// by this call.
    fn use_hook<T: Clone + 'static>(
        &mut self,
        hook_type: &'static str,
        init: impl FnOnce() -> T,
    ) -> (T, bool) {
        let index = self.current_index;
        self.current_index += 1;

        if index < self.hooks.len() {
            // Hook already exists - validate type and return
            let entry = &self.hooks[index];

            if entry.meta.hook_type != hook_type {
                panic!(
                    "\n\n\x1b[1;31mcasement hooks error: Hook order mismatch at index {}!\x1b[0m\n\
                    Previous render: `{}`\n\
                    Current render: `{}`\n\n\
                    Hooks must be called in the exact same order every render.\n",
                    index, entry.meta.hook_type, hook_type
                );
            }

            let Some(value) = entry.value.downcast_ref::<T>() else {
                panic!(
                    "\n\n\x1b[1;31mcasement hooks error: Hook type mismatch at index {}!\x1b[0m\n\
                    Stored `{}`, requested `{}`.\n",
                    index,
                    entry.meta.value_type,
                    std::any::type_name::<T>()
                );
            };
            (value.clone(), false)
        } else {
            // First render - create new hook
            let value = init();
            let meta = HookMeta {
                hook_type,
                value_type: std::any::type_name::<T>(),
            };

            self.hooks.push(HookEntry {
                value: Box::new(value.clone()),
                meta,
            });

            (value, true)
        }
    }

    fn queue_effect(&mut self, effect: QueuedEffect) {
        self.pending_effects.push(effect);
    }

    /// Take everything that must be released on unmount and forget all hooks.
    fn drain(&mut self) -> Vec<Rc<dyn Teardown>> {
        let teardowns = std::mem::take(&mut self.teardowns);
        self.hooks.clear();
        self.commit_checks.clear();
        self.pending_effects.clear();
        self.current_index = 0;
        self.is_rendering = false;
        self.expected_count = None;
        teardowns
    }

    /// Get debug information about registered hooks.
    pub fn debug_info(&self) -> Vec<HookMeta> {
        self.hooks.iter().map(|entry| entry.meta.clone()).collect()
    }
}

// ============================================================================
// Current registry
// ============================================================================

thread_local! {
    static CURRENT: RefCell<Option<Rc<RefCell<HookRegistry>>>> = const { RefCell::new(None) };
}

/// Begin a render cycle with `registry` as the current registry.
///
/// Returns the registry that was current before, to be passed back to
/// [`end_render`].
pub(crate) fn begin_render(
    registry: &Rc<RefCell<HookRegistry>>,
) -> Option<Rc<RefCell<HookRegistry>>> {
    registry.borrow_mut().begin_render();
    CURRENT.with(|current| current.replace(Some(Rc::clone(registry))))
}

/// End the render cycle and restore the previous registry.
///
/// Returns the effects queued during the render; the caller commits them.
pub(crate) fn end_render(
    registry: &Rc<RefCell<HookRegistry>>,
    previous: Option<Rc<RefCell<HookRegistry>>>,
) -> Vec<QueuedEffect> {
    CURRENT.with(|current| *current.borrow_mut() = previous);
    registry.borrow_mut().end_render()
}

/// Run queued effects. No registry borrow is held while they run.
pub(crate) fn commit(effects: Vec<QueuedEffect>) {
    for effect in effects {
        effect();
    }
}

/// Whether any hook rendered a value that is already outdated.
pub(crate) fn has_stale_snapshot(registry: &Rc<RefCell<HookRegistry>>) -> bool {
    let checks = registry.borrow().commit_checks.clone();
    checks.iter().any(|check| check.is_stale())
}

/// Release every hook resource and forget all hook state.
pub(crate) fn unmount(registry: &Rc<RefCell<HookRegistry>>) {
    let teardowns = registry.borrow_mut().drain();
    for teardown in teardowns {
        teardown.teardown();
    }
}

fn with_registry<R>(hook_type: &'static str, f: impl FnOnce(&mut HookRegistry) -> R) -> R {
    let registry = CURRENT
        .with(|current| current.borrow().clone())
        .filter(|registry| registry.borrow().is_rendering);
    let Some(registry) = registry else {
        panic!(
            "\n\n\x1b[1;31mcasement hooks error: `{}` called outside of render!\x1b[0m\n\
            Hooks can only be called during component rendering.\n\
            Make sure you're not calling hooks in:\n\
            - Event handlers\n\
            - Effects or cleanups\n\
            - Static initializers\n",
            hook_type
        );
    };
    let mut registry = registry.borrow_mut();
    f(&mut registry)
}

/// The mode of the render in progress. Does not occupy a hook slot.
pub fn use_render_mode() -> RenderMode {
    with_registry("use_render_mode", |registry| registry.mode)
}

// ============================================================================
// Public API - Hook functions
// ============================================================================

/// Create or retrieve a persistent reactive signal.
///
/// The initializer is only called on the first render. Reading the signal
/// during render subscribes the root, so setting it schedules a re-render.
///
/// # Example
///
/// ```ignore
/// fn app() -> String {
///     let count = use_signal(|| 0);
///     format!("Count: {}", count.get())
/// }
/// ```
pub fn use_signal<T: Clone + 'static>(init: impl FnOnce() -> T) -> Signal<T> {
    with_registry("use_signal", |registry| {
        registry.use_hook("use_signal", || Signal::new(init())).0
    })
}

/// Create or retrieve a simple state value with a setter function.
///
/// Like React's `useState`: the setter stores a new value and schedules a
/// re-render of every root that read the old one. The setter is cheap to
/// clone and may be called from event handlers.
pub fn use_state<T: Clone + 'static>(init: impl FnOnce() -> T) -> (T, impl Fn(T) + Clone + 'static) {
    let signal = use_signal(init);
    let value = signal.get();
    let setter = move |new_value: T| {
        signal.set(new_value);
    };
    (value, setter)
}

/// Create or retrieve a mutable reference that persists across renders.
///
/// Unlike signals, refs don't trigger re-renders when mutated.
pub fn use_ref<T: 'static>(init: impl FnOnce() -> T) -> RefHandle<T> {
    let inner = with_registry("use_ref", |registry| {
        registry
            .use_hook("use_ref", || Rc::new(RefCell::new(init())))
            .0
    });
    RefHandle { inner }
}

/// Handle to a ref value created by `use_ref`.
pub struct RefHandle<T> {
    inner: Rc<RefCell<T>>,
}

impl<T> Clone for RefHandle<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> RefHandle<T> {
    /// Get a reference to the current value.
    pub fn borrow(&self) -> std::cell::Ref<'_, T> {
        self.inner.borrow()
    }

    /// Get a mutable reference to the current value.
    pub fn borrow_mut(&self) -> std::cell::RefMut<'_, T> {
        self.inner.borrow_mut()
    }

    /// Set the value directly.
    pub fn set(&self, value: T) {
        *self.inner.borrow_mut() = value;
    }
}

impl<T: Clone> RefHandle<T> {
    /// Get a clone of the current value.
    pub fn get(&self) -> T {
        self.inner.borrow().clone()
    }
}

/// Storage for effect dependencies and cleanup function.
struct EffectSlot<D> {
    deps: RefCell<Option<D>>,
    cleanup: RefCell<Option<Box<dyn FnOnce()>>>,
}

impl<D> EffectSlot<D> {
    fn run_cleanup(&self) {
        let cleanup = self.cleanup.borrow_mut().take();
        if let Some(cleanup) = cleanup {
            cleanup();
        }
    }
}

impl<D> Teardown for EffectSlot<D> {
    fn teardown(&self) {
        self.run_cleanup();
        self.deps.borrow_mut().take();
    }
}

fn effect_hook<F, C, D>(hook_type: &'static str, effect_fn: F, deps: D)
where
    F: FnOnce() -> C + 'static,
    C: FnOnce() + 'static,
    D: PartialEq + 'static,
{
    with_registry(hook_type, move |registry| {
        let (slot, created) = registry.use_hook(hook_type, || {
            Rc::new(EffectSlot::<D> {
                deps: RefCell::new(None),
                cleanup: RefCell::new(None),
            })
        });
        if created {
            registry.teardowns.push(slot.clone());
        }

        if registry.mode == RenderMode::Server {
            return;
        }

        let should_run = match &*slot.deps.borrow() {
            None => true, // First run
            Some(old_deps) => old_deps != &deps,
        };
        if !should_run {
            return;
        }

        *slot.deps.borrow_mut() = Some(deps);
        registry.queue_effect(Box::new(move || {
            // Previous cleanup always runs before the next effect
            slot.run_cleanup();
            let cleanup = effect_fn();
            *slot.cleanup.borrow_mut() = Some(Box::new(cleanup));
        }));
    });
}

/// Run a side effect at commit when dependencies change.
///
/// # Example
///
/// ```ignore
/// fn app() -> String {
///     let count = use_signal(|| 0);
///
///     use_effect(|| println!("Count committed"), count.get());
///     format!("{}", count.get())
/// }
/// ```
pub fn use_effect<F, D>(effect_fn: F, deps: D)
where
    F: FnOnce() + 'static,
    D: PartialEq + 'static,
{
    effect_hook(
        "use_effect",
        move || {
            effect_fn();
            || {}
        },
        deps,
    );
}

/// Run a side effect with a cleanup function when dependencies change.
///
/// The cleanup runs before the next run of the effect and on unmount.
///
/// # Example
///
/// ```ignore
/// fn app() -> String {
///     let query = use_signal(|| String::from("(min-width: 768px)"));
///
///     use_effect_cleanup(|| {
///         let subscription = subscribe(query.get());
///         move || subscription.unsubscribe()
///     }, query.get());
///     String::new()
/// }
/// ```
pub fn use_effect_cleanup<F, C, D>(effect_fn: F, deps: D)
where
    F: FnOnce() -> C + 'static,
    C: FnOnce() + 'static,
    D: PartialEq + 'static,
{
    effect_hook("use_effect_cleanup", effect_fn, deps);
}

/// Run a side effect only once, after the first commit.
///
/// The returned cleanup runs on unmount.
pub fn use_mount<F, C>(effect_fn: F)
where
    F: FnOnce() -> C + 'static,
    C: FnOnce() + 'static,
{
    // Unit deps never change
    effect_hook("use_mount", effect_fn, ());
}

/// Storage for memoized computation state.
struct MemoSlot<T, D> {
    value: Option<T>,
    deps: Option<D>,
}

/// Memoize a computation based on dependencies.
///
/// The compute function only runs when dependencies change.
pub fn use_memo<T, F, D>(compute: F, deps: D) -> T
where
    T: Clone + 'static,
    F: FnOnce() -> T,
    D: PartialEq + 'static,
{
    let slot = with_registry("use_memo", |registry| {
        registry
            .use_hook("use_memo", || {
                Rc::new(RefCell::new(MemoSlot::<T, D> {
                    value: None,
                    deps: None,
                }))
            })
            .0
    });

    let cached = {
        let slot = slot.borrow();
        match (&slot.value, &slot.deps) {
            (Some(value), Some(old_deps)) if old_deps == &deps => Some(value.clone()),
            _ => None,
        }
    };

    match cached {
        Some(value) => value,
        None => {
            let value = compute();
            let mut slot = slot.borrow_mut();
            slot.value = Some(value.clone());
            slot.deps = Some(deps);
            value
        }
    }
}

/// Create a memoized callback that only changes when dependencies change.
pub fn use_callback<F, D>(callback: F, deps: D) -> F
where
    F: Clone + 'static,
    D: PartialEq + 'static,
{
    use_memo(|| callback, deps)
}

// ============================================================================
// External stores
// ============================================================================

/// State that lives outside the renderer and announces its own changes.
///
/// All readers of one store see the same snapshot, which is what makes
/// [`use_sync_external_store`] free of tearing.
pub trait ExternalStore: 'static {
    type Snapshot: Clone + PartialEq + 'static;

    /// Start listening. `on_change` must be called after every change.
    fn subscribe(&self, on_change: Rc<dyn Fn()>) -> Subscription;

    /// The current value next to a live window.
    fn snapshot(&self) -> Self::Snapshot;

    /// The value to render where no live window exists.
    fn server_snapshot(&self) -> Self::Snapshot;
}

struct StoreSlot<S: ExternalStore> {
    /// Store and snapshot of the latest render
    rendered: RefCell<Option<(Rc<S>, S::Snapshot)>>,
    /// Store the live subscription belongs to
    subscribed: RefCell<Option<Rc<S>>>,
    subscription: RefCell<Option<Subscription>>,
}

impl<S: ExternalStore> StoreSlot<S> {
    fn unsubscribe(&self) {
        let subscription = self.subscription.borrow_mut().take();
        drop(subscription);
        self.subscribed.borrow_mut().take();
    }
}

impl<S: ExternalStore> Teardown for StoreSlot<S> {
    fn teardown(&self) {
        self.unsubscribe();
        self.rendered.borrow_mut().take();
    }
}

impl<S: ExternalStore> CommitCheck for StoreSlot<S> {
    fn is_stale(&self) -> bool {
        let rendered = self.rendered.borrow().clone();
        match rendered {
            Some((store, snapshot)) => !same_snapshot(&store.snapshot(), &snapshot),
            None => false,
        }
    }
}

/// Snapshot equality where two values that are each unequal to themselves
/// (such as `f64::NAN`) count as the same.
fn same_snapshot<T: PartialEq>(a: &T, b: &T) -> bool {
    #[allow(clippy::eq_op)]
    let unordered = a != a && b != b;
    a == b || unordered
}

/// Read an external store so that every reader in a render sees one value.
///
/// - Server renders return [`ExternalStore::server_snapshot`] and never subscribe.
/// - Client renders return [`ExternalStore::snapshot`]. The store is
///   subscribed at commit and re-subscribed when a different store is passed.
/// - A change re-renders the root only when the snapshot differs from the
///   one last rendered.
/// - If the snapshot moves while the render is in progress, the root renders
///   again before its output is used.
pub fn use_sync_external_store<S: ExternalStore>(store: Rc<S>) -> S::Snapshot {
    with_registry("use_sync_external_store", move |registry| {
        let (slot, created) = registry.use_hook("use_sync_external_store", || {
            Rc::new(StoreSlot::<S> {
                rendered: RefCell::new(None),
                subscribed: RefCell::new(None),
                subscription: RefCell::new(None),
            })
        });
        if created {
            registry.teardowns.push(slot.clone());
            registry.commit_checks.push(slot.clone());
        }

        if registry.mode == RenderMode::Server {
            return store.server_snapshot();
        }

        let snapshot = store.snapshot();
        *slot.rendered.borrow_mut() = Some((Rc::clone(&store), snapshot.clone()));

        let same_store = slot
            .subscribed
            .borrow()
            .as_ref()
            .is_some_and(|subscribed| Rc::ptr_eq(subscribed, &store));
        if !same_store {
            let handle = registry.handle.clone();
            registry.queue_effect(Box::new(move || {
                slot.unsubscribe();

                let on_change: Rc<dyn Fn()> = {
                    let slot: Weak<StoreSlot<S>> = Rc::downgrade(&slot);
                    let handle = handle.clone();
                    Rc::new(move || {
                        if slot.upgrade().is_some_and(|slot| slot.is_stale()) {
                            handle.request_render();
                        }
                    })
                };
                let subscription = store.subscribe(on_change);
                *slot.subscription.borrow_mut() = Some(subscription);
                *slot.subscribed.borrow_mut() = Some(store);

                // The store may have moved between render and subscribe
                if slot.is_stale() {
                    handle.request_render();
                }
            }));
        }

        snapshot
    })
}
