//! Reactive Runtime
//!
//! The runtime is the central coordinator between observed state and effects.
//! It owns the dependency registry and the tracking context, and implements
//! the track/trigger protocol that interception layers call.
//!
//! # How It Works
//!
//! 1. An effect runs and becomes the active effect of its runtime.
//!
//! 2. Every intercepted read calls [`track`]. If an effect is active and the
//!    tracking gate is open, the runtime resolves (or creates) the dependency
//!    set for the `(target, key)` pair and links it with the effect in both
//!    directions.
//!
//! 3. Every intercepted write calls [`trigger`]. The runtime snapshots the
//!    dependency set for the pair and, for each member, calls its scheduler or
//!    re-runs it.
//!
//! # Threading
//!
//! Runtimes are single-threaded. Each thread lazily gets its own default
//! runtime, reachable through [`Runtime::current`] and the free functions in
//! this module. Tests and embedders that want isolation can build their own
//! with [`Runtime::new`].

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use super::context::{ContextGuard, TrackingContext};
use super::effect::ReactiveEffect;
use super::options::EffectOptions;
use super::runner::Runner;
use super::{EffectId, ObjectId, PropertyKey};
use crate::error::Result;
use crate::graph::{DepId, DepRegistry, RegistryStats};

/// Something that can sit in a dependency set.
///
/// Implemented by effects; the registry stores members as
/// `Rc<dyn Reactive>` so effects with different result types share a set.
pub(crate) trait Reactive {
    /// Get the effect ID used as the membership key.
    fn effect_id(&self) -> EffectId;

    /// Whether the effect still accepts subscriptions and notifications.
    fn is_active(&self) -> bool;

    /// Whether notifications go to a scheduler rather than a direct re-run.
    fn has_scheduler(&self) -> bool;

    /// Record the back-reference for a newly joined set.
    fn add_membership(&self, dep: DepId);

    /// React to a change: hand off to the scheduler if there is one,
    /// otherwise re-run synchronously.
    fn notify(self: Rc<Self>);

    /// Detach from every set, fire the stop hook, and deactivate.
    fn stop(&self);
}

pub(crate) struct RuntimeInner {
    registry: RefCell<DepRegistry>,
    context: TrackingContext,
}

impl RuntimeInner {
    pub(crate) fn enter(&self, effect: Rc<dyn Reactive>) -> ContextGuard<'_> {
        self.context.enter(effect)
    }

    /// Detach `effect` from every set in `deps`.
    pub(crate) fn remove_memberships(&self, effect: EffectId, deps: &[DepId]) {
        let mut registry = self.registry.borrow_mut();
        for &dep in deps {
            if let Some(set) = registry.get_mut(dep) {
                set.remove(effect);
            }
        }
    }
}

thread_local! {
    static CURRENT: Runtime = Runtime::new();
}

/// Handle to a dependency registry and its tracking context.
///
/// Cloning is cheap and yields a handle to the same runtime. Effects only
/// hold a weak handle, but a computation that captures a clone keeps the
/// runtime alive for as long as the effect is subscribed; call
/// [`dispose`](Runtime::dispose) (or stop each effect) to release it.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    /// Create an isolated runtime with an empty registry.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RuntimeInner {
                registry: RefCell::new(DepRegistry::new()),
                context: TrackingContext::new(),
            }),
        }
    }

    /// The default runtime of the calling thread.
    pub fn current() -> Self {
        CURRENT.with(Runtime::clone)
    }

    pub(crate) fn downgrade(&self) -> Weak<RuntimeInner> {
        Rc::downgrade(&self.inner)
    }

    /// Whether a read right now would subscribe anything.
    pub fn is_tracking(&self) -> bool {
        self.inner.context.is_tracking()
    }

    /// Run `f` with tracking disabled, then restore the previous state.
    pub fn untracked<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.inner.context.pause();
        f()
    }

    /// Record that the active effect read `key` on `target`.
    ///
    /// Does nothing outside an effect run or while tracking is paused.
    pub fn track(&self, target: ObjectId, key: impl Into<PropertyKey>) {
        let Some(effect) = self.subscriber() else {
            return;
        };

        let dep = self
            .inner
            .registry
            .borrow_mut()
            .resolve_or_create(target, key.into());
        self.subscribe(effect, dep);
    }

    /// Subscribe the active effect to `dep`.
    ///
    /// Idempotent: an effect already in the set is left alone, so repeated
    /// reads never cause repeated re-runs.
    pub fn track_effects(&self, dep: DepId) {
        if let Some(effect) = self.subscriber() {
            self.subscribe(effect, dep);
        }
    }

    /// The effect a read right now would subscribe. A stopped effect whose
    /// computation is still running subscribes nothing.
    fn subscriber(&self) -> Option<Rc<dyn Reactive>> {
        self.inner
            .context
            .tracking_effect()
            .filter(|effect| effect.is_active())
    }

    fn subscribe(&self, effect: Rc<dyn Reactive>, dep: DepId) {
        let inserted = match self.inner.registry.borrow_mut().get_mut(dep) {
            Some(set) => set.insert(Rc::clone(&effect)),
            None => false,
        };

        if inserted {
            effect.add_membership(dep);
            trace!(effect = %effect.effect_id(), %dep, "subscribed");
        }
    }

    /// Notify every effect that read `key` on `target`.
    ///
    /// A write nobody observed is not an error; it is simply a no-op. Use
    /// [`try_trigger`](Self::try_trigger) to detect it.
    pub fn trigger(&self, target: ObjectId, key: impl Into<PropertyKey>) {
        let key = key.into();
        let lookup = self.inner.registry.borrow().lookup(target, &key);
        match lookup {
            Ok(dep) => {
                self.trigger_effects(dep);
            }
            Err(err) => trace!(%err, "trigger ignored"),
        }
    }

    /// Like [`trigger`](Self::trigger), but fails if no read of the pair was
    /// ever tracked. Returns how many effects were notified.
    pub fn try_trigger(&self, target: ObjectId, key: impl Into<PropertyKey>) -> Result<usize> {
        let dep = self.inner.registry.borrow().lookup(target, &key.into())?;
        Ok(self.trigger_effects(dep))
    }

    /// Notify every member of `dep`. Returns how many effects were notified.
    ///
    /// Members are snapshotted first, so effects may subscribe, unsubscribe
    /// or stop during the dispatch. Effects that join during the dispatch
    /// are not notified by it; effects stopped before their turn are skipped.
    /// The effect that is currently running is never re-run directly by its
    /// own write; if it has a scheduler, the scheduler is still called.
    pub fn trigger_effects(&self, dep: DepId) -> usize {
        let snapshot = match self.inner.registry.borrow().get(dep) {
            Some(set) => {
                trace!(%dep, origin = ?set.origin(), subscribers = set.len(), "dispatch");
                set.snapshot()
            }
            None => return 0,
        };
        let running = self.inner.context.active_effect_id();

        let mut notified = 0;
        for effect in snapshot {
            let id = effect.effect_id();
            if !effect.is_active() {
                continue;
            }
            if running == Some(id) && !effect.has_scheduler() {
                trace!(effect = %id, "skipping self-trigger");
                continue;
            }

            trace!(effect = %id, "notify");
            effect.notify();
            notified += 1;
        }
        notified
    }

    /// Allocate a dependency set that is not keyed by any `(target, key)`.
    ///
    /// Ref-like collaborators own one of these per value and drive it with
    /// [`track_effects`](Self::track_effects) and
    /// [`trigger_effects`](Self::trigger_effects).
    pub fn create_dep(&self) -> DepId {
        self.inner.registry.borrow_mut().create_standalone()
    }

    /// Number of effects currently subscribed to `key` on `target`.
    pub fn dependent_count(&self, target: ObjectId, key: impl Into<PropertyKey>) -> usize {
        let registry = self.inner.registry.borrow();
        registry
            .lookup(target, &key.into())
            .ok()
            .and_then(|dep| registry.get(dep))
            .map_or(0, |set| set.len())
    }

    /// Number of effects currently subscribed to `dep`.
    pub fn dep_len(&self, dep: DepId) -> usize {
        self.inner.registry.borrow().get(dep).map_or(0, |set| set.len())
    }

    /// Whether `effect` is currently a member of `dep`.
    pub fn is_subscribed(&self, effect: EffectId, dep: DepId) -> bool {
        self.inner
            .registry
            .borrow()
            .get(dep)
            .is_some_and(|set| set.contains(effect))
    }

    pub fn stats(&self) -> RegistryStats {
        self.inner.registry.borrow().stats()
    }

    /// Stop every effect subscribed anywhere in this runtime. Returns how
    /// many effects were stopped.
    ///
    /// Subscribed effects are owned by the registry, so an effect whose
    /// computation captures a handle to its own runtime keeps that runtime
    /// alive. Disposing breaks the cycle; the dependency sets stay in place,
    /// empty.
    pub fn dispose(&self) -> usize {
        let subscribers = self.inner.registry.borrow().subscribers();
        for effect in &subscribers {
            effect.stop();
        }
        debug!(stopped = subscribers.len(), "runtime disposed");
        subscribers.len()
    }

    /// Wrap `computation` in an effect owned by this runtime, run it once to
    /// collect its dependencies, and return its runner.
    pub fn effect<T, F>(&self, computation: F, options: EffectOptions) -> Runner<T>
    where
        T: 'static,
        F: Fn() -> T + 'static,
    {
        let effect = ReactiveEffect::new(self, computation, options);
        effect.run();
        Runner::new(effect)
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("stats", &self.stats())
            .field("depth", &self.inner.context.depth())
            .finish()
    }
}

/// Record a read on the current thread's runtime.
pub fn track(target: ObjectId, key: impl Into<PropertyKey>) {
    Runtime::current().track(target, key);
}

/// Record a write on the current thread's runtime.
pub fn trigger(target: ObjectId, key: impl Into<PropertyKey>) {
    Runtime::current().trigger(target, key);
}

/// Whether a read on the current thread would be tracked.
pub fn is_tracking() -> bool {
    Runtime::current().is_tracking()
}

/// Run `f` without tracking on the current thread's runtime.
pub fn untracked<R>(f: impl FnOnce() -> R) -> R {
    Runtime::current().untracked(f)
}
