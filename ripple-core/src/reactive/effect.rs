//! Effect Implementation
//!
//! A reactive effect is a re-runnable computation that subscribes to every
//! observed location it reads while running.
//!
//! # How Effects Work
//!
//! 1. The façade creates the effect and runs it once, which establishes its
//!    initial memberships.
//!
//! 2. During a run, the effect is the active effect of its runtime, so each
//!    [`track`](super::track) call adds it to one dependency set and records
//!    that set in the effect's membership list.
//!
//! 3. When a write triggers one of those sets, the effect's scheduler is
//!    called if it has one; otherwise the effect re-runs synchronously.
//!
//! 4. Memberships accumulate across runs. They are only ever released by
//!    [`stop`](ReactiveEffect::stop).
//!
//! # Stopping
//!
//! Stopping is permanent. It detaches the effect from every set, fires the
//! `on_stop` hook once, then deactivates the effect. A stopped effect can
//! still be run: it just calls its computation without tracking anything.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use serde_json::{Map, Value};
use smallvec::SmallVec;
use tracing::debug;

use super::options::{EffectOptions, Scheduler, StopHook};
use super::runtime::{Reactive, Runtime, RuntimeInner};
use super::EffectId;
use crate::graph::DepId;

/// Shared state behind every handle to one effect.
struct EffectCore<T> {
    id: EffectId,

    /// The runtime whose registry holds this effect's memberships.
    runtime: Weak<RuntimeInner>,

    computation: Box<dyn Fn() -> T>,

    /// True until the first `stop`.
    active: Cell<bool>,

    /// Sets this effect belongs to. Back-references used for cleanup only.
    memberships: RefCell<SmallVec<[DepId; 4]>>,

    scheduler: Option<Scheduler>,

    /// Taken on stop, so it can only ever fire once.
    on_stop: RefCell<Option<StopHook>>,

    /// Collaborator-defined metadata.
    metadata: RefCell<Map<String, Value>>,

    run_count: Cell<usize>,
}

impl<T: 'static> EffectCore<T> {
    fn run(self: &Rc<Self>) -> T {
        self.run_count.set(self.run_count.get() + 1);

        if !self.active.get() {
            return (self.computation)();
        }
        let Some(runtime) = self.runtime.upgrade() else {
            return (self.computation)();
        };

        let this: Rc<dyn Reactive> = self.clone();
        let _guard = runtime.enter(this);
        (self.computation)()
    }
}

impl<T: 'static> Reactive for EffectCore<T> {
    fn effect_id(&self) -> EffectId {
        self.id
    }

    fn is_active(&self) -> bool {
        self.active.get()
    }

    fn add_membership(&self, dep: DepId) {
        self.memberships.borrow_mut().push(dep);
    }

    fn has_scheduler(&self) -> bool {
        self.scheduler.is_some()
    }

    fn notify(self: Rc<Self>) {
        match &self.scheduler {
            Some(scheduler) => scheduler(),
            None => {
                self.run();
            }
        }
    }

    fn stop(&self) {
        if !self.active.get() {
            return;
        }

        let memberships = std::mem::take(&mut *self.memberships.borrow_mut());
        if let Some(runtime) = self.runtime.upgrade() {
            runtime.remove_memberships(self.id, &memberships);
        }
        debug!(effect = %self.id, released = memberships.len(), "effect stopped");

        let on_stop = self.on_stop.borrow_mut().take();
        if let Some(on_stop) = on_stop {
            on_stop();
        }

        self.active.set(false);
    }
}

/// A trackable, re-runnable computation.
///
/// Handles are cheap to clone and share the same effect.
///
/// While subscribed, the effect is owned by its runtime's registry. A
/// computation that captures a [`Runtime`] clone, as below, therefore keeps
/// that runtime alive until the effect is stopped or the runtime is
/// [disposed](Runtime::dispose).
///
/// # Example
///
/// ```rust
/// use ripple_core::reactive::{EffectOptions, ObjectId, Runtime};
///
/// let runtime = Runtime::new();
/// let target = ObjectId::new();
///
/// let rt = runtime.clone();
/// let runner = runtime.effect(move || rt.track(target, "count"), EffectOptions::new());
///
/// assert_eq!(runner.effect().dependency_count(), 1);
/// runner.effect().stop();
/// assert_eq!(runtime.dependent_count(target, "count"), 0);
/// ```
pub struct ReactiveEffect<T: 'static> {
    core: Rc<EffectCore<T>>,
}

impl<T: 'static> ReactiveEffect<T> {
    /// Build an effect owned by `runtime` without running it.
    pub(crate) fn new<F>(runtime: &Runtime, computation: F, options: EffectOptions) -> Self
    where
        F: Fn() -> T + 'static,
    {
        let EffectOptions {
            scheduler,
            on_stop,
            metadata,
        } = options;

        let core = Rc::new(EffectCore {
            id: EffectId::new(),
            runtime: runtime.downgrade(),
            computation: Box::new(computation),
            active: Cell::new(true),
            memberships: RefCell::new(SmallVec::new()),
            scheduler,
            on_stop: RefCell::new(on_stop),
            metadata: RefCell::new(metadata),
            run_count: Cell::new(0),
        });
        debug!(effect = %core.id, scheduled = core.scheduler.is_some(), "effect created");

        Self { core }
    }

    /// Get the effect's unique ID.
    pub fn id(&self) -> EffectId {
        self.core.id
    }

    /// Run the computation and return its result.
    ///
    /// While active, the effect is the implicit subscriber for every read
    /// during the call. Once stopped, this is a plain untracked call.
    pub fn run(&self) -> T {
        self.core.run()
    }

    /// Detach from all dependency sets, fire `on_stop`, and deactivate.
    ///
    /// Calling this again has no effect.
    pub fn stop(&self) {
        self.core.stop();
    }

    /// Check if the effect has not been stopped.
    pub fn is_active(&self) -> bool {
        self.core.active.get()
    }

    /// Whether triggers go through a scheduler instead of re-running.
    pub fn has_scheduler(&self) -> bool {
        self.core.scheduler.is_some()
    }

    /// Get the number of dependency sets the effect belongs to.
    pub fn dependency_count(&self) -> usize {
        self.core.memberships.borrow().len()
    }

    /// The dependency sets the effect belongs to, in the order it joined them.
    pub fn dependencies(&self) -> Vec<DepId> {
        self.core.memberships.borrow().to_vec()
    }

    /// Get the number of times the computation has been invoked.
    pub fn run_count(&self) -> usize {
        self.core.run_count.get()
    }

    /// Read a metadata entry.
    pub fn meta(&self, key: &str) -> Option<Value> {
        self.core.metadata.borrow().get(key).cloned()
    }

    /// Write a metadata entry, returning the previous value.
    pub fn set_meta(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.core.metadata.borrow_mut().insert(key.into(), value.into())
    }
}

impl<T: 'static> Clone for ReactiveEffect<T> {
    fn clone(&self) -> Self {
        Self {
            core: Rc::clone(&self.core),
        }
    }
}

impl<T: 'static> fmt::Debug for ReactiveEffect<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactiveEffect")
            .field("id", &self.id())
            .field("active", &self.is_active())
            .field("run_count", &self.run_count())
            .field("dependency_count", &self.dependency_count())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::ObjectId;

    fn counting_effect(runtime: &Runtime, target: ObjectId) -> (ReactiveEffect<usize>, Rc<Cell<usize>>) {
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let rt = runtime.clone();
        let effect = ReactiveEffect::new(
            runtime,
            move || {
                rt.track(target, "count");
                counter.set(counter.get() + 1);
                counter.get()
            },
            EffectOptions::new(),
        );
        (effect, runs)
    }

    #[test]
    fn new_does_not_run() {
        let runtime = Runtime::new();
        let (effect, runs) = counting_effect(&runtime, ObjectId::new());

        assert_eq!(runs.get(), 0);
        assert_eq!(effect.run_count(), 0);
        assert_eq!(effect.dependency_count(), 0);
    }

    #[test]
    fn run_returns_result_and_tracks() {
        let runtime = Runtime::new();
        let target = ObjectId::new();
        let (effect, _runs) = counting_effect(&runtime, target);

        assert_eq!(effect.run(), 1);
        assert_eq!(effect.run(), 2);
        assert_eq!(effect.dependency_count(), 1);
        assert_eq!(runtime.dependent_count(target, "count"), 1);
        assert!(!runtime.is_tracking());
    }

    #[test]
    fn stop_detaches_and_deactivates() {
        let runtime = Runtime::new();
        let target = ObjectId::new();
        let (effect, runs) = counting_effect(&runtime, target);
        effect.run();

        effect.stop();

        assert!(!effect.is_active());
        assert_eq!(effect.dependency_count(), 0);
        assert_eq!(runtime.dependent_count(target, "count"), 0);

        runtime.trigger(target, "count");
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn stopped_effect_runs_untracked() {
        let runtime = Runtime::new();
        let target = ObjectId::new();
        let (effect, _runs) = counting_effect(&runtime, target);
        effect.stop();

        assert_eq!(effect.run(), 1);
        assert_eq!(effect.dependency_count(), 0);
        assert_eq!(runtime.dependent_count(target, "count"), 0);
    }

    #[test]
    fn on_stop_sees_detached_active_effect() {
        let runtime = Runtime::new();
        let target = ObjectId::new();
        let observed = Rc::new(RefCell::new(None));

        let slot: Rc<RefCell<Option<ReactiveEffect<()>>>> = Rc::new(RefCell::new(None));
        let hook_slot = slot.clone();
        let hook_observed = observed.clone();
        let rt = runtime.clone();
        let effect = ReactiveEffect::new(
            &runtime,
            move || rt.track(target, "count"),
            EffectOptions::new().on_stop(move || {
                if let Some(effect) = hook_slot.borrow().as_ref() {
                    *hook_observed.borrow_mut() =
                        Some((effect.is_active(), effect.dependency_count()));
                }
            }),
        );
        *slot.borrow_mut() = Some(effect.clone());
        effect.run();

        effect.stop();

        assert_eq!(*observed.borrow(), Some((true, 0)));
        slot.borrow_mut().take();
    }

    #[test]
    fn stop_is_idempotent() {
        let runtime = Runtime::new();
        let stops = Rc::new(Cell::new(0));
        let counter = stops.clone();
        let effect = ReactiveEffect::new(
            &runtime,
            || (),
            EffectOptions::new().on_stop(move || counter.set(counter.get() + 1)),
        );

        effect.stop();
        effect.stop();

        assert_eq!(stops.get(), 1);
    }

    #[test]
    fn metadata_is_copied_from_options() {
        let runtime = Runtime::new();
        let effect = ReactiveEffect::new(
            &runtime,
            || (),
            EffectOptions::new().meta("lazy", true),
        );

        assert_eq!(effect.meta("lazy"), Some(Value::Bool(true)));
        assert_eq!(effect.set_meta("lazy", false), Some(Value::Bool(true)));
        assert_eq!(effect.meta("missing"), None);
    }

    #[test]
    fn clone_shares_state() {
        let runtime = Runtime::new();
        let (effect1, _runs) = counting_effect(&runtime, ObjectId::new());
        let effect2 = effect1.clone();

        assert_eq!(effect1.id(), effect2.id());

        effect1.run();
        assert_eq!(effect2.run_count(), 1);

        effect2.stop();
        assert!(!effect1.is_active());
    }

    #[test]
    fn effect_outlives_runtime() {
        let runtime = Runtime::new();
        let effect = ReactiveEffect::new(&runtime, || 7, EffectOptions::new());
        drop(runtime);

        assert_eq!(effect.run(), 7);
        effect.stop();
        assert!(!effect.is_active());
    }
}
