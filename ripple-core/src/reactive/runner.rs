//! Effect Façade
//!
//! [`effect`] turns a plain closure into a tracked effect and hands back a
//! [`Runner`]: the caller's handle for re-invoking the computation and for
//! cancelling it later with [`stop`].

use std::fmt;

use super::effect::ReactiveEffect;
use super::options::EffectOptions;
use super::runtime::Runtime;

/// Callable handle returned by [`effect`].
///
/// Calling [`run`](Runner::run) re-invokes the computation under tracking
/// and returns its result. The underlying effect stays reachable through
/// [`effect`](Runner::effect) for cancellation and introspection.
pub struct Runner<T: 'static> {
    effect: ReactiveEffect<T>,
}

impl<T: 'static> Runner<T> {
    pub(crate) fn new(effect: ReactiveEffect<T>) -> Self {
        Self { effect }
    }

    /// Run the computation and return its result.
    pub fn run(&self) -> T {
        self.effect.run()
    }

    /// The effect this runner drives.
    pub fn effect(&self) -> &ReactiveEffect<T> {
        &self.effect
    }

    /// Stop the underlying effect. Same as [`stop`].
    pub fn stop(&self) {
        self.effect.stop();
    }
}

impl<T: 'static> Clone for Runner<T> {
    fn clone(&self) -> Self {
        Self {
            effect: self.effect.clone(),
        }
    }
}

impl<T: 'static> fmt::Debug for Runner<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Runner").field(&self.effect).finish()
    }
}

/// Create an effect on the current thread's runtime.
///
/// The computation runs once before this returns, so its dependencies are
/// in place by the time the caller sees the runner.
///
/// # Example
///
/// ```rust
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// use ripple_core::reactive::{effect, stop, track, trigger, EffectOptions, ObjectId};
///
/// let target = ObjectId::new();
/// let count = Rc::new(Cell::new(0));
///
/// let value = count.clone();
/// let runner = effect(
///     move || {
///         track(target, "count");
///         value.get()
///     },
///     EffectOptions::new(),
/// );
/// assert_eq!(runner.run(), 0);
///
/// count.set(1);
/// trigger(target, "count");
/// assert_eq!(runner.run(), 1);
///
/// stop(&runner);
/// ```
pub fn effect<T, F>(computation: F, options: EffectOptions) -> Runner<T>
where
    T: 'static,
    F: Fn() -> T + 'static,
{
    Runtime::current().effect(computation, options)
}

/// Stop the effect behind `runner`.
pub fn stop<T: 'static>(runner: &Runner<T>) {
    runner.stop();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    use crate::reactive::{track, trigger, ObjectId};

    #[test]
    fn effect_runs_on_creation() {
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();

        let runner = effect(move || counter.set(counter.get() + 1), EffectOptions::new());

        assert_eq!(runs.get(), 1);
        assert_eq!(runner.effect().run_count(), 1);
    }

    #[test]
    fn trigger_reruns_with_new_value() {
        let target = ObjectId::new();
        let count = Rc::new(Cell::new(0));
        let seen = Rc::new(RefCell::new(Vec::new()));

        let value = count.clone();
        let log = seen.clone();
        let _runner = effect(
            move || {
                track(target, "count");
                log.borrow_mut().push(value.get());
            },
            EffectOptions::new(),
        );

        count.set(1);
        trigger(target, "count");

        assert_eq!(*seen.borrow(), vec![0, 1]);
    }

    #[test]
    fn stop_via_free_function() {
        let target = ObjectId::new();
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();

        let runner = effect(
            move || {
                track(target, "count");
                counter.set(counter.get() + 1);
            },
            EffectOptions::new(),
        );

        stop(&runner);
        trigger(target, "count");

        assert_eq!(runs.get(), 1);
        assert!(!runner.effect().is_active());
    }

    #[test]
    fn runner_clone_drives_same_effect() {
        let runner = effect(|| 5, EffectOptions::new());
        let other = runner.clone();

        assert_eq!(other.run(), 5);
        assert_eq!(runner.effect().run_count(), 2);
        assert_eq!(runner.effect().id(), other.effect().id());
    }
}
