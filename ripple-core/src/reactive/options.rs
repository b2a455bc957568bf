//! Effect configuration.

use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

/// Callback that decides when a triggered effect re-runs.
pub(crate) type Scheduler = Rc<dyn Fn()>;

/// Callback fired once when an effect is stopped.
pub(crate) type StopHook = Box<dyn FnOnce()>;

/// Options accepted by [`effect`](crate::reactive::effect).
///
/// Two fields change behavior: the scheduler and the stop hook. Anything
/// else is metadata, copied onto the effect for layers built on top of the
/// core (a `lazy` flag, a debug label) and never interpreted here.
///
/// # Example
///
/// ```rust
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use ripple_core::reactive::EffectOptions;
///
/// let queue = Rc::new(RefCell::new(Vec::new()));
/// let pending = queue.clone();
///
/// let options = EffectOptions::new()
///     .scheduler(move || pending.borrow_mut().push("rerun"))
///     .on_stop(|| println!("stopped"))
///     .meta("label", "counter");
/// ```
#[derive(Default)]
pub struct EffectOptions {
    pub(crate) scheduler: Option<Scheduler>,
    pub(crate) on_stop: Option<StopHook>,
    pub(crate) metadata: Map<String, Value>,
}

impl EffectOptions {
    /// Options with no scheduler, no stop hook and no metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Call `scheduler` on trigger instead of re-running directly.
    ///
    /// The scheduler owns the decision of whether and when to re-run; it
    /// usually queues the effect's runner somewhere.
    pub fn scheduler(mut self, scheduler: impl Fn() + 'static) -> Self {
        self.scheduler = Some(Rc::new(scheduler));
        self
    }

    /// Call `on_stop` when the effect is stopped.
    pub fn on_stop(mut self, on_stop: impl FnOnce() + 'static) -> Self {
        self.on_stop = Some(Box::new(on_stop));
        self
    }

    /// Attach a metadata entry. A repeated key overwrites the earlier value.
    pub fn meta(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

impl fmt::Debug for EffectOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EffectOptions")
            .field("scheduler", &self.scheduler.is_some())
            .field("on_stop", &self.on_stop.is_some())
            .field("metadata", &self.metadata)
            .finish()
    }
}
