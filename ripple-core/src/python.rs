//! Python Bindings
//!
//! Exposes the effect façade and the track/trigger protocol to Python so a
//! Python-side interception layer (descriptors, `__setattr__` hooks) can
//! drive the engine. Targets are identified by object address and keys by
//! attribute name.
//!
//! Dependency sets outlive the objects they were created for, so an address
//! alone could be reused by a new object and inherit stale subscribers. The
//! module therefore holds a strong reference to every target that was read
//! inside an effect, for the lifetime of the interpreter thread.
//!
//! Exceptions raised by Python callbacks are held until control returns to
//! Python, then re-raised from whichever call (`effect`, `trigger`, `stop`,
//! or a runner invocation) caused them. Only the first one is kept.

use std::cell::RefCell;
use std::collections::HashMap;

use pyo3::prelude::*;

use crate::reactive::{EffectOptions, ObjectId, Runner, Runtime};

thread_local! {
    static RUNTIME: Runtime = Runtime::new();
    static PENDING: RefCell<Option<PyErr>> = RefCell::new(None);
    static PINNED: RefCell<TargetPins<PyObject>> = RefCell::new(TargetPins::default());
}

/// Keeps tracked targets alive so their identities stay unique.
#[derive(Debug)]
struct TargetPins<T> {
    pins: HashMap<ObjectId, T>,
}

impl<T> Default for TargetPins<T> {
    fn default() -> Self {
        Self {
            pins: HashMap::new(),
        }
    }
}

impl<T> TargetPins<T> {
    /// Pin `target` under `id`. The first pin wins; later ones are dropped.
    fn pin(&mut self, id: ObjectId, target: impl FnOnce() -> T) -> bool {
        if self.pins.contains_key(&id) {
            return false;
        }
        self.pins.insert(id, target());
        true
    }

    fn len(&self) -> usize {
        self.pins.len()
    }
}

fn runtime() -> Runtime {
    RUNTIME.with(Runtime::clone)
}

fn defer_error(err: PyErr) {
    PENDING.with(|slot| {
        let mut slot = slot.borrow_mut();
        if slot.is_none() {
            *slot = Some(err);
        }
    });
}

fn raise_pending() -> PyResult<()> {
    match PENDING.with(|slot| slot.borrow_mut().take()) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

fn object_id(target: &Bound<'_, PyAny>) -> ObjectId {
    ObjectId::from_raw(target.as_ptr() as usize as u64)
}

/// Call `callable`, parking any exception for later.
fn call_deferred(callable: &PyObject) -> Option<PyObject> {
    Python::with_gil(|py| match callable.call0(py) {
        Ok(value) => Some(value),
        Err(err) => {
            defer_error(err);
            None
        }
    })
}

/// Python-exposed runner.
#[pyclass(name = "Runner", unsendable)]
pub struct PyRunner {
    runner: Runner<Option<PyObject>>,
}

#[pymethods]
impl PyRunner {
    /// Re-run the effect and return the function's result.
    fn __call__(&self, py: Python<'_>) -> PyResult<PyObject> {
        let out = self.runner.run();
        raise_pending()?;
        Ok(out.unwrap_or_else(|| py.None()))
    }

    /// Stop the effect.
    fn stop(&self) -> PyResult<()> {
        self.runner.stop();
        raise_pending()
    }

    #[getter]
    fn active(&self) -> bool {
        self.runner.effect().is_active()
    }

    #[getter]
    fn dependency_count(&self) -> usize {
        self.runner.effect().dependency_count()
    }

    fn __repr__(&self) -> String {
        let effect = self.runner.effect();
        format!(
            "Runner(id={}, active={}, dependencies={})",
            effect.id().raw(),
            effect.is_active(),
            effect.dependency_count()
        )
    }
}

/// Create an effect, run it once, and return its runner.
#[pyfunction]
#[pyo3(signature = (func, scheduler=None, on_stop=None))]
fn effect(
    func: PyObject,
    scheduler: Option<PyObject>,
    on_stop: Option<PyObject>,
) -> PyResult<PyRunner> {
    let mut options = EffectOptions::new();
    if let Some(scheduler) = scheduler {
        options = options.scheduler(move || {
            call_deferred(&scheduler);
        });
    }
    if let Some(on_stop) = on_stop {
        options = options.on_stop(move || {
            call_deferred(&on_stop);
        });
    }

    let runner = runtime().effect(move || call_deferred(&func), options);
    raise_pending()?;
    Ok(PyRunner { runner })
}

/// Stop the effect behind `runner`.
#[pyfunction]
fn stop(runner: PyRef<'_, PyRunner>) -> PyResult<()> {
    runner.stop()
}

/// Record a read of `target.key`.
#[pyfunction]
fn track(target: &Bound<'_, PyAny>, key: String) {
    let runtime = runtime();
    if !runtime.is_tracking() {
        return;
    }

    let id = object_id(target);
    PINNED.with(|pins| {
        pins.borrow_mut().pin(id, || target.clone().unbind());
    });
    runtime.track(id, key);
}

/// Number of objects kept alive because an effect read them.
#[pyfunction]
fn pinned_targets() -> usize {
    PINNED.with(|pins| pins.borrow().len())
}

/// Record a write of `target.key` and re-run dependent effects.
#[pyfunction]
fn trigger(target: &Bound<'_, PyAny>, key: String) -> PyResult<()> {
    runtime().trigger(object_id(target), key);
    raise_pending()
}

/// Whether a read right now would be tracked.
#[pyfunction]
fn is_tracking() -> bool {
    runtime().is_tracking()
}

/// Python module definition.
///
/// This function is called by Python when importing the module.
/// It registers all Python-exposed types and functions.
#[pymodule]
fn _core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyRunner>()?;

    m.add_function(wrap_pyfunction!(effect, m)?)?;
    m.add_function(wrap_pyfunction!(stop, m)?)?;
    m.add_function(wrap_pyfunction!(track, m)?)?;
    m.add_function(wrap_pyfunction!(trigger, m)?)?;
    m.add_function(wrap_pyfunction!(is_tracking, m)?)?;
    m.add_function(wrap_pyfunction!(pinned_targets, m)?)?;

    // Add version info
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}
