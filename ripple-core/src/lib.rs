//! Ripple Core
//!
//! This crate provides the dependency-tracking engine underneath the Ripple
//! reactive state library. It implements:
//!
//! - Effects: re-runnable computations with a stop lifecycle
//! - The dependency registry mapping observed locations to effects
//! - The track/trigger protocol called by read/write interception layers
//!
//! The crate is designed to be used both as a native Rust library and, with
//! the `python` feature, as a Python extension module via PyO3.
//!
//! # Architecture
//!
//! - `reactive`: effects, runtimes, and the track/trigger entry points
//! - `graph`: dependency sets and the registry that owns them
//! - `error`: errors reported by the strict registry operations
//!
//! # Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use ripple_core::reactive::{effect, track, trigger, EffectOptions, ObjectId};
//!
//! // An observed object with one property
//! let state = ObjectId::new();
//! let count = Rc::new(Cell::new(0));
//!
//! // The read goes through `track`
//! let value = count.clone();
//! let runner = effect(
//!     move || {
//!         track(state, "count");
//!         println!("Count: {}", value.get());
//!     },
//!     EffectOptions::new(),
//! );
//!
//! // The write goes through `trigger`
//! count.set(5);
//! trigger(state, "count");
//! // Effect automatically runs, prints: "Count: 5"
//!
//! assert_eq!(runner.effect().run_count(), 2);
//! ```

pub mod error;
pub mod graph;
pub mod reactive;

#[cfg(feature = "python")]
mod python;

pub use error::{ReactiveError, Result};
