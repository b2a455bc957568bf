//! Reactive Primitives
//!
//! This module implements the effect abstraction and the track/trigger
//! protocol that connects observed reads and writes to it.
//!
//! # Concepts
//!
//! ## Effects
//!
//! An effect is a computation that re-runs whenever state it read during its
//! last run changes. Effects are created with [`effect`], which runs them once
//! immediately and returns a [`Runner`].
//!
//! ## Track and trigger
//!
//! The core never sees the observed objects. An interception layer (a proxy,
//! a setter, a wrapper type) calls [`track`] on every read and [`trigger`] on
//! every write, naming the object by [`ObjectId`] and the property by
//! [`PropertyKey`].
//!
//! ## Runtimes
//!
//! A [`Runtime`] owns the dependency registry and the tracking context. Each
//! thread has a default runtime used by the free functions; isolated runtimes
//! can be created explicitly.
//!
//! # Implementation Notes
//!
//! The active effect is kept on a per-runtime stack rather than threaded
//! through calls, which is what lets `track` find its subscriber implicitly.
//! Nested runs push and pop their own frame, so an outer effect keeps
//! tracking after an inner effect it triggered has finished.

mod context;
mod effect;
mod ids;
mod key;
mod options;
mod runner;
mod runtime;

pub use effect::ReactiveEffect;
pub use ids::{EffectId, ObjectId};
pub use key::PropertyKey;
pub use options::EffectOptions;
pub use runner::{effect, stop, Runner};
pub use runtime::{is_tracking, track, trigger, untracked, Runtime};

pub(crate) use runtime::Reactive;
