//! Dependency Graph
//!
//! This module holds the observer graph: which effects read which observed
//! locations.
//!
//! # Overview
//!
//! The graph is bipartite. On one side are dependency sets, one per
//! `(target, key)` pair that has ever been read inside an effect (plus any
//! standalone sets created by ref-like collaborators). On the other side are
//! effects. An edge exists when an effect is a member of a set, and every edge
//! is recorded twice:
//!
//! - The set holds a strong reference to the effect, keyed by its ID.
//! - The effect holds the set's [`DepId`] in its membership list.
//!
//! Writes walk the first direction to find effects to re-run. Stopping an
//! effect walks the second direction so teardown costs O(memberships) instead
//! of a scan over the whole registry.

pub(crate) mod dep;
mod registry;

pub use dep::DepId;
pub use registry::RegistryStats;

pub(crate) use registry::DepRegistry;
