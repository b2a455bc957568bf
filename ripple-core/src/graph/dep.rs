//! Dependency Sets
//!
//! A dependency set holds the effects subscribed to one `(target, key)` pair,
//! or to one standalone dependency owned by a ref-like collaborator.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::reactive::{EffectId, ObjectId, PropertyKey, Reactive};

/// Stable handle to a dependency set inside a registry.
///
/// Sets are never removed from their registry, so a handle stays valid for
/// the registry's whole lifetime. Effects keep these handles as their
/// membership back-references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepId(usize);

impl DepId {
    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    /// Index of the set in its registry's arena.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for DepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dep#{}", self.0)
    }
}

/// The set of effects interested in one dependency.
///
/// The set is the canonical owner of membership: it holds the strong
/// references that keep subscribed effects alive, while each effect only
/// remembers the [`DepId`]s it belongs to.
pub(crate) struct Dep {
    /// The location this set was created for. `None` for standalone sets.
    origin: Option<(ObjectId, PropertyKey)>,

    /// Subscribed effects, in subscription order.
    subscribers: IndexMap<EffectId, Rc<dyn Reactive>>,
}

impl Dep {
    /// Create an empty set keyed to `(target, key)`.
    pub fn keyed(target: ObjectId, key: PropertyKey) -> Self {
        Self {
            origin: Some((target, key)),
            subscribers: IndexMap::new(),
        }
    }

    /// Create an empty set not tied to any location.
    pub fn standalone() -> Self {
        Self {
            origin: None,
            subscribers: IndexMap::new(),
        }
    }

    pub fn origin(&self) -> Option<&(ObjectId, PropertyKey)> {
        self.origin.as_ref()
    }

    pub fn contains(&self, effect: EffectId) -> bool {
        self.subscribers.contains_key(&effect)
    }

    /// Add a subscriber. Returns `false` if it was already a member.
    pub fn insert(&mut self, effect: Rc<dyn Reactive>) -> bool {
        let id = effect.effect_id();
        if self.subscribers.contains_key(&id) {
            return false;
        }
        self.subscribers.insert(id, effect);
        true
    }

    /// Remove a subscriber. Returns `false` if it was not a member.
    pub fn remove(&mut self, effect: EffectId) -> bool {
        self.subscribers.shift_remove(&effect).is_some()
    }

    pub fn len(&self) -> usize {
        self.subscribers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subscribers.is_empty()
    }

    /// Copy out the current members so dispatch can run them while the set
    /// itself is being modified.
    pub fn snapshot(&self) -> Vec<Rc<dyn Reactive>> {
        self.subscribers.values().cloned().collect()
    }

    pub fn members(&self) -> impl Iterator<Item = (EffectId, &Rc<dyn Reactive>)> + '_ {
        self.subscribers.iter().map(|(id, effect)| (*id, effect))
    }
}

impl fmt::Debug for Dep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dep")
            .field("origin", &self.origin)
            .field("subscribers", &self.subscribers.keys().collect::<Vec<_>>())
            .finish()
    }
}
