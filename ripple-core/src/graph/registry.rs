//! Dependency Registry
//!
//! Two-level index from observed object to property key to dependency set.
//! Sets live in an arena and are addressed by [`DepId`], so effects can hold
//! back-references without aliasing the containers.

use std::collections::HashMap;
use std::rc::Rc;

use indexmap::IndexMap;
use serde::Serialize;

use super::dep::{Dep, DepId};
use crate::error::{ReactiveError, Result};
use crate::reactive::{EffectId, ObjectId, PropertyKey, Reactive};

/// Counters describing the size of a registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    /// Number of targets with at least one tracked key.
    pub targets: usize,

    /// Number of dependency sets, keyed and standalone.
    pub dependency_sets: usize,

    /// Total effect memberships across all sets.
    pub subscriptions: usize,

    /// Sets with no members left, typically after their effects stopped.
    pub empty_sets: usize,
}

/// Owns every dependency set of one runtime.
///
/// Entries are created lazily on first track and never removed; stopping an
/// effect can empty a set but the set stays addressable.
#[derive(Debug, Default)]
pub(crate) struct DepRegistry {
    targets: HashMap<ObjectId, HashMap<PropertyKey, DepId>>,
    deps: Vec<Dep>,
}

impl DepRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve the set for `(target, key)`, creating the key map and the set
    /// on first use.
    pub fn resolve_or_create(&mut self, target: ObjectId, key: PropertyKey) -> DepId {
        let deps = &mut self.deps;
        *self
            .targets
            .entry(target)
            .or_default()
            .entry(key)
            .or_insert_with_key(|key| {
                deps.push(Dep::keyed(target, key.clone()));
                DepId::new(deps.len() - 1)
            })
    }

    /// Resolve the set for `(target, key)` without creating anything.
    pub fn lookup(&self, target: ObjectId, key: &PropertyKey) -> Result<DepId> {
        let keys = self
            .targets
            .get(&target)
            .ok_or(ReactiveError::UntrackedTarget { target })?;

        keys.get(key)
            .copied()
            .ok_or_else(|| ReactiveError::UntrackedKey {
                target,
                key: key.clone(),
            })
    }

    /// Allocate a set that is not reachable through any `(target, key)`.
    pub fn create_standalone(&mut self) -> DepId {
        self.deps.push(Dep::standalone());
        DepId::new(self.deps.len() - 1)
    }

    pub fn get(&self, id: DepId) -> Option<&Dep> {
        self.deps.get(id.index())
    }

    pub fn get_mut(&mut self, id: DepId) -> Option<&mut Dep> {
        self.deps.get_mut(id.index())
    }

    /// Every effect subscribed to at least one set, each listed once, in
    /// order of first subscription by set.
    pub fn subscribers(&self) -> Vec<Rc<dyn Reactive>> {
        let mut seen: IndexMap<EffectId, Rc<dyn Reactive>> = IndexMap::new();
        for (id, effect) in self.deps.iter().flat_map(Dep::members) {
            seen.entry(id).or_insert_with(|| effect.clone());
        }
        seen.into_values().collect()
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            targets: self.targets.len(),
            dependency_sets: self.deps.len(),
            subscriptions: self.deps.iter().map(Dep::len).sum(),
            empty_sets: self.deps.iter().filter(|dep| dep.is_empty()).count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::dep::tests::MockReactive;

    #[test]
    fn resolve_creates_lazily_and_reuses() {
        let mut registry = DepRegistry::new();
        let target = ObjectId::new();

        let first = registry.resolve_or_create(target, "count".into());
        let again = registry.resolve_or_create(target, "count".into());
        let other = registry.resolve_or_create(target, "name".into());

        assert_eq!(first, again);
        assert_ne!(first, other);
        assert_eq!(registry.stats().targets, 1);
        assert_eq!(registry.stats().dependency_sets, 2);
    }

    #[test]
    fn lookup_distinguishes_missing_target_and_key() {
        let mut registry = DepRegistry::new();
        let target = ObjectId::new();
        let stranger = ObjectId::new();
        registry.resolve_or_create(target, "count".into());

        assert_eq!(
            registry.lookup(stranger, &"count".into()),
            Err(ReactiveError::UntrackedTarget { target: stranger })
        );
        assert_eq!(
            registry.lookup(target, &"name".into()),
            Err(ReactiveError::UntrackedKey {
                target,
                key: "name".into()
            })
        );
        assert!(registry.lookup(target, &"count".into()).is_ok());
    }

    #[test]
    fn standalone_sets_are_not_keyed() {
        let mut registry = DepRegistry::new();
        let id = registry.create_standalone();

        assert!(registry.get(id).is_some_and(|dep| dep.origin().is_none()));
        assert_eq!(registry.stats().targets, 0);
        assert_eq!(registry.stats().dependency_sets, 1);
    }

    #[test]
    fn stats_count_subscriptions() {
        let mut registry = DepRegistry::new();
        let target = ObjectId::new();
        let a = registry.resolve_or_create(target, "a".into());
        let b = registry.resolve_or_create(target, "b".into());
        let effect = MockReactive::new();

        registry.get_mut(a).unwrap().insert(effect.clone());
        registry.get_mut(b).unwrap().insert(effect.clone());

        assert_eq!(registry.stats().subscriptions, 2);

        registry.get_mut(a).unwrap().remove(effect.effect_id());
        assert_eq!(registry.stats().subscriptions, 1);
        assert_eq!(registry.stats().empty_sets, 1);
    }

    #[test]
    fn subscribers_are_listed_once() {
        let mut registry = DepRegistry::new();
        let target = ObjectId::new();
        let a = registry.resolve_or_create(target, "a".into());
        let b = registry.resolve_or_create(target, "b".into());
        let shared = MockReactive::new();
        let lone = MockReactive::new();

        registry.get_mut(a).unwrap().insert(shared.clone());
        registry.get_mut(b).unwrap().insert(shared.clone());
        registry.get_mut(b).unwrap().insert(lone.clone());

        let ids: Vec<_> = registry
            .subscribers()
            .iter()
            .map(|effect| effect.effect_id())
            .collect();
        assert_eq!(ids, vec![shared.effect_id(), lone.effect_id()]);
    }
}
