use std::collections::{BTreeMap, BTreeSet, HashMap};

use crate::api::types::EntityId;
use crate::core::physics::ContactEvent;
use super::collidable::Collidable;

/// Unordered pair of entities, stored smaller id first so `(a, b)` and
/// `(b, a)` are the same key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CollisionPair {
    first: EntityId,
    second: EntityId,
}

impl CollisionPair {
    /// `None` for a self-pair.
    pub fn new(a: EntityId, b: EntityId) -> Option<Self> {
        match a.cmp(&b) {
            std::cmp::Ordering::Less => Some(Self { first: a, second: b }),
            std::cmp::Ordering::Greater => Some(Self { first: b, second: a }),
            std::cmp::Ordering::Equal => None,
        }
    }

    pub fn first(&self) -> EntityId {
        self.first
    }

    pub fn second(&self) -> EntityId {
        self.second
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.first == id || self.second == id
    }

    /// The partner of `id`, if `id` is in the pair.
    pub fn other(&self, id: EntityId) -> Option<EntityId> {
        if self.first == id {
            Some(self.second)
        } else if self.second == id {
            Some(self.first)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PairPhase {
    Enter,
    Stay,
    Exit,
}

/// Resolves an entity id to its collidable.
pub trait CollidableLookup {
    fn collidable(&self, id: EntityId) -> Option<&Collidable>;
}

impl CollidableLookup for BTreeMap<EntityId, Collidable> {
    fn collidable(&self, id: EntityId) -> Option<&Collidable> {
        self.get(&id)
    }
}

impl CollidableLookup for HashMap<EntityId, Collidable> {
    fn collidable(&self, id: EntityId) -> Option<&Collidable> {
        self.get(&id)
    }
}

/// Set of collidable pairs currently touching.
#[derive(Debug, Clone, Default)]
pub struct CollisionPairTracker {
    pairs: BTreeSet<CollisionPair>,
}

impl CollisionPairTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a pair. `false` if either side is not a collidable or both
    /// sides are the same entity.
    pub fn add_collision_pair(&mut self, a: Option<&Collidable>, b: Option<&Collidable>) -> bool {
        match Self::resolve(a, b) {
            Some(pair) => {
                self.pairs.insert(pair);
                true
            }
            None => false,
        }
    }

    /// Stop tracking a pair, in either order. `false` if either side is not
    /// a collidable or the pair was not tracked.
    pub fn remove_collision_pair(&mut self, a: Option<&Collidable>, b: Option<&Collidable>) -> bool {
        Self::resolve(a, b).is_some_and(|pair| self.pairs.remove(&pair))
    }

    /// Whether `id` is in any tracked pair. Linear in the number of pairs.
    pub fn is_entity_in_collision(&self, id: EntityId) -> bool {
        self.pairs.iter().any(|p| p.contains(id))
    }

    /// Feed one step's contact events and classify every pair.
    ///
    /// Pairs that started this step are `Enter`, pairs that ended are
    /// `Exit`, and tracked pairs with no event are `Stay`. Events naming a
    /// non-collidable are ignored. Output is ordered by pair, then phase.
    pub fn apply_events(
        &mut self,
        events: &[ContactEvent],
        lookup: &impl CollidableLookup,
    ) -> Vec<(CollisionPair, PairPhase)> {
        let mut out = Vec::new();
        let mut touched = BTreeSet::new();

        for event in events {
            let a = lookup.collidable(event.entity_a);
            let b = lookup.collidable(event.entity_b);
            let Some(pair) = Self::resolve(a, b) else {
                continue;
            };
            touched.insert(pair);
            if event.started {
                if self.pairs.insert(pair) {
                    out.push((pair, PairPhase::Enter));
                }
            } else if self.pairs.remove(&pair) {
                out.push((pair, PairPhase::Exit));
            }
        }

        out.extend(
            self.pairs
                .iter()
                .filter(|p| !touched.contains(*p))
                .map(|p| (*p, PairPhase::Stay)),
        );
        out.sort();
        out
    }

    /// Drop every pair involving `id`. Returns the pairs removed.
    pub fn forget_entity(&mut self, id: EntityId) -> Vec<CollisionPair> {
        let gone: Vec<_> = self.pairs.iter().filter(|p| p.contains(id)).copied().collect();
        for pair in &gone {
            self.pairs.remove(pair);
        }
        gone
    }

    pub fn pairs(&self) -> impl Iterator<Item = &CollisionPair> {
        self.pairs.iter()
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    fn resolve(a: Option<&Collidable>, b: Option<&Collidable>) -> Option<CollisionPair> {
        CollisionPair::new(a?.entity, b?.entity)
    }
}
