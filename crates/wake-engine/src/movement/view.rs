use std::collections::BTreeMap;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::api::types::EntityId;

/// What a strategy may know about another entity this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewEntry {
    pub pos: Vec2,
    pub velocity: Vec2,
    pub size: Vec2,
    pub tag: String,
}

/// Read-only snapshot of the active entities, taken once per tick before
/// any movement runs. Ordered by id so scans are deterministic.
#[derive(Debug, Clone, Default)]
pub struct WorldView {
    entries: BTreeMap<EntityId, ViewEntry>,
}

impl WorldView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: EntityId, entry: ViewEntry) {
        self.entries.insert(id, entry);
    }

    /// Convenience for tests and hosts: a point entity with a tag.
    pub fn with_point(mut self, id: EntityId, tag: &str, pos: Vec2, velocity: Vec2) -> Self {
        self.insert(
            id,
            ViewEntry {
                pos,
                velocity,
                size: Vec2::ZERO,
                tag: tag.to_string(),
            },
        );
        self
    }

    pub fn get(&self, id: EntityId) -> Option<&ViewEntry> {
        self.entries.get(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries matched by a target set, in id order. Unknown ids are skipped.
    pub fn select<'a>(
        &'a self,
        set: &'a TargetSet,
    ) -> Box<dyn Iterator<Item = (EntityId, &'a ViewEntry)> + 'a> {
        match set {
            TargetSet::Ids(ids) => Box::new(
                ids.iter()
                    .filter_map(move |id| self.entries.get(id).map(|e| (*id, e))),
            ),
            TargetSet::Tagged(tag) => Box::new(
                self.entries
                    .iter()
                    .filter(move |(_, e)| e.tag == *tag)
                    .map(|(id, e)| (*id, e)),
            ),
        }
    }
}

/// A group of candidate entities, by explicit id or by tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetSet {
    Ids(Vec<EntityId>),
    Tagged(String),
}

impl TargetSet {
    pub fn tagged(tag: impl Into<String>) -> Self {
        TargetSet::Tagged(tag.into())
    }
}
