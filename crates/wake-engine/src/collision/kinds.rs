use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Stable tag naming the kind of a collidable ("boat", "rock", "shark").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KindId(pub u16);

/// Registry of collidable kinds and their declared supertypes.
///
/// A parent must be registered before its children, so parents always have
/// smaller ids and the ancestor chain is finite.
#[derive(Debug, Clone, Default)]
pub struct KindTable {
    names: Vec<String>,
    parents: Vec<Option<KindId>>,
    by_name: HashMap<String, KindId>,
}

impl KindTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name` as a subtype of `parent`. Registering an existing
    /// name returns its id unchanged.
    pub fn register(&mut self, name: &str, parent: Option<KindId>) -> KindId {
        if let Some(&existing) = self.by_name.get(name) {
            log::debug!("kind '{name}' already registered as {}", existing.0);
            return existing;
        }
        let parent = match parent {
            Some(p) if (p.0 as usize) < self.names.len() => Some(p),
            Some(p) => {
                log::warn!("kind '{name}': unknown parent {}, registering as a root kind", p.0);
                None
            }
            None => None,
        };
        let id = KindId(self.names.len() as u16);
        self.names.push(name.to_string());
        self.parents.push(parent);
        self.by_name.insert(name.to_string(), id);
        id
    }

    pub fn lookup(&self, name: &str) -> Option<KindId> {
        self.by_name.get(name).copied()
    }

    pub fn name(&self, kind: KindId) -> Option<&str> {
        self.names.get(kind.0 as usize).map(String::as_str)
    }

    pub fn parent(&self, kind: KindId) -> Option<KindId> {
        self.parents.get(kind.0 as usize).copied().flatten()
    }

    /// `kind` itself, then each declared supertype up to the root.
    pub fn ancestors(&self, kind: KindId) -> impl Iterator<Item = KindId> + '_ {
        let start = ((kind.0 as usize) < self.names.len()).then_some(kind);
        std::iter::successors(start, move |k| self.parent(*k))
    }

    pub fn is_a(&self, kind: KindId, ancestor: KindId) -> bool {
        self.ancestors(kind).any(|k| k == ancestor)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
