//! Kind-dispatched collision handlers.
//!
//! Resolving a contact between A and B asks A's handler about "A visits B"
//! and B's handler about "B visits A". Handlers only read the world and
//! return an action; every action discovered in a step runs afterwards, so
//! no action can change the outcome of another contact in the same step.

use std::collections::HashMap;

use crate::api::types::EntityId;
use super::kinds::{KindId, KindTable};
use super::reconcile::Edges;

/// One side of a contact.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Participant {
    Entity { id: EntityId, kind: KindId },
    /// The world edge(s) an entity is pressed against.
    Boundary(Edges),
}

impl Participant {
    pub fn entity_id(&self) -> Option<EntityId> {
        match self {
            Participant::Entity { id, .. } => Some(*id),
            Participant::Boundary(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visit {
    pub visitor: Participant,
    pub visited: Participant,
}

/// Deferred effect of a contact, run with exclusive world access.
pub type CollisionAction<W> = Box<dyn FnOnce(&mut W)>;

type Handler<W> = Box<dyn Fn(&W, &Visit) -> Option<CollisionAction<W>>>;

/// Actions queued during one step, in discovery order.
pub struct ActionQueue<W> {
    actions: Vec<CollisionAction<W>>,
}

impl<W> Default for ActionQueue<W> {
    fn default() -> Self {
        Self { actions: Vec::new() }
    }
}

impl<W> ActionQueue<W> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, action: CollisionAction<W>) {
        self.actions.push(action);
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Run and drop every queued action in order.
    pub fn run(&mut self, world: &mut W) {
        for action in self.actions.drain(..) {
            action(world);
        }
    }
}

pub struct CollisionResolver<W> {
    handlers: HashMap<KindId, Handler<W>>,
    boundary: Option<Handler<W>>,
}

impl<W> Default for CollisionResolver<W> {
    fn default() -> Self {
        Self {
            handlers: HashMap::new(),
            boundary: None,
        }
    }
}

impl<W> CollisionResolver<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle visits made by `kind` and by every subtype of `kind` that has
    /// no handler of its own. Replaces any earlier handler for `kind`.
    pub fn register<F>(&mut self, kind: KindId, handler: F)
    where
        F: Fn(&W, &Visit) -> Option<CollisionAction<W>> + 'static,
    {
        if self.handlers.insert(kind, Box::new(handler)).is_some() {
            log::debug!("collision handler for kind {} replaced", kind.0);
        }
    }

    /// Handle visits the boundary makes to entities pressed against it.
    pub fn register_boundary<F>(&mut self, handler: F)
    where
        F: Fn(&W, &Visit) -> Option<CollisionAction<W>> + 'static,
    {
        if self.boundary.replace(Box::new(handler)).is_some() {
            log::debug!("boundary collision handler replaced");
        }
    }

    pub fn unregister(&mut self, kind: KindId) -> bool {
        self.handlers.remove(&kind).is_some()
    }

    /// Kind whose handler would serve visits made by `kind`: the kind
    /// itself if registered, else the nearest registered supertype.
    pub fn handler_kind(&self, kinds: &KindTable, kind: KindId) -> Option<KindId> {
        kinds.ancestors(kind).find(|k| self.handlers.contains_key(k))
    }

    fn handler_for(&self, kinds: &KindTable, participant: &Participant) -> Option<&Handler<W>> {
        match participant {
            Participant::Entity { kind, .. } => self
                .handler_kind(kinds, *kind)
                .and_then(|k| self.handlers.get(&k)),
            Participant::Boundary(_) => self.boundary.as_ref(),
        }
    }

    /// Decide both directions of one contact and queue the resulting
    /// actions. Returns how many were queued.
    pub fn resolve(
        &self,
        kinds: &KindTable,
        world: &W,
        a: Participant,
        b: Participant,
        queue: &mut ActionQueue<W>,
    ) -> usize {
        let mut queued = 0;
        for visit in [
            Visit { visitor: a, visited: b },
            Visit { visitor: b, visited: a },
        ] {
            let Some(handler) = self.handler_for(kinds, &visit.visitor) else {
                continue;
            };
            if let Some(action) = handler(world, &visit) {
                queue.push(action);
                queued += 1;
            }
        }
        queued
    }
}
