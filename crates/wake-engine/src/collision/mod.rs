//! Collision bookkeeping on top of the physics world: collidable wrappers,
//! pair tracking, kind-dispatched handlers, and position reconciliation.

pub mod collidable;
pub mod kinds;
pub mod pairs;
pub mod reconcile;
pub mod resolver;

pub use collidable::{Collidable, CollisionFlag};
pub use kinds::{KindId, KindTable};
pub use pairs::{CollidableLookup, CollisionPair, CollisionPairTracker, PairPhase};
pub use reconcile::{
    clamp_to_bounds, touching_edges, CollisionResponseHandler, Edges, ReconcileParams,
    Reconciliation, WorldBounds,
};
pub use resolver::{ActionQueue, CollisionAction, CollisionResolver, Participant, Visit};
