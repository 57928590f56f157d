pub mod api;
pub mod core;
pub mod components;
pub mod systems;
pub mod renderer;
pub mod input;
pub mod movement;
#[cfg(feature = "physics")]
pub mod collision;

// Re-export key types at crate root for convenience
pub use api::config::SimConfig;
pub use api::constants::Constants;
pub use api::error::{CollisionError, MovementError};
pub use api::policy::Policy;
pub use api::types::EntityId;
pub use components::entity::Entity;
pub use core::scene::Scene;
pub use core::time::FixedTimestep;
pub use renderer::instance::{RenderInstance, RenderBuffer};
pub use renderer::traits::Renderer;
pub use input::queue::{InputEvent, InputQueue, KeyBindings, LogicalKey, PressedKeys};
pub use movement::{
    Direction, Movable, MovementManager, MovementState, MovementStrategy, StrategyConfig,
    WorldView,
};

#[cfg(feature = "physics")]
pub use api::sim::Simulation;

#[cfg(feature = "physics")]
pub use core::physics::{
    PhysicsWorld, PhysicsBody, BodyDesc, BodyType,
    ColliderDesc, ColliderMaterial, ContactEvent,
};

#[cfg(feature = "physics")]
pub use collision::{
    Collidable, CollisionPairTracker, CollisionResolver, CollisionResponseHandler, KindId,
    KindTable, Participant, Visit,
};
