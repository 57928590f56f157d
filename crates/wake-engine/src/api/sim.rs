use std::collections::{BTreeMap, BTreeSet};

use glam::Vec2;

use crate::api::config::SimConfig;
use crate::api::constants::Constants;
use crate::api::error::{CollisionError, MovementError};
use crate::api::types::EntityId;
use crate::collision::{
    touching_edges, ActionQueue, Collidable, CollisionPair, CollisionPairTracker,
    CollisionResolver, CollisionResponseHandler, Edges, KindId, KindTable, PairPhase,
    Participant, ReconcileParams, Reconciliation,
};
use crate::components::entity::Entity;
use crate::core::physics::{BodyDesc, BodyType, ColliderMaterial, ContactEvent, PhysicsWorld};
use crate::core::scene::Scene;
use crate::core::time::FixedTimestep;
use crate::input::queue::{InputQueue, KeyBindings, PressedKeys};
use crate::movement::{Movable, MovementManager, MovementStrategy, ViewEntry, WorldView};
use crate::renderer::instance::RenderBuffer;
use crate::renderer::traits::Renderer;
use crate::systems::render::build_render_buffer;

/// Handlers registered on a [`Simulation`] read it during the decision pass
/// and mutate it when their actions run.
pub type SimResolver = CollisionResolver<Simulation>;

/// Owns every entity, body, movement manager and collision record, and
/// advances them one fixed tick at a time:
///
/// 1. input → pressed keys → player direction
/// 2. world view snapshot → every movement manager
/// 3. physics step
/// 4. contact events → pair tracker; Enter/Stay raise collision flags
/// 5. new boundary touches from manager-desired positions
/// 6. visitor resolution: decide every contact, then run the actions
/// 7. expire flags, reconcile every collidable
/// 8. advance the clock
pub struct Simulation {
    config: SimConfig,
    scene: Scene,
    kinds: KindTable,
    physics: PhysicsWorld,
    collidables: BTreeMap<EntityId, Collidable>,
    managers: BTreeMap<EntityId, MovementManager>,
    tracker: CollisionPairTracker,
    resolver: SimResolver,
    response: CollisionResponseHandler,
    timestep: FixedTimestep,
    keys: PressedKeys,
    bindings: KeyBindings,
    player: Option<EntityId>,
    at_boundary: BTreeMap<EntityId, Edges>,
    phases: Vec<(CollisionPair, PairPhase)>,
    contacts: Vec<ContactEvent>,
    render_buffer: RenderBuffer,
    time: f64,
    next_id: u32,
}

impl Simulation {
    pub fn new(config: SimConfig) -> Self {
        let gravity = config.gravity * config.pixels_to_meters;
        Self {
            scene: Scene::new(),
            kinds: KindTable::new(),
            physics: PhysicsWorld::new(gravity),
            collidables: BTreeMap::new(),
            managers: BTreeMap::new(),
            tracker: CollisionPairTracker::new(),
            resolver: SimResolver::new(),
            response: CollisionResponseHandler::new(ReconcileParams::from_config(&config)),
            timestep: FixedTimestep::new(config.fixed_dt),
            keys: PressedKeys::new(),
            bindings: KeyBindings::default(),
            player: None,
            at_boundary: BTreeMap::new(),
            phases: Vec::new(),
            contacts: Vec::new(),
            render_buffer: RenderBuffer::new(),
            time: 0.0,
            next_id: 1,
            config,
        }
    }

    pub fn from_constants(constants: &Constants) -> Self {
        Self::new(SimConfig::from_constants(constants))
    }

    pub fn with_bindings(mut self, bindings: KeyBindings) -> Self {
        self.bindings = bindings;
        self
    }

    // -- Accessors --

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Simulated seconds since start.
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.scene.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.scene.get_mut(id)
    }

    pub fn kinds(&self) -> &KindTable {
        &self.kinds
    }

    pub fn register_kind(&mut self, name: &str, parent: Option<KindId>) -> KindId {
        self.kinds.register(name, parent)
    }

    pub fn resolver_mut(&mut self) -> &mut SimResolver {
        &mut self.resolver
    }

    pub fn physics(&self) -> &PhysicsWorld {
        &self.physics
    }

    pub fn physics_mut(&mut self) -> &mut PhysicsWorld {
        &mut self.physics
    }

    pub fn collidable(&self, id: EntityId) -> Option<&Collidable> {
        self.collidables.get(&id)
    }

    pub fn manager(&self, id: EntityId) -> Option<&MovementManager> {
        self.managers.get(&id)
    }

    pub fn manager_mut(&mut self, id: EntityId) -> Option<&mut MovementManager> {
        self.managers.get_mut(&id)
    }

    pub fn tracker(&self) -> &CollisionPairTracker {
        &self.tracker
    }

    /// Pair phases from the most recent tick.
    pub fn phases(&self) -> &[(CollisionPair, PairPhase)] {
        &self.phases
    }

    pub fn pressed_keys(&self) -> PressedKeys {
        self.keys
    }

    pub fn player(&self) -> Option<EntityId> {
        self.player
    }

    /// The entity whose manager follows keyboard input.
    pub fn set_player(&mut self, id: Option<EntityId>) {
        self.player = id;
    }

    // -- Entity factory --

    /// Generate the next unique entity ID.
    pub fn next_id(&mut self) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Add a purely logical entity. An entity already live under the same
    /// id is despawned first, body included.
    pub fn spawn(&mut self, entity: Entity) -> EntityId {
        let id = entity.id;
        if self.scene.contains(id) {
            log::warn!("spawn {id}: id already live, replacing the previous entity");
            self.despawn(id);
        }
        self.next_id = self.next_id.max(id.0 + 1);
        log::debug!("spawn {id} '{}' at {}", entity.tag, entity.pos);
        self.scene.spawn(entity);
        id
    }

    /// Add an entity backed by a physics body. `desc` is in logical units
    /// and is placed at the entity's position. Dynamic bodies track
    /// collision state; fixed and kinematic ones do not.
    pub fn spawn_collidable(
        &mut self,
        entity: Entity,
        kind: KindId,
        desc: BodyDesc,
        material: ColliderMaterial,
    ) -> EntityId {
        let desc = desc.with_position(entity.pos).scaled(self.config.pixels_to_meters);
        let dynamic = desc.body_type == BodyType::Dynamic;
        let id = self.spawn(entity);
        let body = self.physics.create_body(id, &desc, material);
        let collidable = Collidable::new(id, kind, body);
        let collidable = if dynamic { collidable.with_collision_flag() } else { collidable };
        self.collidables.insert(id, collidable);
        id
    }

    /// Drive `id` with `strategy`, starting from the entity's position.
    pub fn attach_movement(
        &mut self,
        id: EntityId,
        strategy: Box<dyn MovementStrategy>,
    ) -> Result<(), CollisionError> {
        let pos = self.scene.get(id).ok_or(CollisionError::UnknownEntity(id))?.pos;
        self.managers
            .insert(id, MovementManager::new(id, pos, strategy, self.config.policy));
        Ok(())
    }

    /// Remove an entity and everything attached to it. The body is destroyed
    /// before the collidable record is dropped.
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        if let Some(collidable) = self.collidables.remove(&id) {
            self.physics.remove_body(&collidable.body);
        }
        self.tracker.forget_entity(id);
        self.managers.remove(&id);
        self.at_boundary.remove(&id);
        if self.player == Some(id) {
            self.player = None;
        }
        let entity = self.scene.despawn(id)?;
        log::debug!("despawn {id} '{}'", entity.tag);
        Some(entity)
    }

    // -- Stepping --

    /// Run as many fixed ticks as `frame_dt` covers. Input events are
    /// applied on the first tick; pressed keys persist across ticks.
    pub fn advance(&mut self, frame_dt: f32, input: &InputQueue) -> Result<u32, MovementError> {
        let steps = self.timestep.accumulate(frame_dt);
        let dt = self.timestep.dt();
        let empty = InputQueue::new();
        for step in 0..steps {
            self.tick(dt, if step == 0 { input } else { &empty })?;
        }
        Ok(steps)
    }

    /// One simulation tick. Strict managers fail fast on invalid movement;
    /// lenient ones never return an error.
    pub fn tick(&mut self, dt: f32, input: &InputQueue) -> Result<(), MovementError> {
        let dt = self.config.policy.delta_time(dt)?;

        for event in input.iter() {
            self.keys.apply(event, &self.bindings);
        }
        if let Some(manager) = self.player.and_then(|id| self.managers.get_mut(&id)) {
            manager.update_direction(&self.keys);
        }

        let view = self.world_view();
        for (id, manager) in self.managers.iter_mut() {
            if self.scene.get(*id).is_some_and(|e| e.active) {
                manager.update_movement(&view, dt)?;
            }
        }

        self.contacts.clear();
        self.physics.step(
            dt,
            self.config.velocity_iterations,
            self.config.position_iterations,
            &mut self.contacts,
        );

        self.phases = self.tracker.apply_events(&self.contacts, &self.collidables);
        self.raise_collision_flags();
        let touches = self.detect_boundary_touches();
        self.resolve_visits(&touches);

        self.reconcile_all();
        self.time += dt as f64;
        Ok(())
    }

    /// Snapshot every active entity for this tick's strategies.
    pub fn world_view(&self) -> WorldView {
        let scale = self.config.pixels_to_meters;
        let mut view = WorldView::new();
        for entity in self.scene.iter().filter(|e| e.active) {
            let velocity = match (self.managers.get(&entity.id), self.collidables.get(&entity.id)) {
                (Some(manager), _) => manager.velocity(),
                (None, Some(collidable)) => self.physics.velocity(&collidable.body) / scale,
                (None, None) => Vec2::ZERO,
            };
            view.insert(
                entity.id,
                ViewEntry {
                    pos: entity.pos,
                    velocity,
                    size: entity.size,
                    tag: entity.tag.clone(),
                },
            );
        }
        view
    }

    fn raise_collision_flags(&mut self) {
        let duration = self.config.collision_active_duration;
        for (pair, phase) in &self.phases {
            if *phase == PairPhase::Exit {
                continue;
            }
            for id in [pair.first(), pair.second()] {
                if let Some(flag) = self
                    .collidables
                    .get_mut(&id)
                    .and_then(|c| c.collision_flag_mut())
                {
                    flag.activate(self.time, duration);
                }
            }
        }
    }

    /// Entities whose desired position reaches an edge they were not
    /// touching last tick.
    fn detect_boundary_touches(&mut self) -> Vec<(EntityId, Edges)> {
        let bounds = self.response.params().bounds;
        let epsilon = self.config.boundary_epsilon;
        let mut touching = BTreeMap::new();
        for id in self.collidables.keys() {
            let (Some(manager), Some(entity)) = (self.managers.get(id), self.scene.get(*id)) else {
                continue;
            };
            let edges = touching_edges(manager.position(), entity.half_extents(), &bounds, epsilon);
            if edges.any() {
                touching.insert(*id, edges);
            }
        }
        let fresh = touching
            .iter()
            .filter(|&(id, edges)| self.at_boundary.get(id) != Some(edges))
            .map(|(&id, &edges)| (id, edges))
            .collect();
        self.at_boundary = touching;
        fresh
    }

    fn participant(&self, id: EntityId) -> Option<Participant> {
        self.collidables
            .get(&id)
            .map(|c| Participant::Entity { id, kind: c.kind })
    }

    /// Decide every new contact against this tick's state, then run the
    /// queued actions in order.
    fn resolve_visits(&mut self, touches: &[(EntityId, Edges)]) {
        let mut queue = ActionQueue::new();
        for (pair, phase) in &self.phases {
            if *phase != PairPhase::Enter {
                continue;
            }
            if let (Some(a), Some(b)) = (self.participant(pair.first()), self.participant(pair.second())) {
                self.resolver.resolve(&self.kinds, self, a, b, &mut queue);
            }
        }
        for (id, edges) in touches {
            if let Some(entity) = self.participant(*id) {
                self.resolver
                    .resolve(&self.kinds, self, entity, Participant::Boundary(*edges), &mut queue);
            }
        }
        if !queue.is_empty() {
            log::trace!("running {} collision actions", queue.len());
            queue.run(self);
        }
    }

    fn reconcile_all(&mut self) {
        for collidable in self.collidables.values_mut() {
            if let Some(flag) = collidable.collision_flag_mut() {
                flag.expire(self.time);
            }
        }

        let ids: BTreeSet<EntityId> = self.collidables.keys().copied().collect();
        for id in &ids {
            let (Some(entity), Some(collidable)) =
                (self.scene.get_mut(*id), self.collidables.get_mut(id))
            else {
                log::warn!("{}", CollisionError::UnknownEntity(*id));
                continue;
            };
            let outcome = self.response.reconcile(
                entity,
                collidable,
                self.managers.get_mut(id),
                &mut self.physics,
                self.time,
            );
            match outcome {
                Ok(Reconciliation::InCollision { capped: true }) => {
                    log::trace!("entity {id} correction capped");
                }
                Ok(_) => {}
                Err(err) => log::warn!("reconcile skipped: {err}"),
            }
        }

        // Managers without a body own their entity's position outright.
        for (id, manager) in &self.managers {
            if ids.contains(id) {
                continue;
            }
            if let Some(entity) = self.scene.get_mut(*id) {
                entity.pos = manager.position();
            }
        }
    }

    // -- Rendering --

    /// Fill the render snapshot and hand it to `renderer`.
    pub fn render(&mut self, renderer: &mut dyn Renderer) {
        build_render_buffer(self.scene.iter(), &mut self.render_buffer);
        renderer.draw(&self.render_buffer);
    }

    pub fn render_buffer(&self) -> &RenderBuffer {
        &self.render_buffer
    }
}

impl Default for Simulation {
    fn default() -> Self {
        Self::new(SimConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::policy::Policy;
    use crate::core::physics::ColliderDesc;
    use crate::input::queue::InputEvent;
    use crate::movement::{ConstantMovement, Direction, FollowMovement};
    use crate::renderer::traits::CaptureRenderer;
    use std::cell::Cell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;

    fn config() -> SimConfig {
        SimConfig {
            policy: Policy::Strict,
            ..SimConfig::default()
        }
    }

    fn boat(sim: &mut Simulation, kind: KindId, pos: Vec2) -> EntityId {
        let id = sim.next_id();
        let entity = Entity::new(id).with_tag("boat").with_pos(pos).with_size(Vec2::splat(40.0));
        let desc = BodyDesc::dynamic(ColliderDesc::Cuboid { half_width: 20.0, half_height: 20.0 });
        sim.spawn_collidable(entity, kind, desc, ColliderMaterial::default())
    }

    fn rock(sim: &mut Simulation, kind: KindId, pos: Vec2) -> EntityId {
        let id = sim.next_id();
        let entity = Entity::new(id).with_tag("rock").with_pos(pos).with_size(Vec2::splat(40.0));
        let desc = BodyDesc::fixed(ColliderDesc::Cuboid { half_width: 20.0, half_height: 20.0 });
        sim.spawn_collidable(entity, kind, desc, ColliderMaterial::default())
    }

    #[test]
    fn spawn_and_despawn_manage_bodies() {
        let mut sim = Simulation::new(config());
        let kind = sim.register_kind("boat", None);
        let id = boat(&mut sim, kind, Vec2::new(100.0, 100.0));
        assert_eq!(sim.physics().body_count(), 1);
        assert!(sim.collidable(id).is_some_and(|c| c.collision_flag().is_some()));

        let (pos, _) = sim.physics().body_position(&sim.collidable(id).unwrap().body);
        assert_eq!(pos / sim.config().pixels_to_meters, Vec2::new(100.0, 100.0));

        let removed = sim.despawn(id).unwrap();
        assert_eq!(removed.tag, "boat");
        assert_eq!(sim.physics().body_count(), 0);
        assert!(sim.collidable(id).is_none());
        assert!(sim.despawn(id).is_none());
    }

    #[test]
    fn respawning_a_live_id_replaces_it() {
        let mut sim = Simulation::new(config());
        let kind = sim.register_kind("boat", None);
        let id = boat(&mut sim, kind, Vec2::new(100.0, 100.0));
        let again = Entity::new(id).with_tag("boat").with_pos(Vec2::new(300.0, 100.0)).with_size(Vec2::splat(40.0));
        let desc = BodyDesc::dynamic(ColliderDesc::Cuboid { half_width: 20.0, half_height: 20.0 });
        sim.spawn_collidable(again, kind, desc, ColliderMaterial::default());

        assert_eq!(sim.physics().body_count(), 1);
        assert_eq!(sim.scene().len(), 1);
        assert_eq!(sim.entity(id).unwrap().pos, Vec2::new(300.0, 100.0));

        sim.despawn(id);
        assert_eq!(sim.physics().body_count(), 0);
        assert!(sim.scene().is_empty());
    }

    #[test]
    fn player_follows_keys() {
        let mut sim = Simulation::new(config());
        let kind = sim.register_kind("boat", None);
        let id = boat(&mut sim, kind, Vec2::new(400.0, 300.0));
        sim.attach_movement(id, Box::new(ConstantMovement::new(120.0, Policy::Strict).unwrap()))
            .unwrap();
        sim.set_player(Some(id));

        let mut input = InputQueue::new();
        input.push(InputEvent::KeyDown { key_code: 39 });
        sim.tick(DT, &input).unwrap();
        assert_eq!(sim.manager(id).unwrap().direction(), Direction::Right);

        let empty = InputQueue::new();
        for _ in 0..29 {
            sim.tick(DT, &empty).unwrap();
        }
        let entity = sim.entity(id).unwrap();
        assert!((entity.pos.x - 460.0).abs() < 0.5, "x = {}", entity.pos.x);
        assert_eq!(entity.pos.y, 300.0);

        let mut release = InputQueue::new();
        release.push(InputEvent::KeyUp { key_code: 39 });
        sim.tick(DT, &release).unwrap();
        assert_eq!(sim.manager(id).unwrap().direction(), Direction::None);
    }

    #[test]
    fn boat_hitting_rock_runs_handler() {
        let mut sim = Simulation::new(config());
        let boat_kind = sim.register_kind("boat", None);
        let rock_kind = sim.register_kind("rock", None);
        let hits = Rc::new(Cell::new(0));
        let counter = hits.clone();
        sim.resolver_mut().register(boat_kind, move |world, visit| {
            let rock = visit.visited.entity_id()?;
            world.entity(rock)?;
            let counter = counter.clone();
            Some(Box::new(move |_: &mut Simulation| counter.set(counter.get() + 1)))
        });

        let b = boat(&mut sim, boat_kind, Vec2::new(200.0, 300.0));
        let r = rock(&mut sim, rock_kind, Vec2::new(300.0, 300.0));
        let chase = FollowMovement::new(Some(r), 120.0, Policy::Strict).unwrap();
        sim.attach_movement(b, Box::new(chase)).unwrap();

        let empty = InputQueue::new();
        let scale = sim.config().pixels_to_meters;
        let max_correction = sim.config().max_correction;
        let mut entered = false;
        let mut previous = sim.entity(b).unwrap().pos;
        for _ in 0..90 {
            sim.tick(DT, &empty).unwrap();
            entered |= sim.phases().iter().any(|(_, phase)| *phase == PairPhase::Enter);

            let pos = sim.entity(b).unwrap().pos;
            let (body_pos, _) = sim.physics().body_position(&sim.collidable(b).unwrap().body);
            assert!((pos - body_pos / scale).length() <= max_correction + 1e-3);
            assert!((pos - previous).length() <= max_correction + 1e-3);
            previous = pos;
        }
        assert!(entered);
        assert!(hits.get() >= 1);
        // The rock has no manager: it stays where physics keeps it.
        assert_eq!(sim.entity(r).unwrap().pos, Vec2::new(300.0, 300.0));
        // Collision response keeps the boat from tunnelling through.
        assert!(sim.entity(b).unwrap().pos.x < 300.0);
    }

    #[test]
    fn boundary_handler_fires_on_new_touch() {
        let mut sim = Simulation::new(config());
        let kind = sim.register_kind("boat", None);
        let touches = Rc::new(Cell::new(0));
        let counter = touches.clone();
        sim.resolver_mut().register_boundary(move |_, visit| {
            visit.visited.entity_id()?;
            let counter = counter.clone();
            Some(Box::new(move |_: &mut Simulation| counter.set(counter.get() + 1)))
        });

        let id = boat(&mut sim, kind, Vec2::new(40.0, 300.0));
        let strategy = ConstantMovement::new(200.0, Policy::Strict)
            .unwrap()
            .with_heading(Direction::Left);
        sim.attach_movement(id, Box::new(strategy)).unwrap();

        let empty = InputQueue::new();
        for _ in 0..30 {
            sim.tick(DT, &empty).unwrap();
        }
        let entity = sim.entity(id).unwrap();
        assert_eq!(entity.pos.x, 20.0);
        assert_eq!(sim.manager(id).unwrap().position().x, 20.0);
        assert_eq!(touches.get(), 1);
    }

    #[test]
    fn despawn_from_action() {
        let mut sim = Simulation::new(config());
        let boat_kind = sim.register_kind("boat", None);
        let trash_kind = sim.register_kind("trash", None);
        sim.resolver_mut().register(trash_kind, |_, visit| {
            let Participant::Entity { id, .. } = visit.visitor else {
                return None;
            };
            Some(Box::new(move |sim: &mut Simulation| {
                sim.despawn(id);
            }))
        });

        let b = boat(&mut sim, boat_kind, Vec2::new(200.0, 300.0));
        let t = sim.next_id();
        let trash = Entity::new(t).with_tag("trash").with_pos(Vec2::new(260.0, 300.0)).with_size(Vec2::splat(20.0));
        sim.spawn_collidable(
            trash,
            trash_kind,
            BodyDesc::dynamic(ColliderDesc::Ball { radius: 10.0 }),
            ColliderMaterial::default(),
        );
        let chase = FollowMovement::new(Some(t), 150.0, Policy::Lenient).unwrap();
        sim.attach_movement(b, Box::new(chase)).unwrap();

        let empty = InputQueue::new();
        for _ in 0..60 {
            sim.tick(DT, &empty).unwrap();
        }
        assert!(sim.entity(t).is_none());
        assert!(!sim.tracker().is_entity_in_collision(b));
        assert_eq!(sim.physics().body_count(), 1);
    }

    #[test]
    fn strict_negative_dt_fails() {
        let mut sim = Simulation::new(config());
        assert!(sim.tick(-DT, &InputQueue::new()).is_err());

        let mut lenient = Simulation::new(SimConfig { policy: Policy::Lenient, ..SimConfig::default() });
        assert!(lenient.tick(-DT, &InputQueue::new()).is_ok());
    }

    #[test]
    fn advance_runs_fixed_steps() {
        let mut sim = Simulation::new(config());
        let empty = InputQueue::new();
        assert_eq!(sim.advance(DT * 2.5, &empty).unwrap(), 2);
        assert!((sim.time() - 2.0 * DT as f64).abs() < 1e-6);
    }

    #[test]
    fn logical_entities_follow_their_manager() {
        let mut sim = Simulation::new(config());
        let id = sim.next_id();
        sim.spawn(Entity::new(id).with_pos(Vec2::new(10.0, 10.0)));
        let strategy = ConstantMovement::new(60.0, Policy::Strict)
            .unwrap()
            .with_heading(Direction::Up);
        sim.attach_movement(id, Box::new(strategy)).unwrap();
        sim.tick(0.5, &InputQueue::new()).unwrap();
        assert_eq!(sim.entity(id).unwrap().pos, Vec2::new(10.0, 40.0));
        assert_eq!(
            sim.attach_movement(EntityId(99), Box::new(ConstantMovement::new(1.0, Policy::Strict).unwrap())),
            Err(CollisionError::UnknownEntity(EntityId(99)))
        );
    }

    #[test]
    fn render_reports_every_entity() {
        let mut sim = Simulation::new(config());
        let kind = sim.register_kind("rock", None);
        rock(&mut sim, kind, Vec2::new(50.0, 60.0));
        let mut renderer = CaptureRenderer::default();
        sim.render(&mut renderer);
        assert_eq!(renderer.frames, 1);
        assert_eq!(renderer.last.instances.len(), 1);
        assert_eq!(renderer.last.instances[0].x, 50.0);
        assert_eq!(renderer.last.instances[0].width, 40.0);
    }
}
