use crate::api::types::EntityId;
use crate::core::physics::PhysicsBody;
use super::kinds::KindId;

/// "Recently hit something" marker. Set on contact, expires on its own.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CollisionFlag {
    active: bool,
    expires_at: f64,
}

impl CollisionFlag {
    pub fn activate(&mut self, now: f64, duration: f64) {
        self.active = true;
        self.expires_at = now + duration;
    }

    pub fn clear(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self, now: f64) -> bool {
        self.active && now < self.expires_at
    }

    /// Drop the flag once its time has passed.
    pub fn expire(&mut self, now: f64) {
        if self.active && now >= self.expires_at {
            self.active = false;
        }
    }
}

/// An entity that owns a physics body.
///
/// Only collidables built [`with_collision_flag`](Self::with_collision_flag)
/// take part in the in-collision reconciliation case; the rest are always
/// treated as free or boundary-bound.
#[derive(Debug, Clone, PartialEq)]
pub struct Collidable {
    pub entity: EntityId,
    pub kind: KindId,
    pub body: PhysicsBody,
    flag: Option<CollisionFlag>,
}

impl Collidable {
    pub fn new(entity: EntityId, kind: KindId, body: PhysicsBody) -> Self {
        Self {
            entity,
            kind,
            body,
            flag: None,
        }
    }

    pub fn with_collision_flag(mut self) -> Self {
        self.flag = Some(CollisionFlag::default());
        self
    }

    pub fn collision_flag(&self) -> Option<&CollisionFlag> {
        self.flag.as_ref()
    }

    /// `None` when this collidable does not track collision state.
    pub fn collision_flag_mut(&mut self) -> Option<&mut CollisionFlag> {
        self.flag.as_mut()
    }

    pub fn is_in_collision(&self, now: f64) -> bool {
        self.flag.is_some_and(|f| f.is_active(now))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_expires() {
        let mut flag = CollisionFlag::default();
        assert!(!flag.is_active(0.0));
        flag.activate(1.0, 0.3);
        assert!(flag.is_active(1.2));
        assert!(!flag.is_active(1.3));
        flag.expire(1.3);
        assert!(!flag.is_active(1.0));
        flag.activate(2.0, 0.3);
        flag.expire(2.29);
        assert!(flag.is_active(2.29));
        flag.expire(1.5);
        assert!(!flag.is_active(1.0));
    }

    #[test]
    fn clear_wins_over_expiry() {
        let mut flag = CollisionFlag::default();
        flag.activate(0.0, 10.0);
        flag.clear();
        assert!(!flag.is_active(1.0));
    }
}
