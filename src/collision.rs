//! Raw query results handed back by the physics backend.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// A single shape cast (or ray cast) hit.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CollisionData {
    /// Distance travelled by the cast shape before the hit.
    pub distance: f32,
    /// Surface normal at the hit, pointing out of the hit collider.
    pub normal: Vec2,
    /// World position of the cast origin at the moment of impact.
    pub point: Vec2,
    /// Collider that was hit.
    pub entity: Option<Entity>,
}

impl CollisionData {
    pub fn new(distance: f32, normal: Vec2, point: Vec2, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}

/// Physics material of a contacted collider.
///
/// Only the dynamic friction is used by the controller: it decides how much
/// of a frame's horizontal velocity change a surface lets through.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct SurfaceMaterial {
    /// Dynamic friction coefficient, clamped to `[0, 1]`.
    pub friction: f32,
}

impl Default for SurfaceMaterial {
    fn default() -> Self {
        Self { friction: 1.0 }
    }
}

impl SurfaceMaterial {
    pub fn new(friction: f32) -> Self {
        Self {
            friction: friction.clamp(0.0, 1.0),
        }
    }

    /// Ice-like material that ignores most input.
    pub fn slippery() -> Self {
        Self::new(0.05)
    }
}

/// Everything the backend knows about a surface hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurfaceHit {
    pub collision: CollisionData,
    /// Material of the hit collider, if it carries one.
    pub material: Option<SurfaceMaterial>,
    /// Collision layer memberships of the hit collider, if it has any.
    pub layers: Option<u32>,
}

impl SurfaceHit {
    pub fn new(collision: CollisionData) -> Self {
        Self {
            collision,
            ..default()
        }
    }

    pub fn with_material(mut self, material: SurfaceMaterial) -> Self {
        self.material = Some(material);
        self
    }

    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = Some(layers);
        self
    }
}

/// A contact point of a collision that just started, reported by the
/// backend for a character.
#[derive(Event, Debug, Clone, Copy, PartialEq)]
pub struct SurfaceContact {
    /// The character that collided.
    pub entity: Entity,
    /// World-space contact point.
    pub point: Vec2,
}
