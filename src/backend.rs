//! Physics backend abstraction.
//!
//! The controller never integrates positions or resolves collisions itself.
//! It reads and writes the body state of a physics engine through this
//! trait. Shape casts and collision-enter notifications are engine-specific
//! and are provided by systems the backend plugin adds to the
//! [`Sensors`](crate::CharacterControllerSet::Sensors) and
//! [`Contacts`](crate::CharacterControllerSet::Contacts) sets.

use bevy::prelude::*;

/// Trait for physics backend implementations.
///
/// For an example implementation, see the `rapier` module's
/// `Rapier2dBackend`.
pub trait CharacterPhysicsBackend: 'static + Send + Sync {
    /// The velocity component type used by this backend.
    type VelocityComponent: Component;

    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Get the current linear velocity of an entity.
    fn get_velocity(world: &World, entity: Entity) -> Vec2;

    /// Set the linear velocity of an entity.
    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2);

    /// Set the engine-side linear drag of an entity.
    fn set_linear_damping(world: &mut World, entity: Entity, damping: f32);

    /// Get the current position of an entity.
    fn get_position(world: &World, entity: Entity) -> Vec2;

    /// Set the rotation of an entity (radians around Z).
    fn set_rotation(world: &mut World, entity: Entity, angle: f32);

    /// Get the fixed timestep delta time.
    fn get_fixed_timestep(world: &World) -> f32;
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
