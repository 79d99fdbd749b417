//! Core controller systems.
//!
//! One pass of these systems is one physics step of the controller. They are
//! generic over the physics backend and never touch engine types directly.

use bevy::ecs::event::EventCursor;
use bevy::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::collision::SurfaceContact;
use crate::config::{
    CharacterController, ControllerConfig, GravityFrame, GroundTransition, OrientationMode,
};
use crate::detection::{SurfaceInfo, SurfaceSide};
use crate::intent::MovementIntent;
use crate::jump::{JumpController, JumpImpulse, JumpKind};
use crate::mover::KineticMover;
use crate::state::{Airborne, Grounded, TouchingWall};

/// Feed the collision-enter contact points reported by the backend to their
/// characters.
pub fn register_ground_contacts<B: CharacterPhysicsBackend>(
    world: &mut World,
    mut cursor: Local<EventCursor<SurfaceContact>>,
) {
    let contacts: Vec<SurfaceContact> = match world.get_resource::<Events<SurfaceContact>>() {
        Some(events) => cursor.read(events).copied().collect(),
        None => return,
    };

    for contact in contacts {
        let position = B::get_position(world, contact.entity);
        let Some(step_height) = world
            .get::<ControllerConfig>(contact.entity)
            .map(|config| config.step_height)
        else {
            continue;
        };
        let Some(mut controller) = world.get_mut::<CharacterController>(contact.entity) else {
            continue;
        };

        let feet = controller.foot_position(position);
        if controller.register_contact_point(contact.point, feet, step_height) {
            trace!(entity = ?contact.entity, point = ?contact.point, "ground contact");
        }
    }
}

/// Recompute the ground status of every character and advance its jump
/// timers.
pub fn update_ground_status<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let mut q = world.query::<(
        Entity,
        &ControllerConfig,
        &KineticMover,
        &mut CharacterController,
        &mut JumpController,
    )>();

    for (entity, config, mover, mut controller, mut jump) in q.iter_mut(world) {
        jump.tick(dt);

        match controller.update_ground_status(config, mover, &mut jump) {
            GroundTransition::Landed => debug!(?entity, "landed"),
            GroundTransition::Detached => debug!(?entity, "left the ground"),
            GroundTransition::Unchanged => {}
        }
    }
}

/// Align each character's up direction according to its [`OrientationMode`].
pub fn apply_orientation<B: CharacterPhysicsBackend>(world: &mut World) {
    let targets: Vec<(Entity, f32)> = world
        .query::<(Entity, &ControllerConfig, &CharacterController)>()
        .iter(world)
        .filter_map(|(entity, config, controller)| {
            config
                .align_to
                .target_up(controller.gravity, &controller.ground)
                .map(|up| (entity, OrientationMode::rotation_for(up)))
        })
        .collect();

    for (entity, angle) in targets {
        B::set_rotation(world, entity, angle);
    }
}

/// Consume jump requests and launch the characters that may jump.
///
/// Impulses are computed in the character's gravity frame, so a jump always
/// points away from gravity.
pub fn apply_jump<B: CharacterPhysicsBackend>(world: &mut World) {
    let mut impulses: Vec<(Entity, GravityFrame, JumpImpulse)> = Vec::new();

    let mut q = world.query::<(
        Entity,
        &ControllerConfig,
        &KineticMover,
        &CharacterController,
        &mut MovementIntent,
        &mut JumpController,
    )>();

    for (entity, config, mover, controller, mut intent, mut jump) in q.iter_mut(world) {
        if !intent.jump_requested {
            continue;
        }
        intent.take_jump_request();

        // Too steep to stand on is too steep to jump off
        let ground = if mover.is_walkable(&controller.ground, controller.gravity_up()) {
            &controller.ground
        } else {
            &SurfaceInfo::NONE
        };
        let (left, right) = (&controller.left_wall, &controller.right_wall);
        if !jump.can_jump(ground, left, right) {
            trace!(?entity, jump_count = jump.jump_count(), "jump refused");
            continue;
        }

        let impulse = jump.jump_velocity(
            config.jump_height,
            controller.gravity_along_up(),
            intent.directional_input(),
            ground,
            left,
            right,
        );
        impulses.push((entity, controller.frame(), impulse));
    }

    for (entity, frame, impulse) in impulses {
        if impulse.kind == JumpKind::None {
            continue;
        }

        let current = frame.to_local(B::get_velocity(world, entity));
        let velocity = frame.to_world(launch_velocity(current, &impulse));
        B::set_velocity(world, entity, velocity);
        debug!(?entity, kind = ?impulse.kind, velocity = ?impulse.velocity, "jump");
    }
}

/// Velocity after a jump, in the gravity frame: the vertical component is
/// replaced, the horizontal one only by wall and air jumps that push
/// sideways.
fn launch_velocity(current: Vec2, impulse: &JumpImpulse) -> Vec2 {
    let mut velocity = current;
    velocity.y = impulse.velocity.y;
    if impulse.kind != JumpKind::Ground && impulse.velocity.x != 0.0 {
        velocity.x = impulse.velocity.x;
    }
    velocity
}

/// Integrate horizontal movement from each character's intent.
pub fn apply_horizontal_movement<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let entities: Vec<(Entity, ControllerConfig, f32)> = world
        .query_filtered::<(Entity, &ControllerConfig, &MovementIntent), With<CharacterController>>()
        .iter(world)
        .map(|(entity, config, intent)| (entity, *config, intent.horizontal))
        .collect();

    let mut state = world.query::<(&mut CharacterController, &mut KineticMover)>();

    for (entity, config, input) in entities {
        let world_velocity = B::get_velocity(world, entity);

        let Ok((mut controller, mut mover)) = state.get_mut(world, entity) else {
            continue;
        };

        let frame = controller.frame();
        let step_dt = controller.step_delta_time(dt, config.air_control);
        let velocity = mover.velocity(
            input * config.acceleration,
            config.speed,
            frame.to_local(world_velocity),
            &controller.ground,
            step_dt,
        );
        controller.current_speed = velocity.x;

        B::set_velocity(world, entity, frame.to_world(velocity));
        B::set_linear_damping(world, entity, config.drag_for_input(input));
    }
}

/// Apply each character's own gravity.
pub fn apply_gravity<B: CharacterPhysicsBackend>(world: &mut World) {
    let dt = B::get_fixed_timestep(world);

    let entities: Vec<(Entity, Vec2)> = world
        .query::<(Entity, &CharacterController)>()
        .iter(world)
        .map(|(entity, controller)| (entity, controller.gravity))
        .collect();

    for (entity, gravity) in entities {
        let velocity = B::get_velocity(world, entity);
        B::set_velocity(world, entity, velocity + gravity * dt);
    }
}

/// Sync state marker components with the controller state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &CharacterController,
        Has<Grounded>,
        Has<Airborne>,
        Option<&TouchingWall>,
    )>,
) {
    for (entity, controller, has_grounded, has_airborne, wall) in &q_controllers {
        let grounded = controller.is_grounded();
        if grounded && !has_grounded {
            commands.entity(entity).insert(Grounded).remove::<Airborne>();
        } else if !grounded && !has_airborne {
            commands.entity(entity).insert(Airborne).remove::<Grounded>();
        }

        let touching = if controller.left_wall.in_contact {
            Some(TouchingWall::new(SurfaceSide::Left, controller.left_wall.normal))
        } else if controller.right_wall.in_contact {
            Some(TouchingWall::new(SurfaceSide::Right, controller.right_wall.normal))
        } else {
            None
        };

        match (touching, wall) {
            (Some(touching), Some(current)) if touching == *current => {}
            (Some(touching), _) => {
                commands.entity(entity).insert(touching);
            }
            (None, Some(_)) => {
                commands.entity(entity).remove::<TouchingWall>();
            }
            (None, None) => {}
        }
    }
}
