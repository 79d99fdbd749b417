//! Rapier2D physics backend implementation.
//!
//! This module provides the physics backend for Bevy Rapier2D.
//! Enable with the `rapier2d` feature.

use std::f32::consts::{PI, TAU};

use bevy::prelude::*;
use bevy_rapier2d::geometry::Group;
use bevy_rapier2d::prelude::*;

use crate::backend::CharacterPhysicsBackend;
use crate::collision::{CollisionData, SurfaceContact, SurfaceHit, SurfaceMaterial};
use crate::config::{CharacterController, ControllerConfig};
use crate::detection::{SurfaceCast, SurfaceDetector, SurfaceInfo, SurfaceSensors};
use crate::systems;

/// Rapier2D physics backend for the character controller.
///
/// Body state goes through `Velocity`, `Damping` and `Transform`. Surface
/// detection and collision-enter reporting are handled by dedicated Rapier
/// systems that receive `RapierContext` as a system parameter.
pub struct Rapier2dBackend;

impl CharacterPhysicsBackend for Rapier2dBackend {
    type VelocityComponent = Velocity;

    fn plugin() -> impl Plugin {
        Rapier2dBackendPlugin
    }

    fn get_velocity(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Velocity>(entity)
            .map(|v| v.linvel)
            .unwrap_or(Vec2::ZERO)
    }

    fn set_velocity(world: &mut World, entity: Entity, velocity: Vec2) {
        if let Some(mut vel) = world.get_mut::<Velocity>(entity) {
            vel.linvel = velocity;
        }
    }

    fn set_linear_damping(world: &mut World, entity: Entity, damping: f32) {
        if let Some(mut current) = world.get_mut::<Damping>(entity) {
            if current.linear_damping != damping {
                current.linear_damping = damping;
            }
        }
    }

    fn get_position(world: &World, entity: Entity) -> Vec2 {
        world
            .get::<Transform>(entity)
            .map(|t| t.translation.xy())
            .or_else(|| {
                world
                    .get::<GlobalTransform>(entity)
                    .map(|t| t.translation().xy())
            })
            .unwrap_or(Vec2::ZERO)
    }

    fn set_rotation(world: &mut World, entity: Entity, angle: f32) {
        let Some(mut transform) = world.get_mut::<Transform>(entity) else {
            return;
        };

        // Writing the transform teleports the body, so only write on change
        let (_, _, current) = transform.rotation.to_euler(EulerRot::XYZ);
        if angle_between(current, angle).abs() > 1e-4 {
            transform.rotation = Quat::from_rotation_z(angle);
        }
    }

    fn get_fixed_timestep(world: &World) -> f32 {
        world
            .get_resource::<Time<Fixed>>()
            .map(|t| t.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0)
    }
}

/// Signed difference `b - a` wrapped to `[-π, π)`.
fn angle_between(a: f32, b: f32) -> f32 {
    (b - a + PI).rem_euclid(TAU) - PI
}

/// Plugin that sets up Rapier2D-specific systems for the character controller.
pub struct Rapier2dBackendPlugin;

impl Plugin for Rapier2dBackendPlugin {
    fn build(&self, app: &mut App) {
        use crate::CharacterControllerSet;

        app.add_systems(
            FixedUpdate,
            rapier_surface_detection.in_set(CharacterControllerSet::Sensors),
        );

        // Contact points have to be reported before the controller registers them
        app.add_systems(
            FixedUpdate,
            rapier_ground_contacts
                .in_set(CharacterControllerSet::Contacts)
                .before(systems::register_ground_contacts::<Rapier2dBackend>),
        );
    }
}

/// Get the distance from collider center to bottom for a given collider.
/// For capsules, this is half_height + radius.
pub fn get_collider_bottom_offset(collider: &Collider) -> f32 {
    if let Some(capsule) = collider.as_capsule() {
        let segment = capsule.segment();
        let half_height = (segment.a().y - segment.b().y).abs() / 2.0;
        half_height + capsule.radius()
    } else if let Some(ball) = collider.as_ball() {
        ball.radius()
    } else if let Some(cuboid) = collider.as_cuboid() {
        cuboid.half_extents().y
    } else {
        0.0
    }
}

/// Sweep a box using RapierContext.
fn rapier_box_cast(
    context: &RapierContext,
    cast: &SurfaceCast,
    exclude_entity: Entity,
) -> Option<CollisionData> {
    let shape = Collider::cuboid(cast.half_extents.x, cast.half_extents.y);

    let filter = QueryFilter::default()
        .exclude_rigid_body(exclude_entity)
        .exclude_sensors()
        .groups(CollisionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(cast.layers),
        ));

    context
        .cast_shape(
            cast.start,
            cast.rotation,
            cast.direction,
            &shape,
            ShapeCastOptions {
                max_time_of_impact: cast.distance,
                stop_at_penetration: false,
                ..default()
            },
            filter,
        )
        .map(|(hit_entity, hit)| {
            let normal = hit.details.map(|d| d.normal1).unwrap_or(-cast.direction);
            let hit_point = cast.start + cast.direction * hit.time_of_impact;
            CollisionData::new(hit.time_of_impact, normal, hit_point, Some(hit_entity))
        })
}

/// Cast one detector from the character's feet.
fn detect(
    context: &RapierContext,
    detector: &SurfaceDetector,
    feet: Vec2,
    up: Vec2,
    skin_width: f32,
    entity: Entity,
    q_surfaces: &Query<(Option<&Friction>, Option<&CollisionGroups>)>,
) -> SurfaceInfo {
    let cast = detector.cast_request(feet, skin_width, up);
    let hit = rapier_box_cast(context, &cast, entity).map(|collision| {
        let mut hit = SurfaceHit::new(collision);
        if let Some((friction, groups)) = collision
            .entity
            .and_then(|surface| q_surfaces.get(surface).ok())
        {
            hit.material = friction.map(|f| SurfaceMaterial::new(f.coefficient));
            // Without `CollisionGroups` Rapier puts a collider in every group
            hit.layers = Some(groups.map_or(Group::ALL, |g| g.memberships).bits());
        }
        hit
    });

    detector.resolve(hit)
}

/// Rapier-specific surface detection: box-casts the ground and wall
/// detectors of every character.
///
/// Detectors are placed relative to the feet (the bottom of the collider),
/// and the previous ground result is kept on the controller.
fn rapier_surface_detection(
    rapier_context: ReadRapierContext,
    mut q_controllers: Query<(
        Entity,
        &GlobalTransform,
        &ControllerConfig,
        &SurfaceSensors,
        &mut CharacterController,
        Option<&Collider>,
    )>,
    q_surfaces: Query<(Option<&Friction>, Option<&CollisionGroups>)>,
) {
    let Ok(context) = rapier_context.single() else {
        return;
    };

    for (entity, transform, config, sensors, mut controller, collider) in &mut q_controllers {
        controller.foot_offset = collider.map(get_collider_bottom_offset).unwrap_or(0.0);
        let feet = controller.foot_position(transform.translation().xy());
        let up = controller.gravity_up();

        let ground = detect(
            &context,
            &sensors.ground,
            feet,
            up,
            config.step_height,
            entity,
            &q_surfaces,
        );
        let left_wall = detect(
            &context,
            &sensors.left_wall,
            feet,
            up,
            config.wall_skin_width,
            entity,
            &q_surfaces,
        );
        let right_wall = detect(
            &context,
            &sensors.right_wall,
            feet,
            up,
            config.wall_skin_width,
            entity,
            &q_surfaces,
        );

        controller.push_surface_info(ground, left_wall, right_wall);
    }
}

/// Report the contact points of collisions that just started on a
/// character collider.
fn rapier_ground_contacts(
    rapier_context: ReadRapierContext,
    mut collision_events: EventReader<CollisionEvent>,
    q_characters: Query<(), With<CharacterController>>,
    mut contacts: EventWriter<SurfaceContact>,
) {
    let Ok(context) = rapier_context.single() else {
        collision_events.clear();
        return;
    };

    for event in collision_events.read() {
        let CollisionEvent::Started(e1, e2, _) = *event else {
            continue;
        };

        for (character, other) in [(e1, e2), (e2, e1)] {
            if !q_characters.contains(character) {
                continue;
            }
            let Some(pair) = context.contact_pair(character, other) else {
                continue;
            };

            for manifold in pair.manifolds() {
                for contact in manifold.solver_contacts() {
                    contacts.write(SurfaceContact {
                        entity: character,
                        point: contact.point(),
                    });
                }
            }
        }
    }
}

/// Bundle for creating a character with Rapier2D physics.
///
/// Provides the body, velocity and drag the controller writes to. Gravity
/// scale is zero because the controller applies the character's own
/// gravity, and collision events are enabled so that touchdowns are
/// reported.
///
/// # Example
///
/// ```ignore
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use heracles_controller::prelude::*;
///
/// fn spawn_player(mut commands: Commands) {
///     commands.spawn((
///         Transform::from_xyz(0.0, 2.0, 0.0),
///         CharacterController::new(),
///         ControllerConfig::player(),
///         Rapier2dCharacterBundle::rotation_locked(),
///         Collider::capsule_y(0.25, 0.25),
///     ));
/// }
/// ```
#[derive(Bundle)]
pub struct Rapier2dCharacterBundle {
    pub rigid_body: RigidBody,
    /// Written by the controller every fixed step.
    pub velocity: Velocity,
    /// Use [`LockedAxes::ROTATION_LOCKED`] unless something else should
    /// rotate the body.
    pub locked_axes: LockedAxes,
    /// Linear damping is the controller's idle drag.
    pub damping: Damping,
    pub gravity_scale: GravityScale,
    /// Zero friction, combined with `Min`: the controller handles grip.
    pub friction: Friction,
    pub active_events: ActiveEvents,
}

impl Default for Rapier2dCharacterBundle {
    fn default() -> Self {
        Self::new()
    }
}

impl Rapier2dCharacterBundle {
    /// Create a new character bundle with rotation enabled.
    pub fn new() -> Self {
        Self {
            rigid_body: RigidBody::Dynamic,
            velocity: Velocity::default(),
            locked_axes: LockedAxes::empty(),
            damping: Damping {
                linear_damping: 0.0,
                angular_damping: 1.0,
            },
            gravity_scale: GravityScale(0.0),
            friction: Friction {
                coefficient: 0.0,
                combine_rule: CoefficientCombineRule::Min,
            },
            active_events: ActiveEvents::COLLISION_EVENTS,
        }
    }

    /// Create a character bundle with rotation locked.
    ///
    /// The most common configuration for 2D platformers: the body never
    /// tips over and only the orientation modes rotate it.
    pub fn rotation_locked() -> Self {
        Self {
            locked_axes: LockedAxes::ROTATION_LOCKED,
            ..Self::new()
        }
    }

    /// Set the rigid body type for the character.
    pub fn with_body(mut self, body: RigidBody) -> Self {
        self.rigid_body = body;
        self
    }

    /// Set which axes should be locked for the rigid body.
    pub fn with_locked_axes(mut self, axes: LockedAxes) -> Self {
        self.locked_axes = axes;
        self
    }
}
