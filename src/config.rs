//! Controller configuration and per-step state components.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collision::SurfaceMaterial;
use crate::detection::{SurfaceInfo, SurfaceSensors};
use crate::intent::MovementIntent;
use crate::jump::JumpController;
use crate::mover::KineticMover;

/// What the character keeps its "up" aligned to.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrientationMode {
    /// Rotation is left to the physics engine.
    None,
    /// Always world up.
    World,
    /// Opposite to the character's gravity.
    #[default]
    Gravity,
    /// The normal of the ground below, when there is ground.
    Surface,
}

impl OrientationMode {
    /// The up direction the character should face, if this mode sets one.
    pub fn target_up(self, gravity: Vec2, ground: &SurfaceInfo) -> Option<Vec2> {
        match self {
            OrientationMode::None => None,
            OrientationMode::World => Some(Vec2::Y),
            OrientationMode::Gravity => Some((-gravity).try_normalize().unwrap_or(Vec2::Y)),
            OrientationMode::Surface => {
                if ground.in_contact {
                    ground.normal.try_normalize()
                } else {
                    None
                }
            }
        }
    }

    /// The rotation (radians around Z, in `(-π, π]`) that maps world up
    /// onto `up`.
    #[inline]
    pub fn rotation_for(up: Vec2) -> f32 {
        Vec2::Y.angle_to(up)
    }
}

/// Tunable movement settings.
#[derive(Component, Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
#[serde(default)]
pub struct ControllerConfig {
    /// Horizontal speed full input settles at (units/second).
    pub speed: f32,
    /// Horizontal acceleration at full input (units/second²).
    pub acceleration: f32,
    /// Height of a ground jump (units).
    pub jump_height: f32,
    /// Height of steps the character may stand on; also the skin width of
    /// the ground detector.
    pub step_height: f32,
    /// Skin width of the wall detectors.
    pub wall_skin_width: f32,
    /// Only count as grounded after a collision with the ground was
    /// reported, not merely when the ground detector finds it.
    pub restore_ground_on_ground_collision: bool,
    pub align_to: OrientationMode,
    /// Time scale of horizontal movement while airborne is `air_control²`.
    pub air_control: f32,
    /// Below this input magnitude the engine-side idle drag is applied.
    pub input_drag_threshold: f32,
    /// Engine-side linear drag while there is no input.
    pub idle_drag: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            speed: 5.0,
            acceleration: 20.0,
            jump_height: 1.5,
            step_height: 0.2,
            wall_skin_width: 0.1,
            restore_ground_on_ground_collision: true,
            align_to: OrientationMode::Gravity,
            air_control: 0.7,
            input_drag_threshold: 0.1,
            idle_drag: 1.0,
        }
    }
}

impl ControllerConfig {
    /// Snappy settings for a player character.
    pub fn player() -> Self {
        Self {
            speed: 6.0,
            acceleration: 40.0,
            jump_height: 2.0,
            air_control: 0.8,
            ..default()
        }
    }

    /// Slow to accelerate, high jumps, little air control.
    pub fn floaty() -> Self {
        Self {
            speed: 4.0,
            acceleration: 8.0,
            jump_height: 3.0,
            air_control: 0.4,
            idle_drag: 0.3,
            ..default()
        }
    }

    /// Builder: set speed and acceleration.
    pub fn with_movement(mut self, speed: f32, acceleration: f32) -> Self {
        self.speed = speed;
        self.acceleration = acceleration;
        self
    }

    pub fn with_jump_height(mut self, height: f32) -> Self {
        self.jump_height = height;
        self
    }

    pub fn with_step_height(mut self, height: f32) -> Self {
        self.step_height = height;
        self
    }

    /// Builder: set air control, clamped to `[0, 1]`.
    pub fn with_air_control(mut self, air_control: f32) -> Self {
        self.air_control = air_control.clamp(0.0, 1.0);
        self
    }

    pub fn with_orientation(mut self, mode: OrientationMode) -> Self {
        self.align_to = mode;
        self
    }

    pub fn with_restore_ground_on_collision(mut self, enabled: bool) -> Self {
        self.restore_ground_on_ground_collision = enabled;
        self
    }

    pub fn with_idle_drag(mut self, drag: f32) -> Self {
        self.idle_drag = drag;
        self
    }

    /// Engine-side drag for the given input axis.
    pub fn drag_for_input(&self, input: f32) -> f32 {
        if input.abs() < self.input_drag_threshold {
            self.idle_drag
        } else {
            0.0
        }
    }
}

/// Axes of a character's gravity frame.
///
/// Movement and jumps are computed in this frame: `x` runs along `right`,
/// `y` along `up`. With default gravity it is the world frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GravityFrame {
    pub up: Vec2,
    pub right: Vec2,
}

impl GravityFrame {
    /// Frame for the unit vector `up`.
    pub fn from_up(up: Vec2) -> Self {
        Self {
            up,
            right: Vec2::new(up.y, -up.x),
        }
    }

    /// Express a world vector in this frame.
    pub fn to_local(&self, world: Vec2) -> Vec2 {
        Vec2::new(world.dot(self.right), world.dot(self.up))
    }

    /// Inverse of [`to_local`](Self::to_local).
    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.right * local.x + self.up * local.y
    }
}

/// Ground status change produced by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroundTransition {
    Unchanged,
    Landed,
    Detached,
}

/// Per-step state of a character controller.
///
/// Written by the sensor, contact and ground-status systems; read by the
/// jump and movement systems of the same step.
#[derive(Component, Reflect, Debug, Clone)]
#[reflect(Component)]
#[require(ControllerConfig, KineticMover, JumpController, SurfaceSensors, MovementIntent)]
pub struct CharacterController {
    /// Gravity acting on this character. Applied by the controller, not by
    /// the physics engine.
    pub gravity: Vec2,

    // === Surface Info ===
    pub ground: SurfaceInfo,
    /// Ground info of the previous step.
    pub previous_ground: SurfaceInfo,
    pub left_wall: SurfaceInfo,
    pub right_wall: SurfaceInfo,

    // === Ground Status ===
    pub(crate) on_ground: bool,
    pub(crate) has_made_full_surface_contact: bool,

    /// Ramps from 0 to 1 over the first second on the ground; blends the
    /// airborne and grounded movement time scales.
    pub(crate) control: f32,

    // === Readouts ===
    /// Horizontal velocity written by the last step.
    pub current_speed: f32,
    /// Material of the ground below, if any.
    pub surface_material: Option<SurfaceMaterial>,

    /// Distance from the body origin down to the feet.
    pub(crate) foot_offset: f32,
}

impl Default for CharacterController {
    fn default() -> Self {
        Self {
            gravity: Vec2::new(0.0, -9.81),
            ground: SurfaceInfo::NONE,
            previous_ground: SurfaceInfo::NONE,
            left_wall: SurfaceInfo::NONE,
            right_wall: SurfaceInfo::NONE,
            on_ground: false,
            has_made_full_surface_contact: false,
            control: 1.0,
            current_speed: 0.0,
            surface_material: None,
            foot_offset: 0.0,
        }
    }
}

impl CharacterController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gravity(gravity: Vec2) -> Self {
        Self {
            gravity,
            ..default()
        }
    }

    pub fn set_gravity(&mut self, gravity: Vec2) {
        self.gravity = gravity;
    }

    /// Up as defined by gravity.
    pub fn gravity_up(&self) -> Vec2 {
        (-self.gravity).try_normalize().unwrap_or(Vec2::Y)
    }

    /// The character's right, a quarter turn clockwise from up.
    pub fn gravity_right(&self) -> Vec2 {
        self.frame().right
    }

    pub fn frame(&self) -> GravityFrame {
        GravityFrame::from_up(self.gravity_up())
    }

    pub fn to_local(&self, world: Vec2) -> Vec2 {
        self.frame().to_local(world)
    }

    pub fn to_world(&self, local: Vec2) -> Vec2 {
        self.frame().to_world(local)
    }

    /// Signed gravity along the up axis (negative when pulling down).
    pub fn gravity_along_up(&self) -> f32 {
        -self.gravity.length()
    }

    /// Whether the character currently counts as standing on ground.
    pub fn is_grounded(&self) -> bool {
        self.on_ground
    }

    pub fn has_made_full_surface_contact(&self) -> bool {
        self.has_made_full_surface_contact
    }

    pub fn control(&self) -> f32 {
        self.control
    }

    pub fn ground_detected(&self) -> bool {
        self.ground.in_contact
    }

    pub fn ground_normal(&self) -> Vec2 {
        if self.ground.in_contact {
            self.ground.normal
        } else {
            self.gravity_up()
        }
    }

    pub fn ground_entity(&self) -> Option<Entity> {
        self.ground.entity
    }

    pub fn touching_wall(&self) -> bool {
        self.left_wall.in_contact || self.right_wall.in_contact
    }

    pub fn touching_left_wall(&self) -> bool {
        self.left_wall.in_contact
    }

    pub fn touching_right_wall(&self) -> bool {
        self.right_wall.in_contact
    }

    pub fn foot_offset(&self) -> f32 {
        self.foot_offset
    }

    /// Feet position for a body origin at `position`.
    pub fn foot_position(&self, position: Vec2) -> Vec2 {
        position - self.gravity_up() * self.foot_offset
    }

    /// Store this step's detector results, keeping the last ground result.
    pub fn push_surface_info(
        &mut self,
        ground: SurfaceInfo,
        left_wall: SurfaceInfo,
        right_wall: SurfaceInfo,
    ) {
        self.previous_ground = self.ground;
        self.ground = ground;
        self.left_wall = left_wall;
        self.right_wall = right_wall;
    }

    /// Collision-enter callback for one contact point.
    ///
    /// A contact no higher than `step_height` above the feet counts as
    /// touching down on ground. Returns whether it did.
    pub fn register_contact_point(&mut self, point: Vec2, feet: Vec2, step_height: f32) -> bool {
        let height = (point - feet).dot(self.gravity_up());
        if height > step_height {
            return false;
        }
        self.has_made_full_surface_contact = true;
        true
    }

    /// Recompute ground status from this step's surface info and notify the
    /// jump controller of landings and departures.
    pub fn update_ground_status(
        &mut self,
        config: &ControllerConfig,
        mover: &KineticMover,
        jump: &mut JumpController,
    ) -> GroundTransition {
        let was_on_ground = self.on_ground;

        let mut on_ground = mover.is_walkable(&self.ground, self.gravity_up());
        if config.restore_ground_on_ground_collision {
            on_ground &= self.has_made_full_surface_contact;
        }

        self.on_ground = on_ground;
        self.surface_material = self.ground.physics_material();

        match (was_on_ground, on_ground) {
            (false, true) => {
                jump.on_returned_to_ground();
                GroundTransition::Landed
            }
            (true, false) => {
                self.has_made_full_surface_contact = false;
                jump.on_detached_from_ground();
                GroundTransition::Detached
            }
            _ => GroundTransition::Unchanged,
        }
    }

    /// Effective time step for horizontal movement.
    ///
    /// In the air movement runs at `air_control²` of real time. After
    /// landing, full control ramps back in over one second.
    pub fn step_delta_time(&mut self, dt: f32, air_control: f32) -> f32 {
        if self.on_ground {
            self.control = (self.control + dt).clamp(0.0, 1.0);
        } else {
            self.control = 0.0;
        }

        let airborne = dt * air_control * air_control;
        airborne + (dt - airborne) * self.control
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collision::{CollisionData, SurfaceHit};
    use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    const DT: f32 = 1.0 / 60.0;

    fn flat_ground() -> SurfaceInfo {
        SurfaceInfo::from_hit(
            SurfaceHit::new(CollisionData::new(0.1, Vec2::Y, Vec2::ZERO, None))
                .with_material(SurfaceMaterial::new(0.4)),
        )
    }

    #[test]
    fn orientation_targets() {
        let gravity = Vec2::new(0.0, -9.81);
        assert_eq!(OrientationMode::None.target_up(gravity, &flat_ground()), None);
        assert_eq!(OrientationMode::World.target_up(Vec2::X, &SurfaceInfo::NONE), Some(Vec2::Y));
        assert_eq!(
            OrientationMode::Gravity.target_up(Vec2::new(5.0, 0.0), &SurfaceInfo::NONE),
            Some(Vec2::NEG_X)
        );
        assert_eq!(
            OrientationMode::Gravity.target_up(Vec2::ZERO, &SurfaceInfo::NONE),
            Some(Vec2::Y)
        );
        assert_eq!(OrientationMode::Surface.target_up(gravity, &SurfaceInfo::NONE), None);
        assert_eq!(OrientationMode::Surface.target_up(gravity, &flat_ground()), Some(Vec2::Y));
    }

    #[test]
    fn rotation_for_up() {
        assert!(OrientationMode::rotation_for(Vec2::Y).abs() < 1e-6);
        assert!((OrientationMode::rotation_for(Vec2::NEG_X) - FRAC_PI_2).abs() < 1e-6);
        assert!((OrientationMode::rotation_for(Vec2::X) + FRAC_PI_2).abs() < 1e-6);
        assert!((OrientationMode::rotation_for(Vec2::NEG_Y).abs() - PI).abs() < 1e-6);
    }

    #[test]
    fn rotation_for_stays_in_half_turn_range() {
        // Gravity pulling right gives up = (-1, -0.0)
        let sideways = OrientationMode::Gravity
            .target_up(Vec2::new(9.81, 0.0), &SurfaceInfo::NONE)
            .unwrap();
        assert!((OrientationMode::rotation_for(sideways) - FRAC_PI_2).abs() < 1e-6);

        let diagonal = OrientationMode::Gravity
            .target_up(Vec2::new(1.0, 1.0), &SurfaceInfo::NONE)
            .unwrap();
        let angle = OrientationMode::rotation_for(diagonal);
        assert!((angle - 3.0 * FRAC_PI_4).abs() < 1e-5, "got {angle}");

        for i in 0..16 {
            let up = Vec2::from_angle(i as f32 * PI / 8.0);
            let angle = OrientationMode::rotation_for(up);
            assert!(angle > -PI - 1e-6 && angle <= PI + 1e-6, "{up:?} -> {angle}");
            assert!((Vec2::from_angle(angle).rotate(Vec2::Y) - up).length() < 1e-5);
        }
    }

    #[test]
    fn gravity_frame_round_trips() {
        let controller = CharacterController::with_gravity(Vec2::new(0.0, 9.81));
        assert_eq!(controller.gravity_up(), Vec2::NEG_Y);
        assert_eq!(controller.gravity_right(), Vec2::new(-1.0, 0.0));

        // Jumping up in the frame moves against gravity
        assert_eq!(controller.to_world(Vec2::new(0.0, 2.0)), Vec2::new(0.0, -2.0));

        let sideways = CharacterController::with_gravity(Vec2::new(9.81, 0.0));
        let v = Vec2::new(1.5, -0.5);
        assert!((sideways.to_world(sideways.to_local(v)) - v).length() < 1e-6);
        assert!((sideways.to_local(Vec2::NEG_X) - Vec2::Y).length() < 1e-6);
    }

    #[test]
    fn config_drag_for_input() {
        let config = ControllerConfig::default();
        assert_eq!(config.drag_for_input(0.0), 1.0);
        assert_eq!(config.drag_for_input(0.05), 1.0);
        assert_eq!(config.drag_for_input(-0.5), 0.0);
    }

    #[test]
    fn config_builders() {
        let config = ControllerConfig::default()
            .with_movement(8.0, 30.0)
            .with_jump_height(2.5)
            .with_air_control(3.0)
            .with_orientation(OrientationMode::World);
        assert_eq!(config.speed, 8.0);
        assert_eq!(config.acceleration, 30.0);
        assert_eq!(config.jump_height, 2.5);
        assert_eq!(config.air_control, 1.0);
        assert_eq!(config.align_to, OrientationMode::World);
    }

    #[test]
    fn config_presets_differ() {
        assert!(ControllerConfig::player().acceleration > ControllerConfig::default().acceleration);
        assert!(ControllerConfig::floaty().air_control < ControllerConfig::default().air_control);
    }

    #[test]
    fn controller_new() {
        let controller = CharacterController::new();
        assert!(!controller.is_grounded());
        assert_eq!(controller.gravity, Vec2::new(0.0, -9.81));
        assert_eq!(controller.gravity_up(), Vec2::Y);
        assert_eq!(controller.ground_normal(), Vec2::Y);
    }

    #[test]
    fn push_surface_info_keeps_previous_ground() {
        let mut controller = CharacterController::new();
        controller.push_surface_info(flat_ground(), SurfaceInfo::NONE, SurfaceInfo::NONE);
        controller.push_surface_info(SurfaceInfo::NONE, flat_ground(), SurfaceInfo::NONE);

        assert!(controller.previous_ground.in_contact);
        assert!(!controller.ground.in_contact);
        assert!(controller.touching_left_wall());
        assert!(!controller.touching_right_wall());
        assert!(controller.touching_wall());
    }

    #[test]
    fn contact_points_above_step_height_are_ignored() {
        let mut controller = CharacterController::new();
        let feet = Vec2::new(0.0, 1.0);

        assert!(!controller.register_contact_point(Vec2::new(0.3, 1.5), feet, 0.2));
        assert!(!controller.has_made_full_surface_contact());

        assert!(controller.register_contact_point(Vec2::new(0.1, 1.15), feet, 0.2));
        assert!(controller.has_made_full_surface_contact());
    }

    #[test]
    fn foot_position_follows_gravity() {
        let mut controller = CharacterController::with_gravity(Vec2::new(-9.81, 0.0));
        controller.foot_offset = 0.5;
        let feet = controller.foot_position(Vec2::new(2.0, 3.0));
        assert!((feet - Vec2::new(1.5, 3.0)).length() < 1e-5);
    }

    #[test]
    fn landing_requires_collision_when_restoring_on_collision() {
        let config = ControllerConfig::default();
        let mover = KineticMover::default();
        let mut jump = JumpController::default();
        let mut controller = CharacterController::new();

        controller.push_surface_info(flat_ground(), SurfaceInfo::NONE, SurfaceInfo::NONE);
        assert_eq!(
            controller.update_ground_status(&config, &mover, &mut jump),
            GroundTransition::Unchanged
        );
        assert!(!controller.is_grounded());

        controller.register_contact_point(Vec2::ZERO, Vec2::ZERO, config.step_height);
        assert_eq!(
            controller.update_ground_status(&config, &mover, &mut jump),
            GroundTransition::Landed
        );
        assert!(controller.is_grounded());
        assert_eq!(controller.surface_material, Some(SurfaceMaterial::new(0.4)));
    }

    #[test]
    fn landing_without_collision_requirement() {
        let config = ControllerConfig::default().with_restore_ground_on_collision(false);
        let mover = KineticMover::default();
        let mut jump = JumpController::default();
        let mut controller = CharacterController::new();

        controller.push_surface_info(flat_ground(), SurfaceInfo::NONE, SurfaceInfo::NONE);
        assert_eq!(
            controller.update_ground_status(&config, &mover, &mut jump),
            GroundTransition::Landed
        );
    }

    #[test]
    fn leaving_ground_resets_contact_and_notifies_jump() {
        let config = ControllerConfig::default().with_restore_ground_on_collision(false);
        let mover = KineticMover::default();
        let mut jump = JumpController::default().with_grace_time(0.0);
        let mut controller = CharacterController::new();
        controller.has_made_full_surface_contact = true;

        controller.push_surface_info(flat_ground(), SurfaceInfo::NONE, SurfaceInfo::NONE);
        controller.update_ground_status(&config, &mover, &mut jump);

        controller.push_surface_info(SurfaceInfo::NONE, SurfaceInfo::NONE, SurfaceInfo::NONE);
        assert_eq!(
            controller.update_ground_status(&config, &mover, &mut jump),
            GroundTransition::Detached
        );
        assert!(!controller.has_made_full_surface_contact());
        assert_eq!(jump.jump_count(), 1);
        assert!(controller.surface_material.is_none());
    }

    #[test]
    fn steep_ground_is_not_ground() {
        let config = ControllerConfig::default().with_restore_ground_on_collision(false);
        let mover = KineticMover::default();
        let mut jump = JumpController::default();
        let mut controller = CharacterController::new();

        let mut steep = flat_ground();
        steep.normal = Vec2::new(1.0, 0.2);
        controller.push_surface_info(steep, SurfaceInfo::NONE, SurfaceInfo::NONE);
        controller.update_ground_status(&config, &mover, &mut jump);
        assert!(!controller.is_grounded());
    }

    #[test]
    fn step_delta_time_blends_air_and_ground() {
        let mut controller = CharacterController::new();

        // Airborne: control drops to zero, time scaled by air_control²
        let dt = controller.step_delta_time(DT, 0.5);
        assert!((dt - DT * 0.25).abs() < 1e-7);
        assert_eq!(controller.control(), 0.0);

        // Grounded: control ramps back over one second
        controller.on_ground = true;
        let first = controller.step_delta_time(DT, 0.5);
        assert!(first > DT * 0.25 && first < DT);
        for _ in 0..60 {
            controller.step_delta_time(DT, 0.5);
        }
        assert_eq!(controller.control(), 1.0);
        assert!((controller.step_delta_time(DT, 0.5) - DT).abs() < 1e-7);
    }
}
