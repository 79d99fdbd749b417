//! Jump state machine.
//!
//! Decides whether a jump is legal this step and what velocity it launches
//! with. Three kinds of jump exist, checked in priority order: a ground jump
//! (also allowed for a short grace period after walking off a ledge), a
//! wall jump off either side, and an air jump. All of them share one jump
//! budget that refills when the character lands.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::detection::{SurfaceInfo, SurfaceSide};
use crate::kinetics;

/// A `[min, max]` range inside `[0, 1]`.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FloatMinMax {
    pub min: f32,
    pub max: f32,
}

impl Default for FloatMinMax {
    fn default() -> Self {
        Self { min: 0.0, max: 1.0 }
    }
}

impl FloatMinMax {
    /// Build a range, clamping both ends to `[0, 1]` and ordering them.
    pub fn new(a: f32, b: f32) -> Self {
        let a = a.clamp(0.0, 1.0);
        let b = b.clamp(0.0, 1.0);
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Map `t ∈ [0, 1]` linearly onto the range.
    #[inline]
    pub fn remap(&self, t: f32) -> f32 {
        self.min + (self.max - self.min) * t.clamp(0.0, 1.0)
    }
}

/// Jumping again while airborne.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct AirJump {
    pub enabled: bool,
    /// Fraction of the ground jump height, in `[0, 1]`.
    pub strength: f32,
    /// How much horizontal input steers the jump, in `[0, 1]`.
    pub control: f32,
}

impl Default for AirJump {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 0.8,
            control: 0.5,
        }
    }
}

/// Jumping off a wall.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct WallJump {
    pub enabled: bool,
    /// Fraction of the ground jump height, in `[0, 1]`.
    pub strength: f32,
    /// Tilt of the jump away from vertical, in quarter turns.
    ///
    /// The tilt is `max - remap(|input.x|)`: no horizontal input tilts by
    /// `max - min`, full input jumps straight up.
    pub control: FloatMinMax,
}

impl Default for WallJump {
    fn default() -> Self {
        Self {
            enabled: true,
            strength: 0.9,
            control: FloatMinMax::new(0.2, 0.6),
        }
    }
}

/// What kind of jump was performed.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpKind {
    Ground,
    Wall(SurfaceSide),
    Air,
    /// A jump was spent but no jump mode applied.
    None,
}

/// Launch velocity of a jump.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JumpImpulse {
    pub kind: JumpKind,
    pub velocity: Vec2,
}

/// Jump rules and the per-character jump budget.
#[derive(Component, Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
#[serde(default)]
pub struct JumpController {
    /// Seconds after walking off a ledge during which a ground jump is
    /// still allowed.
    pub grace_time: f32,
    /// Jumps available between two landings (ground jump included).
    pub max_jumps: u32,
    pub air_jump: AirJump,
    pub wall_jump: WallJump,

    #[serde(skip)]
    jump_count: u32,
    #[serde(skip)]
    airborne: bool,
    #[serde(skip)]
    time_since_grounded: f32,
}

impl Default for JumpController {
    fn default() -> Self {
        Self {
            grace_time: 0.1,
            max_jumps: 2,
            air_jump: AirJump::default(),
            wall_jump: WallJump::default(),
            jump_count: 0,
            airborne: false,
            time_since_grounded: 0.0,
        }
    }
}

impl JumpController {
    /// Ground jumps only.
    pub fn single() -> Self {
        Self {
            max_jumps: 1,
            air_jump: AirJump {
                enabled: false,
                ..default()
            },
            wall_jump: WallJump {
                enabled: false,
                ..default()
            },
            ..default()
        }
    }

    pub fn with_max_jumps(mut self, max_jumps: u32) -> Self {
        self.max_jumps = max_jumps;
        self
    }

    pub fn with_grace_time(mut self, grace_time: f32) -> Self {
        self.grace_time = grace_time;
        self
    }

    pub fn with_air_jump(mut self, air_jump: AirJump) -> Self {
        self.air_jump = air_jump;
        self
    }

    pub fn with_wall_jump(mut self, wall_jump: WallJump) -> Self {
        self.wall_jump = wall_jump;
        self
    }

    pub fn jump_count(&self) -> u32 {
        self.jump_count
    }

    pub fn time_since_grounded(&self) -> f32 {
        self.time_since_grounded
    }

    /// Whether the character left the ground without jumping recently
    /// enough to still ground-jump.
    pub fn in_grace_period(&self) -> bool {
        self.airborne && self.jump_count == 0 && self.time_since_grounded < self.grace_time
    }

    fn wall_in_contact(&self, left_wall: &SurfaceInfo, right_wall: &SurfaceInfo) -> bool {
        self.wall_jump.enabled && (left_wall.in_contact || right_wall.in_contact)
    }

    pub fn can_jump(
        &self,
        ground: &SurfaceInfo,
        left_wall: &SurfaceInfo,
        right_wall: &SurfaceInfo,
    ) -> bool {
        if self.jump_count >= self.max_jumps {
            return false;
        }

        if self.air_jump.enabled {
            return true;
        }

        if self.wall_in_contact(left_wall, right_wall) {
            return true;
        }

        ground.in_contact || self.in_grace_period()
    }

    /// Spend a jump and return its launch velocity.
    ///
    /// Call only after [`can_jump`](Self::can_jump) agreed.
    pub fn jump_velocity(
        &mut self,
        jump_height: f32,
        gravity: f32,
        directional_input: Vec2,
        ground: &SurfaceInfo,
        left_wall: &SurfaceInfo,
        right_wall: &SurfaceInfo,
    ) -> JumpImpulse {
        let from_ground = ground.in_contact || self.in_grace_period();
        self.jump_count += 1;

        if from_ground {
            return JumpImpulse {
                kind: JumpKind::Ground,
                velocity: Vec2::new(0.0, kinetics::velocity_to_reach_apex(jump_height, gravity)),
            };
        }

        if self.wall_jump.enabled {
            let side = if left_wall.in_contact {
                Some((SurfaceSide::Left, 1.0))
            } else if right_wall.in_contact {
                Some((SurfaceSide::Right, -1.0))
            } else {
                None
            };

            if let Some((side, sign)) = side {
                let speed = kinetics::velocity_to_reach_apex(
                    jump_height * self.wall_jump.strength,
                    gravity,
                );
                return JumpImpulse {
                    kind: JumpKind::Wall(side),
                    velocity: self.wall_jump_velocity(speed, directional_input, sign),
                };
            }
        }

        if self.air_jump.enabled {
            let speed =
                kinetics::velocity_to_reach_apex(jump_height * self.air_jump.strength, gravity);
            return JumpImpulse {
                kind: JumpKind::Air,
                velocity: self.air_jump_velocity(speed, directional_input),
            };
        }

        JumpImpulse {
            kind: JumpKind::None,
            velocity: Vec2::ZERO,
        }
    }

    /// `sign` is `1` for a wall on the left (launch to the right) and `-1`
    /// for a wall on the right.
    fn wall_jump_velocity(&self, base_speed: f32, directional_input: Vec2, sign: f32) -> Vec2 {
        let control = &self.wall_jump.control;
        let tilt = control.max - control.remap(directional_input.x.abs());
        let jump =
            Vec2::from_angle(std::f32::consts::FRAC_PI_2 * tilt).rotate(Vec2::Y) * base_speed;

        Vec2::new(jump.x * -sign, jump.y)
    }

    fn air_jump_velocity(&self, base_speed: f32, directional_input: Vec2) -> Vec2 {
        let x_scaled = directional_input.x * self.air_jump.control;
        Vec2::new(base_speed * x_scaled, base_speed)
    }

    /// The character stopped standing on ground.
    ///
    /// Walking off a ledge costs the ground jump once the grace period runs
    /// out (immediately without a grace period).
    pub fn on_detached_from_ground(&mut self) {
        self.airborne = true;
        self.time_since_grounded = 0.0;
        if self.grace_time <= 0.0 && self.jump_count == 0 {
            self.jump_count = 1;
        }
    }

    /// The character landed: the jump budget refills.
    pub fn on_returned_to_ground(&mut self) {
        self.airborne = false;
        self.time_since_grounded = 0.0;
        self.jump_count = 0;
    }

    /// Advance the grace timer by one physics step.
    pub fn tick(&mut self, dt: f32) {
        if !self.airborne {
            return;
        }

        self.time_since_grounded += dt;
        if self.jump_count == 0 && self.time_since_grounded >= self.grace_time {
            self.jump_count = 1;
        }
    }
}
