//! Horizontal movement integrator.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::detection::SurfaceInfo;
use crate::kinetics;

/// Which velocity axes the mover is allowed to write.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisMask {
    X,
    Y,
    #[default]
    XY,
}

impl AxisMask {
    #[inline]
    pub fn mask(self) -> Vec2 {
        match self {
            AxisMask::X => Vec2::X,
            AxisMask::Y => Vec2::Y,
            AxisMask::XY => Vec2::ONE,
        }
    }
}

/// Drag-based horizontal integrator.
///
/// Each step the drag is re-derived from the requested acceleration and the
/// target speed, so that holding full input settles exactly at the target
/// speed. Letting go (zero acceleration) zeroes that drag; slowing down is
/// then left to the slipperiness of the surface and the engine-side drag.
#[derive(Component, Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
#[serde(default)]
pub struct KineticMover {
    pub axis_mask: AxisMask,
    /// Steepest surface (radians) that still counts as ground.
    pub max_surface_angle: f32,
    #[serde(skip)]
    drag: f32,
}

impl Default for KineticMover {
    fn default() -> Self {
        Self {
            axis_mask: AxisMask::XY,
            max_surface_angle: 60f32.to_radians(),
            drag: 1.0,
        }
    }
}

impl KineticMover {
    pub fn new(axis_mask: AxisMask, max_surface_angle: f32) -> Self {
        Self {
            axis_mask,
            max_surface_angle: max_surface_angle.clamp(0.0, std::f32::consts::FRAC_PI_2),
            ..default()
        }
    }

    /// Drag used by the most recent [`velocity`](Self::velocity) call.
    pub fn drag(&self) -> f32 {
        self.drag
    }

    /// Integrate one step of horizontal movement.
    ///
    /// `acceleration` is the signed input acceleration, `target_speed` the
    /// speed full input should settle at. The vertical component of
    /// `current` is passed through untouched (before masking).
    pub fn velocity(
        &mut self,
        acceleration: f32,
        target_speed: f32,
        current: Vec2,
        surface: &SurfaceInfo,
        dt: f32,
    ) -> Vec2 {
        self.drag = kinetics::optimal_drag(acceleration, target_speed);

        let mut x = kinetics::accelerate_towards(current.x, acceleration, self.drag, dt);

        if let Some(material) = surface.physics_material() {
            x -= kinetics::apply_slipperiness(x - current.x, material.friction);
        }

        Vec2::new(x, current.y) * self.axis_mask.mask()
    }

    /// Whether `surface` is flat enough to stand on.
    pub fn is_walkable(&self, surface: &SurfaceInfo, up: Vec2) -> bool {
        surface.in_contact && surface.slope_angle(up) <= self.max_surface_angle + f32::EPSILON
    }
}
