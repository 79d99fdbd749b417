//! State marker components.
//!
//! Mirrors of the controller's ground and wall status, kept in sync at the
//! end of every fixed step so gameplay code can filter on them in queries.

use bevy::prelude::*;

use crate::detection::SurfaceSide;

/// Marker: the character is standing on walkable ground.
///
/// # Example
///
/// ```rust
/// use bevy::prelude::*;
/// use heracles_controller::prelude::*;
///
/// fn check_grounded(grounded: Option<&Grounded>) -> bool {
///     grounded.is_some()
/// }
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker: the character is not standing on ground.
///
/// Mutually exclusive with [`Grounded`].
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// The character's wall detector on one side found a surface.
///
/// When both sides touch, the left wall wins.
#[derive(Component, Reflect, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
pub struct TouchingWall {
    pub side: SurfaceSide,
    /// Normal of the wall surface.
    pub normal: Vec2,
}

impl Default for TouchingWall {
    fn default() -> Self {
        Self {
            side: SurfaceSide::Right,
            normal: Vec2::NEG_X,
        }
    }
}

impl TouchingWall {
    pub fn new(side: SurfaceSide, normal: Vec2) -> Self {
        Self { side, normal }
    }

    pub fn is_left(&self) -> bool {
        self.side == SurfaceSide::Left
    }

    pub fn is_right(&self) -> bool {
        self.side == SurfaceSide::Right
    }

    /// Unit direction from the character towards the wall.
    pub fn direction(&self) -> Vec2 {
        match self.side {
            SurfaceSide::Left => Vec2::NEG_X,
            SurfaceSide::Right => Vec2::X,
            SurfaceSide::Above => Vec2::Y,
            SurfaceSide::Below => Vec2::NEG_Y,
        }
    }
}
