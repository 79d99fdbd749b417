//! Surface detection.
//!
//! A [`SurfaceDetector`] describes one box cast relative to the character
//! (where it starts, which way it sweeps, how far). The physics backend runs
//! the cast and the detector turns the answer into a [`SurfaceInfo`], the
//! per-tick "am I touching something on this side" result.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::collision::{SurfaceHit, SurfaceMaterial};

/// Side of the character a detector watches.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SurfaceSide {
    Below,
    Above,
    Left,
    Right,
}

/// Axis-aligned cast direction.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxialDirection {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl AxialDirection {
    #[inline]
    pub fn to_vec2(self) -> Vec2 {
        match self {
            AxialDirection::Up => Vec2::Y,
            AxialDirection::Down => Vec2::NEG_Y,
            AxialDirection::Left => Vec2::NEG_X,
            AxialDirection::Right => Vec2::X,
        }
    }

    /// The side of the character this direction points at.
    pub fn side(self) -> SurfaceSide {
        match self {
            AxialDirection::Up => SurfaceSide::Above,
            AxialDirection::Down => SurfaceSide::Below,
            AxialDirection::Left => SurfaceSide::Left,
            AxialDirection::Right => SurfaceSide::Right,
        }
    }
}

/// Result of one surface detector for the current physics step.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct SurfaceInfo {
    /// Whether the cast hit anything.
    pub in_contact: bool,
    /// Normal of the contacted surface (zero without contact).
    pub normal: Vec2,
    /// Distance from the cast start to the surface.
    pub distance: f32,
    /// The contacted collider.
    pub entity: Option<Entity>,
    /// Physics material of the contacted collider.
    pub material: Option<SurfaceMaterial>,
    /// Collision layer memberships of the contacted collider.
    pub layers: Option<u32>,
}

impl Default for SurfaceInfo {
    fn default() -> Self {
        Self::NONE
    }
}

impl SurfaceInfo {
    /// No contact.
    pub const NONE: Self = Self {
        in_contact: false,
        normal: Vec2::ZERO,
        distance: 0.0,
        entity: None,
        material: None,
        layers: None,
    };

    pub fn from_hit(hit: SurfaceHit) -> Self {
        Self {
            in_contact: true,
            normal: hit.collision.normal,
            distance: hit.collision.distance,
            entity: hit.collision.entity,
            material: hit.material,
            layers: hit.layers,
        }
    }

    /// Material of the contacted collider, if there is a contact and it has one.
    #[inline]
    pub fn physics_material(&self) -> Option<SurfaceMaterial> {
        if self.in_contact {
            self.material
        } else {
            None
        }
    }

    /// Whether the contacted collider belongs to any of the layers in `mask`.
    pub fn is_on_layer(&self, mask: u32) -> bool {
        self.in_contact && self.layers.is_some_and(|layers| layers & mask != 0)
    }

    /// Angle (radians) between the surface normal and `up`.
    ///
    /// Without contact the surface is treated as flat.
    pub fn slope_angle(&self, up: Vec2) -> f32 {
        if !self.in_contact || self.normal == Vec2::ZERO {
            return 0.0;
        }
        self.normal.normalize().dot(up).clamp(-1.0, 1.0).acos()
    }
}

/// The sweep a backend has to perform for one detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceCast {
    pub start: Vec2,
    /// Unit sweep direction.
    pub direction: Vec2,
    pub distance: f32,
    /// Half extents of the swept box.
    pub half_extents: Vec2,
    /// Rotation of the box (radians around Z).
    pub rotation: f32,
    /// Only colliders in these layers are considered.
    pub layers: u32,
}

/// A box cast that probes one side of the character.
///
/// The box starts `skin_width` behind the character's origin (opposite to
/// the cast direction) so that surfaces the collider already overlaps a
/// little are still found, and sweeps `max_distance + skin_width`.
#[derive(Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SurfaceDetector {
    /// Layer filter for the cast.
    pub valid_layers: u32,
    /// Half extents of the swept box.
    pub scan_size: Vec2,
    /// Offset of the box from the character origin.
    pub offset: Vec2,
    pub direction: AxialDirection,
    pub max_distance: f32,
}

impl Default for SurfaceDetector {
    fn default() -> Self {
        Self::ground()
    }
}

impl SurfaceDetector {
    /// A thin, wide box sweeping down from just above the character origin.
    pub fn ground() -> Self {
        Self {
            valid_layers: u32::MAX,
            scan_size: Vec2::new(0.4, 0.02),
            offset: Vec2::new(0.0, 0.03),
            direction: AxialDirection::Down,
            max_distance: 0.2,
        }
    }

    /// A tall, thin box sweeping left from the character's centre.
    pub fn left_wall() -> Self {
        Self {
            valid_layers: u32::MAX,
            scan_size: Vec2::new(0.02, 0.4),
            offset: Vec2::new(0.0, 0.5),
            direction: AxialDirection::Left,
            max_distance: 0.3,
        }
    }

    pub fn right_wall() -> Self {
        Self {
            direction: AxialDirection::Right,
            ..Self::left_wall()
        }
    }

    pub fn with_layers(mut self, layers: u32) -> Self {
        self.valid_layers = layers;
        self
    }

    pub fn with_scan_size(mut self, half_extents: Vec2) -> Self {
        self.scan_size = half_extents;
        self
    }

    pub fn with_offset(mut self, offset: Vec2) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_max_distance(mut self, distance: f32) -> Self {
        self.max_distance = distance;
        self
    }

    #[inline]
    pub fn start_position(&self, origin: Vec2, skin_width: f32) -> Vec2 {
        origin + self.offset + self.direction.to_vec2() * -skin_width
    }

    #[inline]
    pub fn check_distance(&self, skin_width: f32) -> f32 {
        self.max_distance + skin_width
    }

    /// The sweep for a character whose feet are at `origin` and whose up
    /// is the unit vector `up`. Offset, direction and box are rotated from
    /// world up onto `up`.
    pub fn cast_request(&self, origin: Vec2, skin_width: f32, up: Vec2) -> SurfaceCast {
        let frame = Vec2::new(up.y, -up.x);
        SurfaceCast {
            start: origin + frame.rotate(self.start_position(Vec2::ZERO, skin_width)),
            direction: frame.rotate(self.direction.to_vec2()),
            distance: self.check_distance(skin_width),
            half_extents: self.scan_size,
            rotation: Vec2::Y.angle_to(up),
            layers: self.valid_layers,
        }
    }

    pub fn resolve(&self, hit: Option<SurfaceHit>) -> SurfaceInfo {
        hit.map(SurfaceInfo::from_hit).unwrap_or_default()
    }

    /// The ray drawn for this detector: start point and full sweep vector.
    pub fn debug_ray(&self, origin: Vec2, skin_width: f32, up: Vec2) -> (Vec2, Vec2) {
        let cast = self.cast_request(origin, skin_width, up);
        (cast.start, cast.direction * cast.distance)
    }
}

/// The three detectors of a character.
#[derive(Component, Reflect, Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
#[reflect(Component)]
#[serde(default)]
pub struct SurfaceSensors {
    pub ground: SurfaceDetector,
    pub left_wall: SurfaceDetector,
    pub right_wall: SurfaceDetector,
}

impl Default for SurfaceSensors {
    fn default() -> Self {
        Self {
            ground: SurfaceDetector::ground(),
            left_wall: SurfaceDetector::left_wall(),
            right_wall: SurfaceDetector::right_wall(),
        }
    }
}

impl SurfaceSensors {
    /// Restrict all three detectors to `layers`.
    pub fn with_layers(self, layers: u32) -> Self {
        Self {
            ground: self.ground.with_layers(layers),
            left_wall: self.left_wall.with_layers(layers),
            right_wall: self.right_wall.with_layers(layers),
        }
    }

    pub fn detector(&self, side: SurfaceSide) -> Option<&SurfaceDetector> {
        match side {
            SurfaceSide::Below => Some(&self.ground),
            SurfaceSide::Left => Some(&self.left_wall),
            SurfaceSide::Right => Some(&self.right_wall),
            SurfaceSide::Above => None,
        }
    }
}
