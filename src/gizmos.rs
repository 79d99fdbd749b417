//! Debug drawing of the surface detectors.

use bevy::color::palettes::css;
use bevy::prelude::*;

use crate::config::{CharacterController, ControllerConfig};
use crate::detection::{SurfaceDetector, SurfaceInfo, SurfaceSensors};

/// Draws every detector's sweep: green while it touches a surface, red
/// otherwise.
///
/// Needs the gizmo plugin that `DefaultPlugins` includes.
pub struct ControllerGizmosPlugin;

impl Plugin for ControllerGizmosPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PostUpdate, draw_detector_gizmos);
    }
}

/// Color of a detector ray for its latest result.
pub fn detector_color(info: &SurfaceInfo) -> Color {
    if info.in_contact {
        css::LIME.into()
    } else {
        css::RED.into()
    }
}

/// The rays of one character: start, sweep vector and latest result per
/// detector, ground first.
pub fn detector_rays(
    feet: Vec2,
    config: &ControllerConfig,
    sensors: &SurfaceSensors,
    controller: &CharacterController,
) -> [(Vec2, Vec2, SurfaceInfo); 3] {
    let up = controller.gravity_up();
    let ray = |detector: &SurfaceDetector, skin: f32, info: SurfaceInfo| {
        let (start, sweep) = detector.debug_ray(feet, skin, up);
        (start, sweep, info)
    };

    [
        ray(&sensors.ground, config.step_height, controller.ground),
        ray(&sensors.left_wall, config.wall_skin_width, controller.left_wall),
        ray(&sensors.right_wall, config.wall_skin_width, controller.right_wall),
    ]
}

fn draw_detector_gizmos(
    mut gizmos: Gizmos,
    q_controllers: Query<(
        &GlobalTransform,
        &ControllerConfig,
        &SurfaceSensors,
        &CharacterController,
    )>,
) {
    for (transform, config, sensors, controller) in &q_controllers {
        let feet = controller.foot_position(transform.translation().xy());
        for (start, sweep, info) in detector_rays(feet, config, sensors, controller) {
            gizmos.ray_2d(start, sweep, detector_color(&info));
        }
    }
}
