//! Keyboard input.
//!
//! Reads the keyboard every frame into the [`MovementIntent`] of entities
//! marked [`PlayerControlled`].
//!
//! ## Default controls
//! - **A/D** or **Left/Right**: Move horizontally
//! - **W/S** or **Up/Down**: Vertical axis (steers wall jumps)
//! - **Space**: Jump

use bevy::prelude::*;

use crate::intent::MovementIntent;

/// Marker component for entities driven by the keyboard.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct PlayerControlled;

/// Keys read by [`CharacterInputPlugin`].
#[derive(Resource, Debug, Clone)]
pub struct KeyBindings {
    pub left: Vec<KeyCode>,
    pub right: Vec<KeyCode>,
    pub up: Vec<KeyCode>,
    pub down: Vec<KeyCode>,
    pub jump: Vec<KeyCode>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            left: vec![KeyCode::KeyA, KeyCode::ArrowLeft],
            right: vec![KeyCode::KeyD, KeyCode::ArrowRight],
            up: vec![KeyCode::KeyW, KeyCode::ArrowUp],
            down: vec![KeyCode::KeyS, KeyCode::ArrowDown],
            jump: vec![KeyCode::Space],
        }
    }
}

impl KeyBindings {
    fn axis(keyboard: &ButtonInput<KeyCode>, negative: &[KeyCode], positive: &[KeyCode]) -> f32 {
        let mut axis = 0.0;
        if keyboard.any_pressed(negative.iter().copied()) {
            axis -= 1.0;
        }
        if keyboard.any_pressed(positive.iter().copied()) {
            axis += 1.0;
        }
        axis
    }

    pub fn horizontal(&self, keyboard: &ButtonInput<KeyCode>) -> f32 {
        Self::axis(keyboard, &self.left, &self.right)
    }

    pub fn vertical(&self, keyboard: &ButtonInput<KeyCode>) -> f32 {
        Self::axis(keyboard, &self.down, &self.up)
    }

    pub fn jump_pressed(&self, keyboard: &ButtonInput<KeyCode>) -> bool {
        keyboard.any_pressed(self.jump.iter().copied())
    }
}

/// Plugin that feeds keyboard input to [`PlayerControlled`] characters.
///
/// Needs `ButtonInput<KeyCode>`, which `DefaultPlugins` provides.
#[derive(Default)]
pub struct CharacterInputPlugin {
    pub bindings: KeyBindings,
}

impl Plugin for CharacterInputPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<PlayerControlled>();
        app.insert_resource(self.bindings.clone());
        app.add_systems(Update, handle_input);
    }
}

/// Handles keyboard input for movement and jumping.
///
/// The jump button state is forwarded as-is; the intent turns presses into
/// latched requests.
fn handle_input(
    keyboard: Option<Res<ButtonInput<KeyCode>>>,
    bindings: Res<KeyBindings>,
    mut query: Query<&mut MovementIntent, With<PlayerControlled>>,
) {
    let Some(keyboard) = keyboard else {
        return;
    };

    for mut movement in &mut query {
        movement.set_horizontal(bindings.horizontal(&keyboard));
        movement.set_vertical(bindings.vertical(&keyboard));
        movement.set_jump_pressed(bindings.jump_pressed(&keyboard));
    }
}
