//! Movement intent component.
//!
//! The intent is the seam between whatever polls input (keyboard, gamepad,
//! AI, network) and the fixed-step controller. Input is sampled every frame
//! in `Update`; the controller reads it in `FixedUpdate`, which may run zero
//! or several times per frame. A jump press is therefore latched until a
//! fixed step consumes it, so that no press is lost between two steps.

use bevy::prelude::*;

/// Desired movement for a character.
///
/// # Example
///
/// ```rust
/// use heracles_controller::prelude::*;
///
/// let mut intent = MovementIntent::new();
/// intent.set_horizontal(-1.0);
/// intent.set_jump_pressed(true);
///
/// assert!(intent.is_moving());
/// assert!(intent.take_jump_request());
/// assert!(!intent.take_jump_request());
/// ```
#[derive(Component, Reflect, Debug, Clone, Copy, Default, PartialEq)]
#[reflect(Component)]
pub struct MovementIntent {
    /// Horizontal axis (-1.0 = left, 1.0 = right).
    pub horizontal: f32,
    /// Vertical axis (-1.0 = down, 1.0 = up), forwarded to jumps as the `y`
    /// of the directional input.
    pub vertical: f32,
    /// A jump was requested and not yet consumed by a fixed step.
    pub jump_requested: bool,
    /// Held state of the jump button, for edge detection.
    jump_pressed: bool,
}

impl MovementIntent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the horizontal axis, clamped to `[-1, 1]`.
    pub fn set_horizontal(&mut self, axis: f32) {
        self.horizontal = axis.clamp(-1.0, 1.0);
    }

    /// Set the vertical axis, clamped to `[-1, 1]`.
    pub fn set_vertical(&mut self, axis: f32) {
        self.vertical = axis.clamp(-1.0, 1.0);
    }

    /// Clear both axes. A pending jump request survives.
    pub fn clear(&mut self) {
        self.horizontal = 0.0;
        self.vertical = 0.0;
    }

    pub fn is_moving(&self) -> bool {
        self.horizontal.abs() > 0.001
    }

    /// Directional input as a vector, as jumps see it.
    pub fn directional_input(&self) -> Vec2 {
        Vec2::new(self.horizontal, self.vertical)
    }

    /// Latch a jump request. It stays set until a fixed step consumes it.
    pub fn request_jump(&mut self) {
        self.jump_requested = true;
    }

    /// Feed the held state of a jump button.
    ///
    /// A request is latched on the rising edge only; holding the button
    /// does not repeat jumps.
    pub fn set_jump_pressed(&mut self, pressed: bool) {
        if pressed && !self.jump_pressed {
            self.request_jump();
        }
        self.jump_pressed = pressed;
    }

    pub fn is_jump_pressed(&self) -> bool {
        self.jump_pressed
    }

    /// Consume the pending jump request.
    pub fn take_jump_request(&mut self) -> bool {
        std::mem::take(&mut self.jump_requested)
    }
}
