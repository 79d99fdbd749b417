//! Closed-form kinematics helpers.
//!
//! Everything here is a pure function of its arguments. The movement and
//! jump code only ever combines these; none of them touch the ECS.
//!
//! Drag is modelled as a linear term `-drag * v`, so a body under a
//! constant acceleration `a` settles at the terminal speed `a / drag`.

use bevy::prelude::*;

/// Time (seconds) for a body launched upward to reach `height` under `gravity`.
///
/// Only the magnitude of `gravity` matters. Zero gravity never reaches an
/// apex, which is reported as `0.0`.
#[inline]
pub fn time_to_apex(height: f32, gravity: f32) -> f32 {
    if gravity == 0.0 {
        return 0.0;
    }
    (2.0 * height / gravity).abs().sqrt()
}

/// Launch speed needed to peak at exactly `height` above the take-off point.
#[inline]
pub fn velocity_to_reach_apex(height: f32, gravity: f32) -> f32 {
    gravity.abs() * time_to_apex(height, gravity)
}

/// Single-step acceleration that produces the apex launch speed within `dt`.
#[inline]
pub fn impulse_to_reach_apex(height: f32, gravity: f32, dt: f32) -> f32 {
    let velocity = velocity_to_reach_apex(height, gravity);
    required_acceleration(velocity, 1.0, dt)
}

/// Drag coefficient whose terminal speed under `acceleration` is `target_speed`.
///
/// A zero target speed has no meaningful drag and yields `0.0`.
#[inline]
pub fn optimal_drag(acceleration: f32, target_speed: f32) -> f32 {
    if target_speed == 0.0 {
        return 0.0;
    }
    (acceleration / target_speed).abs()
}

/// Portion of a frame's velocity change that a slippery surface swallows.
///
/// `friction` is the surface's dynamic friction in `[0, 1]`: `1.0` grips
/// fully (nothing is removed), `0.0` is ice (the whole change is removed).
#[inline]
pub fn apply_slipperiness(frame_acceleration: f32, friction: f32) -> f32 {
    frame_acceleration * (1.0 - friction)
}

/// Acceleration needed to reach `target_speed` in `time` against `drag`.
#[inline]
pub fn acceleration_for(time: f32, target_speed: f32, drag: f32) -> f32 {
    target_speed / time + drag
}

#[inline]
pub fn time_to_accelerate(target_speed: f32, acceleration: f32, drag: f32) -> f32 {
    target_speed / (acceleration - drag)
}

#[inline]
pub fn apply_drag(velocity: Vec2, drag: f32, dt: f32) -> Vec2 {
    velocity - dt * drag * velocity
}

/// One explicit Euler step of `dv/dt = acceleration - drag * v`.
///
/// Converges on `acceleration / drag` without overshooting as long as
/// `drag * dt < 1`.
#[inline]
pub fn accelerate_towards(velocity: f32, acceleration: f32, drag: f32, dt: f32) -> f32 {
    velocity + (acceleration - drag * velocity) * dt
}

/// Terminal speed reached when `velocity_change` is added every step and
/// `drag * dt` of the velocity is removed every step.
///
/// Without drag there is no terminal speed; the result is infinite with the
/// sign of `velocity_change`.
#[inline]
pub fn final_velocity(velocity_change: f32, drag: f32, dt: f32) -> f32 {
    let m = (drag * dt).clamp(0.0, 1.0);
    if m == 0.0 {
        return signed_infinity(velocity_change);
    }
    velocity_change * (1.0 / m - 1.0)
}

#[inline]
pub fn final_velocity_from_acceleration(acceleration: f32, drag: f32, dt: f32) -> f32 {
    final_velocity(acceleration * dt, drag, dt)
}

/// Drag that makes a per-step `velocity_change` settle at `final_velocity`.
#[inline]
pub fn drag_for(velocity_change: f32, final_velocity: f32, dt: f32) -> f32 {
    let denominator = (final_velocity + velocity_change) * dt;
    if denominator == 0.0 {
        return 0.0;
    }
    velocity_change / denominator
}

/// Per-step velocity change that settles at `final_speed` under `drag`.
///
/// When `drag * dt >= 1` the whole velocity is removed every step and no
/// finite change suffices.
#[inline]
pub fn required_velocity_change(final_speed: f32, drag: f32, dt: f32) -> f32 {
    let m = (drag * dt).clamp(0.0, 1.0);
    if m >= 1.0 {
        return signed_infinity(final_speed);
    }
    final_speed * m / (1.0 - m)
}

#[inline]
pub fn required_acceleration(final_speed: f32, drag: f32, dt: f32) -> f32 {
    required_velocity_change(final_speed, drag, dt) / dt
}

#[inline]
fn signed_infinity(sign_of: f32) -> f32 {
    if sign_of == 0.0 {
        0.0
    } else {
        f32::INFINITY.copysign(sign_of)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn apex_time_and_velocity() {
        // h = g t^2 / 2 -> t = sqrt(2h/g)
        assert!(approx(time_to_apex(2.0, -9.81), (4.0_f32 / 9.81).sqrt()));
        // v = sqrt(2 g h)
        let v = velocity_to_reach_apex(2.0, -9.81);
        assert!(approx(v, (2.0_f32 * 9.81 * 2.0).sqrt()));
        // Sign of gravity does not matter
        assert!(approx(v, velocity_to_reach_apex(2.0, 9.81)));
    }

    #[test]
    fn apex_with_zero_gravity_is_zero() {
        assert_eq!(time_to_apex(3.0, 0.0), 0.0);
        assert_eq!(velocity_to_reach_apex(3.0, 0.0), 0.0);
    }

    #[test]
    fn apex_velocity_actually_reaches_height() {
        let gravity = -9.81;
        let height = 1.5;
        let mut v = velocity_to_reach_apex(height, gravity);
        let mut y = 0.0;
        let dt = 1.0 / 1000.0;
        while v > 0.0 {
            y += v * dt + 0.5 * gravity * dt * dt;
            v += gravity * dt;
        }
        assert!((y - height).abs() < 0.01, "peaked at {y}");
    }

    #[test]
    fn optimal_drag_sets_terminal_speed() {
        let drag = optimal_drag(20.0, 5.0);
        assert_eq!(drag, 4.0);

        let mut v = 0.0;
        for _ in 0..2000 {
            v = accelerate_towards(v, 20.0, drag, DT);
        }
        assert!(approx(v, 5.0), "settled at {v}");
    }

    #[test]
    fn optimal_drag_is_unsigned() {
        assert_eq!(optimal_drag(-20.0, 5.0), 4.0);
        assert_eq!(optimal_drag(0.0, 5.0), 0.0);
        assert_eq!(optimal_drag(20.0, 0.0), 0.0);
    }

    #[test]
    fn accelerate_towards_never_overshoots() {
        let drag = optimal_drag(20.0, 5.0);
        let mut v = 0.0;
        for _ in 0..600 {
            let next = accelerate_towards(v, 20.0, drag, DT);
            assert!(next >= v);
            assert!(next <= 5.0 + 1e-4);
            v = next;
        }
    }

    #[test]
    fn accelerate_towards_decelerates_without_input() {
        let v = accelerate_towards(5.0, 0.0, 4.0, DT);
        assert!(v < 5.0 && v > 0.0);
    }

    #[test]
    fn slipperiness() {
        assert_eq!(apply_slipperiness(2.0, 1.0), 0.0);
        assert_eq!(apply_slipperiness(2.0, 0.0), 2.0);
        assert_eq!(apply_slipperiness(2.0, 0.25), 1.5);
    }

    #[test]
    fn acceleration_and_time_are_consistent() {
        let drag = 2.0;
        let accel = acceleration_for(0.5, 10.0, drag);
        assert!(approx(accel, 22.0));
        assert!(approx(time_to_accelerate(10.0, accel, drag), 0.5));
    }

    #[test]
    fn drag_scales_velocity() {
        let v = apply_drag(Vec2::new(10.0, -4.0), 3.0, 0.1);
        assert!(approx(v.x, 7.0));
        assert!(approx(v.y, -2.8));
    }

    #[test]
    fn final_velocity_matches_simulation() {
        let change = 0.5;
        let drag = 3.0;
        let mut v = 0.0;
        for _ in 0..5000 {
            v = (v + change) * (1.0 - drag * DT);
        }
        let expected = final_velocity(change, drag, DT);
        assert!((v - expected).abs() < 0.01, "{v} vs {expected}");
    }

    #[test]
    fn final_velocity_without_drag_is_unbounded() {
        assert_eq!(final_velocity(1.0, 0.0, DT), f32::INFINITY);
        assert_eq!(final_velocity(-1.0, 0.0, DT), f32::NEG_INFINITY);
        assert_eq!(final_velocity(0.0, 0.0, DT), 0.0);
    }

    #[test]
    fn drag_round_trips_through_final_velocity() {
        let change = 0.4;
        let drag = 2.5;
        let terminal = final_velocity(change, drag, DT);
        assert!(approx(drag_for(change, terminal, DT), drag));
        assert!(approx(required_velocity_change(terminal, drag, DT), change));
        assert!(approx(
            required_acceleration(terminal, drag, DT),
            change / DT
        ));
        assert!(approx(
            final_velocity_from_acceleration(change / DT, drag, DT),
            terminal
        ));
    }

    #[test]
    fn degenerate_drag_inputs() {
        assert_eq!(drag_for(0.0, 0.0, DT), 0.0);
        assert_eq!(required_velocity_change(3.0, 60.0, DT), f32::INFINITY);
        assert_eq!(required_velocity_change(0.0, 60.0, DT), 0.0);
    }

    #[test]
    fn impulse_to_reach_apex_is_velocity_over_dt() {
        // drag = 1 with dt = 1/60 -> m = 1/60, change = v / 59
        let v = velocity_to_reach_apex(1.0, -9.81);
        let impulse = impulse_to_reach_apex(1.0, -9.81, DT);
        assert!(approx(impulse, v * (DT / (1.0 - DT)) / DT));
    }
}
