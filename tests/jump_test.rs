//! Jump tests with actual physics simulation.

use bevy::prelude::*;
use bevy::time::Virtual;
use bevy_rapier2d::prelude::*;
use heracles_controller::prelude::*;

fn create_test_app() -> App {
    let mut app = App::new();

    app.add_plugins(MinimalPlugins);
    app.add_plugins(TransformPlugin);
    app.add_plugins(RapierPhysicsPlugin::<NoUserData>::default());
    app.add_plugins(CharacterControllerPlugin::<Rapier2dBackend>::default());
    app.insert_resource(Time::<Fixed>::from_hz(60.0));
    app.insert_resource(TimestepMode::Fixed {
        dt: 1.0 / 60.0,
        substeps: 1,
    });

    app.finish();
    app.cleanup();
    app
}

fn spawn_block(app: &mut App, position: Vec2, half_size: Vec2) -> Entity {
    let transform = Transform::from_translation(position.extend(0.0));
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            RigidBody::Fixed,
            Collider::cuboid(half_size.x, half_size.y),
        ))
        .id()
}

/// Ground slab with its top surface at y=0.
fn spawn_ground(app: &mut App) -> Entity {
    spawn_block(app, Vec2::new(0.0, -0.5), Vec2::new(20.0, 0.5))
}

fn spawn_character(app: &mut App, position: Vec2, jump: JumpController) -> Entity {
    let transform = Transform::from_translation(position.extend(0.0));
    app.world_mut()
        .spawn((
            transform,
            GlobalTransform::from(transform),
            CharacterController::new(),
            jump,
            Rapier2dCharacterBundle::rotation_locked(),
            Collider::capsule_y(0.25, 0.25),
        ))
        .id()
}

const STANDING_Y: f32 = 0.52;

fn tick(app: &mut App) {
    let timestep = std::time::Duration::from_secs_f64(1.0 / 60.0);
    app.world_mut()
        .resource_mut::<Time<Virtual>>()
        .advance_by(timestep);
    app.update();
    app.world_mut().run_schedule(bevy::prelude::FixedUpdate);
    app.update();
}

fn run_frames(app: &mut App, frames: usize) {
    for _ in 0..frames {
        tick(app);
    }
}

fn request_jump(app: &mut App, entity: Entity) {
    app.world_mut()
        .get_mut::<MovementIntent>(entity)
        .unwrap()
        .request_jump();
}

fn jump_count(app: &App, entity: Entity) -> u32 {
    app.world().get::<JumpController>(entity).unwrap().jump_count()
}

fn velocity(app: &App, entity: Entity) -> Vec2 {
    app.world().get::<Velocity>(entity).unwrap().linvel
}

// ==================== Ground and Air Jumps ====================

#[test]
fn ground_jump_launches_upwards() {
    let mut app = create_test_app();

    spawn_ground(&mut app);
    let character = spawn_character(
        &mut app,
        Vec2::new(0.0, STANDING_Y),
        JumpController::default(),
    );

    run_frames(&mut app, 30);
    assert!(app.world().get::<Grounded>(character).is_some());

    request_jump(&mut app, character);
    tick(&mut app);

    let vel = velocity(&app, character);
    assert!(vel.y > 4.0, "Ground jump should launch upwards, got {vel:?}");
    assert!(vel.x.abs() < 1e-3, "Ground jump keeps horizontal velocity");
    assert_eq!(jump_count(&app, character), 1);
    assert!(
        !app.world().get::<MovementIntent>(character).unwrap().jump_requested,
        "Request should be consumed"
    );
}

#[test]
fn air_jump_then_budget_runs_out() {
    let mut app = create_test_app();

    spawn_ground(&mut app);
    let character = spawn_character(
        &mut app,
        Vec2::new(0.0, STANDING_Y),
        JumpController::default(),
    );

    run_frames(&mut app, 30);
    request_jump(&mut app, character);
    tick(&mut app);
    run_frames(&mut app, 10);

    assert!(app.world().get::<Airborne>(character).is_some());
    let before = velocity(&app, character).y;

    request_jump(&mut app, character);
    tick(&mut app);

    let after = velocity(&app, character).y;
    assert_eq!(jump_count(&app, character), 2);
    assert!(after > before + 0.5, "Air jump should boost: {before} -> {after}");

    // Both jumps spent
    run_frames(&mut app, 2);
    let falling = velocity(&app, character).y;
    request_jump(&mut app, character);
    tick(&mut app);

    assert_eq!(jump_count(&app, character), 2);
    assert!(
        velocity(&app, character).y < falling,
        "Refused jump must not change velocity"
    );
}

#[test]
fn landing_refills_jumps() {
    let mut app = create_test_app();

    spawn_ground(&mut app);
    let character = spawn_character(
        &mut app,
        Vec2::new(0.0, STANDING_Y),
        JumpController::default(),
    );

    run_frames(&mut app, 30);
    request_jump(&mut app, character);
    tick(&mut app);
    run_frames(&mut app, 10);
    request_jump(&mut app, character);
    tick(&mut app);
    assert_eq!(jump_count(&app, character), 2);

    run_frames(&mut app, 300);

    assert_eq!(jump_count(&app, character), 0);
    assert!(app.world().get::<Grounded>(character).is_some());
}

// ==================== Wall Jumps ====================

#[test]
fn wall_jump_pushes_away_from_wall() {
    let mut app = create_test_app();

    // Left wall, face 0.02 beyond the capsule radius
    spawn_block(&mut app, Vec2::new(-0.37, 5.0), Vec2::new(0.1, 10.0));
    let character = spawn_character(&mut app, Vec2::new(0.0, 5.0), JumpController::default());

    tick(&mut app);
    let touching = *app.world().get::<TouchingWall>(character).unwrap();
    assert!(touching.is_left());

    request_jump(&mut app, character);
    tick(&mut app);

    let vel = velocity(&app, character);
    assert!(vel.x > 0.5, "Wall jump should push right, got {vel:?}");
    assert!(vel.y > 0.0, "Wall jump should push up, got {vel:?}");
    assert_eq!(jump_count(&app, character), 1);
}

#[test]
fn wall_jump_disabled_falls_back_to_air_jump() {
    let mut app = create_test_app();

    spawn_block(&mut app, Vec2::new(-0.37, 5.0), Vec2::new(0.1, 10.0));
    let jump = JumpController::default().with_wall_jump(WallJump {
        enabled: false,
        ..default()
    });
    let character = spawn_character(&mut app, Vec2::new(0.0, 5.0), jump);

    tick(&mut app);
    request_jump(&mut app, character);
    tick(&mut app);

    let vel = velocity(&app, character);
    assert!(vel.x.abs() < 1e-3, "No sideways push without input, got {vel:?}");
    assert!(vel.y > 3.0);
}

// ==================== Grace Period ====================

#[test]
fn ground_jump_allowed_just_after_leaving_ground() {
    let mut app = create_test_app();

    let ground = spawn_ground(&mut app);
    let character = spawn_character(&mut app, Vec2::new(0.0, STANDING_Y), JumpController::single());

    run_frames(&mut app, 30);
    assert!(app.world().get::<Grounded>(character).is_some());

    app.world_mut().despawn(ground);
    tick(&mut app);
    assert!(app.world().get::<Airborne>(character).is_some());

    request_jump(&mut app, character);
    tick(&mut app);

    assert_eq!(jump_count(&app, character), 1);
    assert!(velocity(&app, character).y > 4.0);
}

#[test]
fn ground_jump_refused_after_grace_period() {
    let mut app = create_test_app();

    let ground = spawn_ground(&mut app);
    let character = spawn_character(&mut app, Vec2::new(0.0, STANDING_Y), JumpController::single());

    run_frames(&mut app, 30);
    app.world_mut().despawn(ground);
    run_frames(&mut app, 30);

    // Walking off spent the only jump
    assert_eq!(jump_count(&app, character), 1);

    request_jump(&mut app, character);
    tick(&mut app);

    assert_eq!(jump_count(&app, character), 1);
    assert!(velocity(&app, character).y < 0.0);
}
