//! # `heracles_controller`
//!
//! A 2D platformer character controller with physics backend abstraction.
//!
//! The controller drives a dynamic rigidbody:
//! - Box casts below and beside the character detect ground and walls
//! - Horizontal movement uses a drag-based integrator that settles exactly at
//!   the configured speed, scaled by the friction of the ground
//! - Ground, air (double) and wall jumps share one jump budget, with a grace
//!   period after walking off a ledge
//! - Gravity is per character and may point anywhere
//! - The physics backend is swappable (Rapier2D included)
//!
//! ## Pipeline
//!
//! Every fixed step runs the [`CharacterControllerSet`]s in order:
//! 1. `Sensors`: the backend casts the surface detectors
//! 2. `Contacts`: collision-enter contact points confirm touchdowns
//! 3. `GroundStatus`: grounded/airborne transitions, jump timers
//! 4. `Orientation`: align the body to world, gravity or ground
//! 5. `Jump`: consume jump requests
//! 6. `Movement`: horizontal integration and engine drag
//! 7. `Gravity`: the character's own gravity
//! 8. `Markers`: [`Grounded`](state::Grounded), [`Airborne`](state::Airborne)
//!    and [`TouchingWall`](state::TouchingWall)
//!
//! ## Usage
//!
//! ```rust
//! use bevy::prelude::*;
//! use heracles_controller::prelude::*;
//!
//! // Only the controller is needed, the other components are required by it
//! let controller = CharacterController::new();
//! let config = ControllerConfig::player();
//! let jump = JumpController::default().with_max_jumps(3);
//!
//! // These can be spawned with physics components
//! ```

use bevy::prelude::*;

pub mod backend;
pub mod collision;
pub mod config;
pub mod detection;
pub mod gizmos;
pub mod input;
pub mod intent;
pub mod jump;
pub mod kinetics;
pub mod mover;
pub mod settings;
pub mod state;
pub mod systems;

#[cfg(feature = "rapier2d")]
pub mod rapier;

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::backend::CharacterPhysicsBackend;
    pub use crate::collision::{CollisionData, SurfaceContact, SurfaceHit, SurfaceMaterial};
    pub use crate::config::{CharacterController, ControllerConfig, OrientationMode};
    pub use crate::detection::{
        AxialDirection, SurfaceDetector, SurfaceInfo, SurfaceSensors, SurfaceSide,
    };
    pub use crate::gizmos::ControllerGizmosPlugin;
    pub use crate::input::{CharacterInputPlugin, KeyBindings, PlayerControlled};
    pub use crate::intent::MovementIntent;
    pub use crate::jump::{AirJump, FloatMinMax, JumpController, JumpKind, WallJump};
    pub use crate::mover::{AxisMask, KineticMover};
    pub use crate::settings::{CharacterSettings, SettingsError};
    pub use crate::state::{Airborne, Grounded, TouchingWall};
    pub use crate::{CharacterControllerPlugin, CharacterControllerSet};

    #[cfg(feature = "rapier2d")]
    pub use crate::rapier::{Rapier2dBackend, Rapier2dCharacterBundle};
}

/// System sets of one controller step, chained in this order in
/// `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum CharacterControllerSet {
    /// Backend surface detection.
    Sensors,
    /// Backend collision-enter reporting and contact registration.
    Contacts,
    GroundStatus,
    Orientation,
    Jump,
    Movement,
    Gravity,
    /// State marker sync.
    Markers,
}

/// Main plugin for the character controller system.
///
/// Generic over a physics backend `B` which provides the body state access
/// and the engine-specific detection systems.
///
/// # Examples
///
/// With Rapier2D backend:
/// ```rust,no_run
/// use bevy::prelude::*;
/// use bevy_rapier2d::prelude::*;
/// use heracles_controller::prelude::*;
///
/// App::new()
///     .add_plugins(DefaultPlugins)
///     .add_plugins(RapierPhysicsPlugin::<NoUserData>::default())
///     .add_plugins(CharacterControllerPlugin::<Rapier2dBackend>::default())
///     .run();
/// ```
pub struct CharacterControllerPlugin<B: backend::CharacterPhysicsBackend> {
    _marker: std::marker::PhantomData<B>,
}

impl<B: backend::CharacterPhysicsBackend> Default for CharacterControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _marker: std::marker::PhantomData,
        }
    }
}

impl<B: backend::CharacterPhysicsBackend> Plugin for CharacterControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        use CharacterControllerSet::*;

        // Register core types
        app.register_type::<config::CharacterController>();
        app.register_type::<config::ControllerConfig>();
        app.register_type::<config::OrientationMode>();
        app.register_type::<collision::SurfaceMaterial>();
        app.register_type::<detection::SurfaceInfo>();
        app.register_type::<detection::SurfaceSensors>();
        app.register_type::<mover::KineticMover>();
        app.register_type::<jump::JumpController>();
        app.register_type::<intent::MovementIntent>();
        app.register_type::<state::Grounded>();
        app.register_type::<state::Airborne>();
        app.register_type::<state::TouchingWall>();

        app.add_event::<collision::SurfaceContact>();

        app.configure_sets(
            FixedUpdate,
            (
                Sensors,
                Contacts,
                GroundStatus,
                Orientation,
                Jump,
                Movement,
                Gravity,
                Markers,
            )
                .chain(),
        );

        // Add the physics backend plugin
        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (
                systems::register_ground_contacts::<B>.in_set(Contacts),
                systems::update_ground_status::<B>.in_set(GroundStatus),
                systems::apply_orientation::<B>.in_set(Orientation),
                systems::apply_jump::<B>.in_set(Jump),
                systems::apply_horizontal_movement::<B>.in_set(Movement),
                systems::apply_gravity::<B>.in_set(Gravity),
                systems::sync_state_markers.in_set(Markers),
            ),
        );
    }
}
