//! A first-person character controller for bevy, built on swept capsule
//! collision rather than a dynamic rigid body.
//!
//! The controller reads an [`IntentSnapshot`] each tick (filled by whatever
//! input layer the application uses), classifies the ground under the
//! capsule, integrates gravity and jumping, picks one of three horizontal
//! motion modes (walk, slope slide, post-slide coast), adjusts crouch
//! posture, fires attack/interact probes and optionally pushes dynamic
//! rigid bodies it sweeps into. Camera pitch and body yaw are applied after
//! all motion has been committed.
//!
//! All environment interaction goes through a [`SpatialQueryBackend`], so
//! the core runs identically over Rapier3D (feature `rapier3d`) or a mock
//! backend in tests.
//!
//! # Usage
//!
//! ```ignore
//! use bevy::prelude::*;
//! use first_person_controller::prelude::*;
//! use first_person_controller::rapier::Rapier3dBackend;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(FirstPersonControllerPlugin::<Rapier3dBackend>::default())
//!         .add_systems(Startup, spawn_player)
//!         .run();
//! }
//!
//! fn spawn_player(mut commands: Commands) {
//!     let rig = commands
//!         .spawn((Transform::from_xyz(0.0, 0.8, 0.0), Camera3d::default()))
//!         .id();
//!     let visual = commands.spawn(Transform::default()).id();
//!     commands
//!         .spawn((
//!             Transform::from_xyz(0.0, 1.0, 0.0),
//!             FirstPersonController::new(rig, visual),
//!             ControllerConfig::default(),
//!             CapsuleGeometry::default(),
//!             IntentSnapshot::default(),
//!             RigidBodyPusher::default(),
//!         ))
//!         .add_children(&[rig, visual]);
//! }
//! ```
//!
//! [`IntentSnapshot`]: crate::intent::IntentSnapshot
//! [`SpatialQueryBackend`]: crate::backend::SpatialQueryBackend

use std::marker::PhantomData;

use bevy::gizmos::config::GizmoConfigStore;
use bevy::prelude::*;

pub mod backend;
pub mod camera;
pub mod collision;
pub mod config;
pub mod detection;
pub mod intent;
pub mod posture;
pub mod pusher;
#[cfg(feature = "rapier3d")]
pub mod rapier;
pub mod state;
pub mod systems;

use backend::SpatialQueryBackend;

/// The controller plugin, generic over the spatial query backend.
///
/// Motion systems run in `FixedUpdate` in a fixed chain; camera orientation
/// and debug-ray drawing run in `PostUpdate` after transforms have settled.
pub struct FirstPersonControllerPlugin<B: SpatialQueryBackend> {
    _backend: PhantomData<B>,
}

impl<B: SpatialQueryBackend> Default for FirstPersonControllerPlugin<B> {
    fn default() -> Self {
        Self {
            _backend: PhantomData,
        }
    }
}

impl<B: SpatialQueryBackend> Plugin for FirstPersonControllerPlugin<B> {
    fn build(&self, app: &mut App) {
        app.register_type::<config::ControllerConfig>()
            .register_type::<config::CapsuleGeometry>()
            .register_type::<config::FirstPersonController>()
            .register_type::<intent::IntentSnapshot>()
            .register_type::<detection::GroundState>()
            .register_type::<state::Grounded>()
            .register_type::<state::Airborne>()
            .register_type::<state::Sliding>()
            .register_type::<pusher::RigidBodyPusher>();

        app.init_resource::<systems::DebugRays>();

        app.add_plugins(B::plugin());

        app.add_systems(
            FixedUpdate,
            (
                systems::init_controllers,
                systems::integrate_vertical_motion,
                systems::update_ground_state::<B>,
                systems::apply_posture,
                systems::apply_horizontal_motion::<B>,
                systems::run_action_probes::<B>,
                pusher::push_rigid_bodies::<B>,
                systems::sync_state_markers,
            )
                .chain(),
        );

        // Gizmo setup belongs to the application's render stack; in a
        // headless app the rays stay queued as plain data.
        app.add_systems(
            PostUpdate,
            (
                systems::apply_camera_look,
                systems::draw_debug_rays.run_if(resource_exists::<GizmoConfigStore>),
            ),
        );
    }
}

pub mod prelude {
    //! Commonly used re-exports.

    pub use crate::backend::{NoOpBackendPlugin, SpatialQueryBackend};
    pub use crate::collision::{CharacterContact, Contacts, MeasuredVelocity, RayHit};
    pub use crate::config::{
        CapsuleGeometry, ControllerConfig, FirstPersonController, LayerMask,
    };
    pub use crate::detection::GroundState;
    pub use crate::intent::IntentSnapshot;
    pub use crate::posture::PostureAnchors;
    pub use crate::pusher::RigidBodyPusher;
    #[cfg(feature = "rapier3d")]
    pub use crate::rapier::Rapier3dBackend;
    pub use crate::state::{Airborne, Grounded, MotionMode, Sliding};
    pub use crate::FirstPersonControllerPlugin;
}
