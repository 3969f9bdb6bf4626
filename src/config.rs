//! Controller configuration and state-hub components.
//!
//! [`ControllerConfig`] carries every tunable number with sensible defaults.
//! [`FirstPersonController`] is the central hub for per-frame mutable state:
//! velocities, timers, the accumulated camera pitch and the posture anchors
//! captured at initialization.

use bevy::prelude::*;

use crate::posture::PostureAnchors;
use crate::state::MotionMode;

/// Fixed attack probe range, matching the short melee-style reach of the
/// interaction design. Only the interact range is tunable.
pub const ATTACK_RANGE: f32 = 10.0;

/// Small downward velocity applied while grounded (and when standing on a
/// too-steep slope) so the capsule stays pressed to the floor through uneven
/// terrain instead of accumulating fall speed.
pub const GROUND_STICK_VELOCITY: f32 = -2.0;

/// Smoothing rate for crouch posture interpolation, in 1/seconds.
/// Deliberately independent of [`ControllerConfig::speed_change_rate`]:
/// posture settles faster than horizontal speed.
pub const POSTURE_SMOOTH_RATE: f32 = 10.0;

/// Collision-layer bitmask used to filter spatial queries and push targets.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerMask(pub u32);

impl LayerMask {
    /// Mask matching every layer.
    pub const ALL: Self = Self(u32::MAX);

    /// Mask matching nothing.
    pub const NONE: Self = Self(0);

    /// Check whether any of the given membership bits are in this mask.
    #[inline]
    pub fn contains(&self, bits: u32) -> bool {
        self.0 & bits != 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// The capsule collision volume the backend sweeps through the environment.
///
/// `height` and `center` are mutated by the posture adjuster while crouching;
/// `radius` is fixed and is copied into
/// [`ControllerConfig::grounded_check_radius`] at initialization.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct CapsuleGeometry {
    /// Full capsule height (tip to tip).
    pub height: f32,
    /// Capsule center in the body's local space.
    pub center: Vec3,
    /// Capsule radius.
    pub radius: f32,
}

impl Default for CapsuleGeometry {
    fn default() -> Self {
        Self {
            height: 2.0,
            center: Vec3::ZERO,
            radius: 0.5,
        }
    }
}

impl CapsuleGeometry {
    /// Create a capsule with the given height and radius, centered locally.
    pub fn new(height: f32, radius: f32) -> Self {
        Self {
            height,
            center: Vec3::ZERO,
            radius,
        }
    }

    /// Local height of the capsule's lowest point.
    #[inline]
    pub fn bottom(&self) -> f32 {
        self.center.y - self.height / 2.0
    }
}

/// Configuration parameters for the first-person controller.
///
/// All fields are plain tunables with defaults; nothing is derived at
/// runtime except `grounded_check_radius`, which is overwritten from the
/// capsule radius when the controller initializes.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct ControllerConfig {
    // === Movement ===
    /// Base walking speed (units/second).
    pub move_speed: f32,
    /// Sprinting speed (units/second).
    pub sprint_speed: f32,
    /// Crouched walking speed (units/second).
    pub crouch_speed: f32,
    /// Base slide speed; also the value slide velocity is re-armed to
    /// whenever normal movement runs.
    pub slide_speed: f32,
    /// Linear acceleration while sliding down a slope (units/second^2).
    pub slide_acceleration: f32,
    /// How long residual sliding continues after leaving a steep slope
    /// (seconds).
    pub slide_recovery_time: f32,
    /// Exponential smoothing rate for horizontal speed changes (1/seconds).
    pub speed_change_rate: f32,

    // === Jumping & gravity ===
    /// Apex height of a jump (units).
    pub jump_height: f32,
    /// Minimum time between landings and the next jump (seconds).
    pub jump_cooldown: f32,
    /// Gravity acceleration (negative = down, units/second^2).
    pub gravity: f32,
    /// Cap on vertical velocity; gravity is no longer applied once velocity
    /// reaches this magnitude. Slide acceleration shares the same cap.
    pub max_vertical_velocity: f32,

    // === Ground probing ===
    /// Vertical offset from the body origin to the grounded-check sphere.
    pub grounded_check_offset: f32,
    /// Radius of the grounded-check sphere. Overwritten from the capsule
    /// radius at initialization.
    pub grounded_check_radius: f32,
    /// Ground angles above this are slide surfaces, not walkable ground
    /// (degrees).
    pub min_slide_angle: f32,
    /// Max distance of the downward ray used to sample the ground normal.
    pub ground_angle_distance: f32,
    /// Layers considered ground by the sphere/ray probes.
    pub ground_layers: LayerMask,

    // === Interaction ===
    /// Max range of the interact probe. The attack probe uses the fixed
    /// [`ATTACK_RANGE`].
    pub interaction_range: f32,

    // === Camera ===
    /// Look input multiplier (degrees per input unit).
    pub camera_sensitivity: f32,
    /// Upper pitch clamp (degrees).
    pub top_clamp: f32,
    /// Lower pitch clamp (degrees).
    pub bottom_clamp: f32,
    /// How far the camera rig drops while crouched (units).
    pub crouched_offset: f32,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            move_speed: 6.0,
            sprint_speed: 12.0,
            crouch_speed: 3.0,
            slide_speed: 3.0,
            slide_acceleration: 7.0,
            slide_recovery_time: 0.3,
            speed_change_rate: 20.0,

            jump_height: 1.2,
            jump_cooldown: 0.03,
            gravity: -9.81,
            max_vertical_velocity: 50.0,

            grounded_check_offset: -0.75,
            grounded_check_radius: 0.5,
            min_slide_angle: 20.0,
            ground_angle_distance: 1.5,
            ground_layers: LayerMask::ALL,

            interaction_range: 5.0,

            camera_sensitivity: 1.0,
            top_clamp: 90.0,
            bottom_clamp: -90.0,
            crouched_offset: 0.5,
        }
    }
}

impl ControllerConfig {
    /// Builder: set walk/sprint/crouch speeds.
    pub fn with_speeds(mut self, walk: f32, sprint: f32, crouch: f32) -> Self {
        self.move_speed = walk;
        self.sprint_speed = sprint;
        self.crouch_speed = crouch;
        self
    }

    /// Builder: set the minimum slide angle in degrees.
    pub fn with_min_slide_angle(mut self, degrees: f32) -> Self {
        self.min_slide_angle = degrees;
        self
    }

    /// Builder: set jump height and cooldown.
    pub fn with_jump(mut self, height: f32, cooldown: f32) -> Self {
        self.jump_height = height;
        self.jump_cooldown = cooldown;
        self
    }

    /// Builder: set the ground layer mask.
    pub fn with_ground_layers(mut self, layers: LayerMask) -> Self {
        self.ground_layers = layers;
        self
    }

    /// Builder: set camera sensitivity and pitch clamps.
    pub fn with_camera(mut self, sensitivity: f32, bottom_clamp: f32, top_clamp: f32) -> Self {
        self.camera_sensitivity = sensitivity;
        self.bottom_clamp = bottom_clamp;
        self.top_clamp = top_clamp;
        self
    }

    /// Closed-form takeoff velocity to reach `jump_height` under `gravity`.
    #[inline]
    pub fn jump_velocity(&self) -> f32 {
        (self.jump_height * -2.0 * self.gravity).sqrt()
    }
}

/// Core first-person controller component.
///
/// This is the central hub for per-frame mutable state. The referenced
/// `camera_rig` and `visual` entities are required collaborators: the rig
/// receives pitch and crouch height, the visual receives the crouch
/// deformation scale. Initialization fails loudly if either is missing a
/// `Transform`.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct FirstPersonController {
    /// Entity whose local transform receives camera pitch and crouch height.
    pub camera_rig: Entity,
    /// Entity whose Y scale mirrors the crouch deformation.
    pub visual: Entity,

    /// Current vertical velocity (units/second, negative = falling).
    pub vertical_velocity: f32,
    /// Smoothed horizontal speed used for walking (units/second).
    pub speed: f32,
    /// Accumulated slide speed; grows while sliding, re-armed to
    /// `slide_speed` by normal movement.
    pub slide_velocity: f32,
    /// Remaining jump cooldown (seconds).
    pub jump_cooldown_timer: f32,
    /// Remaining post-slide coast window (seconds).
    pub slide_recovery_timer: f32,
    /// Downhill direction of the most recent slide, kept for coasting.
    pub last_slide_direction: Vec3,
    /// Accumulated camera pitch (degrees, clamped to the configured range).
    pub pitch: f32,
    /// Horizontal motion mode chosen this frame.
    pub mode: MotionMode,

    /// Uncrouched posture captured at initialization. `None` until the init
    /// system has run.
    pub anchors: Option<PostureAnchors>,
}

impl Default for FirstPersonController {
    /// Placeholder entity references, for reflection-driven spawning; they
    /// must be rewired before the controller initializes.
    fn default() -> Self {
        Self::new(Entity::PLACEHOLDER, Entity::PLACEHOLDER)
    }
}

impl FirstPersonController {
    /// Create a controller wired to its camera rig and visual entities.
    pub fn new(camera_rig: Entity, visual: Entity) -> Self {
        Self {
            camera_rig,
            visual,
            vertical_velocity: 0.0,
            speed: 0.0,
            slide_velocity: 0.0,
            jump_cooldown_timer: 0.0,
            slide_recovery_timer: 0.0,
            last_slide_direction: Vec3::ZERO,
            pitch: 0.0,
            mode: MotionMode::Walk,
            anchors: None,
        }
    }

    /// Whether the controller has captured its posture anchors.
    pub fn is_initialized(&self) -> bool {
        self.anchors.is_some()
    }
}
