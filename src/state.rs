//! Motion state: the horizontal mode machine, the vertical integrator and
//! the walk-speed smoother, each a pure step over the controller hub so they
//! can be unit tested against a state snapshot without a physics world.
//! Marker components mirror the derived state for ergonomic queries.

use bevy::prelude::*;

use crate::config::{ControllerConfig, FirstPersonController, GROUND_STICK_VELOCITY};
use crate::intent::IntentSnapshot;

/// The horizontal motion mode chosen for a frame.
///
/// Exactly one mode is active per frame, selected purely from the current
/// ground angle and the slide-recovery timer.
#[derive(Reflect, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MotionMode {
    /// Forced downhill movement on a too-steep slope.
    SlopeSlide,
    /// Residual downhill momentum shortly after leaving a steep slope.
    PostSlideCoast,
    /// Regular walk/sprint/crouch movement.
    #[default]
    Walk,
}

/// Select the horizontal motion mode for this frame.
///
/// Priority: a steep slope always slides; otherwise a still-running recovery
/// timer coasts; otherwise walk.
pub fn select_mode(ground_angle: f32, min_slide_angle: f32, slide_recovery_timer: f32) -> MotionMode {
    if ground_angle > min_slide_angle {
        MotionMode::SlopeSlide
    } else if slide_recovery_timer > 0.0 {
        MotionMode::PostSlideCoast
    } else {
        MotionMode::Walk
    }
}

/// Integrate vertical velocity for one frame.
///
/// Grounded: clamp any downward velocity to the small ground-stick value,
/// fire a jump if requested and off cooldown, and tick the cooldown.
/// Airborne: re-arm the cooldown and clear the jump flag so a press cannot
/// queue across a fall. In both cases gravity is added while velocity is
/// below the configured cap.
pub fn integrate_vertical(
    controller: &mut FirstPersonController,
    intent: &mut IntentSnapshot,
    config: &ControllerConfig,
    grounded: bool,
    dt: f32,
) {
    if grounded {
        if controller.vertical_velocity < 0.0 {
            controller.vertical_velocity = GROUND_STICK_VELOCITY;
        }

        if intent.jump && controller.jump_cooldown_timer <= 0.0 {
            controller.vertical_velocity = config.jump_velocity();
        }

        if controller.jump_cooldown_timer >= 0.0 {
            controller.jump_cooldown_timer -= dt;
        }
    } else {
        controller.jump_cooldown_timer = config.jump_cooldown;
        intent.jump = false;
    }

    if controller.vertical_velocity < config.max_vertical_velocity {
        controller.vertical_velocity += config.gravity * dt;
    }
}

/// Target walking speed from the held sprint/crouch state and move input.
///
/// Sprint overrides crouch (the posture adjuster clears the crouch flag
/// while sprinting, but the override holds even on the frame sprint starts).
/// No move input means a zero target regardless of the held modifiers.
pub fn walk_target_speed(intent: &IntentSnapshot, config: &ControllerConfig) -> f32 {
    if !intent.has_move_input() {
        return 0.0;
    }
    if intent.sprint {
        config.sprint_speed
    } else if intent.crouch {
        config.crouch_speed
    } else {
        config.move_speed
    }
}

/// Tolerance around the target speed inside which the smoother snaps to the
/// target instead of lerping. Without it the 0.001 rounding below can park
/// the speed one step short of the target forever.
const SPEED_SNAP_OFFSET: f32 = 0.1;

/// Smooth the measured horizontal speed toward the target.
///
/// Exponential approach at `rate`, rounded to the nearest 0.001 units; once
/// the current speed is within [`SPEED_SNAP_OFFSET`] of the target it snaps
/// to the target exactly.
pub fn smooth_speed(current: f32, target: f32, rate: f32, dt: f32) -> f32 {
    if current < target - SPEED_SNAP_OFFSET || current > target + SPEED_SNAP_OFFSET {
        let smoothed = lerp(current, target, dt * rate);
        (smoothed * 1000.0).round() / 1000.0
    } else {
        target
    }
}

/// Screen-relative move direction from input axes and the body's basis.
///
/// Returns zero when there is no input so the displacement magnitude is zero
/// even if a target speed were somehow nonzero.
pub fn move_direction(axes: Vec2, right: Vec3, forward: Vec3) -> Vec3 {
    if axes == Vec2::ZERO {
        return Vec3::ZERO;
    }
    (right * axes.x + forward * axes.y).normalize_or_zero()
}

/// Linear interpolation with the parameter clamped to [0, 1], so oversized
/// frame deltas cannot overshoot the target.
#[inline]
pub(crate) fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t.clamp(0.0, 1.0)
}

/// Marker component indicating the character stands on walkable ground.
///
/// Mutually exclusive with [`Airborne`]; synced from [`GroundState`] each
/// frame.
///
/// [`GroundState`]: crate::detection::GroundState
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Grounded;

/// Marker component indicating the character has no walkable ground contact.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Airborne;

/// Marker component indicating the character is sliding down a steep slope
/// this frame.
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct Sliding;

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> FirstPersonController {
        FirstPersonController::new(Entity::from_raw(1), Entity::from_raw(2))
    }

    const DT: f32 = 1.0 / 60.0;

    // ==================== Mode Selection ====================

    #[test]
    fn steep_angle_selects_slide() {
        assert_eq!(select_mode(25.0, 20.0, 0.0), MotionMode::SlopeSlide);
        // Slide wins even with a running recovery timer.
        assert_eq!(select_mode(25.0, 20.0, 0.3), MotionMode::SlopeSlide);
    }

    #[test]
    fn recovery_timer_selects_coast() {
        assert_eq!(select_mode(0.0, 20.0, 0.2), MotionMode::PostSlideCoast);
        assert_eq!(select_mode(19.9, 20.0, 0.001), MotionMode::PostSlideCoast);
    }

    #[test]
    fn otherwise_walk() {
        assert_eq!(select_mode(0.0, 20.0, 0.0), MotionMode::Walk);
        assert_eq!(select_mode(20.0, 20.0, -0.1), MotionMode::Walk);
    }

    #[test]
    fn mode_is_pure_in_angle_and_timer() {
        // Same inputs, same mode, regardless of call order.
        for _ in 0..3 {
            assert_eq!(select_mode(30.0, 20.0, 1.0), MotionMode::SlopeSlide);
            assert_eq!(select_mode(10.0, 20.0, 1.0), MotionMode::PostSlideCoast);
            assert_eq!(select_mode(10.0, 20.0, 0.0), MotionMode::Walk);
        }
    }

    // ==================== Vertical Integration ====================

    #[test]
    fn grounded_clamps_fall_velocity_to_ground_stick() {
        let mut ctrl = controller();
        let mut intent = IntentSnapshot::new();
        let config = ControllerConfig::default();
        ctrl.vertical_velocity = -30.0;

        integrate_vertical(&mut ctrl, &mut intent, &config, true, DT);

        // Clamped to -2, then one tick of gravity.
        let expected = GROUND_STICK_VELOCITY + config.gravity * DT;
        assert!((ctrl.vertical_velocity - expected).abs() < 1e-5);
    }

    #[test]
    fn jump_fires_only_when_flag_set_and_cooldown_elapsed() {
        let config = ControllerConfig::default();
        let mut intent = IntentSnapshot::new();

        // Cooldown still running: no jump.
        let mut ctrl = controller();
        ctrl.jump_cooldown_timer = config.jump_cooldown;
        intent.jump = true;
        integrate_vertical(&mut ctrl, &mut intent, &config, true, DT);
        assert!(ctrl.vertical_velocity < 0.0);

        // Cooldown elapsed: jump fires with the closed-form velocity.
        let mut ctrl = controller();
        ctrl.jump_cooldown_timer = 0.0;
        intent.jump = true;
        integrate_vertical(&mut ctrl, &mut intent, &config, true, DT);
        let expected = config.jump_velocity() + config.gravity * DT;
        assert!((ctrl.vertical_velocity - expected).abs() < 1e-5);
        // jumpHeight=1.2, gravity=-9.81 -> takeoff ~4.852 before gravity.
        assert!((config.jump_velocity() - 4.852).abs() < 1e-3);

        // Flag not set: no jump.
        let mut ctrl = controller();
        ctrl.jump_cooldown_timer = -1.0;
        intent.jump = false;
        integrate_vertical(&mut ctrl, &mut intent, &config, true, DT);
        assert!(ctrl.vertical_velocity < 0.0);
    }

    #[test]
    fn no_jump_while_airborne() {
        let config = ControllerConfig::default();
        let mut ctrl = controller();
        let mut intent = IntentSnapshot::new();
        ctrl.jump_cooldown_timer = -1.0;
        intent.jump = true;

        integrate_vertical(&mut ctrl, &mut intent, &config, false, DT);

        assert!(ctrl.vertical_velocity < 0.0, "airborne jump must not fire");
    }

    #[test]
    fn airborne_clears_jump_and_rearms_cooldown() {
        let config = ControllerConfig::default();
        let mut ctrl = controller();
        let mut intent = IntentSnapshot::new();
        ctrl.jump_cooldown_timer = -0.5;
        intent.jump = true;

        integrate_vertical(&mut ctrl, &mut intent, &config, false, DT);

        assert!(!intent.jump, "jump press must not queue across a fall");
        assert_eq!(ctrl.jump_cooldown_timer, config.jump_cooldown);
    }

    #[test]
    fn vertical_velocity_never_exceeds_cap() {
        let config = ControllerConfig::default();
        let mut ctrl = controller();
        let mut intent = IntentSnapshot::new();
        ctrl.vertical_velocity = config.max_vertical_velocity + 10.0;

        // Any number of airborne gravity applications leaves an over-cap
        // velocity untouched and keeps everything else below the cap.
        for _ in 0..1000 {
            integrate_vertical(&mut ctrl, &mut intent, &config, false, DT);
            assert!(ctrl.vertical_velocity <= config.max_vertical_velocity + 10.0);
        }
        assert_eq!(ctrl.vertical_velocity, config.max_vertical_velocity + 10.0);

        let mut ctrl = controller();
        ctrl.vertical_velocity = config.max_vertical_velocity - 0.01;
        integrate_vertical(&mut ctrl, &mut intent, &config, false, DT);
        assert!(ctrl.vertical_velocity < config.max_vertical_velocity);
    }

    // ==================== Walk Speed ====================

    #[test]
    fn target_speed_honors_modifiers() {
        let config = ControllerConfig::default();
        let mut intent = IntentSnapshot::new();
        intent.set_move(Vec2::new(0.0, 1.0));

        assert_eq!(walk_target_speed(&intent, &config), 6.0);

        intent.crouch = true;
        assert_eq!(walk_target_speed(&intent, &config), 3.0);

        // Sprint overrides crouch.
        intent.sprint = true;
        assert_eq!(walk_target_speed(&intent, &config), 12.0);
    }

    #[test]
    fn no_input_means_zero_target() {
        let config = ControllerConfig::default();
        let mut intent = IntentSnapshot::new();
        intent.sprint = true;

        assert_eq!(walk_target_speed(&intent, &config), 0.0);
    }

    #[test]
    fn smooth_speed_converges_and_snaps() {
        let config = ControllerConfig::default();
        let mut speed = 0.0;
        for _ in 0..200 {
            speed = smooth_speed(speed, 6.0, config.speed_change_rate, DT);
        }
        // The snap band lets the approach actually terminate.
        assert_eq!(speed, 6.0);
    }

    #[test]
    fn smooth_speed_snaps_inside_the_tolerance_band() {
        assert_eq!(smooth_speed(6.0, 6.0, 20.0, DT), 6.0);
        assert_eq!(smooth_speed(5.95, 6.0, 20.0, DT), 6.0);
        assert_eq!(smooth_speed(0.05, 0.0, 20.0, DT), 0.0);
    }

    #[test]
    fn smooth_speed_decelerates_too() {
        let next = smooth_speed(12.0, 6.0, 20.0, DT);
        assert!(next < 12.0 && next > 6.0);
    }

    #[test]
    fn oversized_delta_does_not_overshoot() {
        // dt * rate > 1 clamps to the target instead of oscillating.
        let next = smooth_speed(0.0, 6.0, 20.0, 1.0);
        assert_eq!(next, 6.0);
    }

    // ==================== Move Direction ====================

    #[test]
    fn move_direction_is_body_relative() {
        let right = Vec3::X;
        let forward = Vec3::NEG_Z;

        let dir = move_direction(Vec2::new(0.0, 1.0), right, forward);
        assert!((dir - Vec3::NEG_Z).length() < 1e-6);

        let dir = move_direction(Vec2::new(1.0, 1.0), right, forward);
        assert!((dir.length() - 1.0).abs() < 1e-6, "must be normalized");
        assert!(dir.x > 0.0 && dir.z < 0.0);
    }

    #[test]
    fn zero_axes_give_zero_direction() {
        assert_eq!(
            move_direction(Vec2::ZERO, Vec3::X, Vec3::NEG_Z),
            Vec3::ZERO
        );
    }
}
