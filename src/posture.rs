//! Crouch/posture adjustment.
//!
//! One shared smoothing step drives the capsule height/center, the visual
//! deformation scale and the camera-rig height toward the crouch or stand
//! targets, so the three never visibly desynchronize. The capsule recentres
//! by half the height delta, keeping the feet planted while the top comes
//! down.

use bevy::prelude::*;

use crate::config::{CapsuleGeometry, POSTURE_SMOOTH_RATE};
use crate::state::lerp;

/// Uncrouched posture, captured once at initialization and used as the
/// interpolation anchors ever after.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct PostureAnchors {
    /// Original capsule height.
    pub capsule_height: f32,
    /// Original capsule center (local).
    pub capsule_center: Vec3,
    /// Original visual Y scale.
    pub visual_height: f32,
    /// Original camera-rig local offset.
    pub rig_offset: Vec3,
}

/// Visual/camera values computed by one posture step; the caller applies
/// them to the respective transforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PostureFrame {
    /// New Y scale for the visual entity.
    pub visual_scale_y: f32,
    /// New local position for the visual entity (follows the capsule
    /// center).
    pub visual_position: Vec3,
    /// New local Y offset for the camera rig.
    pub rig_height: f32,
}

/// Advance the posture interpolation one frame.
///
/// Mutates the capsule toward the crouched/standing target and returns the
/// matching visual and rig values. All three use the same smoothing
/// parameter `dt * POSTURE_SMOOTH_RATE` to stay in sync.
pub fn posture_step(
    capsule: &mut CapsuleGeometry,
    anchors: &PostureAnchors,
    crouching: bool,
    crouched_offset: f32,
    current_visual_scale_y: f32,
    current_rig_height: f32,
    dt: f32,
) -> PostureFrame {
    let t = dt * POSTURE_SMOOTH_RATE;

    let target_height = if crouching {
        anchors.capsule_height / 2.0
    } else {
        anchors.capsule_height
    };
    capsule.height = lerp(capsule.height, target_height, t);
    let height_difference = anchors.capsule_height - capsule.height;
    capsule.center = anchors.capsule_center - Vec3::new(0.0, height_difference / 2.0, 0.0);

    let target_visual = if crouching {
        anchors.visual_height / 2.0
    } else {
        anchors.visual_height
    };

    let target_rig = if crouching {
        anchors.rig_offset.y - crouched_offset
    } else {
        anchors.rig_offset.y
    };

    PostureFrame {
        visual_scale_y: lerp(current_visual_scale_y, target_visual, t),
        visual_position: capsule.center,
        rig_height: lerp(current_rig_height, target_rig, t),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn anchors() -> PostureAnchors {
        PostureAnchors {
            capsule_height: 2.0,
            capsule_center: Vec3::ZERO,
            visual_height: 1.0,
            rig_offset: Vec3::new(0.0, 0.8, 0.0),
        }
    }

    fn standing_capsule() -> CapsuleGeometry {
        CapsuleGeometry::new(2.0, 0.5)
    }

    #[test]
    fn crouch_approaches_half_height() {
        let anchors = anchors();
        let mut capsule = standing_capsule();
        let mut scale = 1.0;
        let mut rig = 0.8;

        for _ in 0..120 {
            let frame =
                posture_step(&mut capsule, &anchors, true, 0.5, scale, rig, DT);
            scale = frame.visual_scale_y;
            rig = frame.rig_height;
        }

        assert!((capsule.height - 1.0).abs() < 0.01);
        assert!((scale - 0.5).abs() < 0.01);
        assert!((rig - 0.3).abs() < 0.01);
    }

    #[test]
    fn feet_stay_planted_while_crouching() {
        let anchors = anchors();
        let mut capsule = standing_capsule();
        let original_bottom = capsule.bottom();

        for _ in 0..120 {
            posture_step(&mut capsule, &anchors, true, 0.5, 1.0, 0.8, DT);
            assert!(
                (capsule.bottom() - original_bottom).abs() < 1e-4,
                "capsule bottom moved: {} vs {}",
                capsule.bottom(),
                original_bottom
            );
        }
    }

    #[test]
    fn crouch_round_trip_returns_to_anchor() {
        let anchors = anchors();
        let mut capsule = standing_capsule();
        let mut scale = 1.0;
        let mut rig = 0.8;

        for _ in 0..60 {
            let frame =
                posture_step(&mut capsule, &anchors, true, 0.5, scale, rig, DT);
            scale = frame.visual_scale_y;
            rig = frame.rig_height;
        }
        assert!(capsule.height < 1.5);

        // Exponential approach: convergence within tolerance, not equality.
        for _ in 0..240 {
            let frame =
                posture_step(&mut capsule, &anchors, false, 0.5, scale, rig, DT);
            scale = frame.visual_scale_y;
            rig = frame.rig_height;
        }
        assert!((capsule.height - anchors.capsule_height).abs() < 0.01);
        assert!((scale - anchors.visual_height).abs() < 0.01);
        assert!((rig - anchors.rig_offset.y).abs() < 0.01);
        assert!(capsule.center.distance(anchors.capsule_center) < 0.01);
    }

    #[test]
    fn visual_follows_capsule_center() {
        let anchors = anchors();
        let mut capsule = standing_capsule();

        let frame = posture_step(&mut capsule, &anchors, true, 0.5, 1.0, 0.8, DT);
        assert_eq!(frame.visual_position, capsule.center);
    }

    #[test]
    fn interpolations_share_one_parameter() {
        // After the same number of steps, capsule and visual have covered
        // the same fraction of their respective ranges.
        let anchors = anchors();
        let mut capsule = standing_capsule();
        let mut scale = 1.0;

        for _ in 0..10 {
            let frame = posture_step(&mut capsule, &anchors, true, 0.5, scale, 0.8, DT);
            scale = frame.visual_scale_y;
        }

        let capsule_fraction = (anchors.capsule_height - capsule.height)
            / (anchors.capsule_height - anchors.capsule_height / 2.0);
        let visual_fraction =
            (anchors.visual_height - scale) / (anchors.visual_height - anchors.visual_height / 2.0);
        assert!((capsule_fraction - visual_fraction).abs() < 1e-4);
    }
}
