//! Ground classification.
//!
//! Each frame a sphere just below the capsule is tested for ground contact
//! and, when touching, a downward ray samples the contact normal. The result
//! deliberately exposes two distinct signals: `has_contact` (there is ground
//! under us, however steep) and `grounded` (the contact is shallow enough to
//! walk on). Slide selection uses the angle; locomotion and jumping use
//! `grounded`.

use bevy::prelude::*;

/// Ground classification for the current frame.
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct GroundState {
    /// The grounded-check sphere touched something on the ground layers.
    pub has_contact: bool,
    /// Walkable ground: contact with an angle at or below the slide
    /// threshold.
    pub grounded: bool,
    /// Ground contact normal; straight up when there is no contact or the
    /// normal ray missed.
    pub normal: Vec3,
    /// Angle between straight-up and the contact normal, in degrees.
    pub angle: f32,
}

impl Default for GroundState {
    fn default() -> Self {
        Self {
            has_contact: false,
            grounded: false,
            normal: Vec3::Y,
            angle: 0.0,
        }
    }
}

impl GroundState {
    /// The contact is too steep to stand on and forces sliding.
    #[inline]
    pub fn is_steep(&self, min_slide_angle: f32) -> bool {
        self.angle > min_slide_angle
    }
}

/// Classify the ground under the capsule.
///
/// `ray_normal` is the downward-ray contact normal, if the ray hit; a miss
/// defaults to straight up (treated as flat ground). A contact steeper than
/// `min_slide_angle` is still a contact (`has_contact`) but not walkable
/// ground (`grounded`).
pub fn classify(has_contact: bool, ray_normal: Option<Vec3>, min_slide_angle: f32) -> GroundState {
    if !has_contact {
        return GroundState::default();
    }

    let normal = ray_normal.unwrap_or(Vec3::Y);
    let angle = normal.angle_between(Vec3::Y).to_degrees();

    GroundState {
        has_contact: true,
        grounded: angle <= min_slide_angle,
        normal,
        angle,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normal_at_degrees(degrees: f32) -> Vec3 {
        let radians = degrees.to_radians();
        Vec3::new(radians.sin(), radians.cos(), 0.0)
    }

    #[test]
    fn no_contact_is_airborne() {
        let state = classify(false, None, 20.0);
        assert!(!state.has_contact);
        assert!(!state.grounded);
        assert_eq!(state.normal, Vec3::Y);
        assert_eq!(state.angle, 0.0);
    }

    #[test]
    fn contact_with_missed_ray_defaults_to_flat() {
        let state = classify(true, None, 20.0);
        assert!(state.has_contact);
        assert!(state.grounded);
        assert_eq!(state.normal, Vec3::Y);
        assert!(state.angle.abs() < 1e-4);
    }

    #[test]
    fn shallow_slope_is_grounded() {
        let state = classify(true, Some(normal_at_degrees(15.0)), 20.0);
        assert!(state.has_contact);
        assert!(state.grounded);
        assert!((state.angle - 15.0).abs() < 1e-3);
    }

    #[test]
    fn steep_slope_has_contact_but_is_not_grounded() {
        let state = classify(true, Some(normal_at_degrees(25.0)), 20.0);
        assert!(state.has_contact, "steep contact is still a slide surface");
        assert!(!state.grounded, "steep contact is not walkable ground");
        assert!(state.is_steep(20.0));
        assert!((state.angle - 25.0).abs() < 1e-3);
    }

    #[test]
    fn threshold_angle_counts_as_grounded() {
        // Exactly at the threshold: angle <= min means grounded.
        let state = classify(true, Some(normal_at_degrees(20.0)), 20.0);
        assert!(state.grounded);
        assert!(!state.is_steep(20.0));
    }
}
