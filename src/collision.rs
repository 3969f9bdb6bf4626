//! Spatial query and contact result structures.
//!
//! These structures hold the results of backend queries (raycasts, capsule
//! sweeps) used for ground classification, action probes and rigid-body
//! pushing.

use bevy::prelude::*;

/// Information about a raycast hit.
#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    /// Distance from the ray origin to the hit point.
    pub distance: f32,
    /// Normal of the surface at the hit point.
    pub normal: Vec3,
    /// World position of the hit point.
    pub point: Vec3,
    /// Entity that was hit (if any).
    pub entity: Option<Entity>,
}

impl RayHit {
    /// Create a hit result.
    pub fn new(distance: f32, normal: Vec3, point: Vec3, entity: Option<Entity>) -> Self {
        Self {
            distance,
            normal,
            point,
            entity,
        }
    }
}

/// A single capsule-vs-body contact produced by a sweep move.
#[derive(Debug, Clone, Copy)]
pub struct CharacterContact {
    /// The body the capsule ran into.
    pub body: Entity,
    /// Direction the capsule was moving when the contact occurred (normalized).
    pub move_direction: Vec3,
    /// Contact surface normal.
    pub normal: Vec3,
}

/// Contacts produced by the most recent capsule sweep.
///
/// Refreshed by [`SpatialQueryBackend::move_character`] every frame and read
/// by the rigid-body pusher. Replaces an engine collision callback with an
/// explicit per-frame list.
///
/// [`SpatialQueryBackend::move_character`]: crate::backend::SpatialQueryBackend::move_character
#[derive(Component, Debug, Clone, Default)]
pub struct Contacts(pub Vec<CharacterContact>);

impl Contacts {
    /// Replace the contact list with this frame's contacts.
    pub fn replace(&mut self, contacts: Vec<CharacterContact>) {
        self.0 = contacts;
    }
}

/// Velocity actually achieved by the most recent capsule sweep.
///
/// This is the displacement applied after collision response divided by the
/// frame delta, and is the signal the walk smoother measures its current
/// speed from (not the cached target).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct MeasuredVelocity(pub Vec3);

impl MeasuredVelocity {
    /// Horizontal (XZ-plane) speed of the measured velocity.
    pub fn horizontal_speed(&self) -> f32 {
        Vec3::new(self.0.x, 0.0, self.0.z).length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hit_new() {
        let hit = RayHit::new(5.0, Vec3::Y, Vec3::new(10.0, 0.0, 0.0), None);

        assert_eq!(hit.distance, 5.0);
        assert_eq!(hit.normal, Vec3::Y);
        assert_eq!(hit.point, Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn ray_hit_with_entity() {
        let entity = Entity::from_raw(42);
        let hit = RayHit::new(3.0, Vec3::X, Vec3::ZERO, Some(entity));

        assert_eq!(hit.entity, Some(entity));
    }

    #[test]
    fn contacts_replace() {
        let mut contacts = Contacts::default();
        assert!(contacts.0.is_empty());

        contacts.replace(vec![CharacterContact {
            body: Entity::from_raw(1),
            move_direction: Vec3::NEG_Z,
            normal: Vec3::Z,
        }]);
        assert_eq!(contacts.0.len(), 1);

        contacts.replace(Vec::new());
        assert!(contacts.0.is_empty());
    }

    #[test]
    fn measured_velocity_horizontal_speed_ignores_vertical() {
        let v = MeasuredVelocity(Vec3::new(3.0, -50.0, 4.0));
        assert!((v.horizontal_speed() - 5.0).abs() < 1e-6);
    }
}
