//! Spatial query backend abstraction.
//!
//! This module defines the trait that spatial backends must implement to
//! work with the controller. The controller itself never steps physics; it
//! asks the backend for overlap/ray queries and delegates the capsule
//! sweep-and-slide to it, which keeps the core testable against a mock
//! environment and swappable between physics engines (Rapier3D included).

use bevy::prelude::*;

use crate::collision::RayHit;
use crate::config::LayerMask;

/// Trait for spatial query backend implementations.
///
/// Implement this trait to integrate a physics engine with the controller.
/// Methods take `&mut World` so implementations can stand up engine system
/// params on demand; query methods must not otherwise mutate controller
/// state.
///
/// For an example implementation, see the `rapier` module's
/// [`Rapier3dBackend`] (feature `rapier3d`).
///
/// [`Rapier3dBackend`]: crate::rapier::Rapier3dBackend
pub trait SpatialQueryBackend: 'static + Send + Sync {
    /// Returns the plugin that sets up this backend.
    fn plugin() -> impl Plugin;

    /// Test a sphere for any solid contact on the given layers.
    ///
    /// Trigger/sensor volumes are ignored, as is `exclude` (the querying
    /// character itself).
    fn sphere_overlap(
        world: &mut World,
        center: Vec3,
        radius: f32,
        layers: LayerMask,
        exclude: Entity,
    ) -> bool;

    /// Cast a ray and return the first solid hit.
    ///
    /// `layers: None` matches everything; sensors and `exclude` are always
    /// skipped.
    fn raycast(
        world: &mut World,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: Option<LayerMask>,
        exclude: Entity,
    ) -> Option<RayHit>;

    /// Sweep the entity's capsule by `displacement` with collision response.
    ///
    /// The backend applies the collided-and-slid displacement to the
    /// entity's `Transform`, refreshes its [`Contacts`] list with every body
    /// touched during the sweep, and records the achieved velocity in
    /// [`MeasuredVelocity`].
    ///
    /// [`Contacts`]: crate::collision::Contacts
    /// [`MeasuredVelocity`]: crate::collision::MeasuredVelocity
    fn move_character(world: &mut World, entity: Entity, displacement: Vec3);

    /// Velocity achieved by the entity's most recent sweep.
    fn measured_velocity(world: &World, entity: Entity) -> Vec3;

    /// Apply an instantaneous impulse to a dynamic rigid body.
    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3);

    /// Whether the entity is a dynamic (non-kinematic, non-fixed) rigid
    /// body. Absent bodies are not dynamic.
    fn is_dynamic(world: &World, entity: Entity) -> bool;

    /// Collision-layer membership bits of the entity.
    ///
    /// Bodies without explicit layer data belong to every layer.
    fn layer_bits(_world: &World, _entity: Entity) -> u32 {
        u32::MAX
    }
}

/// Empty plugin for backends that don't need additional setup.
pub struct NoOpBackendPlugin;

impl Plugin for NoOpBackendPlugin {
    fn build(&self, _app: &mut App) {}
}
