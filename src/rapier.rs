//! Rapier3D spatial query backend.

use bevy::ecs::system::SystemState;
use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::backend::{NoOpBackendPlugin, SpatialQueryBackend};
use crate::collision::{CharacterContact, Contacts, MeasuredVelocity, RayHit};
use crate::config::{CapsuleGeometry, LayerMask};

/// Gap left between the capsule and the geometry it sweeps into, so the next
/// frame's sweep does not start in penetration.
const SKIN_WIDTH: f32 = 0.01;

/// Sweep-and-slide iterations per move. Three is enough to resolve a corner
/// of two walls plus the floor.
const MAX_SLIDE_ITERATIONS: usize = 3;

/// Backend implementation over `bevy_rapier3d` scene queries.
///
/// The character body itself is expected to be kinematic as far as rapier is
/// concerned; this backend moves its `Transform` directly via shape casts
/// and never goes through rapier's character controller.
pub struct Rapier3dBackend;

fn query_filter(exclude: Entity, layers: Option<LayerMask>) -> QueryFilter<'static> {
    let mut filter = QueryFilter::default()
        .exclude_rigid_body(exclude)
        .exclude_sensors();
    if let Some(layers) = layers {
        filter = filter.groups(CollisionGroups::new(
            Group::ALL,
            Group::from_bits_truncate(layers.0),
        ));
    }
    filter
}

impl SpatialQueryBackend for Rapier3dBackend {
    fn plugin() -> impl Plugin {
        // Rapier's own plugins are added by the application; nothing extra
        // is needed here.
        NoOpBackendPlugin
    }

    fn sphere_overlap(
        world: &mut World,
        center: Vec3,
        radius: f32,
        layers: LayerMask,
        exclude: Entity,
    ) -> bool {
        let mut state: SystemState<ReadRapierContext> = SystemState::new(world);
        let rapier_context = state.get(world);
        let Ok(context) = rapier_context.single() else {
            return false;
        };
        context
            .query_pipeline
            .intersection_with_shape(
                context.colliders,
                context.rigidbody_set,
                center,
                Quat::IDENTITY,
                &Collider::ball(radius),
                query_filter(exclude, Some(layers)),
            )
            .is_some()
    }

    fn raycast(
        world: &mut World,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        layers: Option<LayerMask>,
        exclude: Entity,
    ) -> Option<RayHit> {
        let mut state: SystemState<ReadRapierContext> = SystemState::new(world);
        let rapier_context = state.get(world);
        let Ok(context) = rapier_context.single() else {
            return None;
        };
        context
            .cast_ray_and_get_normal(
                origin,
                direction,
                max_distance,
                true,
                query_filter(exclude, layers),
            )
            .map(|(entity, intersection)| {
                RayHit::new(
                    intersection.time_of_impact,
                    intersection.normal,
                    intersection.point,
                    Some(entity),
                )
            })
    }

    fn move_character(world: &mut World, entity: Entity, displacement: Vec3) {
        let dt = world
            .get_resource::<Time>()
            .map(|time| time.delta_secs())
            .filter(|&d| d > 0.0)
            .unwrap_or(1.0 / 60.0);
        let Some(capsule) = world.get::<CapsuleGeometry>(entity).copied() else {
            return;
        };
        let Some(start) = world.get::<Transform>(entity).map(|t| t.translation) else {
            return;
        };

        let half_segment = ((capsule.height / 2.0) - capsule.radius).max(0.0);
        let shape = Collider::capsule_y(half_segment, capsule.radius);

        let mut applied = Vec3::ZERO;
        let mut contacts = Vec::new();
        {
            let mut state: SystemState<ReadRapierContext> = SystemState::new(world);
            let rapier_context = state.get(world);
            let Ok(context) = rapier_context.single() else {
                return;
            };

            let mut remaining = displacement;
            for _ in 0..MAX_SLIDE_ITERATIONS {
                let distance = remaining.length();
                if distance <= f32::EPSILON {
                    break;
                }
                let direction = remaining / distance;
                let origin = start + capsule.center + applied;

                match context.cast_shape(
                    origin,
                    Quat::IDENTITY,
                    direction,
                    &shape,
                    ShapeCastOptions {
                        max_time_of_impact: distance,
                        stop_at_penetration: false,
                        ..default()
                    },
                    query_filter(entity, None),
                ) {
                    None => {
                        applied += remaining;
                        break;
                    }
                    Some((hit_entity, hit)) => {
                        let travel = (hit.time_of_impact - SKIN_WIDTH).max(0.0);
                        applied += direction * travel;
                        let normal = hit
                            .details
                            .map(|details| details.normal1)
                            .unwrap_or(-direction);
                        contacts.push(CharacterContact {
                            body: hit_entity,
                            move_direction: direction,
                            normal,
                        });
                        // Slide the leftover along the hit plane.
                        let leftover = remaining - direction * travel;
                        remaining = leftover - normal * leftover.dot(normal);
                    }
                }
            }
        }

        if let Some(mut transform) = world.get_mut::<Transform>(entity) {
            transform.translation += applied;
        }
        if let Some(mut list) = world.get_mut::<Contacts>(entity) {
            list.replace(contacts);
        }
        if let Some(mut velocity) = world.get_mut::<MeasuredVelocity>(entity) {
            velocity.0 = applied / dt;
        }
    }

    fn measured_velocity(world: &World, entity: Entity) -> Vec3 {
        world
            .get::<MeasuredVelocity>(entity)
            .map(|velocity| velocity.0)
            .unwrap_or(Vec3::ZERO)
    }

    fn apply_impulse(world: &mut World, entity: Entity, impulse: Vec3) {
        if let Some(mut external) = world.get_mut::<ExternalImpulse>(entity) {
            external.impulse += impulse;
        } else if let Some(mut velocity) = world.get_mut::<Velocity>(entity) {
            velocity.linvel += impulse;
        }
    }

    fn is_dynamic(world: &World, entity: Entity) -> bool {
        matches!(world.get::<RigidBody>(entity), Some(RigidBody::Dynamic))
    }

    fn layer_bits(world: &World, entity: Entity) -> u32 {
        world
            .get::<CollisionGroups>(entity)
            .map(|groups| groups.memberships.bits())
            .unwrap_or(u32::MAX)
    }
}
