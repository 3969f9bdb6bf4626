//! Rigid-body pushing from capsule sweep contacts.

use bevy::prelude::*;

use crate::backend::SpatialQueryBackend;
use crate::collision::Contacts;
use crate::config::LayerMask;

/// Contacts whose sweep direction points down more steeply than this are
/// floor contacts and never push.
const MAX_DOWNWARD_PUSH: f32 = -0.3;

/// Opt-in pushing of dynamic rigid bodies the capsule sweeps into.
///
/// Attach next to [`FirstPersonController`]; each contact recorded by the
/// backend's sweep turns into one horizontal impulse on the touched body.
///
/// [`FirstPersonController`]: crate::config::FirstPersonController
#[derive(Component, Reflect, Debug, Clone, Copy)]
#[reflect(Component)]
pub struct RigidBodyPusher {
    /// Master switch; a disabled pusher ignores all contacts.
    pub enabled: bool,
    /// Only bodies with membership in this mask are pushed.
    pub push_layers: LayerMask,
    /// Impulse magnitude per unit of horizontal sweep direction.
    pub strength: f32,
}

impl Default for RigidBodyPusher {
    fn default() -> Self {
        Self {
            enabled: true,
            push_layers: LayerMask::ALL,
            strength: 1.1,
        }
    }
}

/// Horizontal push impulse direction for a contact, or `None` for floor
/// contacts.
pub(crate) fn push_vector(move_direction: Vec3) -> Option<Vec3> {
    if move_direction.y < MAX_DOWNWARD_PUSH {
        return None;
    }
    Some(Vec3::new(move_direction.x, 0.0, move_direction.z))
}

/// Turn this frame's sweep contacts into impulses on dynamic bodies.
pub fn push_rigid_bodies<B: SpatialQueryBackend>(world: &mut World) {
    let mut pushes = Vec::new();
    let mut q_pushers = world.query::<(&RigidBodyPusher, &Contacts)>();
    for (pusher, contacts) in q_pushers.iter(world) {
        if !pusher.enabled {
            continue;
        }
        for contact in &contacts.0 {
            let Some(direction) = push_vector(contact.move_direction) else {
                continue;
            };
            pushes.push((contact.body, direction * pusher.strength, pusher.push_layers));
        }
    }

    for (body, impulse, layers) in pushes {
        if !B::is_dynamic(world, body) {
            continue;
        }
        if !layers.contains(B::layer_bits(world, body)) {
            continue;
        }
        B::apply_impulse(world, body, impulse);
    }
}
