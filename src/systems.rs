//! Core controller systems.
//!
//! These are thin per-frame wrappers around the pure steps in `state`,
//! `detection`, `posture` and `camera`, generic over the spatial backend
//! where environment queries are needed. They run once per tick in a fixed
//! order: vertical integration, ground classification, posture, horizontal
//! motion, action probes, pushing, marker sync - then camera orientation
//! after all motion has been committed.

use bevy::prelude::*;

use crate::backend::SpatialQueryBackend;
use crate::collision::{Contacts, MeasuredVelocity};
use crate::config::{
    CapsuleGeometry, ControllerConfig, FirstPersonController, ATTACK_RANGE, GROUND_STICK_VELOCITY,
};
use crate::detection::{classify, GroundState};
use crate::intent::IntentSnapshot;
use crate::posture::{posture_step, PostureAnchors};
use crate::state::{
    integrate_vertical, move_direction, select_mode, smooth_speed, walk_target_speed, Airborne,
    Grounded, MotionMode, Sliding,
};

/// How long an action-probe debug ray stays visible.
pub const DEBUG_RAY_SECONDS: f32 = 10.0;

/// A debug ray queued for drawing.
#[derive(Debug, Clone, Copy)]
pub struct DebugRay {
    /// Ray origin in world space.
    pub origin: Vec3,
    /// Ray direction (normalized).
    pub direction: Vec3,
    /// Drawn length.
    pub length: f32,
    /// Seconds left before the ray expires.
    pub remaining: f32,
}

/// Debug rays pushed by the action probes, drawn with gizmos until they
/// expire. Advisory only; not part of the functional contract.
#[derive(Resource, Debug, Default)]
pub struct DebugRays(pub Vec<DebugRay>);

/// Capture posture anchors and wire up runtime components for freshly added
/// controllers.
///
/// The capsule, camera rig and visual references are required collaborators;
/// a controller without them cannot run, so a missing piece panics with a
/// description rather than degrading silently.
pub fn init_controllers(world: &mut World) {
    let pending: Vec<Entity> = world
        .query::<(Entity, &FirstPersonController)>()
        .iter(world)
        .filter(|(_, controller)| !controller.is_initialized())
        .map(|(entity, _)| entity)
        .collect();

    for entity in pending {
        let capsule = world.get::<CapsuleGeometry>(entity).copied().unwrap_or_else(|| {
            panic!("first-person controller on {entity:?} requires a CapsuleGeometry component")
        });
        let (camera_rig, visual) = {
            let controller = world
                .get::<FirstPersonController>(entity)
                .expect("entity collected from controller query");
            (controller.camera_rig, controller.visual)
        };
        let rig_offset = world
            .get::<Transform>(camera_rig)
            .map(|transform| transform.translation)
            .unwrap_or_else(|| {
                panic!(
                    "first-person controller on {entity:?}: camera rig {camera_rig:?} has no Transform"
                )
            });
        let visual_height = world
            .get::<Transform>(visual)
            .map(|transform| transform.scale.y)
            .unwrap_or_else(|| {
                panic!(
                    "first-person controller on {entity:?}: visual {visual:?} has no Transform"
                )
            });

        let (jump_cooldown, slide_recovery_time) = {
            let mut config = world
                .get_mut::<ControllerConfig>(entity)
                .unwrap_or_else(|| {
                    panic!("first-person controller on {entity:?} requires a ControllerConfig")
                });
            // The grounded-check sphere matches the capsule footprint.
            config.grounded_check_radius = capsule.radius;
            (config.jump_cooldown, config.slide_recovery_time)
        };

        if let Some(mut controller) = world.get_mut::<FirstPersonController>(entity) {
            controller.anchors = Some(PostureAnchors {
                capsule_height: capsule.height,
                capsule_center: capsule.center,
                visual_height,
                rig_offset,
            });
            controller.jump_cooldown_timer = jump_cooldown;
            controller.slide_recovery_timer = slide_recovery_time;
        }

        world
            .entity_mut(entity)
            .insert_if_new(GroundState::default())
            .insert_if_new(Contacts::default())
            .insert_if_new(MeasuredVelocity::default());
    }
}

fn frame_delta(time: &Time) -> f32 {
    let dt = time.delta_secs();
    if dt > 0.0 {
        dt
    } else {
        1.0 / 60.0
    }
}

/// Integrate vertical velocity under gravity, jumping and the grounded
/// floor clamp. Uses the previous frame's ground classification, which is
/// refreshed right after this system.
pub fn integrate_vertical_motion(
    time: Res<Time>,
    mut q_controllers: Query<(
        &ControllerConfig,
        &GroundState,
        &mut FirstPersonController,
        &mut IntentSnapshot,
    )>,
) {
    let dt = frame_delta(&time);
    for (config, ground, mut controller, mut intent) in &mut q_controllers {
        integrate_vertical(&mut controller, &mut intent, config, ground.grounded, dt);
    }
}

/// Classify the ground under each controller via the backend's sphere and
/// ray probes.
pub fn update_ground_state<B: SpatialQueryBackend>(world: &mut World) {
    let entities: Vec<(Entity, ControllerConfig, Vec3)> = world
        .query::<(Entity, &ControllerConfig, &Transform, &FirstPersonController)>()
        .iter(world)
        .map(|(entity, config, transform, _)| (entity, *config, transform.translation))
        .collect();

    for (entity, config, position) in entities {
        let sphere_center = position + Vec3::Y * config.grounded_check_offset;
        let has_contact = B::sphere_overlap(
            world,
            sphere_center,
            config.grounded_check_radius,
            config.ground_layers,
            entity,
        );

        let state = if has_contact {
            let hit = B::raycast(
                world,
                sphere_center,
                Vec3::NEG_Y,
                config.ground_angle_distance,
                Some(config.ground_layers),
                entity,
            );
            classify(true, hit.map(|h| h.normal), config.min_slide_angle)
        } else {
            GroundState::default()
        };

        if state.has_contact && state.is_steep(config.min_slide_angle) {
            // Too steep to stand on: kill upward velocity so the slope
            // cannot launch a pending jump.
            if let Some(mut controller) = world.get_mut::<FirstPersonController>(entity) {
                controller.vertical_velocity = GROUND_STICK_VELOCITY;
            }
        }

        if let Some(mut ground) = world.get_mut::<GroundState>(entity) {
            *ground = state;
        }
    }
}

/// Drive capsule, visual and camera-rig posture toward the crouch/stand
/// targets. Sprint force-clears the crouch flag before anything else.
pub fn apply_posture(
    time: Res<Time>,
    mut q_controllers: Query<(
        &ControllerConfig,
        &FirstPersonController,
        &mut IntentSnapshot,
        &mut CapsuleGeometry,
    )>,
    mut q_transforms: Query<&mut Transform, Without<FirstPersonController>>,
) {
    let dt = frame_delta(&time);
    for (config, controller, mut intent, mut capsule) in &mut q_controllers {
        let Some(anchors) = controller.anchors else {
            continue;
        };

        if intent.sprint {
            intent.crouch = false;
        }
        let crouching = intent.crouch;

        let current_visual_scale = q_transforms
            .get(controller.visual)
            .map(|transform| transform.scale.y)
            .unwrap_or(anchors.visual_height);
        let current_rig_height = q_transforms
            .get(controller.camera_rig)
            .map(|transform| transform.translation.y)
            .unwrap_or(anchors.rig_offset.y);

        let frame = posture_step(
            &mut capsule,
            &anchors,
            crouching,
            config.crouched_offset,
            current_visual_scale,
            current_rig_height,
            dt,
        );

        if let Ok(mut transform) = q_transforms.get_mut(controller.visual) {
            transform.scale.y = frame.visual_scale_y;
            transform.translation = frame.visual_position;
        }
        if let Ok(mut transform) = q_transforms.get_mut(controller.camera_rig) {
            transform.translation.y = frame.rig_height;
        }
    }
}

/// Select the horizontal motion mode, compute this frame's displacement and
/// issue the capsule sweep.
pub fn apply_horizontal_motion<B: SpatialQueryBackend>(world: &mut World) {
    let dt = world
        .get_resource::<Time>()
        .map(|time| time.delta_secs())
        .filter(|&d| d > 0.0)
        .unwrap_or(1.0 / 60.0);

    let entities: Vec<(Entity, ControllerConfig, GroundState, IntentSnapshot, Vec3, Vec3)> = world
        .query::<(
            Entity,
            &ControllerConfig,
            &GroundState,
            &IntentSnapshot,
            &Transform,
            &FirstPersonController,
        )>()
        .iter(world)
        .filter(|(.., controller)| controller.is_initialized())
        .map(|(entity, config, ground, intent, transform, _)| {
            (
                entity,
                *config,
                *ground,
                *intent,
                *transform.right(),
                *transform.forward(),
            )
        })
        .collect();

    for (entity, config, ground, intent, right, forward) in entities {
        let measured = B::measured_velocity(world, entity);

        let displacement = {
            let Some(mut controller) = world.get_mut::<FirstPersonController>(entity) else {
                continue;
            };

            let mode = select_mode(
                ground.angle,
                config.min_slide_angle,
                controller.slide_recovery_timer,
            );
            controller.mode = mode;
            let vertical = Vec3::Y * (controller.vertical_velocity * dt);

            match mode {
                MotionMode::SlopeSlide => {
                    let normal = ground.normal;
                    let slide_direction = Vec3::new(normal.x, -normal.y, normal.z);
                    controller.last_slide_direction = slide_direction;
                    // Accelerate while sliding, up to the shared velocity cap.
                    if controller.slide_velocity < config.max_vertical_velocity {
                        controller.slide_velocity += config.slide_acceleration * dt;
                    }
                    controller.slide_recovery_timer = config.slide_recovery_time;
                    slide_direction * (controller.slide_velocity * dt) + vertical
                }
                MotionMode::PostSlideCoast => {
                    controller.slide_recovery_timer -= dt;
                    // Half the base slide speed: intentional fixed ratio,
                    // not a separate tunable.
                    controller.last_slide_direction * (config.slide_speed / 2.0 * dt) + vertical
                }
                MotionMode::Walk => {
                    // Re-arm the slide for the next slope entry.
                    controller.slide_velocity = config.slide_speed;

                    let target = walk_target_speed(&intent, &config);
                    let current = MeasuredVelocity(measured).horizontal_speed();
                    controller.speed =
                        smooth_speed(current, target, config.speed_change_rate, dt);

                    let direction = move_direction(intent.move_axes, right, forward);
                    direction * (controller.speed * dt) + vertical
                }
            }
        };

        B::move_character(world, entity, displacement);
    }
}

/// Run edge-triggered attack/interact forward raycasts from the camera rig.
///
/// Flags are consumed whether or not the ray hits; a hit is reported to the
/// log and queues a debug ray.
pub fn run_action_probes<B: SpatialQueryBackend>(world: &mut World) {
    let mut requests = Vec::new();
    let mut q_controllers =
        world.query::<(Entity, &FirstPersonController, &ControllerConfig, &mut IntentSnapshot)>();
    for (entity, controller, config, mut intent) in q_controllers.iter_mut(world) {
        let attack = intent.take_attack();
        let interact = intent.take_interact();
        if attack || interact {
            requests.push((
                entity,
                controller.camera_rig,
                config.interaction_range,
                attack,
                interact,
            ));
        }
    }

    for (entity, camera_rig, interaction_range, attack, interact) in requests {
        let Some(rig_transform) = world.get::<GlobalTransform>(camera_rig) else {
            continue;
        };
        let (_, rotation, origin) = rig_transform.to_scale_rotation_translation();
        let direction = rotation * Vec3::NEG_Z;

        if attack {
            if let Some(hit) = B::raycast(world, origin, direction, ATTACK_RANGE, None, entity) {
                info!("Attacked: {}", target_label(world, hit.entity));
                push_debug_ray(world, origin, direction, ATTACK_RANGE);
            }
        }
        if interact {
            if let Some(hit) = B::raycast(world, origin, direction, interaction_range, None, entity)
            {
                info!("Interacted with: {}", target_label(world, hit.entity));
                push_debug_ray(world, origin, direction, interaction_range);
            }
        }
    }
}

fn target_label(world: &World, entity: Option<Entity>) -> String {
    match entity {
        Some(entity) => world
            .get::<Name>(entity)
            .map(|name| name.as_str().to_owned())
            .unwrap_or_else(|| format!("{entity:?}")),
        None => "unknown".to_owned(),
    }
}

fn push_debug_ray(world: &mut World, origin: Vec3, direction: Vec3, length: f32) {
    if let Some(mut rays) = world.get_resource_mut::<DebugRays>() {
        rays.0.push(DebugRay {
            origin,
            direction,
            length,
            remaining: DEBUG_RAY_SECONDS,
        });
    }
}

/// Sync `Grounded`/`Airborne`/`Sliding` marker components from the derived
/// state.
pub fn sync_state_markers(
    mut commands: Commands,
    q_controllers: Query<(
        Entity,
        &GroundState,
        &FirstPersonController,
        Has<Grounded>,
        Has<Airborne>,
        Has<Sliding>,
    )>,
) {
    for (entity, ground, controller, has_grounded, has_airborne, has_sliding) in &q_controllers {
        if ground.grounded {
            if !has_grounded {
                commands.entity(entity).insert(Grounded).remove::<Airborne>();
            }
        } else if has_grounded || !has_airborne {
            commands.entity(entity).remove::<Grounded>().insert(Airborne);
        }

        let sliding = controller.mode == MotionMode::SlopeSlide;
        if sliding && !has_sliding {
            commands.entity(entity).insert(Sliding);
        } else if !sliding && has_sliding {
            commands.entity(entity).remove::<Sliding>();
        }
    }
}

/// Apply look input: accumulated, clamped pitch on the camera rig and
/// incremental yaw on the body. Runs after all motion for the frame.
///
/// Zero look input deliberately performs no update, so orientation never
/// drifts without explicit input.
pub fn apply_camera_look(
    mut q_controllers: Query<(
        &ControllerConfig,
        &mut FirstPersonController,
        &IntentSnapshot,
        &mut Transform,
    )>,
    mut q_rigs: Query<&mut Transform, Without<FirstPersonController>>,
) {
    for (config, mut controller, intent, mut body) in &mut q_controllers {
        if !intent.has_look_input() {
            continue;
        }

        controller.pitch = crate::camera::accumulate_pitch(
            controller.pitch,
            intent.look.y,
            config.camera_sensitivity,
            config.bottom_clamp,
            config.top_clamp,
        );

        if let Ok(mut rig) = q_rigs.get_mut(controller.camera_rig) {
            // Positive pitch looks down.
            rig.rotation = Quat::from_rotation_x(-controller.pitch.to_radians());
        }

        let yaw = intent.look.x * config.camera_sensitivity;
        // Positive look.x turns right.
        body.rotate_y(-yaw.to_radians());
    }
}

/// Draw queued debug rays and expire them.
pub fn draw_debug_rays(time: Res<Time>, mut rays: ResMut<DebugRays>, mut gizmos: Gizmos) {
    let dt = time.delta_secs();
    rays.0.retain_mut(|ray| {
        gizmos.line(
            ray.origin,
            ray.origin + ray.direction * ray.length,
            Color::srgb(1.0, 0.0, 0.0),
        );
        ray.remaining -= dt;
        ray.remaining > 0.0
    });
}
