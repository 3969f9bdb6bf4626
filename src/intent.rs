//! Player intent snapshot.
//!
//! The input layer (keyboard, gamepad, AI, network - any source of the raw
//! signals) writes into [`IntentSnapshot`] whenever an input event fires;
//! the controller reads it once per frame, last write wins. Edge-triggered
//! flags are consumed through explicit `take_*` operations so the one-shot
//! contract lives in the type rather than in caller discipline.

use bevy::prelude::*;

/// The latest sampled player intent.
///
/// `move_axes` and `look` are level-triggered: they reflect the currently
/// held state and are never cleared by the controller. `attack` and
/// `interact` are edge-triggered and consumed via [`take_attack`] /
/// [`take_interact`]. `jump` is edge-triggered too, but is cleared by the
/// vertical integrator when the body goes airborne so a press cannot queue
/// across a fall. `sprint` and `crouch` are held states, with the caveat
/// that the posture adjuster force-clears `crouch` while `sprint` is held.
///
/// [`take_attack`]: IntentSnapshot::take_attack
/// [`take_interact`]: IntentSnapshot::take_interact
#[derive(Component, Reflect, Debug, Clone, Copy, Default)]
#[reflect(Component)]
pub struct IntentSnapshot {
    /// Movement input axes (x = strafe, y = forward).
    pub move_axes: Vec2,
    /// Look input axes (x = yaw, y = pitch).
    pub look: Vec2,
    /// One-shot attack press.
    pub attack: bool,
    /// One-shot interact press.
    pub interact: bool,
    /// One-shot jump press; cleared on going airborne.
    pub jump: bool,
    /// Held sprint state.
    pub sprint: bool,
    /// Held crouch state.
    pub crouch: bool,
}

impl IntentSnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the movement axes.
    pub fn set_move(&mut self, axes: Vec2) {
        self.move_axes = axes;
    }

    /// Set the look axes.
    pub fn set_look(&mut self, axes: Vec2) {
        self.look = axes;
    }

    /// Whether there is any movement input this frame.
    pub fn has_move_input(&self) -> bool {
        self.move_axes != Vec2::ZERO
    }

    /// Whether there is any look input this frame.
    pub fn has_look_input(&self) -> bool {
        self.look.length_squared() > 0.0
    }

    /// Consume the attack press, clearing it.
    pub fn take_attack(&mut self) -> bool {
        std::mem::take(&mut self.attack)
    }

    /// Consume the interact press, clearing it.
    pub fn take_interact(&mut self) -> bool {
        std::mem::take(&mut self.interact)
    }
}
