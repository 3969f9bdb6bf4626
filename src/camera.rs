//! Camera pitch accumulation and clamping.
//!
//! The controller owns the accumulated pitch; yaw is applied directly to the
//! body transform and never stored. Orientation only changes on nonzero look
//! input - with the stick centered the camera holds its last orientation by
//! contract, so it can never drift.

/// Wrap an angle back into [-360, 360] if it overflowed, then clamp it into
/// [min, max] degrees.
pub fn clamp_angle(mut angle: f32, min: f32, max: f32) -> f32 {
    if angle < -360.0 {
        angle += 360.0;
    }
    if angle > 360.0 {
        angle -= 360.0;
    }
    angle.clamp(min, max)
}

/// Accumulate one frame of pitch input and clamp the result.
pub fn accumulate_pitch(pitch: f32, look_y: f32, sensitivity: f32, bottom: f32, top: f32) -> f32 {
    clamp_angle(pitch + look_y * sensitivity, bottom, top)
}
