//! Raw knob byte to floating point mapping

/// Raw value that maps to the top of a range. MIDI control changes are 7-bit.
pub const RAW_MAX: f32 = 127.0;

/// Fraction of full travel, `raw / 127`. Not clamped: bytes above 127 give
/// values above 1.0.
pub fn normalize(raw: u8) -> f32 {
    raw as f32 / RAW_MAX
}

/// Linear interpolation between `min` and `max` by the normalized raw value.
///
/// `raw = 0` yields `min`, `raw = 127` yields `max`. Out-of-range raw bytes
/// extrapolate past `max` rather than clamping.
pub fn lerp_range(raw: u8, min: f32, max: f32) -> f32 {
    let value = normalize(raw);
    (1.0 - value) * min + value * max
}
