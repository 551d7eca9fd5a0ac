/// Normalization factors for fixed-point samples.
pub struct Factor;

impl Factor {
    /// Full signed 16-bit range, used by positions and texture coordinates.
    pub const I16: f32 = 32767.0;
    /// Signed 8-bit range, used by normals.
    pub const I8: f32 = 127.0;
    /// Bone weights are stored as signed bytes.
    pub const BONE_WEIGHT: f32 = 127.0;
}

/// Reconstruct a float from a quantized sample: `raw * scale / factor`.
pub fn scaled(raw: i32, scale: f32, factor: f32) -> f32 {
    (raw as f32 * scale) / factor
}

/// Inverse of [`scaled`], rounded to the nearest sample.
///
/// `scale` must be non-zero.
pub fn unscaled(value: f32, scale: f32, factor: f32) -> i32 {
    (value * factor / scale).round() as i32
}

pub fn scaled_i16(raw: i16, scale: f32) -> f32 {
    scaled(raw as i32, scale, Factor::I16)
}

pub fn scaled_i8(raw: i8, scale: f32) -> f32 {
    scaled(raw as i32, scale, Factor::I8)
}
