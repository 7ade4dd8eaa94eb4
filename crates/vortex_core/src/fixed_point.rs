//! # Fixed-Point Statistics Code
//!
//! The engine reports floating quantities through 32-bit integers because
//! its reductions only have integer atomics.
//!
//! ## Encodings
//!
//! - `StatFixed`: linear code, `value = raw / (i32::MAX / F2I_MAX_VALUE)`.
//!   Range is `[-F2I_MAX_VALUE, F2I_MAX_VALUE]`, step `F2I_MAX_VALUE / i32::MAX`.
//! - `GridCoord`: normalized grid position, `raw = pos / grid * i32::MAX`.
//!   Min corners are sent as `grid - pos` so that an atomic max yields a min.
//!
//! Conversions go through `f64` so the round trip stays within one step
//! across the whole range.

use glam::Vec3;
use vortex_shared::constants::F2I_MAX_VALUE;

/// Raw integers per unit of decoded value.
const F2I_SCALE: f64 = i32::MAX as f64 / F2I_MAX_VALUE as f64;

// =============================================================================
// StatFixed - linear fixed-point scalar
// =============================================================================

/// One fixed-point statistics value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct StatFixed(i32);

impl StatFixed {
    /// Zero value.
    pub const ZERO: Self = Self(0);

    /// Largest absolute difference between a value and its round trip.
    pub const QUANTUM: f64 = F2I_MAX_VALUE as f64 / i32::MAX as f64;

    /// Wraps a raw engine integer.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: i32) -> Self {
        Self(raw)
    }

    /// The raw engine integer.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Encodes a float, saturating outside the representable range.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_f32(value: f32) -> Self {
        let scaled = (f64::from(value) * F2I_SCALE).round();
        Self(scaled.clamp(f64::from(i32::MIN), f64::from(i32::MAX)) as i32)
    }

    /// Decodes to a float.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn to_f32(self) -> f32 {
        (f64::from(self.0) / F2I_SCALE) as f32
    }
}

/// Decodes a raw statistics integer.
#[inline]
#[must_use]
pub fn int_to_float(raw: i32) -> f32 {
    StatFixed::from_raw(raw).to_f32()
}

/// Encodes a float as a raw statistics integer.
#[inline]
#[must_use]
pub fn float_to_int(value: f32) -> i32 {
    StatFixed::from_f32(value).raw()
}

/// Decodes three consecutive raw integers as a vector.
#[must_use]
pub fn decode_vec3(raw: &[i32]) -> Vec3 {
    Vec3::new(int_to_float(raw[0]), int_to_float(raw[1]), int_to_float(raw[2]))
}

// =============================================================================
// GridCoord - normalized grid positions
// =============================================================================

/// Encodes one grid-space coordinate in `[0, extent]`.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn encode_grid(position: f32, extent: f32) -> i32 {
    let normalized = f64::from(position) / f64::from(extent);
    (normalized * f64::from(i32::MAX))
        .round()
        .clamp(0.0, f64::from(i32::MAX)) as i32
}

/// Decodes one grid-space coordinate.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn decode_grid(raw: i32, extent: f32) -> f32 {
    (f64::from(raw) / f64::from(i32::MAX) * f64::from(extent)) as f32
}

/// Encodes a min corner: the engine sends `extent - position`.
#[must_use]
pub fn encode_grid_min(position: Vec3, grid: Vec3) -> [i32; 3] {
    let inverted = grid - position;
    [
        encode_grid(inverted.x, grid.x),
        encode_grid(inverted.y, grid.y),
        encode_grid(inverted.z, grid.z),
    ]
}

/// Encodes a max corner.
#[must_use]
pub fn encode_grid_max(position: Vec3, grid: Vec3) -> [i32; 3] {
    [
        encode_grid(position.x, grid.x),
        encode_grid(position.y, grid.y),
        encode_grid(position.z, grid.z),
    ]
}

/// Decodes a grid-space corner, undoing the min-corner inversion when
/// `inverted` is set.
#[must_use]
pub fn decode_grid_corner(raw: &[i32], grid: Vec3, inverted: bool) -> Vec3 {
    let position = Vec3::new(
        decode_grid(raw[0], grid.x),
        decode_grid(raw[1], grid.y),
        decode_grid(raw[2], grid.z),
    );
    if inverted {
        grid - position
    } else {
        position
    }
}
