//! Interop records exchanged with the simulation engine.
//!
//! Every record is `#[repr(C)]`, `Pod`, and laid out in 16-byte rows so the
//! engine can read it as a structured buffer. Sizes are asserted below; a
//! failing size test is a protocol break, not a test to update.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

/// Which engine the buffers are built for.
///
/// The two engines share the manipulator record but disagree on the SDF
/// record, the range table and the statistics stride.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phenomenon {
    /// Particle liquid.
    #[default]
    Liquid = 0,
    /// Grid smoke and fire.
    SmokeAndFire = 1,
}

/// SDF kind tag for neural shapes.
pub const SDF_KIND_NEURAL: i32 = -1;
/// SDF kind tag for group (multi-bone) shapes.
pub const SDF_KIND_GROUP: i32 = -2;
/// SDF kind tag for heightmap shapes.
pub const SDF_KIND_HEIGHTMAP: i32 = -3;

/// One manipulator as the engine sees it (48 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct ManipulatorParam {
    /// 1 when the manipulator participates this tick.
    pub enabled: i32,
    /// Index of this manipulator's descriptor in the SDF buffer.
    pub sdf_object_id: i32,
    /// Encoded species selector.
    pub particle_species: i32,
    /// Kind-specific integer parameter.
    pub int_parameter: i32,
    /// Kind-specific payload, first vector.
    pub additional_data0: [f32; 4],
    /// Kind-specific payload, second vector.
    pub additional_data1: [f32; 4],
}

impl ManipulatorParam {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// SDF descriptor record for the liquid engine (128 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct LiquidSdfParams {
    /// World position.
    pub position: [f32; 3],
    /// Normal smoothing radius.
    pub normal_smooth: f32,
    /// Linear velocity.
    pub velocity: [f32; 3],
    /// Surface bias.
    pub surface_value: f32,
    /// World scale.
    pub scale: [f32; 3],
    /// +1 or -1.
    pub distance_scale: f32,
    /// Angular velocity.
    pub angular_velocity: [f32; 3],
    /// Kind tag, or primitive ordinal for analytic shapes.
    pub kind: i32,
    /// Rotation quaternion (x, y, z, w).
    pub rotation: [f32; 4],
    /// Bounding box size.
    pub bbox_size: [f32; 3],
    /// Bounding box volume.
    pub bbox_volume: f32,
    /// Embedding atlas blocks per axis.
    pub embedding_blocks: i32,
    /// Coarse atlas blocks per axis, group child count or heightmap tiles.
    pub sdf_blocks: i32,
    /// Atlas slot, first child index or heightmap index.
    pub object_id: i32,
    /// Sum of child volumes for group shapes.
    pub total_group_volume: f32,
    /// Padding.
    pub _pad: [f32; 3],
    /// Owning manipulator's registry index.
    pub manipulator_id: i32,
}

impl LiquidSdfParams {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// SDF descriptor record for the smoke & fire engine (128 bytes).
///
/// The engine reconstructs motion from the previous tick's transform instead
/// of explicit velocities.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SmokeSdfParams {
    /// World position.
    pub position: [f32; 3],
    /// Normal smoothing radius.
    pub normal_smooth: f32,
    /// Position one tick ago.
    pub prev_position: [f32; 3],
    /// Surface bias.
    pub surface_value: f32,
    /// World scale.
    pub scale: [f32; 3],
    /// +1 or -1.
    pub distance_scale: f32,
    /// Scale one tick ago.
    pub prev_scale: [f32; 3],
    /// Kind tag, or primitive ordinal for analytic shapes.
    pub kind: i32,
    /// Rotation quaternion (x, y, z, w).
    pub rotation: [f32; 4],
    /// Rotation one tick ago.
    pub prev_rotation: [f32; 4],
    /// Bounding box size.
    pub bbox_size: [f32; 3],
    /// Bounding box volume.
    pub bbox_volume: f32,
    /// Embedding atlas blocks per axis.
    pub embedding_blocks: i32,
    /// Coarse atlas blocks per axis, group child count or heightmap tiles.
    pub sdf_blocks: i32,
    /// Atlas slot, first child index or heightmap index.
    pub object_id: i32,
    /// Sum of child volumes for group shapes.
    pub total_group_volume: f32,
}

impl SmokeSdfParams {
    /// Size in bytes.
    pub const SIZE: usize = std::mem::size_of::<Self>();
}

/// `[begin, end)` pair as sent to the engine.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct IndexRange {
    /// First index.
    pub begin: i32,
    /// One past the last index.
    pub end: i32,
}

/// Type range table for the liquid engine (80 bytes).
///
/// Pairs are in type-ordinal order: emitter, void, force field, analytic
/// collider, neural collider, group collider, detector, species modifier,
/// heightmap collider.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct LiquidManipulatorIndices {
    /// Per-type ranges.
    pub ranges: [IndexRange; 9],
    /// Padding.
    pub _pad: [i32; 2],
}

/// Type range table for the smoke & fire engine (112 bytes).
///
/// Emitter through species modifier, effect particle emitter, the three
/// force-field shape sub-ranges (analytic, neural, group), then texture
/// emitter.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct SmokeManipulatorIndices {
    /// Per-type ranges.
    pub ranges: [IndexRange; 9],
    /// Force-field sub-ranges by shape kind.
    pub force_field_shapes: [IndexRange; 3],
    /// Texture emitter range.
    pub texture_emitter: IndexRange,
    /// Padding.
    pub _pad: [i32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_sizes() {
        assert_eq!(ManipulatorParam::SIZE, 48);
        assert_eq!(LiquidSdfParams::SIZE, 128);
        assert_eq!(SmokeSdfParams::SIZE, 128);
        assert_eq!(std::mem::size_of::<LiquidManipulatorIndices>(), 80);
        assert_eq!(std::mem::size_of::<SmokeManipulatorIndices>(), 112);
    }

    #[test]
    fn test_records_are_16_byte_rows() {
        assert_eq!(ManipulatorParam::SIZE % 16, 0);
        assert_eq!(LiquidSdfParams::SIZE % 16, 0);
        assert_eq!(SmokeSdfParams::SIZE % 16, 0);
    }

    #[test]
    fn test_alignment() {
        assert_eq!(std::mem::align_of::<ManipulatorParam>(), 4);
        assert_eq!(std::mem::align_of::<LiquidSdfParams>(), 4);
    }

    #[test]
    fn test_zeroed_manipulator_is_disabled() {
        let param = ManipulatorParam::zeroed();
        assert_eq!(param.enabled, 0);
        assert_eq!(bytemuck::bytes_of(&param).len(), 48);
    }
}
