//! # Interop Frame
//!
//! One tick's worth of engine input: manipulator records, SDF descriptors
//! and the type range table, each a dense `#[repr(C)]` array.
//!
//! ## Descriptor order
//!
//! Descriptors are emitted in sorted registry order. A group emits its
//! children first, then itself, so a group's `object_id` points backwards
//! at its first child. Each manipulator's `sdf_object_id` is the index of
//! its own (last emitted) descriptor.
//!
//! The frame owns every buffer; dropping it releases them.

use glam::{Quat, Vec3};
use vortex_shared::constants::NORMAL_SMOOTH;
use vortex_shared::{
    quat_row, LiquidManipulatorIndices, LiquidSdfParams, ManipulatorParam, Phenomenon,
    SmokeManipulatorIndices, SmokeSdfParams,
};

use crate::error::{CoreError, CoreResult};
use crate::manipulator::payload::{encode, PayloadContext};
use crate::ranges::TypeRangeTable;
use crate::registry::ManipulatorRegistry;
use crate::shape::descriptor::DescriptorSlot;
use crate::shape::{SdfDescriptor, ShapeDescriptorBuilder};

/// SDF records in the active engine's layout.
#[derive(Clone, Debug, PartialEq)]
pub enum SdfBuffer {
    /// Liquid layout.
    Liquid(Vec<LiquidSdfParams>),
    /// Smoke & fire layout.
    Smoke(Vec<SmokeSdfParams>),
}

impl SdfBuffer {
    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Liquid(records) => records.len(),
            Self::Smoke(records) => records.len(),
        }
    }

    /// Whether there are no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw bytes for upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Liquid(records) => bytemuck::cast_slice(records),
            Self::Smoke(records) => bytemuck::cast_slice(records),
        }
    }
}

/// Type range table in the active engine's layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndicesBuffer {
    /// Liquid layout.
    Liquid(LiquidManipulatorIndices),
    /// Smoke & fire layout.
    Smoke(SmokeManipulatorIndices),
}

impl IndicesBuffer {
    /// Raw bytes for upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Liquid(indices) => bytemuck::bytes_of(indices),
            Self::Smoke(indices) => bytemuck::bytes_of(indices),
        }
    }
}

/// Everything the engine needs for one tick.
#[derive(Clone, Debug, PartialEq)]
pub struct InteropFrame {
    /// Tick this frame was built for.
    pub tick: u64,
    /// One record per sorted manipulator.
    pub manipulators: Vec<ManipulatorParam>,
    /// SDF records.
    pub sdf: SdfBuffer,
    /// Type range table.
    pub indices: IndicesBuffer,
    /// Descriptors the SDF records were built from.
    pub descriptors: Vec<SdfDescriptor>,
}

impl InteropFrame {
    /// Manipulator records as bytes.
    #[must_use]
    pub fn manipulator_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.manipulators)
    }

    /// SDF records as bytes.
    #[must_use]
    pub fn sdf_bytes(&self) -> &[u8] {
        self.sdf.as_bytes()
    }

    /// Range table as bytes.
    #[must_use]
    pub fn indices_bytes(&self) -> &[u8] {
        self.indices.as_bytes()
    }
}

/// Builds frames and carries last tick's descriptors for the smoke
/// engine's motion data.
#[derive(Debug, Default)]
pub struct FrameAssembler {
    previous: Vec<SdfDescriptor>,
}

impl FrameAssembler {
    /// Assembler with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets last tick's descriptors.
    pub fn reset(&mut self) {
        self.previous.clear();
    }

    /// Builds the frame for `tick`.
    ///
    /// `heightmap_indices[i]` is the heightmap index of sorted member `i`
    /// (ignored for other shapes).
    ///
    /// # Errors
    ///
    /// Propagates descriptor errors ([`CoreError::AssetNotPacked`],
    /// [`CoreError::MissingShape`]).
    pub fn assemble(
        &mut self,
        tick: u64,
        registry: &ManipulatorRegistry,
        ranges: &TypeRangeTable,
        builder: &ShapeDescriptorBuilder<'_>,
        heightmap_indices: &[u32],
        payload: &PayloadContext,
    ) -> CoreResult<InteropFrame> {
        let mut manipulators = Vec::with_capacity(registry.len());
        let mut descriptors = Vec::with_capacity(registry.len());

        for (index, manipulator) in registry.iter().enumerate() {
            let slot = DescriptorSlot {
                owner_id: index_u32(index)?,
                first_index: index_u32(descriptors.len())?,
                heightmap_index: heightmap_indices.get(index).copied().unwrap_or(0),
            };
            let built = builder.build(manipulator, slot)?;
            descriptors.extend(built.children);
            let own_index = index_u32(descriptors.len())?;
            descriptors.push(built.main);

            let mut param = encode(manipulator, payload);
            param.sdf_object_id = wire_i32(own_index);
            manipulators.push(param);
        }

        let (sdf, indices) = match payload.phenomenon {
            Phenomenon::Liquid => (
                SdfBuffer::Liquid(descriptors.iter().map(liquid_record).collect()),
                IndicesBuffer::Liquid(ranges.to_liquid_indices()),
            ),
            Phenomenon::SmokeAndFire => {
                let history = (self.previous.len() == descriptors.len()).then_some(&self.previous);
                let records = descriptors
                    .iter()
                    .enumerate()
                    .map(|(i, d)| smoke_record(d, history.map_or(d, |prev| &prev[i])))
                    .collect();
                (SdfBuffer::Smoke(records), IndicesBuffer::Smoke(ranges.to_smoke_indices()))
            }
        };

        self.previous.clone_from(&descriptors);
        Ok(InteropFrame { tick, manipulators, sdf, indices, descriptors })
    }
}

/// Liquid record. Velocities are left at zero.
#[must_use]
pub fn liquid_record(d: &SdfDescriptor) -> LiquidSdfParams {
    LiquidSdfParams {
        position: d.position.to_array(),
        normal_smooth: NORMAL_SMOOTH,
        velocity: Vec3::ZERO.to_array(),
        surface_value: d.surface_bias,
        scale: d.scale.to_array(),
        distance_scale: d.distance_scale,
        angular_velocity: Vec3::ZERO.to_array(),
        kind: d.kind.wire_tag(),
        rotation: quat_row(d.rotation),
        bbox_size: d.bbox_size.to_array(),
        bbox_volume: d.bbox_volume,
        embedding_blocks: wire_i32(d.embedding_blocks),
        sdf_blocks: wire_i32(d.coarse_blocks),
        object_id: wire_i32(d.kind.object_id()),
        total_group_volume: d.total_group_volume,
        _pad: [0.0; 3],
        manipulator_id: wire_i32(d.owner_id),
    }
}

/// Smoke record with `prev` supplying the motion fields.
#[must_use]
pub fn smoke_record(d: &SdfDescriptor, prev: &SdfDescriptor) -> SmokeSdfParams {
    SmokeSdfParams {
        position: d.position.to_array(),
        normal_smooth: NORMAL_SMOOTH,
        prev_position: prev.position.to_array(),
        surface_value: d.surface_bias,
        scale: d.scale.to_array(),
        distance_scale: d.distance_scale,
        prev_scale: prev.scale.to_array(),
        kind: d.kind.wire_tag(),
        rotation: quat_row(d.rotation),
        prev_rotation: quat_row(normalized(prev.rotation)),
        bbox_size: d.bbox_size.to_array(),
        bbox_volume: d.bbox_volume,
        embedding_blocks: wire_i32(d.embedding_blocks),
        sdf_blocks: wire_i32(d.coarse_blocks),
        object_id: wire_i32(d.kind.object_id()),
        total_group_volume: d.total_group_volume,
    }
}

fn normalized(q: Quat) -> Quat {
    if q.length_squared() > 0.0 {
        q.normalize()
    } else {
        Quat::IDENTITY
    }
}

#[allow(clippy::cast_possible_wrap)]
fn wire_i32(value: u32) -> i32 {
    value as i32
}

fn index_u32(index: usize) -> CoreResult<u32> {
    u32::try_from(index).map_err(|_| CoreError::Config(format!("index {index} exceeds u32")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atlas::{HeightmapAtlasLayout, PackedAtlas};
    use crate::config::SimulationConfig;
    use crate::manipulator::{ColliderParams, EmitterParams, Manipulator, ManipulatorKind, ObjectId};
    use crate::registry::SortPolicy;
    use crate::shape::{Primitive, Shape};
    use vortex_shared::Transform;

    fn scene(config: &SimulationConfig) -> (ManipulatorRegistry, TypeRangeTable) {
        let sphere = |x: f32| {
            Shape::analytic(Primitive::Sphere, Transform::from_translation(Vec3::new(x, 0.0, 0.0)))
        };
        let (registry, _) = ManipulatorRegistry::from_candidates(
            vec![
                Manipulator::new(
                    ObjectId(1),
                    ManipulatorKind::Collider(ColliderParams::default()),
                    sphere(1.0),
                ),
                Manipulator::new(
                    ObjectId(2),
                    ManipulatorKind::Emitter(EmitterParams::default()),
                    sphere(2.0),
                ),
            ],
            SortPolicy::from_config(config),
        );
        let ranges = TypeRangeTable::compute_ranges(&registry.sorted_types());
        (registry, ranges)
    }

    #[test]
    fn test_liquid_frame() {
        let config = SimulationConfig::liquid();
        let (registry, ranges) = scene(&config);
        let atlas = PackedAtlas::empty();
        let heightmaps = HeightmapAtlasLayout::new(0, config.heightmap_resolution);
        let builder = ShapeDescriptorBuilder::new(&atlas, &heightmaps, config.neural_padding);
        let payload = PayloadContext::new(&config, 1.0);

        let frame = FrameAssembler::new()
            .assemble(7, &registry, &ranges, &builder, &[], &payload)
            .unwrap();

        assert_eq!(frame.tick, 7);
        assert_eq!(frame.manipulators.len(), 2);
        assert_eq!(frame.manipulators[1].sdf_object_id, 1);
        assert_eq!(frame.manipulator_bytes().len(), 2 * ManipulatorParam::SIZE);
        assert_eq!(frame.sdf_bytes().len(), 2 * LiquidSdfParams::SIZE);
        assert_eq!(frame.indices_bytes().len(), 80);

        let SdfBuffer::Liquid(records) = &frame.sdf else {
            panic!("expected liquid records");
        };
        // Emitter sorts first.
        assert_eq!(records[0].position, [2.0, 0.0, 0.0]);
        assert_eq!(records[0].manipulator_id, 0);
        assert_eq!(records[1].velocity, [0.0; 3]);
        assert_eq!(records[1].normal_smooth, NORMAL_SMOOTH);
    }

    #[test]
    fn test_smoke_history() {
        let config = SimulationConfig::smoke_and_fire();
        let (mut registry, ranges) = scene(&config);
        let atlas = PackedAtlas::empty();
        let heightmaps = HeightmapAtlasLayout::new(0, config.heightmap_resolution);
        let builder = ShapeDescriptorBuilder::new(&atlas, &heightmaps, config.neural_padding);
        let payload = PayloadContext::new(&config, 1.0);
        let mut assembler = FrameAssembler::new();

        let first = assembler.assemble(1, &registry, &ranges, &builder, &[], &payload).unwrap();
        let SdfBuffer::Smoke(records) = &first.sdf else {
            panic!("expected smoke records");
        };
        assert_eq!(records[0].prev_position, records[0].position);

        if let Some(shape) = registry.get_mut(0).and_then(|m| m.shape.as_mut()) {
            shape.transform.translation = Vec3::new(3.0, 0.0, 0.0);
        }
        let second = assembler.assemble(2, &registry, &ranges, &builder, &[], &payload).unwrap();
        let SdfBuffer::Smoke(records) = &second.sdf else {
            panic!("expected smoke records");
        };
        assert_eq!(records[0].position, [3.0, 0.0, 0.0]);
        assert_eq!(records[0].prev_position, [2.0, 0.0, 0.0]);
        assert_eq!(second.indices_bytes().len(), 112);
    }
}
