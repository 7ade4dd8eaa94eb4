//! # Shape Descriptor Builder
//!
//! Turns a manipulator's live shape into the fixed-layout descriptors the
//! engine evaluates. Building is pure: the same manipulator, atlas and slot
//! always produce the same descriptors, so it runs every tick.
//!
//! ## Per-kind rules
//!
//! - Analytic: scale is the lossy world scale (near-zero axes lifted), bbox
//!   depends on the primitive.
//! - Neural: world transform is `shape * asset correction`; scale is
//!   `|scale| * (1 + padding)` and doubles as the bbox.
//! - Heightmap: identity rotation; horizontal scale spans the heightmap,
//!   vertical scale is twice the height scale because heights are authored
//!   in `[0, 1]` and shape space is `[-1, 1]`.
//! - Group: one descriptor per bone, then the group itself with the mean
//!   bone position and scale and the summed bone volume.

use glam::{Quat, Vec3};
use vortex_shared::protocol::{SDF_KIND_GROUP, SDF_KIND_HEIGHTMAP, SDF_KIND_NEURAL};
use vortex_shared::{replace_zeroes, Transform};

use super::{Primitive, Shape, ShapeGeometry};
use crate::atlas::{HeightmapAtlasLayout, PackedAtlas};
use crate::error::{CoreError, CoreResult};
use crate::manipulator::Manipulator;

/// Descriptor kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SdfKind {
    /// Closed-form primitive.
    Analytic(Primitive),
    /// Neural asset in atlas slot `slot`.
    Neural {
        /// Atlas slot.
        slot: u32,
    },
    /// Terrain tile `index` of the heightmap atlas.
    Heightmap {
        /// Heightmap index.
        index: u32,
    },
    /// Bone group whose children start at descriptor `first_child`.
    Group {
        /// Index of the first child descriptor.
        first_child: u32,
        /// Number of children.
        child_count: u32,
    },
}

impl SdfKind {
    /// Engine kind tag.
    #[must_use]
    pub const fn wire_tag(self) -> i32 {
        match self {
            Self::Analytic(primitive) => primitive as i32,
            Self::Neural { .. } => SDF_KIND_NEURAL,
            Self::Group { .. } => SDF_KIND_GROUP,
            Self::Heightmap { .. } => SDF_KIND_HEIGHTMAP,
        }
    }

    /// Object id the engine reads: atlas slot, heightmap index or first
    /// child index.
    #[must_use]
    pub const fn object_id(self) -> u32 {
        match self {
            Self::Analytic(_) => 0,
            Self::Neural { slot } => slot,
            Self::Heightmap { index } => index,
            Self::Group { first_child, .. } => first_child,
        }
    }
}

/// One shape instance as the engine sees it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SdfDescriptor {
    /// World position.
    pub position: Vec3,
    /// World rotation.
    pub rotation: Quat,
    /// World scale.
    pub scale: Vec3,
    /// `+1`, or `-1` for inverted shapes.
    pub distance_scale: f32,
    /// Manipulator offset plus shape offset.
    pub surface_bias: f32,
    /// Bounding box size.
    pub bbox_size: Vec3,
    /// `bbox_size.x * y * z`.
    pub bbox_volume: f32,
    /// Kind.
    pub kind: SdfKind,
    /// Registry index of the owning manipulator.
    pub owner_id: u32,
    /// Sum of child volumes (groups only).
    pub total_group_volume: f32,
    /// Embedding atlas blocks per axis (neural only).
    pub embedding_blocks: u32,
    /// Coarse atlas blocks per axis, child count, or heightmap tiles per side.
    pub coarse_blocks: u32,
}

impl SdfDescriptor {
    fn new(position: Vec3, rotation: Quat, scale: Vec3, bbox_size: Vec3, kind: SdfKind) -> Self {
        Self {
            position,
            rotation,
            scale,
            distance_scale: 1.0,
            surface_bias: 0.0,
            bbox_size,
            bbox_volume: bbox_size.x * bbox_size.y * bbox_size.z,
            kind,
            owner_id: 0,
            total_group_volume: 0.0,
            embedding_blocks: 0,
            coarse_blocks: 0,
        }
    }

    /// Atlas slot for neural descriptors.
    #[must_use]
    pub const fn atlas_slot(&self) -> Option<u32> {
        match self.kind {
            SdfKind::Neural { slot } => Some(slot),
            _ => None,
        }
    }
}

/// Descriptors for one manipulator, in emission order: children, then main.
#[derive(Clone, Debug, PartialEq)]
pub struct ShapeDescriptors {
    /// Bone descriptors (groups only).
    pub children: Vec<SdfDescriptor>,
    /// The manipulator's own descriptor.
    pub main: SdfDescriptor,
}

/// Where a manipulator's descriptors land this tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DescriptorSlot {
    /// Registry index of the owner.
    pub owner_id: u32,
    /// Index the first emitted descriptor will have.
    pub first_index: u32,
    /// Heightmap index if the shape is a heightmap.
    pub heightmap_index: u32,
}

/// Builds descriptors against a finalized atlas.
#[derive(Clone, Copy, Debug)]
pub struct ShapeDescriptorBuilder<'a> {
    atlas: &'a PackedAtlas,
    heightmaps: &'a HeightmapAtlasLayout,
    padding: f32,
}

impl<'a> ShapeDescriptorBuilder<'a> {
    /// Builder over packed atlases with the engine's neural padding.
    #[must_use]
    pub fn new(atlas: &'a PackedAtlas, heightmaps: &'a HeightmapAtlasLayout, padding: f32) -> Self {
        Self { atlas, heightmaps, padding }
    }

    /// Descriptors for `owner`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::MissingShape`] if the shape data is gone.
    /// - [`CoreError::AssetNotPacked`] if a neural asset was never packed.
    pub fn build(&self, owner: &Manipulator, slot: DescriptorSlot) -> CoreResult<ShapeDescriptors> {
        let missing = || CoreError::MissingShape { id: owner.id.raw() };
        let shape = owner.shape.as_ref().ok_or_else(missing)?;

        let mut children = Vec::new();
        let mut main = match &shape.geometry {
            ShapeGeometry::Analytic(primitive) => Self::analytic(shape, *primitive),
            ShapeGeometry::Neural(_) => self.neural(shape).ok_or_else(missing)??,
            ShapeGeometry::Heightmap(terrain) => {
                let terrain = terrain.as_ref().ok_or_else(missing)?;
                let mut scale = terrain.heightmap_scale * resolution_f32(terrain.resolution);
                scale.y = terrain.heightmap_scale.y * 2.0;
                let mut sdf = SdfDescriptor::new(
                    shape.transform.translation,
                    Quat::IDENTITY,
                    scale,
                    scale,
                    SdfKind::Heightmap { index: slot.heightmap_index },
                );
                sdf.coarse_blocks = self.heightmaps.tiles_per_side;
                sdf
            }
            ShapeGeometry::Group(bones) => {
                let mut volume = 0.0;
                let mut position = Vec3::ZERO;
                let mut scale = Vec3::ZERO;
                for bone in bones {
                    let mut child = self.neural(bone).ok_or_else(missing)??;
                    child.surface_bias = owner.surface_offset + bone.surface_offset;
                    child.owner_id = slot.owner_id;
                    volume += child.bbox_volume;
                    position += child.position;
                    scale += child.scale;
                    children.push(child);
                }
                if children.is_empty() {
                    return Err(missing());
                }
                #[allow(clippy::cast_precision_loss)]
                let n = children.len() as f32;
                let child_count = u32::try_from(children.len()).map_err(|_| missing())?;

                let own_scale = replace_zeroes(shape.transform.scale);
                let mut sdf = SdfDescriptor::new(
                    position / n,
                    shape.transform.rotation,
                    scale / n,
                    0.5 * own_scale,
                    SdfKind::Group { first_child: slot.first_index, child_count },
                );
                sdf.total_group_volume = volume;
                sdf.coarse_blocks = child_count;
                sdf
            }
        };

        main.surface_bias = owner.surface_offset + shape.surface_offset;
        main.distance_scale = if shape.inverted { -1.0 } else { 1.0 };
        main.owner_id = slot.owner_id;
        Ok(ShapeDescriptors { children, main })
    }

    fn analytic(shape: &Shape, primitive: Primitive) -> SdfDescriptor {
        let Transform { translation, rotation, scale } = shape.transform;
        SdfDescriptor::new(
            translation,
            rotation,
            replace_zeroes(scale),
            primitive.bbox_size(scale),
            SdfKind::Analytic(primitive),
        )
    }

    /// `None` if the shape is not a generated neural shape.
    fn neural(&self, shape: &Shape) -> Option<CoreResult<SdfDescriptor>> {
        let asset = shape.neural_asset()?;
        let slot = match self.atlas.slot_of(asset.hash()) {
            Ok(slot) => slot,
            Err(e) => return Some(Err(e)),
        };

        let world = shape.transform.compose_matrix(asset.correction());
        let scale = replace_zeroes(world.scale).abs() * (1.0 + self.padding);
        let mut sdf =
            SdfDescriptor::new(world.translation, world.rotation, scale, scale, SdfKind::Neural { slot });
        sdf.distance_scale = if shape.inverted { -1.0 } else { 1.0 };
        sdf.embedding_blocks = self.atlas.embedding_layout().blocks_per_axis;
        sdf.coarse_blocks = self.atlas.coarse_layout().blocks_per_axis;
        Some(Ok(sdf))
    }
}

#[allow(clippy::cast_precision_loss)]
fn resolution_f32(resolution: u32) -> f32 {
    resolution as f32
}
