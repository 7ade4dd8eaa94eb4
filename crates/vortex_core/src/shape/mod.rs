//! # Shapes
//!
//! What a manipulator's region of influence looks like.
//!
//! A shape is a world transform plus one of four geometries:
//!
//! | Geometry | Source | Wire kind |
//! |----------|--------|-----------|
//! | Analytic | closed-form primitive | primitive ordinal (0..=4) |
//! | Neural | baked grid asset in the atlas | -1 |
//! | Group | neural bone shapes of a skinned mesh | -2 |
//! | Heightmap | host terrain (colliders only) | -3 |

pub mod descriptor;

use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use vortex_shared::Transform;

use crate::atlas::NeuralAsset;

pub use descriptor::{SdfDescriptor, SdfKind, ShapeDescriptorBuilder, ShapeDescriptors};

/// Closed-form primitive. Discriminants are the engine's primitive ordinals.
#[repr(i32)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Primitive {
    /// Unit sphere
    #[default]
    Sphere = 0,
    /// Unit box
    Box = 1,
    /// Y-aligned capsule
    Capsule = 2,
    /// Torus in the XZ plane
    Torus = 3,
    /// Y-aligned cylinder
    Cylinder = 4,
}

impl Primitive {
    /// Bounding size for a primitive at the given world scale.
    ///
    /// Round cross-section primitives use `x` for both horizontal axes.
    #[must_use]
    pub fn bbox_size(self, scale: Vec3) -> Vec3 {
        match self {
            Self::Sphere | Self::Box => 0.5 * scale,
            Self::Capsule | Self::Torus | Self::Cylinder => Vec3::new(scale.x, scale.y, scale.x),
        }
    }
}

/// Host terrain backing a heightmap shape.
#[derive(Clone, Debug, PartialEq)]
pub struct Terrain {
    /// World units per heightmap texel (x, z) and full height (y).
    pub heightmap_scale: Vec3,
    /// Heightmap texels per side.
    pub resolution: u32,
    /// Row-major samples in `[0, 1]`, `resolution²` of them. Empty when the
    /// host keeps the heights on the GPU.
    pub heights: Vec<f32>,
}

impl Terrain {
    /// Terrain with no CPU-side samples.
    #[must_use]
    pub fn new(heightmap_scale: Vec3, resolution: u32) -> Self {
        Self { heightmap_scale, resolution, heights: Vec::new() }
    }
}

/// Shape geometry.
#[derive(Clone, Debug)]
pub enum ShapeGeometry {
    /// Closed-form primitive.
    Analytic(Primitive),
    /// Baked neural asset; `None` until the asset has been generated.
    Neural(Option<Arc<NeuralAsset>>),
    /// Host terrain; `None` when the terrain or its data is missing.
    Heightmap(Option<Terrain>),
    /// Bone shapes of a skinned mesh; empty until generated.
    Group(Vec<Shape>),
}

/// Coarse shape classification, used for sorting and validation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShapeClass {
    /// Analytic primitive
    Analytic,
    /// Neural asset
    Neural,
    /// Bone group
    Group,
    /// Terrain heightmap
    Heightmap,
}

impl ShapeClass {
    /// Rank used to order force fields inside their range: analytic first,
    /// then neural, then group.
    #[must_use]
    pub const fn force_field_rank(self) -> u8 {
        match self {
            Self::Analytic => 0,
            Self::Neural => 1,
            Self::Group => 2,
            Self::Heightmap => 3,
        }
    }
}

/// One shape instance.
#[derive(Clone, Debug)]
pub struct Shape {
    /// World transform.
    pub transform: Transform,
    /// Extra surface distance for this shape.
    pub surface_offset: f32,
    /// Flip inside and outside.
    pub inverted: bool,
    /// Geometry.
    pub geometry: ShapeGeometry,
}

impl Shape {
    /// Analytic shape at `transform`.
    #[must_use]
    pub fn analytic(primitive: Primitive, transform: Transform) -> Self {
        Self::with_geometry(ShapeGeometry::Analytic(primitive), transform)
    }

    /// Neural shape at `transform`.
    #[must_use]
    pub fn neural(asset: Arc<NeuralAsset>, transform: Transform) -> Self {
        Self::with_geometry(ShapeGeometry::Neural(Some(asset)), transform)
    }

    /// Heightmap shape at `transform`.
    #[must_use]
    pub fn heightmap(terrain: Terrain, transform: Transform) -> Self {
        Self::with_geometry(ShapeGeometry::Heightmap(Some(terrain)), transform)
    }

    /// Group of bone shapes.
    #[must_use]
    pub fn group(bones: Vec<Shape>, transform: Transform) -> Self {
        Self::with_geometry(ShapeGeometry::Group(bones), transform)
    }

    /// Shape with default offset and orientation.
    #[must_use]
    pub fn with_geometry(geometry: ShapeGeometry, transform: Transform) -> Self {
        Self { transform, surface_offset: 0.0, inverted: false, geometry }
    }

    /// Classification.
    #[must_use]
    pub fn class(&self) -> ShapeClass {
        match self.geometry {
            ShapeGeometry::Analytic(_) => ShapeClass::Analytic,
            ShapeGeometry::Neural(_) => ShapeClass::Neural,
            ShapeGeometry::Group(_) => ShapeClass::Group,
            ShapeGeometry::Heightmap(_) => ShapeClass::Heightmap,
        }
    }

    /// The neural asset, if this is a generated neural shape.
    #[must_use]
    pub fn neural_asset(&self) -> Option<&Arc<NeuralAsset>> {
        match &self.geometry {
            ShapeGeometry::Neural(asset) => asset.as_ref(),
            _ => None,
        }
    }

    /// Every neural asset this shape needs packed, including group bones.
    pub fn neural_assets(&self) -> Vec<&Arc<NeuralAsset>> {
        match &self.geometry {
            ShapeGeometry::Neural(Some(asset)) => vec![asset],
            ShapeGeometry::Group(bones) => bones.iter().flat_map(Shape::neural_assets).collect(),
            _ => Vec::new(),
        }
    }

    /// Why this shape cannot be simulated yet, if anything.
    #[must_use]
    pub fn missing_data(&self) -> Option<&'static str> {
        match &self.geometry {
            ShapeGeometry::Analytic(_) => None,
            ShapeGeometry::Neural(None) => Some("neural SDF was not generated"),
            ShapeGeometry::Neural(Some(_)) => None,
            ShapeGeometry::Heightmap(None) => Some("terrain or terrain data is missing"),
            ShapeGeometry::Heightmap(Some(_)) => None,
            ShapeGeometry::Group(bones) => {
                let generated =
                    !bones.is_empty() && bones.iter().all(|bone| bone.neural_asset().is_some());
                (!generated).then_some("skinned mesh SDF was not generated")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_bbox() {
        let scale = Vec3::new(2.0, 4.0, 6.0);
        assert_eq!(Primitive::Sphere.bbox_size(scale), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Primitive::Box.bbox_size(scale), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(Primitive::Capsule.bbox_size(scale), Vec3::new(2.0, 4.0, 2.0));
        assert_eq!(Primitive::Cylinder.bbox_size(scale), Vec3::new(2.0, 4.0, 2.0));
    }

    #[test]
    fn test_primitive_ordinals() {
        assert_eq!(Primitive::Sphere as i32, 0);
        assert_eq!(Primitive::Cylinder as i32, 4);
    }

    #[test]
    fn test_missing_data() {
        let t = Transform::IDENTITY;
        assert!(Shape::analytic(Primitive::Box, t).missing_data().is_none());
        assert!(Shape::with_geometry(ShapeGeometry::Neural(None), t).missing_data().is_some());
        assert!(Shape::with_geometry(ShapeGeometry::Heightmap(None), t).missing_data().is_some());
        assert!(Shape::group(Vec::new(), t).missing_data().is_some());

        let ungenerated_bone = Shape::with_geometry(ShapeGeometry::Neural(None), t);
        assert!(Shape::group(vec![ungenerated_bone], t).missing_data().is_some());
    }

    #[test]
    fn test_force_field_rank_order() {
        assert!(ShapeClass::Analytic.force_field_rank() < ShapeClass::Neural.force_field_rank());
        assert!(ShapeClass::Neural.force_field_rank() < ShapeClass::Group.force_field_rank());
    }
}
