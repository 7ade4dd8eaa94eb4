//! # Manipulators
//!
//! Scene objects that push on, feed, drain or observe the simulation.
//!
//! A manipulator is composed, not inherited: identity and common state, an
//! optional [`Shape`], and a closed [`ManipulatorKind`] carrying the
//! kind-specific parameters. The engine-facing [`ManipulatorType`] is derived
//! from the kind and, for colliders, from the shape.

pub mod feedback;
pub mod kind;
pub mod payload;

use std::fmt;

use serde::{Deserialize, Serialize};
use vortex_shared::{Phenomenon, Transform};

use crate::shape::{Shape, ShapeClass};

pub use feedback::{DetectorReading, ManipulatorFeedback};
pub use kind::{
    ColliderParams, EffectParticleEmitterParams, EmitterParams, ForceFieldParams, ForceFieldType,
    ManipulatorKind, SpeciesModifierParams, TextureEmitterParams, VoidParams,
};
pub use payload::PayloadContext;

/// Process-stable identity of a manipulator. Also the sort tiebreak inside
/// a type range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[repr(transparent)]
pub struct ObjectId(pub u64);

impl ObjectId {
    /// Raw id.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "manipulator#{}", self.0)
    }
}

/// Engine-facing manipulator type. Discriminants are the ordinals the range
/// table is partitioned by.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ManipulatorType {
    /// Adds material.
    Emitter = 0,
    /// Removes material.
    Void = 1,
    /// Applies a force field.
    ForceField = 2,
    /// Collider with an analytic shape.
    AnalyticCollider = 3,
    /// Collider with a neural shape.
    NeuralCollider = 4,
    /// Collider with a bone group shape.
    GroupCollider = 5,
    /// Reports what is inside its shape.
    Detector = 6,
    /// Converts particles between species.
    SpeciesModifier = 7,
    /// Collider with a terrain heightmap shape.
    HeightmapCollider = 8,
    /// Spawns render-only effect particles.
    EffectParticleEmitter = 9,
    /// Emits from a 3D texture.
    TextureEmitter = 10,
}

impl ManipulatorType {
    /// Number of types.
    pub const COUNT: usize = 11;

    /// Every type in ordinal order.
    pub const ALL: [Self; Self::COUNT] = [
        Self::Emitter,
        Self::Void,
        Self::ForceField,
        Self::AnalyticCollider,
        Self::NeuralCollider,
        Self::GroupCollider,
        Self::Detector,
        Self::SpeciesModifier,
        Self::HeightmapCollider,
        Self::EffectParticleEmitter,
        Self::TextureEmitter,
    ];

    /// Ordinal.
    #[inline]
    #[must_use]
    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// Whether `phenomenon`'s range table has a slot for this type.
    #[must_use]
    pub const fn indexed_by(self, phenomenon: Phenomenon) -> bool {
        match phenomenon {
            Phenomenon::Liquid => {
                !matches!(self, Self::EffectParticleEmitter | Self::TextureEmitter)
            }
            Phenomenon::SmokeAndFire => !matches!(self, Self::HeightmapCollider),
        }
    }

    /// Whether this is one of the collider types.
    #[must_use]
    pub const fn is_collider(self) -> bool {
        matches!(
            self,
            Self::AnalyticCollider
                | Self::NeuralCollider
                | Self::GroupCollider
                | Self::HeightmapCollider
        )
    }
}

/// Which particle species a manipulator affects.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum InteractionMode {
    /// Every species.
    #[default]
    AllSpecies,
    /// Only the given species.
    OnlySelected(u32),
    /// Every species except the given one.
    ExceptSelected(u32),
}

impl InteractionMode {
    /// Engine encoding: `0`, `1 + s` or `-(1 + s)`.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn encode(self) -> i32 {
        match self {
            Self::AllSpecies => 0,
            Self::OnlySelected(species) => 1 + species as i32,
            Self::ExceptSelected(species) => -(1 + species as i32),
        }
    }

    /// The selected species, or 0 for [`InteractionMode::AllSpecies`].
    #[must_use]
    pub const fn species(self) -> u32 {
        match self {
            Self::AllSpecies => 0,
            Self::OnlySelected(species) | Self::ExceptSelected(species) => species,
        }
    }
}

/// One registered manipulator.
#[derive(Clone, Debug)]
pub struct Manipulator {
    /// Identity.
    pub id: ObjectId,
    /// Participates in the simulation this tick.
    pub enabled: bool,
    /// Species filter.
    pub interaction: InteractionMode,
    /// Surface distance added to every descriptor this manipulator owns.
    pub surface_offset: f32,
    /// Manipulator's own world transform (orients emitter velocities).
    pub transform: Transform,
    /// Region of influence. Required; manipulators without one are excluded.
    pub shape: Option<Shape>,
    /// Kind and its parameters.
    pub kind: ManipulatorKind,
    /// Latest decoded engine feedback.
    pub feedback: ManipulatorFeedback,
}

impl Manipulator {
    /// Enabled manipulator with the given shape.
    #[must_use]
    pub fn new(id: ObjectId, kind: ManipulatorKind, shape: Shape) -> Self {
        Self {
            id,
            enabled: true,
            interaction: InteractionMode::AllSpecies,
            surface_offset: 0.0,
            transform: shape.transform,
            shape: Some(shape),
            kind,
            feedback: ManipulatorFeedback::None,
        }
    }

    /// Manipulator with no shape attached yet.
    #[must_use]
    pub fn without_shape(id: ObjectId, kind: ManipulatorKind) -> Self {
        Self {
            id,
            enabled: true,
            interaction: InteractionMode::AllSpecies,
            surface_offset: 0.0,
            transform: Transform::IDENTITY,
            shape: None,
            kind,
            feedback: ManipulatorFeedback::None,
        }
    }

    /// Engine type. Colliders take their type from their shape.
    #[must_use]
    pub fn manipulator_type(&self) -> ManipulatorType {
        match self.kind {
            ManipulatorKind::Emitter(_) => ManipulatorType::Emitter,
            ManipulatorKind::Void(_) => ManipulatorType::Void,
            ManipulatorKind::ForceField(_) => ManipulatorType::ForceField,
            ManipulatorKind::Detector => ManipulatorType::Detector,
            ManipulatorKind::SpeciesModifier(_) => ManipulatorType::SpeciesModifier,
            ManipulatorKind::EffectParticleEmitter(_) => ManipulatorType::EffectParticleEmitter,
            ManipulatorKind::TextureEmitter(_) => ManipulatorType::TextureEmitter,
            ManipulatorKind::Collider(_) => match self.shape_class() {
                Some(ShapeClass::Neural) => ManipulatorType::NeuralCollider,
                Some(ShapeClass::Group) => ManipulatorType::GroupCollider,
                Some(ShapeClass::Heightmap) => ManipulatorType::HeightmapCollider,
                Some(ShapeClass::Analytic) | None => ManipulatorType::AnalyticCollider,
            },
        }
    }

    /// Class of the attached shape.
    #[must_use]
    pub fn shape_class(&self) -> Option<ShapeClass> {
        self.shape.as_ref().map(Shape::class)
    }

    /// Builder-style species filter.
    #[must_use]
    pub fn with_interaction(mut self, interaction: InteractionMode) -> Self {
        self.interaction = interaction;
        self
    }

    /// Builder-style enabled flag.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::{Primitive, ShapeGeometry};

    #[test]
    fn test_ordinals_are_dense() {
        for (i, ty) in ManipulatorType::ALL.iter().enumerate() {
            assert_eq!(ty.ordinal(), i);
        }
    }

    #[test]
    fn test_types_indexed_per_engine() {
        let liquid: Vec<_> =
            ManipulatorType::ALL.into_iter().filter(|ty| !ty.indexed_by(Phenomenon::Liquid)).collect();
        assert_eq!(
            liquid,
            [ManipulatorType::EffectParticleEmitter, ManipulatorType::TextureEmitter]
        );

        let smoke: Vec<_> = ManipulatorType::ALL
            .into_iter()
            .filter(|ty| !ty.indexed_by(Phenomenon::SmokeAndFire))
            .collect();
        assert_eq!(smoke, [ManipulatorType::HeightmapCollider]);
    }

    #[test]
    fn test_interaction_encoding() {
        assert_eq!(InteractionMode::AllSpecies.encode(), 0);
        assert_eq!(InteractionMode::OnlySelected(0).encode(), 1);
        assert_eq!(InteractionMode::OnlySelected(2).encode(), 3);
        assert_eq!(InteractionMode::ExceptSelected(2).encode(), -3);
    }

    #[test]
    fn test_collider_type_follows_shape() {
        let t = Transform::IDENTITY;
        let collider = ManipulatorKind::Collider(ColliderParams::default());

        let analytic = Manipulator::new(ObjectId(1), collider.clone(), Shape::analytic(Primitive::Box, t));
        assert_eq!(analytic.manipulator_type(), ManipulatorType::AnalyticCollider);

        let neural = Manipulator::new(
            ObjectId(2),
            collider.clone(),
            Shape::with_geometry(ShapeGeometry::Neural(None), t),
        );
        assert_eq!(neural.manipulator_type(), ManipulatorType::NeuralCollider);

        let terrain = Manipulator::new(
            ObjectId(3),
            collider,
            Shape::with_geometry(ShapeGeometry::Heightmap(None), t),
        );
        assert_eq!(terrain.manipulator_type(), ManipulatorType::HeightmapCollider);
        assert!(terrain.manipulator_type().is_collider());
    }

    #[test]
    fn test_non_collider_type_ignores_shape() {
        let shape = Shape::with_geometry(ShapeGeometry::Neural(None), Transform::IDENTITY);
        let emitter = Manipulator::new(ObjectId(4), ManipulatorKind::Detector, shape);
        assert_eq!(emitter.manipulator_type(), ManipulatorType::Detector);
    }
}
