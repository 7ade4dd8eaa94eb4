//! # Type Range Indexer
//!
//! One `[begin, end)` range per manipulator type over the sorted registry,
//! so the engine dispatches a type without per-object branching.
//!
//! `first_index(T)` is the first sorted index whose type ordinal is `>= T`,
//! with `first_index(COUNT) = len`. The range of `T` is
//! `first_index(T)..first_index(T + 1)`. Types with no members get an empty
//! range positioned where they would sit.

use std::ops::Range;

use vortex_shared::{IndexRange, LiquidManipulatorIndices, SmokeManipulatorIndices};

use crate::manipulator::ManipulatorType;
use crate::shape::ShapeClass;

/// Force-field sub-ranges, in this order.
pub const FORCE_FIELD_SHAPES: [ShapeClass; 3] =
    [ShapeClass::Analytic, ShapeClass::Neural, ShapeClass::Group];

/// Types the liquid engine indexes, in wire order.
const LIQUID_WIRE_ORDER: [ManipulatorType; 9] = [
    ManipulatorType::Emitter,
    ManipulatorType::Void,
    ManipulatorType::ForceField,
    ManipulatorType::AnalyticCollider,
    ManipulatorType::NeuralCollider,
    ManipulatorType::GroupCollider,
    ManipulatorType::Detector,
    ManipulatorType::SpeciesModifier,
    ManipulatorType::HeightmapCollider,
];

/// Types the smoke engine indexes in its main table, in wire order.
const SMOKE_WIRE_ORDER: [ManipulatorType; 9] = [
    ManipulatorType::Emitter,
    ManipulatorType::Void,
    ManipulatorType::ForceField,
    ManipulatorType::AnalyticCollider,
    ManipulatorType::NeuralCollider,
    ManipulatorType::GroupCollider,
    ManipulatorType::Detector,
    ManipulatorType::SpeciesModifier,
    ManipulatorType::EffectParticleEmitter,
];

/// Per-type ranges of one sorted registry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeRangeTable {
    starts: [usize; ManipulatorType::COUNT + 1],
    force_field_starts: [usize; FORCE_FIELD_SHAPES.len() + 1],
}

impl TypeRangeTable {
    /// Scans a sorted type list once.
    ///
    /// `sorted` must be ordered by type ordinal; force fields must be
    /// ordered by shape rank for [`Self::force_field_shapes`] to be
    /// meaningful.
    #[must_use]
    pub fn compute_ranges(sorted: &[(ManipulatorType, Option<ShapeClass>)]) -> Self {
        let len = sorted.len();
        let mut starts = [len; ManipulatorType::COUNT + 1];
        let mut force_field_starts = [len; FORCE_FIELD_SHAPES.len() + 1];
        let mut next_type = 0;
        let mut next_rank = 0;

        for (index, &(ty, class)) in sorted.iter().enumerate() {
            while next_type <= ty.ordinal() {
                starts[next_type] = index;
                next_type += 1;
            }
            if ty == ManipulatorType::ForceField {
                let rank = class.map_or(0, |c| usize::from(c.force_field_rank()));
                while next_rank <= rank.min(FORCE_FIELD_SHAPES.len()) {
                    force_field_starts[next_rank] = index;
                    next_rank += 1;
                }
            }
        }

        // Sub-ranges with no force fields after them end where the force
        // field range ends.
        let field_end = starts[ManipulatorType::ForceField.ordinal() + 1];
        for start in &mut force_field_starts[next_rank..] {
            *start = field_end;
        }

        debug_assert!(starts.windows(2).all(|w| w[0] <= w[1]), "registry not sorted by type");
        Self { starts, force_field_starts }
    }

    /// Range of `ty`.
    #[must_use]
    pub fn range(&self, ty: ManipulatorType) -> Range<usize> {
        let i = ty.ordinal();
        self.starts[i]..self.starts[i + 1]
    }

    /// Members of `ty`.
    #[must_use]
    pub fn count(&self, ty: ManipulatorType) -> usize {
        self.range(ty).len()
    }

    /// Total members covered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.starts[ManipulatorType::COUNT]
    }

    /// Whether the table covers nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Analytic, neural and group sub-ranges of the force-field range.
    #[must_use]
    pub fn force_field_shapes(&self) -> [Range<usize>; 3] {
        let s = &self.force_field_starts;
        [s[0]..s[1], s[1]..s[2], s[2]..s[3]]
    }

    /// Liquid engine table.
    #[must_use]
    pub fn to_liquid_indices(&self) -> LiquidManipulatorIndices {
        LiquidManipulatorIndices {
            ranges: LIQUID_WIRE_ORDER.map(|ty| wire(self.range(ty))),
            _pad: [0; 2],
        }
    }

    /// Smoke engine table.
    #[must_use]
    pub fn to_smoke_indices(&self) -> SmokeManipulatorIndices {
        SmokeManipulatorIndices {
            ranges: SMOKE_WIRE_ORDER.map(|ty| wire(self.range(ty))),
            force_field_shapes: self.force_field_shapes().map(wire),
            texture_emitter: wire(self.range(ManipulatorType::TextureEmitter)),
            _pad: [0; 2],
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
fn wire(range: Range<usize>) -> IndexRange {
    IndexRange { begin: range.start as i32, end: range.end as i32 }
}
