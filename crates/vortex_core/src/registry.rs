//! # Manipulator Registry
//!
//! Owns every manipulator of one simulation instance and keeps the valid
//! ones in engine order.
//!
//! ## Ordering
//!
//! Members are stable-sorted by:
//!
//! 1. type ordinal
//! 2. force-field shape rank (analytic, neural, group) when
//!    `force_fields_grouped_by_shape` is set
//! 3. enabled before disabled when `disabled_objects_trailing` is set
//! 4. [`ObjectId`]
//!
//! The order is fixed when the registry is rebuilt. Toggling `enabled`
//! afterwards does not move anything.
//!
//! ## Exclusions
//!
//! Invalid members stay registered but are left out of the sorted order, so
//! a later rebuild picks them up once their data exists.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{debug, warn};
use vortex_shared::Phenomenon;

use crate::config::SimulationConfig;
use crate::manipulator::{ForceFieldType, Manipulator, ManipulatorKind, ManipulatorType, ObjectId};
use crate::shape::ShapeClass;

/// Why a manipulator was left out of the sorted order.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exclusion {
    /// No shape attached.
    #[error("no shape attached")]
    MissingShape,
    /// Shape data has not been generated.
    #[error("{0}")]
    MissingData(&'static str),
    /// Heightmaps only work as colliders.
    #[error("heightmap shape used outside a collider")]
    HeightmapOutsideCollider,
    /// The active engine's range table has no slot for this type.
    #[error("{0:?} has no range in this engine's index table")]
    UnsupportedType(ManipulatorType),
    /// The active engine has no such force field.
    #[error("force field type {0:?} is not supported by this engine")]
    UnsupportedForceField(ForceFieldType),
}

/// Result of a registry mutation.
#[must_use]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MutationOutcome {
    /// The registry changed and was re-sorted.
    Applied,
    /// Nothing to do (already present, or not present).
    Unchanged,
    /// Rejected because the engine holds resources for the current order.
    Frozen,
    /// Rejected because the active engine cannot index this manipulator.
    Rejected(Exclusion),
}

/// What a rebuild kept and dropped.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Members in the sorted order.
    pub kept: usize,
    /// Members left out, with the reason.
    pub excluded: Vec<(ObjectId, Exclusion)>,
    /// Candidates dropped as duplicate ids.
    pub duplicates: usize,
}

/// Sort and validation rules for one engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SortPolicy {
    /// Engine the registry feeds.
    pub phenomenon: Phenomenon,
    /// Disabled members go to the end of their type bucket.
    pub disabled_trailing: bool,
    /// Force fields are ordered analytic, neural, group.
    pub group_force_fields: bool,
}

impl SortPolicy {
    /// Policy from a simulation config.
    #[must_use]
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            phenomenon: config.phenomenon,
            disabled_trailing: config.disabled_objects_trailing,
            group_force_fields: config.force_fields_grouped_by_shape,
        }
    }

    fn key(&self, manipulator: &Manipulator) -> (usize, u8, bool, ObjectId) {
        let ty = manipulator.manipulator_type();
        let rank = match manipulator.shape_class() {
            Some(class) if self.group_force_fields && ty == ManipulatorType::ForceField => {
                class.force_field_rank()
            }
            _ => 0,
        };
        let trailing = self.disabled_trailing && !manipulator.enabled;
        (ty.ordinal(), rank, trailing, manipulator.id)
    }

    /// `Some` if the engine has no range for the manipulator's type.
    /// Colliders without a shape have no settled type yet and pass.
    fn unsupported_type(&self, manipulator: &Manipulator) -> Option<Exclusion> {
        let ty = manipulator.manipulator_type();
        if ty.indexed_by(self.phenomenon) || (ty.is_collider() && manipulator.shape.is_none()) {
            None
        } else {
            Some(Exclusion::UnsupportedType(ty))
        }
    }

    fn exclusion(&self, manipulator: &Manipulator) -> Option<Exclusion> {
        if let Some(reason) = self.unsupported_type(manipulator) {
            return Some(reason);
        }
        let Some(shape) = manipulator.shape.as_ref() else {
            return Some(Exclusion::MissingShape);
        };
        if let Some(reason) = shape.missing_data() {
            return Some(Exclusion::MissingData(reason));
        }
        match &manipulator.kind {
            ManipulatorKind::Collider(_) => None,
            _ if shape.class() == ShapeClass::Heightmap => Some(Exclusion::HeightmapOutsideCollider),
            ManipulatorKind::ForceField(params) => params
                .field
                .wire_code(self.phenomenon)
                .is_none()
                .then_some(Exclusion::UnsupportedForceField(params.field)),
            _ => None,
        }
    }
}

impl Default for SortPolicy {
    fn default() -> Self {
        Self::from_config(&SimulationConfig::default())
    }
}

/// Registered manipulators plus their engine order.
#[derive(Debug, Default)]
pub struct ManipulatorRegistry {
    members: Vec<Manipulator>,
    order: Vec<usize>,
    frozen: bool,
    policy: SortPolicy,
}

impl ManipulatorRegistry {
    /// Empty registry.
    #[must_use]
    pub fn new(policy: SortPolicy) -> Self {
        Self { members: Vec::new(), order: Vec::new(), frozen: false, policy }
    }

    /// Registry built from a candidate list. Later duplicates of an id are
    /// dropped.
    pub fn from_candidates(
        candidates: impl IntoIterator<Item = Manipulator>,
        policy: SortPolicy,
    ) -> (Self, RebuildReport) {
        let mut registry = Self::new(policy);
        let mut seen = HashSet::new();
        let mut duplicates = 0;
        for candidate in candidates {
            if seen.insert(candidate.id) {
                registry.members.push(candidate);
            } else {
                warn!(id = %candidate.id, "duplicate manipulator ignored");
                duplicates += 1;
            }
        }
        let mut report = registry.rebuild();
        report.duplicates = duplicates;
        (registry, report)
    }

    /// Re-validates every member and recomputes the sorted order.
    pub fn rebuild(&mut self) -> RebuildReport {
        let mut report = RebuildReport::default();
        self.order.clear();
        for (index, manipulator) in self.members.iter().enumerate() {
            match self.policy.exclusion(manipulator) {
                Some(reason) => {
                    warn!(id = %manipulator.id, %reason, "manipulator excluded");
                    report.excluded.push((manipulator.id, reason));
                }
                None => self.order.push(index),
            }
        }

        let members = &self.members;
        let policy = self.policy;
        self.order.sort_by_cached_key(|&index| policy.key(&members[index]));

        report.kept = self.order.len();
        debug!(kept = report.kept, excluded = report.excluded.len(), "registry rebuilt");
        report
    }

    /// Registers a manipulator and re-sorts. Types the engine cannot index
    /// are refused outright.
    pub fn add(&mut self, manipulator: Manipulator) -> MutationOutcome {
        if self.frozen {
            warn!(id = %manipulator.id, "registry frozen, add ignored");
            return MutationOutcome::Frozen;
        }
        if let Some(reason) = self.policy.unsupported_type(&manipulator) {
            warn!(id = %manipulator.id, %reason, "manipulator rejected");
            return MutationOutcome::Rejected(reason);
        }
        if self.contains(manipulator.id) {
            return MutationOutcome::Unchanged;
        }
        self.members.push(manipulator);
        self.rebuild();
        MutationOutcome::Applied
    }

    /// Deregisters a manipulator and re-sorts.
    pub fn remove(&mut self, id: ObjectId) -> MutationOutcome {
        if self.frozen {
            warn!(%id, "registry frozen, remove ignored");
            return MutationOutcome::Frozen;
        }
        let Some(index) = self.members.iter().position(|m| m.id == id) else {
            return MutationOutcome::Unchanged;
        };
        self.members.remove(index);
        self.rebuild();
        MutationOutcome::Applied
    }

    /// Whether `id` is registered (sorted or excluded).
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.members.iter().any(|m| m.id == id)
    }

    /// Member at sorted index `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Manipulator> {
        self.order.get(index).map(|&i| &self.members[i])
    }

    /// Mutable member at sorted index `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut Manipulator> {
        let i = *self.order.get(index)?;
        self.members.get_mut(i)
    }

    /// Sorted index of `id`, if it made it into the order.
    #[must_use]
    pub fn position(&self, id: ObjectId) -> Option<usize> {
        self.order.iter().position(|&i| self.members[i].id == id)
    }

    /// Any registered member by id, sorted or not.
    pub fn find_mut(&mut self, id: ObjectId) -> Option<&mut Manipulator> {
        self.members.iter_mut().find(|m| m.id == id)
    }

    /// Members in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &Manipulator> + '_ {
        self.order.iter().map(move |&i| &self.members[i])
    }

    /// Engine type and shape class of each sorted member.
    #[must_use]
    pub fn sorted_types(&self) -> Vec<(ManipulatorType, Option<ShapeClass>)> {
        self.iter().map(|m| (m.manipulator_type(), m.shape_class())).collect()
    }

    /// Sorted length.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether nothing is in the sorted order.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Registered members, including excluded ones.
    #[must_use]
    pub fn registered(&self) -> usize {
        self.members.len()
    }

    /// Sort and validation rules.
    #[must_use]
    pub fn policy(&self) -> SortPolicy {
        self.policy
    }

    /// Rejects further `add`/`remove`.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    /// Allows `add`/`remove` again.
    pub fn unfreeze(&mut self) {
        self.frozen = false;
    }

    /// Whether mutations are currently rejected.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Drops every member and unfreezes.
    pub fn clear(&mut self) {
        self.members.clear();
        self.order.clear();
        self.frozen = false;
    }
}
