//! Decoded engine feedback stored on each manipulator.

use glam::Vec3;

/// What the engine last reported about one manipulator.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum ManipulatorFeedback {
    /// Nothing reported (or nothing to report for this kind).
    #[default]
    None,
    /// Emitter particle counts.
    Emitter {
        /// Particles created during the last tick.
        created_this_tick: i32,
        /// Particles created since the last clear.
        created_total: i64,
    },
    /// Void particle counts.
    Void {
        /// Particles deleted during the last tick.
        deleted_this_tick: i32,
        /// Particles deleted since the last clear.
        deleted_total: i64,
    },
    /// Detector reading.
    Detector(DetectorReading),
    /// Reaction on a collider, already scaled by the interaction strength.
    Collider {
        /// Accumulated force.
        force: Vec3,
        /// Accumulated torque.
        torque: Vec3,
    },
}

/// Detector reading; the shape depends on the engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DetectorReading {
    /// Liquid: particle count and their world-space bounds. Bounds are zero
    /// when the detector is empty.
    Particles {
        /// Particles inside the detector.
        inside: i32,
        /// World-space min corner.
        bbox_min: Vec3,
        /// World-space max corner.
        bbox_max: Vec3,
    },
    /// Smoke: light emitted by fire inside the detector.
    Illumination {
        /// Emitted light color, scaled by fire brightness.
        illumination: Vec3,
        /// Light-weighted center.
        center: Vec3,
        /// Mean fuel.
        fuel: f32,
        /// Mean temperature.
        temperature: f32,
        /// Mean smoke density.
        smoke_density: f32,
    },
}

impl ManipulatorFeedback {
    /// Running emitter total, 0 for other feedback.
    #[must_use]
    pub fn created_total(&self) -> i64 {
        match self {
            Self::Emitter { created_total, .. } => *created_total,
            _ => 0,
        }
    }

    /// Running void total, 0 for other feedback.
    #[must_use]
    pub fn deleted_total(&self) -> i64 {
        match self {
            Self::Void { deleted_total, .. } => *deleted_total,
            _ => 0,
        }
    }
}
