//! # Statistics Decoder
//!
//! Routes the engine's flat feedback buffer back onto manipulators.
//!
//! Record `i` of the sorted registry owns `flat[i * S..(i + 1) * S]`, where
//! `S` is the engine's stats-per-record. Slot meanings by type:
//!
//! | Type | Slots |
//! |------|-------|
//! | Emitter | 0: particles created this tick |
//! | Void | 0: particles deleted this tick |
//! | Detector (liquid) | 0: count, 1-3: inverted grid min, 4-6: grid max |
//! | Detector (smoke) | 0-2: illumination, 3-5: center + 10, 6: fuel, 7: temperature, 8: smoke |
//! | Analytic / neural collider | 0-2: force, 3-5: torque |
//!
//! Counts are plain integers; everything else is [`crate::fixed_point`].

use glam::Vec3;
use vortex_shared::constants::DETECTOR_ILLUMINATION_CENTER_OFFSET;
use vortex_shared::Phenomenon;

use crate::config::{min_stats_per_record, SimulationConfig, SimulationVolume};
use crate::error::{CoreError, CoreResult};
use crate::fixed_point::{decode_grid_corner, decode_vec3, int_to_float};
use crate::manipulator::{DetectorReading, ManipulatorFeedback, ManipulatorType};
use crate::registry::ManipulatorRegistry;

/// Decodes feedback for one simulation instance.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatisticsDecoder {
    phenomenon: Phenomenon,
    stats_per_record: usize,
    volume: SimulationVolume,
    force_scale: f32,
    illumination_scale: f32,
}

impl StatisticsDecoder {
    /// Decoder for a simulation config.
    #[must_use]
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            phenomenon: config.phenomenon,
            stats_per_record: config.stats_per_record,
            volume: config.volume,
            force_scale: (4.0 * config.force_interaction_strength).exp(),
            illumination_scale: config.fire_brightness + config.black_body_brightness,
        }
    }

    /// Values per record.
    #[must_use]
    pub fn stats_per_record(&self) -> usize {
        self.stats_per_record
    }

    /// Applies one feedback buffer to every sorted member.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::FeedbackTooShort`] if `flat` holds fewer than
    /// `len * stats_per_record` values. Nothing is updated in that case.
    pub fn decode(&self, flat: &[i32], registry: &mut ManipulatorRegistry) -> CoreResult<()> {
        let expected = registry.len() * self.stats_per_record;
        if flat.len() < expected {
            return Err(CoreError::FeedbackTooShort { expected, actual: flat.len() });
        }

        for (index, window) in flat.chunks_exact(self.stats_per_record).take(registry.len()).enumerate()
        {
            if let Some(manipulator) = registry.get_mut(index) {
                let ty = manipulator.manipulator_type();
                if let Some(feedback) = self.decode_record(ty, window, &manipulator.feedback) {
                    manipulator.feedback = feedback;
                }
            }
        }
        Ok(())
    }

    /// Interprets one window. `None` for types without feedback and for
    /// windows shorter than the engine's record.
    #[must_use]
    pub fn decode_record(
        &self,
        ty: ManipulatorType,
        window: &[i32],
        previous: &ManipulatorFeedback,
    ) -> Option<ManipulatorFeedback> {
        if window.len() < min_stats_per_record(self.phenomenon) {
            return None;
        }
        match ty {
            ManipulatorType::Emitter => Some(ManipulatorFeedback::Emitter {
                created_this_tick: window[0],
                created_total: previous.created_total() + i64::from(window[0]),
            }),
            ManipulatorType::Void => Some(ManipulatorFeedback::Void {
                deleted_this_tick: window[0],
                deleted_total: previous.deleted_total() + i64::from(window[0]),
            }),
            ManipulatorType::Detector => Some(ManipulatorFeedback::Detector(self.detector(window))),
            ManipulatorType::AnalyticCollider | ManipulatorType::NeuralCollider => {
                Some(ManipulatorFeedback::Collider {
                    force: decode_vec3(&window[0..3]) * self.force_scale,
                    torque: decode_vec3(&window[3..6]) * self.force_scale,
                })
            }
            _ => None,
        }
    }

    fn detector(&self, window: &[i32]) -> DetectorReading {
        match self.phenomenon {
            Phenomenon::Liquid => {
                let inside = window[0];
                let (bbox_min, bbox_max) = if inside > 0 {
                    let grid = self.volume.grid_size;
                    (
                        self.volume.grid_to_world(decode_grid_corner(&window[1..4], grid, true)),
                        self.volume.grid_to_world(decode_grid_corner(&window[4..7], grid, false)),
                    )
                } else {
                    (Vec3::ZERO, Vec3::ZERO)
                };
                DetectorReading::Particles { inside, bbox_min, bbox_max }
            }
            Phenomenon::SmokeAndFire => DetectorReading::Illumination {
                illumination: decode_vec3(&window[0..3]) * self.illumination_scale,
                center: decode_vec3(&window[3..6]) - DETECTOR_ILLUMINATION_CENTER_OFFSET,
                fuel: int_to_float(window[6]),
                temperature: int_to_float(window[7]),
                smoke_density: int_to_float(window[8]),
            },
        }
    }
}
