//! Per-kind payload encoding.
//!
//! Each kind packs its parameters into the two opaque vectors of a
//! [`ManipulatorParam`]. The descriptor index (`sdf_object_id`) is filled
//! in by the interop pass, not here.

use glam::Vec3;
use vortex_shared::constants::DEFAULT_SIMULATION_TIME_SCALE;
use vortex_shared::{ManipulatorParam, Phenomenon};

use super::kind::{
    EffectParticleEmitterParams, EmitterParams, ForceFieldParams, ForceFieldType, ManipulatorKind,
    SpeciesModifierParams, TextureEmitterParams, VoidParams,
};
use super::Manipulator;
use crate::config::{EmissionSettings, SimulationConfig};

/// Squared color magnitude below which a smoke emitter falls back to white.
const MIN_COLOR_SQUARED: f32 = 0.001;

/// Inputs shared by every payload encoder for one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PayloadContext {
    /// Target engine.
    pub phenomenon: Phenomenon,
    /// Smoke engine is in fire mode.
    pub fire_mode: bool,
    /// Tick length in simulation time.
    pub delta_time: f32,
    /// Emission inputs.
    pub emission: EmissionSettings,
}

impl PayloadContext {
    /// Context for one tick of `config`.
    #[must_use]
    pub fn new(config: &SimulationConfig, delta_time: f32) -> Self {
        Self {
            phenomenon: config.phenomenon,
            fire_mode: config.fire_mode,
            delta_time,
            emission: config.emission,
        }
    }
}

/// Encodes one manipulator's record, leaving `sdf_object_id` at 0.
#[must_use]
pub fn encode(manipulator: &Manipulator, ctx: &PayloadContext) -> ManipulatorParam {
    let mut param = ManipulatorParam {
        enabled: i32::from(manipulator.enabled),
        particle_species: manipulator.interaction.encode(),
        ..ManipulatorParam::default()
    };
    let rotate = |v: Vec3| manipulator.transform.rotate(v);

    match &manipulator.kind {
        ManipulatorKind::Emitter(params) => encode_emitter(&mut param, params, manipulator, ctx),
        ManipulatorKind::Void(params) => encode_void(&mut param, params, ctx),
        ManipulatorKind::ForceField(params) => encode_force_field(&mut param, params, ctx),
        ManipulatorKind::Collider(params) => {
            param.additional_data0 = [0.0, 0.0, 0.0, params.friction];
        }
        ManipulatorKind::Detector => {}
        ManipulatorKind::SpeciesModifier(SpeciesModifierParams { target_species, probability }) => {
            #[allow(clippy::cast_precision_loss)]
            let target = *target_species as f32;
            param.additional_data0 = [0.0, target, *probability, 0.0];
        }
        ManipulatorKind::TextureEmitter(TextureEmitterParams { initial_velocity, use_object_velocity }) => {
            let v = rotate(*initial_velocity);
            param.additional_data0 = [0.0, v.x, v.y, v.z];
            param.additional_data1 = [0.0, 0.0, 0.0, flag(*use_object_velocity)];
        }
        ManipulatorKind::EffectParticleEmitter(params) => encode_effect_particles(&mut param, params),
    }
    param
}

fn encode_emitter(
    param: &mut ManipulatorParam,
    params: &EmitterParams,
    manipulator: &Manipulator,
    ctx: &PayloadContext,
) {
    let v = manipulator.transform.rotate(params.initial_velocity);
    match ctx.phenomenon {
        Phenomenon::Liquid => {
            let node_volume = ctx.emission.node_size.powi(3);
            let per_time =
                params.volume_per_sim_time / node_volume * ctx.emission.particle_density;
            param.additional_data0 = [(per_time * ctx.delta_time).floor(), v.x, v.y, v.z];
            // Emitters spawn one species; the engine wants the raw index.
            #[allow(clippy::cast_possible_wrap)]
            let species = manipulator.interaction.species() as i32;
            param.particle_species = species;
        }
        Phenomenon::SmokeAndFire => {
            param.additional_data0 = [0.0, v.x, v.y, v.z];
            let object_velocity = flag(params.use_object_velocity);
            param.additional_data1 = if ctx.fire_mode {
                [params.smoke_density, params.fuel, params.temperature, object_velocity]
            } else {
                let color = if params.smoke_color.length_squared() < MIN_COLOR_SQUARED {
                    Vec3::ONE
                } else {
                    params.smoke_color
                };
                let c = color.normalize() * params.smoke_density;
                [c.x, c.y, c.z, object_velocity]
            };
        }
    }
}

fn encode_void(param: &mut ManipulatorParam, params: &VoidParams, ctx: &PayloadContext) {
    match ctx.phenomenon {
        Phenomenon::Liquid => {
            let time_scale = ctx.emission.simulation_time_scale;
            let real_seconds = ctx.delta_time / time_scale;
            let scale_difference = DEFAULT_SIMULATION_TIME_SCALE / time_scale;
            let per_tick =
                1.0 - (1.0 - params.delete_percentage).powf(real_seconds * scale_difference);
            param.additional_data0[0] = per_tick;
        }
        Phenomenon::SmokeAndFire => {
            param.additional_data0 =
                [params.color_decay, params.velocity_decay, params.pressure, 0.0];
        }
    }
}

fn encode_force_field(param: &mut ManipulatorParam, params: &ForceFieldParams, ctx: &PayloadContext) {
    // Unsupported field types are rejected at registry rebuild.
    let code = f32::from(params.field.wire_code(ctx.phenomenon).unwrap_or(0));
    let d = params.direction;
    match ctx.phenomenon {
        Phenomenon::Liquid => {
            param.additional_data0 =
                [code, params.strength, params.distance_decay, params.distance_offset];
            param.additional_data1 = [d.x, d.y, d.z, flag(params.disable_inside)];
        }
        Phenomenon::SmokeAndFire => {
            param.additional_data0 = [code, params.strength, params.speed, 0.0];
            param.additional_data1 = if params.field == ForceFieldType::Random {
                [params.random_scale, 0.0, 0.0, 0.0]
            } else {
                [d.x, d.y, d.z, 0.0]
            };
        }
    }
}

fn encode_effect_particles(param: &mut ManipulatorParam, params: &EffectParticleEmitterParams) {
    #[allow(clippy::cast_precision_loss)]
    let render_mode = params.render_mode as f32;
    param.additional_data0 =
        [params.particles_per_frame, render_mode, params.motion_blur, params.brightness];
    param.additional_data1 = [
        params.color_oscillation_amount,
        params.color_oscillation_frequency,
        params.size_oscillation_amount,
        params.size_oscillation_frequency,
    ];
}

fn flag(value: bool) -> f32 {
    if value {
        1.0
    } else {
        0.0
    }
}
