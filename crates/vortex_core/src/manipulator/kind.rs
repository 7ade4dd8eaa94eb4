//! Kind-specific manipulator parameters.
//!
//! Emitter, void and force-field parameters cover both engines; each engine
//! reads only its own fields when the payload is encoded.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use vortex_shared::Phenomenon;

/// Closed set of manipulator kinds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ManipulatorKind {
    /// Adds material.
    Emitter(EmitterParams),
    /// Removes material.
    Void(VoidParams),
    /// Applies a force field.
    ForceField(ForceFieldParams),
    /// Solid obstacle; its engine type depends on its shape.
    Collider(ColliderParams),
    /// Observes its region.
    Detector,
    /// Converts particles between species.
    SpeciesModifier(SpeciesModifierParams),
    /// Emits from a 3D texture.
    TextureEmitter(TextureEmitterParams),
    /// Spawns render-only effect particles.
    EffectParticleEmitter(EffectParticleEmitterParams),
}

/// Emitter parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterParams {
    /// Liquid: volume emitted per unit of simulation time.
    pub volume_per_sim_time: f32,
    /// Initial velocity in the emitter's local frame.
    pub initial_velocity: Vec3,
    /// Smoke: tint, normalized before use.
    pub smoke_color: Vec3,
    /// Smoke: density of emitted smoke.
    pub smoke_density: f32,
    /// Smoke: fuel emitted in fire mode.
    pub fuel: f32,
    /// Smoke: temperature of emitted material in fire mode.
    pub temperature: f32,
    /// Smoke: inherit the emitter's own velocity.
    pub use_object_velocity: bool,
}

impl Default for EmitterParams {
    fn default() -> Self {
        Self {
            volume_per_sim_time: 0.125,
            initial_velocity: Vec3::ZERO,
            smoke_color: Vec3::ONE,
            smoke_density: 0.0,
            fuel: 0.2,
            temperature: 0.4,
            use_object_velocity: true,
        }
    }
}

/// Void parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoidParams {
    /// Liquid: fraction of particles deleted per default-time-scale unit.
    pub delete_percentage: f32,
    /// Smoke: density kept per iteration.
    pub color_decay: f32,
    /// Smoke: velocity kept per iteration.
    pub velocity_decay: f32,
    /// Smoke: pressure added to the region.
    pub pressure: f32,
}

impl Default for VoidParams {
    fn default() -> Self {
        Self { delete_percentage: 1.0, color_decay: 0.95, velocity_decay: 0.95, pressure: -0.05 }
    }
}

/// Force field falloff model.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ForceFieldType {
    /// Pushes away from the shape (liquid only).
    #[default]
    Radial,
    /// Pushes along a direction.
    Directional,
    /// Swirls around the shape.
    Swirl,
    /// Noise-driven swirls (smoke only).
    Random,
}

impl ForceFieldType {
    /// Engine code, or `None` if the engine has no such field.
    #[must_use]
    pub const fn wire_code(self, phenomenon: Phenomenon) -> Option<u8> {
        match (phenomenon, self) {
            (Phenomenon::Liquid, Self::Radial) => Some(0),
            (Phenomenon::Liquid, Self::Directional) | (Phenomenon::SmokeAndFire, Self::Swirl) => {
                Some(1)
            }
            (Phenomenon::Liquid, Self::Swirl) | (Phenomenon::SmokeAndFire, Self::Random) => Some(2),
            (Phenomenon::SmokeAndFire, Self::Directional) => Some(0),
            (Phenomenon::Liquid, Self::Random) | (Phenomenon::SmokeAndFire, Self::Radial) => None,
        }
    }
}

/// Force field parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForceFieldParams {
    /// Falloff model.
    pub field: ForceFieldType,
    /// Force magnitude.
    pub strength: f32,
    /// Liquid: falloff with distance.
    pub distance_decay: f32,
    /// Liquid: distance before falloff starts.
    pub distance_offset: f32,
    /// Direction for directional fields, local frame.
    pub direction: Vec3,
    /// Liquid: no force inside the shape.
    pub disable_inside: bool,
    /// Smoke: noise animation speed.
    pub speed: f32,
    /// Smoke: noise feature size for random fields.
    pub random_scale: f32,
}

impl Default for ForceFieldParams {
    fn default() -> Self {
        Self {
            field: ForceFieldType::Radial,
            strength: 1.0,
            distance_decay: 1.0,
            distance_offset: 0.0,
            direction: Vec3::Y,
            disable_inside: true,
            speed: 1.0,
            random_scale: 16.0,
        }
    }
}

/// Collider parameters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColliderParams {
    /// Surface friction.
    pub friction: f32,
}

/// Species modifier parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeciesModifierParams {
    /// Species particles are converted to.
    pub target_species: u32,
    /// Conversion probability per tick.
    pub probability: f32,
}

impl Default for SpeciesModifierParams {
    fn default() -> Self {
        Self { target_species: 0, probability: 1.0 }
    }
}

/// Texture emitter parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureEmitterParams {
    /// Initial velocity in the emitter's local frame.
    pub initial_velocity: Vec3,
    /// Inherit the emitter's own velocity.
    pub use_object_velocity: bool,
}

impl Default for TextureEmitterParams {
    fn default() -> Self {
        Self { initial_velocity: Vec3::Y, use_object_velocity: true }
    }
}

/// Effect particle emitter parameters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectParticleEmitterParams {
    /// Particles spawned per frame.
    pub particles_per_frame: f32,
    /// Engine render mode code.
    pub render_mode: u32,
    /// Motion blur amount.
    pub motion_blur: f32,
    /// Brightness multiplier.
    pub brightness: f32,
    /// Color oscillation amplitude.
    pub color_oscillation_amount: f32,
    /// Color oscillation frequency.
    pub color_oscillation_frequency: f32,
    /// Size oscillation amplitude.
    pub size_oscillation_amount: f32,
    /// Size oscillation frequency.
    pub size_oscillation_frequency: f32,
}

impl Default for EffectParticleEmitterParams {
    fn default() -> Self {
        Self {
            particles_per_frame: 1.0,
            render_mode: 0,
            motion_blur: 1.0,
            brightness: 1.0,
            color_oscillation_amount: 0.0,
            color_oscillation_frequency: 0.0,
            size_oscillation_amount: 0.0,
            size_oscillation_frequency: 0.0,
        }
    }
}
