//! # Engine Contract Constants
//!
//! Block geometry, fixed-point scale and per-phenomenon defaults the
//! simulation engine was compiled against.
//!
//! **CRITICAL:** These values are baked into the engine's compute kernels.
//! Changing any of them without an engine rebuild corrupts the atlases.

// =============================================================================
// NEURAL SDF ATLAS GEOMETRY
// =============================================================================

/// Side length, in cells, of one coarse distance-grid block.
pub const COARSE_BLOCK_DIM: u32 = 32;

/// Side length, in cells, of one embedding-grid block.
pub const EMBED_BLOCK_DIM: u32 = 21;

/// Embedding blocks per neural asset (one per packed channel group).
pub const EMBEDDING_CHANNELS: u32 = 4;

/// Latent vector length of one embedding cell before packing.
pub const EMBEDDING_BASE_SIZE: u32 = 16;

/// Bytes per coarse atlas cell (two interleaved channels).
pub const COARSE_BYTES_PER_CELL: usize = 2;

/// Bytes per embedding atlas cell (RGBA).
pub const EMBED_BYTES_PER_CELL: usize = 4;

/// GPU bytes consumed by one neural asset once packed.
pub const NEURAL_SDF_VRAM_FOOTPRINT: usize = (EMBED_BLOCK_DIM as usize).pow(3)
    * EMBED_BYTES_PER_CELL
    * EMBEDDING_CHANNELS as usize
    + (COARSE_BLOCK_DIM as usize).pow(3) * COARSE_BYTES_PER_CELL;

// =============================================================================
// HEIGHTMAP ATLAS
// =============================================================================

/// Default per-terrain tile resolution in the heightmap atlas.
pub const DEFAULT_HEIGHTMAP_RESOLUTION: u32 = 256;

/// Bytes per heightmap atlas texel (half float).
pub const HEIGHTMAP_BYTES_PER_TEXEL: usize = 2;

// =============================================================================
// FIXED-POINT STATISTICS
// =============================================================================

/// Largest magnitude representable by the statistics fixed-point code.
pub const F2I_MAX_VALUE: f32 = 5000.0;

/// Statistics slots per manipulator in the liquid engine.
pub const LIQUID_STATS_PER_RECORD: usize = 8;

/// Statistics slots per manipulator in the smoke & fire engine.
pub const SMOKE_STATS_PER_RECORD: usize = 12;

/// Offset the smoke engine adds to illumination centers before encoding.
pub const DETECTOR_ILLUMINATION_CENTER_OFFSET: f32 = 10.0;

// =============================================================================
// SHAPE DESCRIPTORS
// =============================================================================

/// Normal smoothing radius written into every descriptor.
pub const NORMAL_SMOOTH: f32 = 0.01;

/// Smallest per-axis scale allowed for a neural shape.
pub const MIN_AXIS_SCALE: f32 = 1e-3;

/// Bounding-box padding the liquid engine's neural assets were baked with.
pub const LIQUID_NEURAL_PADDING: f32 = 0.05;

/// Bounding-box padding the smoke engine's neural assets were baked with.
pub const SMOKE_NEURAL_PADDING: f32 = 0.1;

// =============================================================================
// EMISSION
// =============================================================================

/// Simulation time scale the void decay formula is normalized to.
pub const DEFAULT_SIMULATION_TIME_SCALE: f32 = 40.0;
