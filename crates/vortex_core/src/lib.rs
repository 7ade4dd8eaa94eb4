//! # VORTEX Core
//!
//! Prepares scene manipulators for an external simulation engine and routes
//! the engine's feedback back onto them:
//! - dedup, validate and stably sort manipulators into type ranges
//! - turn every shape into a fixed-layout SDF descriptor each tick
//! - pack neural SDF assets into two cubic atlases
//! - decode the fixed-point statistics buffer once per tick
//!
//! ## Architecture Rules
//!
//! 1. **Single control thread** - nothing here blocks or spawns
//! 2. **Order is a contract** - the engine indexes by sorted position
//! 3. **Frozen while running** - structural edits wait for `release`
//!
//! ## Example
//!
//! ```rust,ignore
//! use vortex_core::{AssetLibrary, Simulation, SimulationConfig, feedback_channel};
//!
//! let mut sim = Simulation::new(SimulationConfig::liquid())?;
//! let _ = sim.add(emitter);
//! sim.initialize(&AssetLibrary::new())?;
//!
//! let (engine, mut mailbox) = feedback_channel();
//! let frame = sim.tick(1.0)?;
//! // engine consumes frame, then publishes sim.stats_buffer_len() values
//! sim.read_feedback(&mut mailbox)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod atlas;
pub mod config;
pub mod error;
pub mod fixed_point;
pub mod hash;
pub mod interop;
pub mod mailbox;
pub mod manipulator;
pub mod ranges;
pub mod registry;
pub mod shape;
pub mod simulation;
pub mod stats;

pub use atlas::{AssetCorrection, AssetLibrary, HeightmapAtlasLayout, NeuralAsset, NeuralAtlasPacker, PackedAtlas};
pub use config::{EmissionSettings, SimulationConfig, SimulationVolume};
pub use error::{CoreError, CoreResult};
pub use hash::ContentHash;
pub use interop::{FrameAssembler, IndicesBuffer, InteropFrame, SdfBuffer};
pub use mailbox::{feedback_channel, FeedbackMailbox, FeedbackPublisher};
pub use manipulator::{
    DetectorReading, InteractionMode, Manipulator, ManipulatorFeedback, ManipulatorKind,
    ManipulatorType, ObjectId,
};
pub use ranges::TypeRangeTable;
pub use registry::{Exclusion, ManipulatorRegistry, MutationOutcome, RebuildReport, SortPolicy};
pub use shape::{Primitive, SdfDescriptor, SdfKind, Shape, ShapeDescriptorBuilder, Terrain};
pub use simulation::{InitReport, Simulation};
pub use stats::StatisticsDecoder;
