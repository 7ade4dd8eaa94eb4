//! # Simulation
//!
//! One simulation instance: its registry, its atlases and its tick loop.
//!
//! ## Lifecycle
//!
//! ```text
//! new ──> add/remove ──> initialize ──> tick ─> read_feedback ─┐
//!                            │            ^                     │
//!                            │            └─────────────────────┘
//!                            └──> release ──> add/remove ...
//! ```
//!
//! `initialize` validates and sorts the registry, computes the type ranges,
//! packs the neural and heightmap atlases and freezes the registry. While
//! frozen, `add`/`remove` are logged and ignored, and in-place edits may not
//! change what the engine resources were built for. `release` hands the
//! registry back for editing.

use std::sync::Arc;

use tracing::{info, warn};

use crate::atlas::{AssetLibrary, HeightmapAtlasLayout, NeuralAsset, NeuralAtlasPacker, PackedAtlas};
use crate::config::SimulationConfig;
use crate::error::{CoreError, CoreResult};
use crate::interop::{FrameAssembler, InteropFrame};
use crate::mailbox::FeedbackMailbox;
use crate::manipulator::payload::PayloadContext;
use crate::manipulator::{Manipulator, ManipulatorType, ObjectId};
use crate::ranges::TypeRangeTable;
use crate::registry::{ManipulatorRegistry, MutationOutcome, RebuildReport, SortPolicy};
use crate::shape::{ShapeDescriptorBuilder, ShapeGeometry};
use crate::stats::StatisticsDecoder;

/// What `initialize` did.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InitReport {
    /// Registry validation result.
    pub rebuild: RebuildReport,
    /// Distinct neural assets packed.
    pub neural_assets: usize,
    /// Heightmaps in the heightmap atlas.
    pub heightmaps: usize,
    /// Whether anything emits.
    pub has_emitter: bool,
    /// Atlas bytes once uploaded.
    pub vram_footprint: usize,
}

/// One simulation instance.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    registry: ManipulatorRegistry,
    ranges: TypeRangeTable,
    decoder: StatisticsDecoder,
    atlas: PackedAtlas,
    assets: Vec<Arc<NeuralAsset>>,
    heightmaps: HeightmapAtlasLayout,
    heightmap_indices: Vec<u32>,
    heightmap_texels: Vec<f32>,
    assembler: FrameAssembler,
    session: u64,
    tick: u64,
    initialized: bool,
}

impl Simulation {
    /// Uninitialized simulation.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if `config` does not validate.
    pub fn new(config: SimulationConfig) -> CoreResult<Self> {
        config.validate()?;
        Ok(Self {
            registry: ManipulatorRegistry::new(SortPolicy::from_config(&config)),
            ranges: TypeRangeTable::default(),
            decoder: StatisticsDecoder::from_config(&config),
            atlas: PackedAtlas::empty(),
            assets: Vec::new(),
            heightmaps: HeightmapAtlasLayout::new(0, config.heightmap_resolution),
            heightmap_indices: Vec::new(),
            heightmap_texels: Vec::new(),
            assembler: FrameAssembler::new(),
            session: 0,
            tick: 0,
            initialized: false,
            config,
        })
    }

    /// Registers a manipulator.
    pub fn add(&mut self, manipulator: Manipulator) -> MutationOutcome {
        self.registry.add(manipulator)
    }

    /// Deregisters a manipulator.
    pub fn remove(&mut self, id: ObjectId) -> MutationOutcome {
        self.registry.remove(id)
    }

    /// Whether `id` is registered.
    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.registry.contains(id)
    }

    /// Validates, sorts, packs and freezes.
    ///
    /// # Errors
    ///
    /// - [`CoreError::AlreadyInitialized`] if called twice without `release`.
    /// - [`CoreError::AssetResolution`] if a neural asset does not fit a block.
    pub fn initialize(&mut self, library: &AssetLibrary) -> CoreResult<InitReport> {
        if self.initialized {
            return Err(CoreError::AlreadyInitialized);
        }

        let rebuild = self.registry.rebuild();
        self.ranges = TypeRangeTable::compute_ranges(&self.registry.sorted_types());

        let mut packer = NeuralAtlasPacker::new();
        let mut assets = Vec::new();
        for manipulator in self.registry.iter() {
            let Some(shape) = manipulator.shape.as_ref() else { continue };
            for asset in shape.neural_assets() {
                let shared = library.share(asset);
                if packer.slot_of(shared.hash()).is_none() {
                    packer.register_asset(&shared)?;
                    assets.push(shared);
                }
            }
        }
        self.atlas = packer.finalize_layout();
        self.assets = assets;

        self.layout_heightmaps();

        self.registry.freeze();
        self.assembler.reset();
        self.session += 1;
        self.tick = 0;
        self.initialized = true;

        let has_emitter = self.has_emitter();
        if !has_emitter {
            warn!(phenomenon = ?self.config.phenomenon, "simulation has no emitter");
        }

        let report = InitReport {
            rebuild,
            neural_assets: self.atlas.slot_count(),
            heightmaps: self.heightmaps.count as usize,
            has_emitter,
            vram_footprint: self.atlas.vram_footprint() + self.heightmaps.byte_size(),
        };
        info!(
            manipulators = self.registry.len(),
            neural_assets = report.neural_assets,
            heightmaps = report.heightmaps,
            "simulation initialized"
        );
        Ok(report)
    }

    fn layout_heightmaps(&mut self) {
        let mut next = 0u32;
        self.heightmap_indices = self
            .registry
            .iter()
            .map(|m| {
                let index = next;
                if m.manipulator_type() == ManipulatorType::HeightmapCollider {
                    next += 1;
                }
                index
            })
            .collect();

        self.heightmaps = HeightmapAtlasLayout::new(next, self.config.heightmap_resolution);
        self.heightmap_texels = self.heightmaps.allocate();
        for (manipulator, &index) in self.registry.iter().zip(&self.heightmap_indices) {
            if let Some(ShapeGeometry::Heightmap(Some(terrain))) =
                manipulator.shape.as_ref().map(|s| &s.geometry)
            {
                self.heightmaps.blit(&mut self.heightmap_texels, index, terrain);
            }
        }
    }

    /// Builds the engine input for the next tick.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotInitialized`] before `initialize`.
    /// - Descriptor errors from [`FrameAssembler::assemble`].
    pub fn tick(&mut self, delta_time: f32) -> CoreResult<InteropFrame> {
        if !self.initialized {
            return Err(CoreError::NotInitialized);
        }
        self.tick += 1;
        let builder =
            ShapeDescriptorBuilder::new(&self.atlas, &self.heightmaps, self.config.neural_padding);
        let payload = PayloadContext::new(&self.config, delta_time);
        self.assembler.assemble(
            self.tick,
            &self.registry,
            &self.ranges,
            &builder,
            &self.heightmap_indices,
            &payload,
        )
    }

    /// Reads this tick's feedback and applies it. With an empty registry the
    /// buffer is drained and dropped, and a missing buffer is not an error.
    ///
    /// # Errors
    ///
    /// - [`CoreError::NotInitialized`] before `initialize`.
    /// - Mailbox errors ([`CoreError::FeedbackAlreadyRead`],
    ///   [`CoreError::FeedbackUnavailable`]).
    /// - [`CoreError::FeedbackTooShort`] for a truncated buffer.
    pub fn read_feedback(&mut self, mailbox: &mut FeedbackMailbox) -> CoreResult<()> {
        if !self.initialized {
            return Err(CoreError::NotInitialized);
        }
        match mailbox.take(self.session, self.tick) {
            Ok(_) | Err(CoreError::FeedbackUnavailable) if self.registry.is_empty() => Ok(()),
            Ok(stats) => self.decoder.decode(&stats, &mut self.registry),
            Err(e) => Err(e),
        }
    }

    /// Whether any sorted member emits material. Texture emitters only
    /// reach the sorted order in the smoke engine.
    #[must_use]
    pub fn has_emitter(&self) -> bool {
        self.registry.iter().any(|m| {
            matches!(m.manipulator_type(), ManipulatorType::Emitter | ManipulatorType::TextureEmitter)
        })
    }

    /// Length of the feedback buffer the engine must publish.
    #[must_use]
    pub fn stats_buffer_len(&self) -> usize {
        (self.config.stats_per_record * self.registry.len()).max(1)
    }

    /// Hands the registry back for editing. Atlases stay until the next
    /// `initialize`.
    pub fn release(&mut self) {
        self.registry.unfreeze();
        self.initialized = false;
    }

    /// Drops every manipulator, atlas and counter.
    pub fn clear(&mut self) {
        self.registry.clear();
        self.ranges = TypeRangeTable::default();
        self.atlas = PackedAtlas::empty();
        self.assets.clear();
        self.heightmaps = HeightmapAtlasLayout::new(0, self.config.heightmap_resolution);
        self.heightmap_indices.clear();
        self.heightmap_texels.clear();
        self.assembler.reset();
        self.tick = 0;
        self.initialized = false;
    }

    /// Registered manipulator by id.
    #[must_use]
    pub fn manipulator(&self, id: ObjectId) -> Option<&Manipulator> {
        self.registry.position(id).and_then(|i| self.registry.get(i))
    }

    /// Edits a registered manipulator in place.
    ///
    /// While initialized, an edit may move the manipulator, retune its
    /// parameters or toggle it, but must keep its id, type, shape class and
    /// packed neural assets. Any other edit is rolled back.
    ///
    /// # Errors
    ///
    /// - [`CoreError::UnknownManipulator`] if `id` is not registered.
    /// - [`CoreError::LayoutChangedWhileFrozen`] if the edit was rolled back.
    pub fn update_manipulator(
        &mut self,
        id: ObjectId,
        edit: impl FnOnce(&mut Manipulator),
    ) -> CoreResult<()> {
        let manipulator =
            self.registry.find_mut(id).ok_or(CoreError::UnknownManipulator { id: id.raw() })?;
        if !self.initialized {
            edit(manipulator);
            return Ok(());
        }

        let before = manipulator.clone();
        edit(manipulator);
        let atlas = &self.atlas;
        let packed = manipulator.shape.as_ref().map_or(true, |shape| {
            shape.neural_assets().iter().all(|asset| atlas.slot_of(asset.hash()).is_ok())
        });
        if packed
            && manipulator.id == before.id
            && manipulator.manipulator_type() == before.manipulator_type()
            && manipulator.shape_class() == before.shape_class()
        {
            return Ok(());
        }

        warn!(%id, "edit changes engine layout while initialized, rolled back");
        *manipulator = before;
        Err(CoreError::LayoutChangedWhileFrozen { id: id.raw() })
    }

    /// Registry.
    #[must_use]
    pub fn registry(&self) -> &ManipulatorRegistry {
        &self.registry
    }

    /// Type ranges computed at `initialize`.
    #[must_use]
    pub fn type_ranges(&self) -> &TypeRangeTable {
        &self.ranges
    }

    /// Packed neural atlases.
    #[must_use]
    pub fn neural_atlas(&self) -> &PackedAtlas {
        &self.atlas
    }

    /// Heightmap atlas layout.
    #[must_use]
    pub fn heightmap_layout(&self) -> &HeightmapAtlasLayout {
        &self.heightmaps
    }

    /// Heightmap atlas texels, row-major.
    #[must_use]
    pub fn heightmap_texels(&self) -> &[f32] {
        &self.heightmap_texels
    }

    /// Configuration.
    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Ticks since `initialize`.
    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    /// Whether `initialize` ran and `release` has not.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}
