//! # Neural Atlas Packer
//!
//! Assigns every distinct neural asset a dense slot and writes its two grids
//! into block-aligned positions of two cubic atlases.
//!
//! ## Block addressing
//!
//! - coarse atlas: slot `s` occupies block `s`
//! - embedding atlas: slot `s` occupies blocks `s * 4 .. s * 4 + 4`, one per
//!   channel group
//!
//! Block `b` sits at `block_dim * (b % B, (b / B) % B, b / B²)` where `B` is
//! the atlas's blocks per axis. Slots are assigned in registration order and
//! never change for the packer's lifetime.

use std::collections::HashMap;
use std::sync::Arc;

use glam::UVec3;
use tracing::{debug, info};
use vortex_shared::constants::{
    COARSE_BLOCK_DIM, COARSE_BYTES_PER_CELL, EMBEDDING_CHANNELS, EMBED_BLOCK_DIM,
    EMBED_BYTES_PER_CELL, NEURAL_SDF_VRAM_FOOTPRINT,
};

use super::asset::NeuralAsset;
use super::layout::AtlasLayout;
use crate::error::{CoreError, CoreResult};
use crate::hash::ContentHash;

/// Collects assets before the atlas size is known.
#[derive(Debug, Default)]
pub struct NeuralAtlasPacker {
    slots: HashMap<ContentHash, u32>,
    assets: Vec<Arc<NeuralAsset>>,
    coarse_blocks: u32,
    embedding_blocks: u32,
}

impl NeuralAtlasPacker {
    /// Empty packer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an asset and returns its slot.
    ///
    /// Content already registered returns the existing slot and does not
    /// grow the atlas.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AssetResolution`] if either grid is empty or
    /// larger than one block.
    pub fn register_asset(&mut self, asset: &Arc<NeuralAsset>) -> CoreResult<u32> {
        let hash = asset.hash();
        if let Some(&slot) = self.slots.get(&hash) {
            return Ok(slot);
        }

        let coarse = asset.coarse_resolution();
        let embedding = asset.embedding_resolution();
        if !(1..=COARSE_BLOCK_DIM).contains(&coarse) || !(1..=EMBED_BLOCK_DIM).contains(&embedding)
        {
            return Err(CoreError::AssetResolution { hash, coarse, embedding });
        }

        let slot = u32::try_from(self.assets.len())
            .map_err(|_| CoreError::Config("too many neural assets".into()))?;
        self.coarse_blocks += coarse.div_ceil(COARSE_BLOCK_DIM);
        self.embedding_blocks += EMBEDDING_CHANNELS * embedding.div_ceil(EMBED_BLOCK_DIM);
        self.slots.insert(hash, slot);
        self.assets.push(Arc::clone(asset));

        debug!(%hash, slot, "registered neural asset");
        Ok(slot)
    }

    /// Slot of a registered asset.
    #[must_use]
    pub fn slot_of(&self, hash: ContentHash) -> Option<u32> {
        self.slots.get(&hash).copied()
    }

    /// Distinct assets registered.
    #[must_use]
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    /// Whether nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }

    /// Blocks required by the coarse and embedding atlases.
    #[must_use]
    pub fn total_blocks(&self) -> (u32, u32) {
        (self.coarse_blocks, self.embedding_blocks)
    }

    /// Sizes both atlases and writes every registered asset into them.
    ///
    /// # Panics
    ///
    /// Panics if a write lands outside its atlas, which means the block
    /// accounting above is broken.
    #[must_use]
    pub fn finalize_layout(self) -> PackedAtlas {
        let coarse_layout = AtlasLayout::for_blocks(self.coarse_blocks, COARSE_BLOCK_DIM);
        let embedding_layout = AtlasLayout::for_blocks(self.embedding_blocks, EMBED_BLOCK_DIM);

        let mut coarse = vec![0u8; coarse_layout.cell_count() * COARSE_BYTES_PER_CELL];
        let mut embeddings = vec![[0u8; 4]; embedding_layout.cell_count()];

        for (slot, asset) in (0u32..).zip(&self.assets) {
            write_embeddings(&mut embeddings, &embedding_layout, slot, asset);
            write_coarse(&mut coarse, &coarse_layout, slot, asset);
        }

        info!(
            slots = self.assets.len(),
            coarse_dim = coarse_layout.dimension,
            embedding_dim = embedding_layout.dimension,
            "neural atlas packed"
        );

        PackedAtlas {
            slots: self.slots,
            slot_count: self.assets.len(),
            coarse_layout,
            embedding_layout,
            coarse,
            embeddings,
        }
    }
}

fn write_embeddings(atlas: &mut [[u8; 4]], layout: &AtlasLayout, slot: u32, asset: &NeuralAsset) {
    let size = asset.embedding_resolution() as usize;
    for t in 0..EMBEDDING_CHANNELS {
        let origin = layout.block_origin(slot * EMBEDDING_CHANNELS + t);
        for i in 0..size {
            for j in 0..size {
                for k in 0..size {
                    let id = layout.flat_index(origin + cell(i, j, k));
                    assert!(
                        id < atlas.len(),
                        "embedding atlas write {id} past {} for slot {slot}",
                        atlas.len()
                    );
                    atlas[id] = asset.embedding(i, j, k, t as usize);
                }
            }
        }
    }
}

fn write_coarse(atlas: &mut [u8], layout: &AtlasLayout, slot: u32, asset: &NeuralAsset) {
    let size = asset.coarse_resolution() as usize;
    let origin = layout.block_origin(slot);
    for i in 0..size {
        for j in 0..size {
            for k in 0..size {
                let id = COARSE_BYTES_PER_CELL * layout.flat_index(origin + cell(i, j, k));
                assert!(
                    id + 1 < atlas.len(),
                    "coarse atlas write {id} past {} for slot {slot}",
                    atlas.len()
                );
                atlas[id..id + 2].copy_from_slice(&asset.coarse_cell(i, j, k));
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation)]
fn cell(i: usize, j: usize, k: usize) -> UVec3 {
    UVec3::new(i as u32, j as u32, k as u32)
}

/// Where one slot's data lives in the two atlases.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SlotRegion {
    /// Slot id.
    pub slot: u32,
    /// Coarse block origin (cells).
    pub coarse_origin: UVec3,
    /// Embedding block origins, one per channel group.
    pub embedding_origins: [UVec3; EMBEDDING_CHANNELS as usize],
}

/// Finalized atlases ready for upload.
#[derive(Debug)]
pub struct PackedAtlas {
    slots: HashMap<ContentHash, u32>,
    slot_count: usize,
    coarse_layout: AtlasLayout,
    embedding_layout: AtlasLayout,
    coarse: Vec<u8>,
    embeddings: Vec<[u8; 4]>,
}

impl PackedAtlas {
    /// Placeholder atlas for a scene with no neural shapes.
    #[must_use]
    pub fn empty() -> Self {
        NeuralAtlasPacker::new().finalize_layout()
    }

    /// Slot assigned to `hash`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AssetNotPacked`] if the asset was never
    /// registered, which means descriptors are being built for a shape the
    /// initialization pass did not see.
    pub fn slot_of(&self, hash: ContentHash) -> CoreResult<u32> {
        self.slots.get(&hash).copied().ok_or(CoreError::AssetNotPacked { hash })
    }

    /// Number of packed assets.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slot_count
    }

    /// Coarse atlas layout.
    #[must_use]
    pub fn coarse_layout(&self) -> &AtlasLayout {
        &self.coarse_layout
    }

    /// Embedding atlas layout.
    #[must_use]
    pub fn embedding_layout(&self) -> &AtlasLayout {
        &self.embedding_layout
    }

    /// Coarse atlas, two bytes per cell.
    #[must_use]
    pub fn coarse_bytes(&self) -> &[u8] {
        &self.coarse
    }

    /// Embedding atlas cells.
    #[must_use]
    pub fn embedding_cells(&self) -> &[[u8; 4]] {
        &self.embeddings
    }

    /// Embedding atlas as raw RGBA bytes.
    #[must_use]
    pub fn embedding_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.embeddings)
    }

    /// Block origins of every slot.
    #[must_use]
    pub fn slot_regions(&self) -> Vec<SlotRegion> {
        (0u32..)
            .take(self.slot_count)
            .map(|slot| SlotRegion {
                slot,
                coarse_origin: self.coarse_layout.block_origin(slot),
                embedding_origins: std::array::from_fn(|t| {
                    #[allow(clippy::cast_possible_truncation)]
                    let t = t as u32;
                    self.embedding_layout.block_origin(slot * EMBEDDING_CHANNELS + t)
                }),
            })
            .collect()
    }

    /// Bytes both atlases occupy once uploaded.
    #[must_use]
    pub fn vram_footprint(&self) -> usize {
        self.coarse.len() + self.embeddings.len() * EMBED_BYTES_PER_CELL
    }

    /// Bytes the packed assets themselves account for.
    #[must_use]
    pub fn asset_footprint(&self) -> usize {
        self.slot_count * NEURAL_SDF_VRAM_FOOTPRINT
    }
}
