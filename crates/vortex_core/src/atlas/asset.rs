//! Baked neural SDF assets and the process-wide library that shares them.

use std::collections::HashMap;
use std::sync::{Arc, Weak};

use glam::{Mat4, Quat, Vec3};
use parking_lot::RwLock;
use vortex_shared::constants::EMBEDDING_CHANNELS;

use crate::error::{CoreError, CoreResult};
use crate::hash::ContentHash;

/// Bytes per channel group in a baked embedding stream.
const PACKING: usize = 4;

/// Correction transform stored with a baked asset.
///
/// The baker writes rotation as `(w, x, y, z)` of the inverse rotation and
/// the translation it applied, so both are negated on load.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AssetCorrection {
    /// Baked rotation, `(q0, q1, q2, q3)`.
    pub q: [f32; 4],
    /// Baked translation.
    pub t: [f32; 3],
    /// Baked scale.
    pub s: [f32; 3],
}

impl AssetCorrection {
    /// No correction.
    pub const IDENTITY: Self = Self { q: [1.0, 0.0, 0.0, 0.0], t: [0.0; 3], s: [1.0; 3] };

    /// `rotate(R) * translate(-T) * scale(S)`.
    #[must_use]
    pub fn to_matrix(&self) -> Mat4 {
        let [q0, q1, q2, q3] = self.q;
        let rotation = Quat::from_xyzw(-q1, -q2, -q3, q0);
        let translation = -Vec3::from_array(self.t);
        Mat4::from_quat(rotation)
            * Mat4::from_translation(translation)
            * Mat4::from_scale(Vec3::from_array(self.s))
    }
}

/// One baked neural SDF.
///
/// Grids are stored in the layouts the atlas writer reads:
/// - coarse: `2 * (i + R * (j + k * R)) + t`, two bytes per cell
/// - embedding: `i + t * E + 4 * E * (j + k * E)`, one RGBA cell per entry
#[derive(Debug)]
pub struct NeuralAsset {
    coarse_resolution: u32,
    embedding_resolution: u32,
    coarse_grid: Vec<u8>,
    embeddings: Vec<[u8; 4]>,
    correction: Mat4,
    hash: ContentHash,
}

impl NeuralAsset {
    /// Builds an asset from grids already in atlas-reader layout.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AssetGridLength`] if a grid's length does not
    /// match its resolution.
    pub fn new(
        coarse_resolution: u32,
        embedding_resolution: u32,
        coarse_grid: Vec<u8>,
        embeddings: Vec<[u8; 4]>,
        correction: AssetCorrection,
    ) -> CoreResult<Self> {
        let coarse_cells = (coarse_resolution as usize).pow(3) * 2;
        if coarse_grid.len() != coarse_cells {
            return Err(CoreError::AssetGridLength {
                expected: coarse_cells,
                actual: coarse_grid.len(),
            });
        }
        let embed_cells = (embedding_resolution as usize).pow(3) * EMBEDDING_CHANNELS as usize;
        if embeddings.len() != embed_cells {
            return Err(CoreError::AssetGridLength {
                expected: embed_cells,
                actual: embeddings.len(),
            });
        }

        let hash = ContentHash::of_embeddings(&embeddings);
        Ok(Self {
            coarse_resolution,
            embedding_resolution,
            coarse_grid,
            embeddings,
            correction: correction.to_matrix(),
            hash,
        })
    }

    /// Builds an asset from the baker's raw byte stream, where embedding
    /// channel groups are stored cell-major: `PACKING * (t + 4 * cell)`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AssetGridLength`] on a short or long stream.
    pub fn from_baked(
        coarse_resolution: u32,
        embedding_resolution: u32,
        coarse_grid: Vec<u8>,
        raw_embeddings: &[u8],
        correction: AssetCorrection,
    ) -> CoreResult<Self> {
        let e = embedding_resolution as usize;
        let channels = EMBEDDING_CHANNELS as usize;
        let expected = e.pow(3) * channels * PACKING;
        if raw_embeddings.len() != expected {
            return Err(CoreError::AssetGridLength { expected, actual: raw_embeddings.len() });
        }

        let mut embeddings = vec![[0u8; 4]; e.pow(3) * channels];
        for i in 0..e {
            for j in 0..e {
                for k in 0..e {
                    let cell = i + e * (j + k * e);
                    for t in 0..channels {
                        let dst = i + t * e + channels * e * (j + k * e);
                        let src = PACKING * (t + cell * channels);
                        embeddings[dst].copy_from_slice(&raw_embeddings[src..src + PACKING]);
                    }
                }
            }
        }

        Self::new(coarse_resolution, embedding_resolution, coarse_grid, embeddings, correction)
    }

    /// Content hash over the embeddings.
    #[inline]
    #[must_use]
    pub fn hash(&self) -> ContentHash {
        self.hash
    }

    /// Coarse grid cells per side.
    #[inline]
    #[must_use]
    pub fn coarse_resolution(&self) -> u32 {
        self.coarse_resolution
    }

    /// Embedding grid cells per side.
    #[inline]
    #[must_use]
    pub fn embedding_resolution(&self) -> u32 {
        self.embedding_resolution
    }

    /// Correction transform applied after the shape's local-to-world.
    #[inline]
    #[must_use]
    pub fn correction(&self) -> &Mat4 {
        &self.correction
    }

    /// Two coarse bytes at cell `(i, j, k)`.
    #[inline]
    #[must_use]
    pub fn coarse_cell(&self, i: usize, j: usize, k: usize) -> [u8; 2] {
        let r = self.coarse_resolution as usize;
        let id = 2 * (i + r * (j + k * r));
        [self.coarse_grid[id], self.coarse_grid[id + 1]]
    }

    /// Embedding cell `(i, j, k)` of channel group `t`.
    #[inline]
    #[must_use]
    pub fn embedding(&self, i: usize, j: usize, k: usize, t: usize) -> [u8; 4] {
        let e = self.embedding_resolution as usize;
        self.embeddings[i + t * e + EMBEDDING_CHANNELS as usize * e * (j + k * e)]
    }
}

// =============================================================================
// AssetLibrary - shared across simulation instances
// =============================================================================

/// Process-wide asset share point.
///
/// Instances resolve assets through the library so identical content maps
/// to one allocation. The library only holds weak references: an asset
/// lives as long as the longest instance or shape holding it.
#[derive(Clone, Debug, Default)]
pub struct AssetLibrary {
    entries: Arc<RwLock<HashMap<ContentHash, Weak<NeuralAsset>>>>,
}

impl AssetLibrary {
    /// Empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared instance for this asset's content, inserting it if
    /// none is alive.
    pub fn intern(&self, asset: NeuralAsset) -> Arc<NeuralAsset> {
        let hash = asset.hash();
        if let Some(existing) = self.get(hash) {
            return existing;
        }

        let mut entries = self.entries.write();
        // Another instance may have interned the same content meanwhile.
        if let Some(existing) = entries.get(&hash).and_then(Weak::upgrade) {
            return existing;
        }
        let shared = Arc::new(asset);
        entries.insert(hash, Arc::downgrade(&shared));
        shared
    }

    /// Re-points `asset` at the shared instance with the same content.
    pub fn share(&self, asset: &Arc<NeuralAsset>) -> Arc<NeuralAsset> {
        let hash = asset.hash();
        if let Some(existing) = self.get(hash) {
            return existing;
        }
        let mut entries = self.entries.write();
        if let Some(existing) = entries.get(&hash).and_then(Weak::upgrade) {
            return existing;
        }
        entries.insert(hash, Arc::downgrade(asset));
        Arc::clone(asset)
    }

    /// Live asset for `hash`.
    #[must_use]
    pub fn get(&self, hash: ContentHash) -> Option<Arc<NeuralAsset>> {
        self.entries.read().get(&hash).and_then(Weak::upgrade)
    }

    /// Drops entries whose assets are gone. Returns how many were removed.
    pub fn purge(&self) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, weak| weak.strong_count() > 0);
        before - entries.len()
    }

    /// Number of live assets.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.entries.read().values().filter(|weak| weak.strong_count() > 0).count()
    }
}
