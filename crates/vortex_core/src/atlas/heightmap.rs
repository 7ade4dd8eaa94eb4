//! Square atlas of terrain heightmaps.
//!
//! Each heightmap collider gets one `resolution²` tile; tiles are laid out
//! row by row in a `tiles_per_side²` grid.
//!
//! The CPU staging buffer holds `f32` texels. The engine texture is
//! single-channel half float, so uploads convert and take
//! [`HEIGHTMAP_BYTES_PER_TEXEL`] bytes per texel.

use glam::{UVec2, Vec4};
use vortex_shared::constants::HEIGHTMAP_BYTES_PER_TEXEL;

use crate::shape::Terrain;

/// Tile layout of the heightmap atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeightmapAtlasLayout {
    /// Heightmaps in the atlas.
    pub count: u32,
    /// Texels per tile side.
    pub resolution: u32,
    /// Tiles per atlas side (`ceil(sqrt(count))`).
    pub tiles_per_side: u32,
    /// Texels per atlas side, at least 1.
    pub dimension: u32,
}

impl HeightmapAtlasLayout {
    /// Layout for `count` heightmaps of `resolution` texels per side.
    #[must_use]
    pub fn new(count: u32, resolution: u32) -> Self {
        let tiles_per_side = ceil_sqrt(count);
        let dimension = (tiles_per_side * resolution).max(1);
        Self { count, resolution, tiles_per_side, dimension }
    }

    /// Tile coordinate of heightmap `index`.
    #[must_use]
    pub fn tile(&self, index: u32) -> UVec2 {
        let n = self.tiles_per_side.max(1);
        UVec2::new(index % n, index / n)
    }

    /// First texel of heightmap `index`.
    #[must_use]
    pub fn tile_origin(&self, index: u32) -> UVec2 {
        self.tile(index) * self.resolution
    }

    /// Blit parameters `(tile.x, tile.y, tiles, tiles)` for heightmap `index`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn scaling(&self, index: u32) -> Vec4 {
        let tile = self.tile(index);
        let n = self.tiles_per_side as f32;
        Vec4::new(tile.x as f32, tile.y as f32, n, n)
    }

    /// Atlas size in bytes once uploaded as half floats. The staging
    /// buffer from [`Self::allocate`] is twice this size.
    #[must_use]
    pub fn byte_size(&self) -> usize {
        (self.dimension as usize).pow(2) * HEIGHTMAP_BYTES_PER_TEXEL
    }

    /// Copies a terrain's CPU-side samples into its tile. Samples beyond the
    /// tile are dropped; a terrain without samples leaves the tile untouched.
    pub fn blit(&self, atlas: &mut [f32], index: u32, terrain: &Terrain) {
        let source_side = terrain.resolution as usize;
        if terrain.heights.len() < source_side * source_side {
            return;
        }
        let side = source_side.min(self.resolution as usize);
        let origin = self.tile_origin(index);
        let dimension = self.dimension as usize;
        for row in 0..side {
            let dst = (origin.y as usize + row) * dimension + origin.x as usize;
            let src = row * source_side;
            atlas[dst..dst + side].copy_from_slice(&terrain.heights[src..src + side]);
        }
    }

    /// Zeroed `f32` staging buffer, one value per texel.
    #[must_use]
    pub fn allocate(&self) -> Vec<f32> {
        vec![0.0; (self.dimension as usize).pow(2)]
    }
}

/// Smallest `n` with `n² >= count`.
fn ceil_sqrt(count: u32) -> u32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut n = f64::from(count).sqrt().ceil() as u32;
    while n > 0 && (n - 1) * (n - 1) >= count {
        n -= 1;
    }
    while n * n < count {
        n += 1;
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_tiles_per_side() {
        assert_eq!(HeightmapAtlasLayout::new(0, 256).tiles_per_side, 0);
        assert_eq!(HeightmapAtlasLayout::new(1, 256).tiles_per_side, 1);
        assert_eq!(HeightmapAtlasLayout::new(2, 256).tiles_per_side, 2);
        assert_eq!(HeightmapAtlasLayout::new(4, 256).tiles_per_side, 2);
        assert_eq!(HeightmapAtlasLayout::new(5, 256).tiles_per_side, 3);
    }

    #[test]
    fn test_empty_atlas_has_one_texel() {
        let layout = HeightmapAtlasLayout::new(0, 256);
        assert_eq!(layout.dimension, 1);
        assert_eq!(layout.byte_size(), 2);
    }

    #[test]
    fn test_upload_size_is_half_float_per_staged_texel() {
        let layout = HeightmapAtlasLayout::new(3, 8);
        let staging = layout.allocate();
        assert_eq!(staging.len(), 16 * 16);
        assert_eq!(layout.byte_size(), staging.len() * HEIGHTMAP_BYTES_PER_TEXEL);
        assert_eq!(layout.byte_size() * 2, std::mem::size_of_val(staging.as_slice()));
    }

    #[test]
    fn test_tile_placement() {
        let layout = HeightmapAtlasLayout::new(5, 16);
        assert_eq!(layout.tile(4), UVec2::new(1, 1));
        assert_eq!(layout.tile_origin(4), UVec2::new(16, 16));
        assert_eq!(layout.scaling(2), Vec4::new(2.0, 0.0, 3.0, 3.0));
    }

    #[test]
    fn test_blit_into_tile() {
        let layout = HeightmapAtlasLayout::new(2, 2);
        let mut atlas = layout.allocate();
        let terrain = Terrain {
            heightmap_scale: Vec3::ONE,
            resolution: 2,
            heights: vec![0.1, 0.2, 0.3, 0.4],
        };
        layout.blit(&mut atlas, 1, &terrain);

        // dimension 4, tile 1 starts at (2, 0)
        assert_eq!(atlas[2], 0.1);
        assert_eq!(atlas[3], 0.2);
        assert_eq!(atlas[4 + 2], 0.3);
        assert_eq!(atlas[4 + 3], 0.4);
        assert_eq!(atlas[0], 0.0);
    }
}
