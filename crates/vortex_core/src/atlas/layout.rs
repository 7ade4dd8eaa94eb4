//! Cubic atlas geometry: block counts to dimensions, block indices to
//! coordinates.

use glam::UVec3;

/// Smallest `b` with `b³ >= n`. Exact in integers, unlike `cbrt().ceil()`
/// which misrounds perfect cubes.
#[must_use]
pub fn ceil_cbrt(n: u32) -> u32 {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let mut b = f64::from(n).cbrt().round() as u32;
    while u64::from(b).pow(3) < u64::from(n) {
        b += 1;
    }
    while b > 0 && u64::from(b - 1).pow(3) >= u64::from(n) {
        b -= 1;
    }
    b
}

/// Derived layout of one cubic atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AtlasLayout {
    /// Cells per block side.
    pub block_dim: u32,
    /// Blocks per atlas side.
    pub blocks_per_axis: u32,
    /// Cells per atlas side (`block_dim * blocks_per_axis`).
    pub dimension: u32,
}

impl AtlasLayout {
    /// Smallest cube of `block_dim` blocks holding `total_blocks`.
    ///
    /// An empty atlas still gets one block so the engine always has a
    /// texture to bind.
    #[must_use]
    pub fn for_blocks(total_blocks: u32, block_dim: u32) -> Self {
        let blocks_per_axis = ceil_cbrt(total_blocks).max(1);
        Self { block_dim, blocks_per_axis, dimension: block_dim * blocks_per_axis }
    }

    /// Blocks the atlas can hold.
    #[must_use]
    pub fn capacity(&self) -> u32 {
        self.blocks_per_axis.pow(3)
    }

    /// Cells in the atlas (`dimension³`).
    #[must_use]
    pub fn cell_count(&self) -> usize {
        (self.dimension as usize).pow(3)
    }

    /// Block coordinate of flat block index `block`, x fastest.
    #[must_use]
    pub fn decompose(&self, block: u32) -> UVec3 {
        let b = self.blocks_per_axis;
        UVec3::new(block % b, (block / b) % b, block / (b * b))
    }

    /// First cell of block `block`.
    #[must_use]
    pub fn block_origin(&self, block: u32) -> UVec3 {
        self.decompose(block) * self.block_dim
    }

    /// Row-major flat cell index, x fastest.
    #[inline]
    #[must_use]
    pub fn flat_index(&self, cell: UVec3) -> usize {
        let d = self.dimension as usize;
        cell.x as usize + d * (cell.y as usize + d * cell.z as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ceil_cbrt() {
        assert_eq!(ceil_cbrt(0), 0);
        assert_eq!(ceil_cbrt(1), 1);
        assert_eq!(ceil_cbrt(2), 2);
        assert_eq!(ceil_cbrt(8), 2);
        assert_eq!(ceil_cbrt(9), 3);
        assert_eq!(ceil_cbrt(27), 3);
        assert_eq!(ceil_cbrt(64), 4);
        assert_eq!(ceil_cbrt(1000), 10);
        assert_eq!(ceil_cbrt(1001), 11);
    }

    #[test]
    fn test_empty_atlas_is_one_block() {
        let layout = AtlasLayout::for_blocks(0, 32);
        assert_eq!(layout.blocks_per_axis, 1);
        assert_eq!(layout.dimension, 32);
    }

    #[test]
    fn test_decompose_x_fastest() {
        let layout = AtlasLayout::for_blocks(27, 21);
        assert_eq!(layout.decompose(0), UVec3::ZERO);
        assert_eq!(layout.decompose(1), UVec3::new(1, 0, 0));
        assert_eq!(layout.decompose(3), UVec3::new(0, 1, 0));
        assert_eq!(layout.decompose(9), UVec3::new(0, 0, 1));
        assert_eq!(layout.decompose(26), UVec3::new(2, 2, 2));
        assert_eq!(layout.block_origin(26), UVec3::splat(42));
    }

    #[test]
    fn test_last_cell_is_last_index() {
        let layout = AtlasLayout::for_blocks(5, 4);
        let last = UVec3::splat(layout.dimension - 1);
        assert_eq!(layout.flat_index(last), layout.cell_count() - 1);
    }
}
