//! # Atlas Packing Integration Test
//!
//! Many assets of mixed resolution through the packer: every slot owns its
//! own blocks, every block lies inside its atlas, and the bytes at a block
//! are the bytes of the asset that owns it.

use std::collections::HashSet;
use std::sync::Arc;

use glam::UVec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use vortex_core::{AssetCorrection, AssetLibrary, CoreError, NeuralAsset, NeuralAtlasPacker};
use vortex_shared::constants::{COARSE_BLOCK_DIM, EMBED_BLOCK_DIM};

fn random_asset(rng: &mut ChaCha8Rng) -> NeuralAsset {
    let coarse_res = rng.gen_range(1..=COARSE_BLOCK_DIM / 2);
    let embed_res = rng.gen_range(1..=EMBED_BLOCK_DIM);
    let coarse = (0..(coarse_res as usize).pow(3) * 2).map(|_| rng.gen()).collect();
    let embeddings = (0..(embed_res as usize).pow(3) * 4).map(|_| rng.gen()).collect();
    NeuralAsset::new(coarse_res, embed_res, coarse, embeddings, AssetCorrection::IDENTITY).unwrap()
}

/// Test: 40 assets get dense slots and disjoint, in-bounds blocks.
#[test]
fn test_blocks_unique_and_in_bounds() {
    let mut rng = ChaCha8Rng::seed_from_u64(0xA71A5);
    let assets: Vec<_> = (0..40).map(|_| Arc::new(random_asset(&mut rng))).collect();

    let mut packer = NeuralAtlasPacker::new();
    for (expected, asset) in (0u32..).zip(&assets) {
        assert_eq!(packer.register_asset(asset).unwrap(), expected);
    }
    assert_eq!(packer.total_blocks(), (40, 160));

    let atlas = packer.finalize_layout();
    let coarse = *atlas.coarse_layout();
    let embedding = *atlas.embedding_layout();
    assert_eq!(coarse.blocks_per_axis, 4);
    assert_eq!(embedding.blocks_per_axis, 6);

    let mut coarse_seen = HashSet::new();
    let mut embedding_seen = HashSet::new();
    for region in atlas.slot_regions() {
        assert!(coarse_seen.insert(region.coarse_origin), "slot {} reuses a coarse block", region.slot);
        assert!(region.coarse_origin.cmplt(UVec3::splat(coarse.dimension)).all());
        for origin in region.embedding_origins {
            assert!(embedding_seen.insert(origin), "slot {} reuses an embedding block", region.slot);
            assert!(origin.cmplt(UVec3::splat(embedding.dimension)).all());
            assert_eq!(origin % EMBED_BLOCK_DIM, UVec3::ZERO);
        }
    }
    assert_eq!(coarse_seen.len(), 40);
    assert_eq!(embedding_seen.len(), 160);
}

/// Test: The atlas holds each asset's cells at its block origin.
#[test]
fn test_cells_land_at_block_origin() {
    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let assets: Vec<_> = (0..9).map(|_| Arc::new(random_asset(&mut rng))).collect();

    let mut packer = NeuralAtlasPacker::new();
    for asset in &assets {
        packer.register_asset(asset).unwrap();
    }
    let atlas = packer.finalize_layout();
    let coarse = atlas.coarse_layout();
    let embedding = atlas.embedding_layout();

    for (asset, region) in assets.iter().zip(atlas.slot_regions()) {
        let last = asset.coarse_resolution() as usize - 1;
        for (i, j, k) in [(0, 0, 0), (last, 0, 0), (0, last, last), (last, last, last)] {
            let cell = region.coarse_origin + UVec3::new(i as u32, j as u32, k as u32);
            let id = 2 * coarse.flat_index(cell);
            assert_eq!(atlas.coarse_bytes()[id..id + 2], asset.coarse_cell(i, j, k));
        }

        let last = asset.embedding_resolution() as usize - 1;
        for (t, origin) in region.embedding_origins.iter().enumerate() {
            for (i, j, k) in [(0, 0, 0), (last, last, 0), (last, last, last)] {
                let cell = *origin + UVec3::new(i as u32, j as u32, k as u32);
                let id = embedding.flat_index(cell);
                assert_eq!(atlas.embedding_cells()[id], asset.embedding(i, j, k, t));
            }
        }
    }
}

/// Test: Same content registered twice keeps one slot and one block count.
#[test]
fn test_duplicate_content_shares_slot() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let original = random_asset(&mut rng);
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let copy = random_asset(&mut rng);
    assert_eq!(original.hash(), copy.hash());

    let mut packer = NeuralAtlasPacker::new();
    assert_eq!(packer.register_asset(&Arc::new(original)).unwrap(), 0);
    assert_eq!(packer.register_asset(&Arc::new(copy)).unwrap(), 0);
    assert_eq!(packer.len(), 1);
    assert_eq!(packer.total_blocks(), (1, 4));
}

/// Test: An embedding grid wider than a block is refused.
#[test]
fn test_oversized_asset_refused() {
    let res = EMBED_BLOCK_DIM + 1;
    let asset = NeuralAsset::new(
        1,
        res,
        vec![0; 2],
        vec![[0; 4]; (res as usize).pow(3) * 4],
        AssetCorrection::IDENTITY,
    )
    .unwrap();

    let mut packer = NeuralAtlasPacker::new();
    let err = packer.register_asset(&Arc::new(asset)).unwrap_err();
    assert!(matches!(err, CoreError::AssetResolution { embedding, .. } if embedding == res));
    assert!(packer.is_empty());
}

/// Test: Instances sharing a library resolve to one allocation, and the
/// library forgets assets nobody holds.
#[test]
fn test_library_shares_across_instances() {
    let library = AssetLibrary::new();
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let first = library.intern(random_asset(&mut rng));
    let mut rng = ChaCha8Rng::seed_from_u64(99);
    let second = library.intern(random_asset(&mut rng));
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(library.live_count(), 1);

    let other_instance = library.clone();
    let foreign = Arc::new({
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        random_asset(&mut rng)
    });
    assert!(Arc::ptr_eq(&other_instance.share(&foreign), &first));

    drop((first, second));
    assert_eq!(library.live_count(), 0);
    assert_eq!(library.purge(), 1);
}
