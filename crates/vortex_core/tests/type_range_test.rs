//! # Type Range Integration Test
//!
//! Random scenes through the registry and the range indexer: the ranges must
//! partition the sorted order, each range must hold only its type, and the
//! wire tables must agree with the ranges and cover every sorted record.
//! Scenes draw from every kind, so each engine also sees the other engine's
//! types and must keep them out of the sorted order.

use std::sync::Arc;

use glam::Vec3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use vortex_core::manipulator::{
    ColliderParams, EffectParticleEmitterParams, EmitterParams, ForceFieldParams, ForceFieldType,
    SpeciesModifierParams, TextureEmitterParams, VoidParams,
};
use vortex_core::ranges::FORCE_FIELD_SHAPES;
use vortex_core::{
    AssetCorrection, Manipulator, ManipulatorKind, ManipulatorRegistry, ManipulatorType,
    NeuralAsset, ObjectId, Primitive, Shape, SimulationConfig, SortPolicy, Terrain,
    TypeRangeTable,
};
use vortex_shared::{IndexRange, Phenomenon, Transform};

const SCENES: u64 = 200;

fn bone_asset() -> Arc<NeuralAsset> {
    let coarse = vec![3; 4usize.pow(3) * 2];
    let embeddings = vec![[3, 1, 4, 1]; 4usize.pow(3) * 4];
    Arc::new(NeuralAsset::new(4, 4, coarse, embeddings, AssetCorrection::IDENTITY).unwrap())
}

fn random_shape(rng: &mut ChaCha8Rng, asset: &Arc<NeuralAsset>) -> Shape {
    match rng.gen_range(0..3) {
        0 => Shape::analytic(Primitive::Box, Transform::IDENTITY),
        1 => Shape::neural(Arc::clone(asset), Transform::IDENTITY),
        _ => Shape::group(
            vec![Shape::neural(Arc::clone(asset), Transform::IDENTITY); rng.gen_range(1..4)],
            Transform::IDENTITY,
        ),
    }
}

fn random_manipulator(rng: &mut ChaCha8Rng, id: u64, asset: &Arc<NeuralAsset>) -> Manipulator {
    let shape = random_shape(rng, asset);
    let kind = match rng.gen_range(0..9) {
        0 => ManipulatorKind::Emitter(EmitterParams::default()),
        1 => ManipulatorKind::Void(VoidParams::default()),
        2 => ManipulatorKind::ForceField(ForceFieldParams {
            field: [ForceFieldType::Directional, ForceFieldType::Swirl][rng.gen_range(0..2)],
            ..ForceFieldParams::default()
        }),
        3 => ManipulatorKind::Detector,
        4 => ManipulatorKind::SpeciesModifier(SpeciesModifierParams::default()),
        5 => ManipulatorKind::EffectParticleEmitter(EffectParticleEmitterParams::default()),
        6 => ManipulatorKind::TextureEmitter(TextureEmitterParams::default()),
        7 => {
            let terrain = Terrain::new(Vec3::new(1.0, 1.0, 1.0), 8);
            let heightmap = Shape::heightmap(terrain, Transform::IDENTITY);
            let collider = ManipulatorKind::Collider(ColliderParams::default());
            return Manipulator::new(ObjectId(id), collider, heightmap);
        }
        _ => ManipulatorKind::Collider(ColliderParams::default()),
    };
    Manipulator::new(ObjectId(id), kind, shape).with_enabled(rng.gen_bool(0.8))
}

fn random_registry(seed: u64, config: &SimulationConfig) -> ManipulatorRegistry {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let asset = bone_asset();
    let count = rng.gen_range(0..64);
    let candidates: Vec<_> = (0..count)
        .map(|_| {
            let id = rng.gen_range(0..1_000);
            random_manipulator(&mut rng, id, &asset)
        })
        .collect();
    ManipulatorRegistry::from_candidates(candidates, SortPolicy::from_config(config)).0
}

/// Sorted indices covered by a wire table's type ranges, one entry per
/// covering range.
fn covered(ranges: &[IndexRange]) -> Vec<usize> {
    let mut indices: Vec<usize> = ranges
        .iter()
        .flat_map(|r| r.begin..r.end)
        .map(|i| usize::try_from(i).unwrap())
        .collect();
    indices.sort_unstable();
    indices
}

/// Test: Ranges tile the sorted registry and hold only their own type.
#[test]
fn test_ranges_partition_random_scenes() {
    for config in [SimulationConfig::liquid(), SimulationConfig::smoke_and_fire()] {
        for seed in 0..SCENES {
            let registry = random_registry(seed, &config);
            let table = TypeRangeTable::compute_ranges(&registry.sorted_types());

            let mut cursor = 0;
            for ty in ManipulatorType::ALL {
                let range = table.range(ty);
                assert_eq!(range.start, cursor, "seed {seed}: gap before {ty:?}");
                for index in range.clone() {
                    let member = registry.get(index).unwrap();
                    assert_eq!(member.manipulator_type(), ty, "seed {seed}: index {index}");
                }
                cursor = range.end;
            }
            assert_eq!(cursor, registry.len(), "seed {seed}");
            assert_eq!(table.len(), registry.len());
        }
    }
}

/// Test: Ids ascend inside a type, enabled first when disabled trail.
#[test]
fn test_order_inside_ranges() {
    let config = SimulationConfig::smoke_and_fire();
    for seed in 0..SCENES {
        let registry = random_registry(seed, &config);
        let table = TypeRangeTable::compute_ranges(&registry.sorted_types());

        for ty in ManipulatorType::ALL {
            if ty == ManipulatorType::ForceField {
                continue;
            }
            let members: Vec<_> = table.range(ty).filter_map(|i| registry.get(i)).collect();
            for pair in members.windows(2) {
                let key = |m: &Manipulator| (!m.enabled, m.id);
                assert!(key(pair[0]) < key(pair[1]), "seed {seed}: {ty:?} out of order");
            }
        }
    }
}

/// Test: Force-field sub-ranges split the force-field range by shape.
#[test]
fn test_force_field_sub_ranges() {
    let config = SimulationConfig::smoke_and_fire();
    for seed in 0..SCENES {
        let registry = random_registry(seed, &config);
        let table = TypeRangeTable::compute_ranges(&registry.sorted_types());
        let fields = table.range(ManipulatorType::ForceField);
        let subs = table.force_field_shapes();

        assert_eq!(subs[0].start, fields.start, "seed {seed}");
        assert_eq!(subs[2].end, fields.end, "seed {seed}");
        for (class, sub) in FORCE_FIELD_SHAPES.iter().zip(&subs) {
            for index in sub.clone() {
                assert_eq!(registry.get(index).unwrap().shape_class(), Some(*class), "seed {seed}");
            }
        }
    }
}

/// Test: Wire tables carry exactly the computed ranges.
#[test]
fn test_wire_tables_match_ranges() {
    let liquid = SimulationConfig::liquid();
    let smoke = SimulationConfig::smoke_and_fire();
    let as_wire = |r: std::ops::Range<usize>| (r.start as i32, r.end as i32);

    for seed in 0..SCENES {
        let registry = random_registry(seed, &liquid);
        let table = TypeRangeTable::compute_ranges(&registry.sorted_types());
        let wire = table.to_liquid_indices();
        for (slot, ty) in ManipulatorType::ALL[..9].iter().enumerate() {
            let range = wire.ranges[slot];
            assert_eq!((range.begin, range.end), as_wire(table.range(*ty)), "seed {seed}: {ty:?}");
        }

        let registry = random_registry(seed, &smoke);
        let table = TypeRangeTable::compute_ranges(&registry.sorted_types());
        let wire = table.to_smoke_indices();
        let effect = wire.ranges[8];
        assert_eq!(
            (effect.begin, effect.end),
            as_wire(table.range(ManipulatorType::EffectParticleEmitter))
        );
        let texture = wire.texture_emitter;
        assert_eq!(
            (texture.begin, texture.end),
            as_wire(table.range(ManipulatorType::TextureEmitter))
        );
        for (sub, range) in table.force_field_shapes().into_iter().zip(wire.force_field_shapes) {
            assert_eq!((range.begin, range.end), as_wire(sub));
        }
    }
}

/// Test: Each engine's wire table covers every sorted record exactly once,
/// and the other engine's types never reach the sorted order.
#[test]
fn test_wire_ranges_cover_registry() {
    for config in [SimulationConfig::liquid(), SimulationConfig::smoke_and_fire()] {
        for seed in 0..SCENES {
            let registry = random_registry(seed, &config);
            for member in registry.iter() {
                let ty = member.manipulator_type();
                assert!(ty.indexed_by(config.phenomenon), "seed {seed}: {ty:?} was sorted");
            }

            let table = TypeRangeTable::compute_ranges(&registry.sorted_types());
            let indices = match config.phenomenon {
                Phenomenon::Liquid => covered(&table.to_liquid_indices().ranges),
                Phenomenon::SmokeAndFire => {
                    let wire = table.to_smoke_indices();
                    let mut ranges = wire.ranges.to_vec();
                    ranges.push(wire.texture_emitter);
                    covered(&ranges)
                }
            };
            let expected: Vec<usize> = (0..registry.len()).collect();
            assert_eq!(indices, expected, "seed {seed}: {:?}", config.phenomenon);
        }
    }
}
