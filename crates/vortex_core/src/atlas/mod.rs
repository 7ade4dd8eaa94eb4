//! # SDF Atlases
//!
//! Neural assets are packed into two cubic atlases (coarse distance grid,
//! latent embeddings); terrain heightmaps into one square atlas.

pub mod asset;
pub mod heightmap;
pub mod layout;
pub mod packer;

pub use asset::{AssetCorrection, AssetLibrary, NeuralAsset};
pub use heightmap::HeightmapAtlasLayout;
pub use layout::{ceil_cbrt, AtlasLayout};
pub use packer::{NeuralAtlasPacker, PackedAtlas, SlotRegion};
