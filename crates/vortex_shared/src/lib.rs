//! # VORTEX Shared
//!
//! The contract between the manipulator pipeline and the simulation engine.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER contain pipeline logic. It holds:
//! - engine constants (block geometry, fixed-point scale)
//! - `#[repr(C)]` interop records
//! - transform math used on both sides of asset baking
//!
//! If you need registry or packing behavior, put it in `vortex_core`.

#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod math;
pub mod protocol;

pub use math::{quat_row, replace_zeroes, Transform};
pub use protocol::{
    IndexRange, LiquidManipulatorIndices, LiquidSdfParams, ManipulatorParam, Phenomenon,
    SmokeManipulatorIndices, SmokeSdfParams,
};
