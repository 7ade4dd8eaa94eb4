//! # Core Error Types
//!
//! Errors surfaced by the manipulator pipeline.
//!
//! Recoverable scene problems (a collider without a shape, an ungenerated
//! neural asset) are not errors: they are logged and the object is
//! excluded. What remains here is either bad configuration or an internal
//! ordering violation the caller must treat as a bug.

use thiserror::Error;

use crate::hash::ContentHash;

/// Errors that can occur in the manipulator pipeline.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// The engine's statistics buffer is shorter than the registry needs.
    #[error("feedback buffer too short: need {expected} values, got {actual}")]
    FeedbackTooShort {
        /// Values required (`len * stats_per_record`).
        expected: usize,
        /// Values received.
        actual: usize,
    },

    /// A second feedback read was attempted within one tick.
    #[error("feedback already read for tick {tick}")]
    FeedbackAlreadyRead {
        /// Tick that was already consumed.
        tick: u64,
    },

    /// The engine has not published feedback yet.
    #[error("no feedback published")]
    FeedbackUnavailable,

    /// A descriptor referenced an asset the atlas never packed.
    #[error("neural asset {hash} has no atlas slot")]
    AssetNotPacked {
        /// Content hash of the asset.
        hash: ContentHash,
    },

    /// A neural asset's grids do not fit in one atlas block.
    #[error("neural asset {hash} resolution {coarse}/{embedding} exceeds block size")]
    AssetResolution {
        /// Content hash of the asset.
        hash: ContentHash,
        /// Coarse grid resolution.
        coarse: u32,
        /// Embedding grid resolution.
        embedding: u32,
    },

    /// A neural asset's source grid length disagrees with its resolution.
    #[error("neural asset grid has {actual} cells, resolution implies {expected}")]
    AssetGridLength {
        /// Cells implied by the resolution.
        expected: usize,
        /// Cells supplied.
        actual: usize,
    },

    /// A registered manipulator's shape data disappeared after validation.
    #[error("manipulator {id} has no usable shape")]
    MissingShape {
        /// Raw manipulator id.
        id: u64,
    },

    /// No manipulator with this id is registered.
    #[error("manipulator {id} is not registered")]
    UnknownManipulator {
        /// Raw manipulator id.
        id: u64,
    },

    /// An edit while initialized changed what the engine resources were
    /// built for (id, type, shape class or packed assets). The edit was
    /// rolled back.
    #[error("manipulator {id} changed its layout while initialized")]
    LayoutChangedWhileFrozen {
        /// Raw manipulator id.
        id: u64,
    },

    /// Operation needs an initialized simulation.
    #[error("simulation not initialized")]
    NotInitialized,

    /// Operation needs an uninitialized simulation.
    #[error("simulation already initialized")]
    AlreadyInitialized,

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for pipeline operations.
pub type CoreResult<T> = Result<T, CoreError>;
