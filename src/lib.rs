//! momenta - life timeline aggregation and layout engine.
//!
//! Turns an unordered set of timestamped, optionally geotagged,
//! multi-participant life events into grouped moments, zoom-dependent
//! cluster hierarchies, and overlap-free 2D layouts. Everything is
//! recomputed on demand from the authoritative event list; storage,
//! privacy filtering, and rendering live outside this crate.

pub mod aggregate;
pub mod cluster;
pub mod config;
pub mod edit;
pub mod export;
pub mod geometry;
pub mod layout;
pub mod logging;
pub mod model;
