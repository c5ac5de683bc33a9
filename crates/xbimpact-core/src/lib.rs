//! Storm-impact post-processing for coastal morphodynamic model output.
//!
//! A run is read as a mesh time series, reduced to per-row water-line and
//! erosion-scarp frontiers, and reference points are classified by their
//! distance to those frontiers.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;
