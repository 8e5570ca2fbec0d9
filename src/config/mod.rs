//! Visualizer configuration: band table, analysis resolution and smoothing.

pub(crate) mod color;
pub(crate) mod model;
