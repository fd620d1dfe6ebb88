//! Cargo load planning.
//!
//! Places cargo items into vehicle cargo volumes with a greedy bottom-left-fill
//! heuristic, checks dangerous-goods separation and weight balance, and spreads
//! shipments across a fleet.
//!
//! Layers, bottom up:
//! - [`types`], [`model`], [`geometry`]: value types and AABB helpers
//! - [`feasibility`], [`candidates`], [`optimizer`]: single-vehicle placement
//! - [`records`], [`dangerous_goods`], [`load_plan`], [`compliance`], [`fleet`]: planning pipeline
//! - [`config`], [`logging`], [`error`]: ambient concerns

pub mod candidates;
pub mod compliance;
pub mod config;
pub mod dangerous_goods;
pub mod error;
pub mod feasibility;
pub mod fleet;
pub mod geometry;
pub mod load_plan;
pub mod logging;
pub mod model;
pub mod optimizer;
pub mod records;
pub mod types;
