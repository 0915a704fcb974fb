mod aoe4world;

pub mod client;
pub mod metrics;
pub mod types;

pub use aoe4world::{Aoe4WorldClient, StatsApi};
