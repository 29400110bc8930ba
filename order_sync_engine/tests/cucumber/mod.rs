mod steps;
mod world;

pub use world::{SyncSystem, SyncWorld};
