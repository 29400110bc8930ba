//! Adapters that implement the engine's client traits on top of the vendor API crates.
pub mod idosell;
pub mod refurbed;

pub use idosell::IdosellFulfillment;
pub use refurbed::RefurbedMarketplace;
