// geodata_server/server/src/world/geodata/mod.rs
pub mod block;
pub mod complex;
pub mod dynamic;
pub mod flat;
pub mod layer;
pub mod multilayer;
pub mod null;

pub use block::Block;
pub use complex::ComplexBlock;
pub use dynamic::{DynamicBlock, DynamicLayout};
pub use flat::FlatBlock;
pub use multilayer::MultilayerBlock;
pub use null::NullBlock;

use crate::core::error::GeoError;

pub(crate) fn truncated(what: &'static str) -> impl FnOnce(std::io::Error) -> GeoError {
    move |e| GeoError::TruncatedRegion(format!("{}: {}", what, e))
}
