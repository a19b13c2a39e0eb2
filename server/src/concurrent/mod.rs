// geodata_server/server/src/concurrent/mod.rs
pub mod node_buffer_pool;

pub use node_buffer_pool::{BufferClassStats, NodeBufferPool, PooledBuffer};
