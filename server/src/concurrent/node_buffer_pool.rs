// geodata_server/server/src/concurrent/node_buffer_pool.rs
use crate::core::config::BufferClassConfig;
use crate::operational::monitoring::metrics::GeoMetrics;
use crate::systems::pathfinding::NodeBuffer;
use crossbeam_queue::ArrayQueue;
use serde::Serialize;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::debug;

/// Snapshot of one buffer size class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BufferClassStats {
    pub size: usize,
    pub count: usize,
    pub uses: u64,
    pub playable_uses: u64,
    pub elapsed_ms: u64,
    pub overflows: u64,
    pub playable_overflows: u64,
}

struct BufferClass {
    size: usize,
    count: usize,
    idle: ArrayQueue<NodeBuffer>,
    uses: AtomicU64,
    playable_uses: AtomicU64,
    elapsed_ms: AtomicU64,
    overflows: AtomicU64,
    playable_overflows: AtomicU64,
}

impl BufferClass {
    fn new(size: usize, count: usize) -> Self {
        let idle = ArrayQueue::new(count.max(1));
        for _ in 0..count {
            let _ = idle.push(NodeBuffer::new(size));
        }
        BufferClass {
            size,
            count,
            idle,
            uses: AtomicU64::new(0),
            playable_uses: AtomicU64::new(0),
            elapsed_ms: AtomicU64::new(0),
            overflows: AtomicU64::new(0),
            playable_overflows: AtomicU64::new(0),
        }
    }

    fn stats(&self) -> BufferClassStats {
        BufferClassStats {
            size: self.size,
            count: self.count,
            uses: self.uses.load(Ordering::Relaxed),
            playable_uses: self.playable_uses.load(Ordering::Relaxed),
            elapsed_ms: self.elapsed_ms.load(Ordering::Relaxed),
            overflows: self.overflows.load(Ordering::Relaxed),
            playable_overflows: self.playable_overflows.load(Ordering::Relaxed),
        }
    }
}

/// Pre-allocated search buffers grouped in ascending size classes.
///
/// Acquisition never waits: when every buffer of a large enough class is
/// busy, a temporary buffer is allocated and the overflow is counted.
pub struct NodeBufferPool {
    classes: Vec<BufferClass>,
}

impl NodeBufferPool {
    pub fn new(config: &[BufferClassConfig]) -> Self {
        let classes = config.iter().map(|c| BufferClass::new(c.size, c.count)).collect();
        NodeBufferPool { classes }
    }

    /// Largest search window the pool can serve.
    pub fn max_size(&self) -> usize {
        self.classes.iter().map(|c| c.size).max().unwrap_or(0)
    }

    /// Takes a buffer with a side of at least `required` cells. Returns `None`
    /// only when `required` is larger than every class.
    pub fn acquire(&self, required: usize, playable: bool) -> Option<PooledBuffer<'_>> {
        let mut fallback = None;
        for class in self.classes.iter().filter(|c| c.size >= required) {
            if let Some(buffer) = class.idle.pop() {
                class.uses.fetch_add(1, Ordering::Relaxed);
                if playable {
                    class.playable_uses.fetch_add(1, Ordering::Relaxed);
                }
                return Some(PooledBuffer::new(buffer, class, true));
            }
            class.overflows.fetch_add(1, Ordering::Relaxed);
            if playable {
                class.playable_overflows.fetch_add(1, Ordering::Relaxed);
            }
            GeoMetrics::record_buffer_overflow(class.size);
            fallback.get_or_insert(class);
        }
        let class = fallback?;
        debug!(size = class.size, required, "All path buffers busy, allocating a temporary one");
        Some(PooledBuffer::new(NodeBuffer::new(class.size), class, false))
    }

    pub fn stats(&self) -> Vec<BufferClassStats> {
        self.classes.iter().map(BufferClass::stats).collect()
    }

    /// Buffers currently idle across all classes.
    pub fn idle_count(&self) -> usize {
        self.classes.iter().map(|c| c.idle.len()).sum()
    }
}

/// A buffer checked out of the pool. Dropping it records the time it was held
/// and puts pooled buffers back, including while unwinding.
pub struct PooledBuffer<'a> {
    buffer: NodeBuffer,
    class: &'a BufferClass,
    pooled: bool,
    acquired: Instant,
}

impl<'a> PooledBuffer<'a> {
    fn new(buffer: NodeBuffer, class: &'a BufferClass, pooled: bool) -> Self {
        PooledBuffer { buffer, class, pooled, acquired: Instant::now() }
    }

    pub fn is_temporary(&self) -> bool {
        !self.pooled
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = NodeBuffer;

    fn deref(&self) -> &NodeBuffer {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut NodeBuffer {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        let mut buffer = std::mem::replace(&mut self.buffer, NodeBuffer::new(0));
        let elapsed = self.acquired.elapsed();
        buffer.set_last_elapsed(elapsed);
        if self.pooled {
            self.class.elapsed_ms.fetch_add(elapsed.as_millis() as u64, Ordering::Relaxed);
            buffer.reset();
            let _ = self.class.idle.push(buffer);
        }
    }
}
