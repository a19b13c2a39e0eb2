// geodata_server/server/src/operational/stats.rs
use crate::concurrent::node_buffer_pool::BufferClassStats;
use crate::systems::pathfinding::PathfindingCounters;
use serde::Serialize;
use std::fmt;

/// Point-in-time engine statistics. `Display` renders the operator text, one
/// line per entry of [`GeoStats::lines`].
#[derive(Debug, Clone, Serialize)]
pub struct GeoStats {
    pub buffers: Vec<BufferClassStats>,
    pub pathfinding: PathfindingCounters,
    pub active_obstacles: usize,
}

fn average(total: u64, count: u64) -> f64 {
    total as f64 / count as f64
}

impl GeoStats {
    pub fn lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = self.buffers.iter().map(buffer_line).collect();

        let p = &self.pathfinding;
        lines.push(format!(
            "Use: playable={} non-playable={}",
            p.filter_playable_uses,
            p.filter_uses - p.filter_playable_uses
        ));
        if p.filter_uses > 0 {
            lines.push(format!(
                "Time (ms): total={} avg={:.2}",
                p.filter_elapsed_ms,
                average(p.filter_elapsed_ms, p.filter_uses)
            ));
        }
        lines.push(format!("Pathfind: success={}, fail={}", p.success, p.fail));
        lines
    }
}

fn buffer_line(b: &BufferClassStats) -> String {
    let mut line = format!(
        "Buffer {size}x{size}: count={} uses={}/{}",
        b.count,
        b.playable_uses,
        b.uses,
        size = b.size
    );
    if b.uses > 0 {
        line.push_str(&format!(" total/avg(ms)={}/{:.2}", b.elapsed_ms, average(b.elapsed_ms, b.uses)));
    }
    line.push_str(&format!(" ovf={}/{}", b.playable_overflows, b.overflows));
    line
}

impl fmt::Display for GeoStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}
