// geodata_server/server/src/operational/bug_report.rs
use crate::core::config::WorldBounds;
use crate::core::constants::{BLOCK_CELLS_X, BLOCK_CELLS_Y};
use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::error;

/// Formats one report line: region tile, block within the region, cell within
/// the block, z and the comment. Semicolons in the comment would break the
/// column layout and become colons.
pub fn format_bug_line(bounds: &WorldBounds, geo_x: i32, geo_y: i32, z: i32, comment: &str) -> String {
    let region_cells = bounds.region_cells() as i32;
    let region_blocks = bounds.region_blocks as i32;
    let rx = geo_x / region_cells + bounds.tile_x_min;
    let ry = geo_y / region_cells + bounds.tile_y_min;
    let bx = (geo_x / BLOCK_CELLS_X as i32) % region_blocks;
    let by = (geo_y / BLOCK_CELLS_Y as i32) % region_blocks;
    let cx = geo_x % BLOCK_CELLS_X as i32;
    let cy = geo_y % BLOCK_CELLS_Y as i32;
    format!("{};{};{};{};{};{};{};{}\r\n", rx, ry, bx, by, cx, cy, z, comment.replace(';', ":"))
}

/// Append-only sink for reported geodata bugs. The file is opened on the
/// first report.
pub struct GeoBugReporter {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl GeoBugReporter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        GeoBugReporter { path: path.into(), file: Mutex::new(None) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn append(&self, line: &str) -> bool {
        match self.write_line(line) {
            Ok(()) => true,
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Couldn't save geodata bug report");
                false
            }
        }
    }

    fn write_line(&self, line: &str) -> io::Result<()> {
        let mut guard = self.file.lock();
        let file = match &mut *guard {
            Some(file) => file,
            slot => slot.insert(OpenOptions::new().create(true).append(true).open(&self.path)?),
        };
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}
