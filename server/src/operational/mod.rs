// geodata_server/server/src/operational/mod.rs
pub mod bug_report;
pub mod monitoring;
pub mod stats;
