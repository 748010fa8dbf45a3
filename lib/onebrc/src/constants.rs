//! Centralized environment variable names and default values for run tuning.

// Environment variable names
pub const ENV_CHUNK_BYTES: &str = "ONEBRC_CHUNK_BYTES";
pub const ENV_THREADS: &str = "ONEBRC_THREADS";
pub const ENV_SKIP_MALFORMED: &str = "ONEBRC_SKIP_MALFORMED";

pub const DEFAULT_INPUT_PATH: &str = "./measurements.txt";

// Auto-sized chunks: each worker gets several ranges so a slow range does not stall the pool
pub const RANGES_PER_WORKER: usize = 4;
pub const MIN_AUTO_CHUNK_BYTES: usize = 64 * 1024; // 64 KiB
pub const MAX_AUTO_CHUNK_BYTES: usize = 256 * 1024 * 1024; // 256 MiB

// Records between two checks of the shared abort flag
pub const ABORT_CHECK_INTERVAL: u64 = 64 * 1024;

pub const LINE_TERMINATOR: u8 = b'\n';
pub const FIELD_DELIMITER: u8 = b';';

// Partial maps at or above this count are merged as a parallel tree
pub const TREE_REDUCE_MIN_MAPS: usize = 8;
