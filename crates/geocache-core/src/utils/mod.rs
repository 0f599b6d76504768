//! Small helpers shared by the cache modules.

pub mod format;
pub mod fs;

pub use format::{normalize_place, truncate_body};
pub use fs::write_atomic;
