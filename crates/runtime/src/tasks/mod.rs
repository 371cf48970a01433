//! Resumable tasks driven by the runtime each tick.
mod cover_finder;
mod extraction_scan;

pub use cover_finder::{CoverFinderTask, CoverTaskContext};
pub use extraction_scan::{ExtractionScanTask, ExtractionTaskContext};
