//! Application services for conflict detection.

mod detector;
mod passes;

pub use detector::{
    ConflictDetector, ConflictDetectorError, ConflictDetectorResult, DEFAULT_HISTORY_LIMIT,
};
