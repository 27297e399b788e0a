use std::future::Future;
use std::path::Path;

use crate::error::AppError;
use crate::models::{CandidateRecord, RawCapture};

/// Supplies the raw captures written by the fetch layer.
pub trait CaptureSource: Send + Sync + Clone {
    /// Load every capture available to this source.
    ///
    /// A single unreadable capture is skipped by the implementation; only a
    /// source-wide failure is an error.
    fn load(&self) -> impl Future<Output = Result<Vec<RawCapture>, AppError>> + Send;
}

/// External OCR backend turning a page screenshot into candidate draws.
///
/// Called from the per-capture worker pool, so implementations must be
/// shareable across threads.
pub trait VisionBridge: Send + Sync {
    /// Candidates read from the image at `image`. An empty list is a valid
    /// answer.
    fn extract_from_image(&self, image: &Path) -> Result<Vec<CandidateRecord>, AppError>;
}
