//! Test utilities: fixed clock, capture builders and a recording OCR mock.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, TimeZone, Utc};

use crate::config::PipelineConfig;
use crate::error::AppError;
use crate::lanes::LaneContext;
use crate::models::{CandidateRecord, CaptureMeta, RawCapture};
use crate::rules::AdapterRegistry;
use crate::traits::VisionBridge;

/// Fixed reference instant: 2025-09-14 12:00 UTC.
pub fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 14, 12, 0, 0).unwrap()
}

pub fn config() -> PipelineConfig {
    PipelineConfig::default().with_as_of(as_of())
}

/// A 200 capture of `url` with the given body.
pub fn capture(url: &str, body: &str) -> RawCapture {
    RawCapture::new(
        CaptureMeta {
            url: url.to_string(),
            fetched_at: Some(as_of()),
            status: Some(200),
            ..Default::default()
        },
        body.as_bytes().to_vec(),
    )
}

pub fn context() -> LaneContext {
    context_with(config())
}

pub fn context_with(config: PipelineConfig) -> LaneContext {
    LaneContext::new(config, AdapterRegistry::empty(), None).unwrap()
}

pub fn context_with_rules(adapters: AdapterRegistry) -> LaneContext {
    LaneContext::new(config(), adapters, None).unwrap()
}

pub fn context_with_vision(vision: Arc<dyn VisionBridge>) -> LaneContext {
    LaneContext::new(config(), AdapterRegistry::empty(), Some(vision)).unwrap()
}

// ---------------------------------------------------------------------------
// MockVision
// ---------------------------------------------------------------------------

/// OCR bridge that records every image it is asked about.
#[derive(Clone)]
pub struct MockVision {
    response: Arc<Mutex<Result<Vec<CandidateRecord>, String>>>,
    calls: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockVision {
    pub fn new(candidates: Vec<CandidateRecord>) -> Self {
        Self {
            response: Arc::new(Mutex::new(Ok(candidates))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            response: Arc::new(Mutex::new(Err(message.to_string()))),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

impl VisionBridge for MockVision {
    fn extract_from_image(&self, image: &Path) -> Result<Vec<CandidateRecord>, AppError> {
        self.calls.lock().unwrap().push(image.to_path_buf());
        self.response
            .lock()
            .unwrap()
            .clone()
            .map_err(AppError::VisionError)
    }
}
