use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, TimeZone, Utc};
use tyche_core::{
    AdapterRegistry, AppError, CandidateRecord, CaptureMeta, Pipeline, PipelineConfig,
    PipelineReporter, RawCapture, VisionBridge,
};

/// Reference instant shared by every scenario: 2025-09-14 12:00 UTC.
pub fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 14, 12, 0, 0).unwrap()
}

pub fn config() -> PipelineConfig {
    PipelineConfig::default().with_as_of(as_of())
}

/// A 200 capture of `url`, fetched one day before [`as_of`].
pub fn capture(url: &str, body: &str) -> RawCapture {
    RawCapture::new(
        CaptureMeta {
            url: url.to_string(),
            fetched_at: Some(as_of() - Duration::days(1)),
            status: Some(200),
            content_type: Some(if body.trim_start().starts_with(['{', '[']) {
                "application/json".into()
            } else {
                "text/html".into()
            }),
            ..Default::default()
        },
        body.as_bytes().to_vec(),
    )
}

pub fn pipeline() -> Pipeline {
    Pipeline::new(config(), AdapterRegistry::empty(), None).unwrap()
}

pub fn pipeline_with_vision(vision: MockVision) -> Pipeline {
    Pipeline::new(config(), AdapterRegistry::empty(), Some(Arc::new(vision))).unwrap()
}

/// Reporter that ignores every event.
pub struct Quiet;

impl PipelineReporter for Quiet {}

pub const SCENARIO_A: &str = r#"{"field_draw_date":"09/13/2025","field_winning_numbers":"01 12 23 34 45","field_powerball":"10"}"#;

pub const SCENARIO_B: &str =
    r#"{"d":"[{\"DrawDate\":\"09/12/2025\",\"WinningNumbers\":\"5 10 15 20 25\",\"MegaBall\":7}]"}"#;

pub const SCENARIO_C: &str = r#"<html><body>
    <h1>404 — page wasn't a winner</h1>
    <p>Try these instead: Powerball 01 12 23 34 45 Powerball 10 on 09/10/2025</p>
    <script>var last = {"date":"2025-09-10","numbers":[1,12,23,34,45,10]};</script>
</body></html>"#;

pub const SCENARIO_D: &str = r#"<html><body><article>
    <p>Last night's Powerball numbers 01 12 23 34 45 Powerball 10 Drawn on 09/10/2025. Nobody hit the jackpot.</p>
</article></body></html>"#;

/// OCR bridge that records every image it is asked about.
#[derive(Clone, Default)]
pub struct MockVision {
    candidates: Vec<CandidateRecord>,
    fail: bool,
    calls: Arc<Mutex<Vec<PathBuf>>>,
}

impl MockVision {
    pub fn returning(candidates: Vec<CandidateRecord>) -> Self {
        Self {
            candidates,
            ..Default::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }
}

impl VisionBridge for MockVision {
    fn extract_from_image(&self, image: &Path) -> Result<Vec<CandidateRecord>, AppError> {
        self.calls.lock().unwrap().push(image.to_path_buf());
        if self.fail {
            return Err(AppError::VisionError("backend unavailable".into()));
        }
        Ok(self.candidates.clone())
    }
}
