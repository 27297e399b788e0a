//! Bridge to the external OCR backend for captures with a screenshot.

use super::LaneContext;
use crate::error::AppError;
use crate::models::{CandidateRecord, ExtractionMethod, RawCapture};

pub fn extract(capture: &RawCapture, ctx: &LaneContext) -> Result<Vec<CandidateRecord>, AppError> {
    let (Some(bridge), Some(image)) = (ctx.vision.as_ref(), capture.screenshot.as_ref()) else {
        return Ok(Vec::new());
    };

    let candidates = bridge.extract_from_image(image)?;
    Ok(candidates
        .into_iter()
        .map(|mut candidate| {
            candidate.extraction_method = ExtractionMethod::Vision;
            if candidate.source_url.is_empty() {
                candidate.source_url = capture.source_url.clone();
            }
            candidate
        })
        .collect())
}
