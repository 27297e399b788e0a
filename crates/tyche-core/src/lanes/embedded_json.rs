//! Recovery of JSON blobs embedded in markup (scripts, data attributes).

use super::{LaneContext, direct_json, json_mining};
use crate::error::AppError;
use crate::markup;
use crate::models::{CandidateRecord, RawCapture};

/// Decode each embedded span with the typed decoder, then the tree miner,
/// stopping at the first span that yields a candidate passing the ball rules.
pub fn extract(capture: &RawCapture, ctx: &LaneContext) -> Result<Vec<CandidateRecord>, AppError> {
    if capture.looks_like_json() {
        return Ok(Vec::new());
    }
    let text = capture.text();
    let spans = markup::embedded_json(&ctx.markup, &text, ctx.config.max_json_spans);

    for span in &spans {
        let mut candidates = direct_json::decode_value(span, capture, ctx);
        if !candidates.iter().any(|c| ctx.validator().accepts(c)) {
            candidates = json_mining::mine(span, capture, ctx);
        }
        if candidates.iter().any(|c| ctx.validator().accepts(c)) {
            return Ok(candidates);
        }
    }

    Ok(Vec::new())
}
