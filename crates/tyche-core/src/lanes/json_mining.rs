//! Generic mining of arbitrary JSON trees for draw-shaped objects.

use serde_json::{Map, Value};

use super::direct_json::{DATE_KEYS, JACKPOT_KEYS, WINNER_KEYS, count, named_game};
use super::{LaneContext, hint_game};
use crate::error::AppError;
use crate::games::{Game, fold_key};
use crate::json;
use crate::models::{CandidateRecord, ExtractionMethod, RawCapture};
use crate::numbers::{NumberSet, is_ball_key};

pub fn extract(capture: &RawCapture, ctx: &LaneContext) -> Result<Vec<CandidateRecord>, AppError> {
    let text = capture.text();
    let Some(value) = json::parse_body(&text) else {
        return Ok(Vec::new());
    };
    Ok(mine(&json::unwrap_asmx(value), capture, ctx))
}

/// Visit every object in `root` and emit a candidate for each one carrying
/// both a date field and a ball field, up to `json_max_records`.
pub(crate) fn mine(root: &Value, capture: &RawCapture, ctx: &LaneContext) -> Vec<CandidateRecord> {
    let hint = hint_game(capture);
    let limit = ctx.config.json_max_records;
    let mut out = Vec::new();

    for node in json::objects(root, ctx.config.walk_limits()) {
        if out.len() >= limit {
            tracing::debug!(url = %capture.source_url, limit, "JSON mining hit record cap");
            break;
        }
        if let Some(candidate) = node_candidate(node, capture, ctx, hint) {
            out.push(candidate);
        }
    }

    out
}

fn node_candidate(
    node: &Map<String, Value>,
    capture: &RawCapture,
    ctx: &LaneContext,
    hint: Option<Game>,
) -> Option<CandidateRecord> {
    let (_, date) = json::field(node, DATE_KEYS).or_else(|| json::field_containing(node, "date"))?;
    if !node.keys().any(|k| is_ball_key(&fold_key(k))) {
        return None;
    }
    let set = numbers_on(node, ctx)?;
    let game = named_game(node)
        .or_else(|| bonus_game(node))
        .or(hint)?;

    Some(
        CandidateRecord::new(
            game,
            json::as_text(date),
            set.mains,
            set.bonus,
            capture.source_url.clone(),
            ExtractionMethod::Json,
        )
        .with_jackpot(json::field(node, JACKPOT_KEYS).and_then(|(_, v)| ctx.numbers.money_value(v)))
        .with_winners(json::field(node, WINNER_KEYS).and_then(|(_, v)| count(v))),
    )
}

/// Prefer a set with a bonus ball: the node as a whole first, then each
/// nested ball-keyed value.
fn numbers_on(node: &Map<String, Value>, ctx: &LaneContext) -> Option<NumberSet> {
    let mut best = ctx.numbers.from_map(node);
    if best.as_ref().is_some_and(|s| s.bonus.is_some()) {
        return best;
    }
    for (key, value) in node {
        if !is_ball_key(&fold_key(key)) || !(value.is_object() || value.is_array()) {
            continue;
        }
        if let Some(set) = ctx.numbers.from_value(value) {
            if set.bonus.is_some() {
                return Some(set);
            }
            best.get_or_insert(set);
        }
    }
    best
}

/// Game whose bonus-ball key appears on the node or one level below it.
fn bonus_game(node: &Map<String, Value>) -> Option<Game> {
    node.keys()
        .find_map(|k| Game::from_bonus_key(k))
        .or_else(|| {
            node.values()
                .filter_map(Value::as_object)
                .find_map(|child| child.keys().find_map(|k| Game::from_bonus_key(k)))
        })
}
