//! Keyword and pattern scan over the visible text of a rendered page.

use super::{LaneContext, hint_game};
use crate::error::AppError;
use crate::games::Game;
use crate::markup;
use crate::models::{CandidateRecord, ExtractionMethod, RawCapture};

pub fn extract(capture: &RawCapture, ctx: &LaneContext) -> Result<Vec<CandidateRecord>, AppError> {
    let body = capture.text();
    let text = markup::html_to_text(&body);
    if ctx.markup.is_soft_404(&text) {
        tracing::debug!(url = %capture.source_url, "Soft 404 page");
        return Ok(Vec::new());
    }

    let hint = hint_game(capture);
    let games = match hint {
        Some(game) => vec![game],
        None => Game::ALL.to_vec(),
    };
    let page_date = ctx.dates().find(&text);
    let page_jackpot = ctx.numbers.jackpot_in_text(&text);
    let mut out = Vec::new();

    for game in games {
        for hit in ctx.numbers.near_keyword(&text, game) {
            let (window, offset) = window(&text, hit.offset, ctx.config.scan_window);
            let Some(raw_date) = ctx.dates().nearest(window, offset).or(page_date) else {
                continue;
            };
            out.push(
                CandidateRecord::new(
                    game,
                    raw_date,
                    hit.set.mains,
                    hit.set.bonus,
                    capture.source_url.clone(),
                    ExtractionMethod::Html,
                )
                .with_jackpot(ctx.numbers.jackpot_in_text(&window[offset..]).or(page_jackpot)),
            );
        }
    }

    if out.is_empty() {
        let game = hint.or_else(|| Game::detect(&text));
        let run = ctx.numbers.runs(&text).into_iter().next();
        if let (Some(game), Some(raw_date), Some(hit)) = (game, page_date, run) {
            out.push(
                CandidateRecord::new(
                    game,
                    raw_date,
                    hit.set.mains,
                    hit.set.bonus,
                    capture.source_url.clone(),
                    ExtractionMethod::Html,
                )
                .with_jackpot(page_jackpot),
            );
        }
    }

    Ok(out)
}

/// Up to `radius` bytes either side of `offset`, widened to char boundaries.
/// Returns the slice and `offset` relative to it.
fn window(text: &str, offset: usize, radius: usize) -> (&str, usize) {
    let mut start = offset.saturating_sub(radius);
    while !text.is_char_boundary(start) {
        start -= 1;
    }
    let mut end = offset.saturating_add(radius).min(text.len());
    while !text.is_char_boundary(end) {
        end += 1;
    }
    (&text[start..end], offset - start)
}
