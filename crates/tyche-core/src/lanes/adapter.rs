//! Extraction driven by declarative per-host adapter rules.

use regex::{Captures, Regex};
use scraper::Html;

use super::LaneContext;
use crate::error::AppError;
use crate::markup::visible_text;
use crate::models::{CandidateRecord, ExtractionMethod, RawCapture};
use crate::rules::CompiledRule;

/// Apply the host's rules in load order. Within a rule, scopes come from its
/// CSS selector (or every text block when it has none or it matches nothing);
/// the first scope producing a candidate that passes the ball rules wins.
pub fn extract(capture: &RawCapture, ctx: &LaneContext) -> Result<Vec<CandidateRecord>, AppError> {
    let rules = ctx.adapters.for_host(&capture.host);
    if rules.is_empty() {
        return Ok(Vec::new());
    }

    let text = capture.text();
    let html = Html::parse_document(&text);
    let blocks = ctx.markup.text_blocks(&html);

    for rule in rules {
        let scoped: Vec<String> = rule
            .css_scope
            .as_ref()
            .map(|selector| html.select(selector).map(visible_text).collect())
            .unwrap_or_default();
        let scopes = if scoped.is_empty() { &blocks } else { &scoped };

        for scope in scopes.iter().filter(|s| rule.in_scope(s)) {
            let Some(candidate) = apply_rule(rule, scope, capture, ctx) else {
                continue;
            };
            if ctx.validator().accepts(&candidate) {
                return Ok(vec![candidate]);
            }
        }
    }

    Ok(Vec::new())
}

/// Rule patterns first, built-in heuristics for any field the rule leaves out.
fn apply_rule(
    rule: &CompiledRule,
    text: &str,
    capture: &RawCapture,
    ctx: &LaneContext,
) -> Option<CandidateRecord> {
    let raw_date = rule
        .date
        .as_ref()
        .and_then(|re| first_group(re, text))
        .filter(|d| ctx.dates().parse(d).is_some())
        .or_else(|| ctx.dates().find(text).map(str::to_string))?;

    let near = ctx
        .numbers
        .near_keyword(text, rule.game)
        .into_iter()
        .next()
        .map(|hit| hit.set);
    let built_in = near.or_else(|| ctx.numbers.from_text(text));

    let mains = match rule.numbers.as_ref().and_then(|re| re.find(text)) {
        Some(m) => ctx.numbers.digits(m.as_str()),
        None => built_in.as_ref()?.mains.clone(),
    };
    if mains.len() < 5 {
        return None;
    }

    let bonus = rule
        .bonus
        .as_ref()
        .and_then(|re| re.find(text))
        .and_then(|m| ctx.numbers.digits(m.as_str()).into_iter().next())
        .or_else(|| built_in.as_ref().and_then(|set| set.bonus));

    let jackpot = rule
        .jackpot
        .as_ref()
        .and_then(|re| re.find(text))
        .and_then(|m| ctx.numbers.money(m.as_str()))
        .or_else(|| ctx.numbers.jackpot_in_text(text));

    Some(
        CandidateRecord::new(
            rule.game,
            raw_date,
            mains[..5].to_vec(),
            bonus,
            capture.source_url.clone(),
            ExtractionMethod::Html,
        )
        .with_jackpot(jackpot),
    )
}

/// Capture group 1 if the pattern has one, else the whole match.
fn first_group(re: &Regex, text: &str) -> Option<String> {
    let c: Captures<'_> = re.captures(text)?;
    c.get(1)
        .or_else(|| c.get(0))
        .map(|m| m.as_str().trim().to_string())
}
