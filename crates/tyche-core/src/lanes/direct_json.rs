//! Typed decode of JSON bodies using known field-name synonyms.

use serde_json::{Map, Value};

use super::{LaneContext, hint_game};
use crate::error::AppError;
use crate::games::Game;
use crate::json;
use crate::models::{CandidateRecord, ExtractionMethod, RawCapture};

/// Folded keys naming the draw date, in preference order.
pub(crate) const DATE_KEYS: &[&str] = &[
    "drawdate",
    "fielddrawdate",
    "date",
    "playdate",
    "drawingdate",
    "drawndate",
    "fielddate",
    "postdate",
];

/// Folded keys naming the main-ball list.
const NUMBER_KEYS: &[&str] = &[
    "fieldwinningnumbers",
    "winningnumbers",
    "numbers",
    "drawnnumbers",
    "mainnumbers",
    "whiteballs",
];

const GENERIC_BONUS_KEYS: &[&str] = &["bonus", "bonusball", "bonusnumber"];

pub(crate) const JACKPOT_KEYS: &[&str] = &[
    "jackpot",
    "estimatedjackpot",
    "fieldjackpot",
    "annuityjackpot",
    "estimatedannuity",
    "jackpotprize",
    "currentjackpot",
    "prize",
];

pub(crate) const WINNER_KEYS: &[&str] = &[
    "winners",
    "winnercount",
    "winnerscount",
    "numwinners",
    "numberofwinners",
    "jackpotwinners",
];

pub(crate) const GAME_KEYS: &[&str] = &["game", "gamename", "name", "title"];

/// Keys whose array value holds one row per draw.
const ROW_CONTAINERS: &[&str] = &["items", "data", "results", "draws"];

const PRIZE_POOL_KEYS: &[&str] = &["currentprizepool", "nextprizepool", "currentcashvalue"];

pub fn extract(capture: &RawCapture, ctx: &LaneContext) -> Result<Vec<CandidateRecord>, AppError> {
    let text = capture.text();
    let Some(value) = json::parse_body(&text) else {
        return Ok(Vec::new());
    };
    Ok(decode_value(&json::unwrap_asmx(value), capture, ctx))
}

/// Decode an already-parsed JSON document. Shared with the embedded lane.
pub(crate) fn decode_value(
    root: &Value,
    capture: &RawCapture,
    ctx: &LaneContext,
) -> Vec<CandidateRecord> {
    let hint = hint_game(capture);
    if let Some(candidate) = drawing_bundle(root, capture, ctx, hint) {
        return vec![candidate];
    }
    rows(root)
        .into_iter()
        .filter_map(|row| row_candidate(row, capture, ctx, hint))
        .collect()
}

fn rows(root: &Value) -> Vec<&Map<String, Value>> {
    match root {
        Value::Array(items) => items.iter().filter_map(Value::as_object).collect(),
        Value::Object(map) => {
            let nested = ROW_CONTAINERS
                .iter()
                .find_map(|key| match json::field(map, &[*key]) {
                    Some((_, Value::Array(items))) => Some(items),
                    _ => None,
                });
            match nested {
                Some(items) => items.iter().filter_map(Value::as_object).collect(),
                None => vec![map],
            }
        }
        _ => Vec::new(),
    }
}

fn row_candidate(
    row: &Map<String, Value>,
    capture: &RawCapture,
    ctx: &LaneContext,
    hint: Option<Game>,
) -> Option<CandidateRecord> {
    let (_, date) = json::field(row, DATE_KEYS)?;
    let (_, numbers) = json::field(row, NUMBER_KEYS)?;
    let all = ctx.numbers.collect_numbers(numbers);
    if !(5..=7).contains(&all.len()) {
        return None;
    }

    let keyed_bonus = Game::ALL.into_iter().find_map(|game| {
        json::field(row, game.bonus_keys())
            .and_then(|(_, v)| ctx.numbers.first_number(v))
            .map(|bonus| (game, bonus))
    });
    let bonus = keyed_bonus
        .map(|(_, b)| b)
        .or_else(|| {
            json::field(row, GENERIC_BONUS_KEYS).and_then(|(_, v)| ctx.numbers.first_number(v))
        })
        .or_else(|| all.get(5).copied());

    let game = keyed_bonus
        .map(|(g, _)| g)
        .or_else(|| named_game(row))
        .or(hint)?;

    Some(
        CandidateRecord::new(
            game,
            json::as_text(date),
            all[..5].to_vec(),
            bonus,
            capture.source_url.clone(),
            ExtractionMethod::Json,
        )
        .with_jackpot(json::field(row, JACKPOT_KEYS).and_then(|(_, v)| ctx.numbers.money_value(v)))
        .with_winners(json::field(row, WINNER_KEYS).and_then(|(_, v)| count(v))),
    )
}

/// `{"Drawing": {N1..N5, MBall, PlayDate}, "Jackpot": {"CurrentPrizePool": ...}}`
fn drawing_bundle(
    root: &Value,
    capture: &RawCapture,
    ctx: &LaneContext,
    hint: Option<Game>,
) -> Option<CandidateRecord> {
    let map = root.as_object()?;
    let Some((_, Value::Object(drawing))) = json::field(map, &["drawing"]) else {
        return None;
    };
    let set = ctx.numbers.from_map(drawing)?;
    let (_, date) = json::field(drawing, DATE_KEYS)?;
    let game = drawing
        .keys()
        .find_map(|k| Game::from_bonus_key(k))
        .or(hint)?;

    let jackpot = json::field(map, &["jackpot"]).and_then(|(_, v)| match v {
        Value::Object(pool) => json::field(pool, PRIZE_POOL_KEYS)
            .and_then(|(_, amount)| ctx.numbers.money_value(amount)),
        other => ctx.numbers.money_value(other),
    });

    Some(
        CandidateRecord::new(
            game,
            json::as_text(date),
            set.mains,
            set.bonus,
            capture.source_url.clone(),
            ExtractionMethod::Json,
        )
        .with_jackpot(jackpot),
    )
}

/// Game named by an explicit `game`/`name`/`title` field.
pub(crate) fn named_game(row: &Map<String, Value>) -> Option<Game> {
    let (_, value) = json::field(row, GAME_KEYS)?;
    let text = json::as_text(value);
    text.parse().ok().or_else(|| Game::detect(&text))
}

/// Non-negative count from a number or a digit string like `"1,204"`.
pub(crate) fn count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{capture, context};

    #[test]
    fn test_field_prefixed_powerball_row() {
        let ctx = context();
        let c = capture(
            "https://www.powerball.com/api/v1/numbers/powerball/recent",
            r#"{"field_draw_date":"09/13/2025","field_winning_numbers":"01 12 23 34 45","field_powerball":"10"}"#,
        );
        let out = extract(&c, &ctx).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].game, "Powerball");
        assert_eq!(out[0].raw_date, "09/13/2025");
        assert_eq!(out[0].numbers, vec![1, 12, 23, 34, 45]);
        assert_eq!(out[0].bonus, Some(10));
        assert_eq!(out[0].extraction_method, ExtractionMethod::Json);
    }

    #[test]
    fn test_asmx_envelope_with_mega_ball() {
        let ctx = context();
        let c = capture(
            "https://example.org/service.asmx/GetLatest",
            r#"{"d":"[{\"DrawDate\":\"09/12/2025\",\"WinningNumbers\":\"5 10 15 20 25\",\"MegaBall\":7}]"}"#,
        );
        let out = extract(&c, &ctx).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].game, "Mega Millions");
        assert_eq!(out[0].numbers, vec![5, 10, 15, 20, 25]);
        assert_eq!(out[0].bonus, Some(7));
    }

    #[test]
    fn test_row_container_and_sixth_number_bonus() {
        let ctx = context();
        let c = capture(
            "https://www.luckyforlife.us/api/draws",
            r#"{"draws":[
                {"date":"2025-09-12","numbers":[2,9,17,33,41,12],"jackpot":"$7,000 a Week for Life"},
                {"date":"2025-09-11","numbers":[1,2]}
            ]}"#,
        );
        let out = extract(&c, &ctx).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].game, "Lucky for Life");
        assert_eq!(out[0].bonus, Some(12));
        assert_eq!(out[0].jackpot_amount, Some(7_000));
    }

    #[test]
    fn test_game_from_name_field() {
        let ctx = context();
        let c = capture(
            "https://example.org/feed.json",
            r#"[{"game_name":"Cash 4 Life","draw_date":"2025-09-12","winning_numbers":"3 8 19 27 44","cash_ball":"2","winners":"1,204"}]"#,
        );
        let out = extract(&c, &ctx).unwrap();
        assert_eq!(out[0].game, "Cash4Life");
        assert_eq!(out[0].bonus, Some(2));
        assert_eq!(out[0].winners_count, Some(1_204));
    }

    #[test]
    fn test_drawing_bundle() {
        let ctx = context();
        let c = capture(
            "https://www.megamillions.com/cmspages/utilservice.asmx/GetLatestDrawData",
            r#"{"d":"{\"Drawing\":{\"PlayDate\":\"2025-09-12T00:00:00\",\"N1\":4,\"N2\":11,\"N3\":30,\"N4\":52,\"N5\":68,\"MBall\":9},\"Jackpot\":{\"CurrentPrizePool\":350000000}}"}"#,
        );
        let out = extract(&c, &ctx).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].game, "Mega Millions");
        assert_eq!(out[0].numbers, vec![4, 11, 30, 52, 68]);
        assert_eq!(out[0].bonus, Some(9));
        assert_eq!(out[0].jackpot_amount, Some(350_000_000));
    }

    #[test]
    fn test_markup_and_unknown_game_yield_nothing() {
        let ctx = context();
        let html = capture("https://www.powerball.com/", "<html><body>01 12 23 34 45</body></html>");
        assert!(extract(&html, &ctx).unwrap().is_empty());
        let anonymous = capture(
            "https://example.org/feed.json",
            r#"{"date":"2025-09-12","numbers":"1 2 3 4 5 6"}"#,
        );
        assert!(extract(&anonymous, &ctx).unwrap().is_empty());
    }
}
