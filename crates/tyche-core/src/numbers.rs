//! Heuristics that pull an ordered ball set out of JSON values and text.

use regex::Regex;
use serde_json::{Map, Value};

use crate::error::AppError;
use crate::games::{Game, fold_key};

/// Largest main ball any supported game draws, used to reject implausible runs.
const PLAUSIBLE_MAIN_MAX: u32 = 75;
/// Largest bonus ball any supported game draws.
const PLAUSIBLE_BONUS_MAX: u32 = 35;
/// Non-digit characters allowed between the last main ball and a bonus label.
const KEYWORD_GAP: usize = 40;

/// Keys (folded) whose value is the list of main balls.
const MAIN_KEYS: &[&str] = &[
    "whiteballs",
    "winningnumbers",
    "fieldwinningnumbers",
    "numbers",
    "mainnumbers",
    "drawnnumbers",
    "balls",
];

/// Generic bonus keys not tied to one game.
const GENERIC_BONUS_KEYS: &[&str] = &["bonus", "bonusball", "bonusnumber", "extra"];

/// Main balls in draw order plus an optional bonus ball.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumberSet {
    pub mains: Vec<u32>,
    pub bonus: Option<u32>,
}

impl NumberSet {
    fn plausible(mains: Vec<u32>, bonus: Option<u32>) -> Option<Self> {
        let mains_ok = mains.len() == 5
            && mains.iter().all(|n| (1..=PLAUSIBLE_MAIN_MAX).contains(n));
        let bonus_ok = bonus.is_none_or(|b| (1..=PLAUSIBLE_BONUS_MAX).contains(&b));
        (mains_ok && bonus_ok).then_some(Self { mains, bonus })
    }
}

/// A ball set found in free text, with the byte offset where it starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextHit {
    pub offset: usize,
    pub set: NumberSet,
}

/// Compiled patterns for number extraction. Built once per pipeline.
#[derive(Debug, Clone)]
pub struct NumberExtractor {
    token: Regex,
    five_plus_one: Regex,
    bare_run: Regex,
    near_bonus: Vec<(Game, Regex)>,
    money: Regex,
    jackpot: Regex,
}

impl NumberExtractor {
    pub fn new() -> Result<Self, AppError> {
        let sep = r"[,\s\-–•|]+";
        let five = format!(
            r"\b(\d{{1,2}}){sep}(\d{{1,2}}){sep}(\d{{1,2}}){sep}(\d{{1,2}}){sep}(\d{{1,2}})\b"
        );

        let near_bonus = Game::ALL
            .into_iter()
            .map(|game| {
                let label = bonus_label_pattern(game);
                Regex::new(&format!(
                    r"(?is){five}\D{{0,{KEYWORD_GAP}}}?{label}\D{{0,10}}?(\d{{1,2}})\b"
                ))
                .map(|re| (game, re))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            token: Regex::new(r"\b\d{1,2}\b")?,
            five_plus_one: Regex::new(&format!(
                r"{five}\s*(?:[+\-–]\s*|\(\s*|\s+)(\d{{1,2}})\b"
            ))?,
            bare_run: Regex::new(&five)?,
            near_bonus,
            money: Regex::new(
                r"(?i)(\d[\d,]*(?:\.\d+)?)\s*(billion|million|thousand|[bmk]\b)?",
            )?,
            jackpot: Regex::new(
                r"(?is)jackpot[^$0-9]{0,60}(\$?\s?\d[\d,]*(?:\.\d+)?(?:\s*(?:billion|million))?)",
            )?,
        })
    }

    /// Every one- or two-digit number token in `text`, in order.
    pub fn digits(&self, text: &str) -> Vec<u32> {
        self.token
            .find_iter(text)
            .filter_map(|m| m.as_str().parse().ok())
            .collect()
    }

    /// First plausible ball set in free text: a 5+1 run, else a bare 5 run.
    pub fn from_text(&self, text: &str) -> Option<NumberSet> {
        self.five_plus_one
            .captures_iter(text)
            .find_map(|c| {
                let all = groups(&c, 6)?;
                NumberSet::plausible(all[..5].to_vec(), Some(all[5]))
            })
            .or_else(|| {
                self.bare_run
                    .captures_iter(text)
                    .find_map(|c| NumberSet::plausible(groups(&c, 5)?, None))
            })
    }

    /// Every five-ball run followed closely by `game`'s bonus label and a bonus ball.
    pub fn near_keyword(&self, text: &str, game: Game) -> Vec<TextHit> {
        let Some((_, re)) = self.near_bonus.iter().find(|(g, _)| *g == game) else {
            return Vec::new();
        };
        re.captures_iter(text)
            .filter_map(|c| {
                let all = groups(&c, 6)?;
                let set = NumberSet::plausible(all[..5].to_vec(), Some(all[5]))?;
                let offset = c.get(0)?.start();
                Some(TextHit { offset, set })
            })
            .collect()
    }

    /// Bare five-ball runs (with an optional trailing sixth ball) and their offsets.
    pub fn runs(&self, text: &str) -> Vec<TextHit> {
        let with_bonus: Vec<TextHit> = self
            .five_plus_one
            .captures_iter(text)
            .filter_map(|c| {
                let all = groups(&c, 6)?;
                let set = NumberSet::plausible(all[..5].to_vec(), Some(all[5]))?;
                Some(TextHit {
                    offset: c.get(0)?.start(),
                    set,
                })
            })
            .collect();
        if !with_bonus.is_empty() {
            return with_bonus;
        }
        self.bare_run
            .captures_iter(text)
            .filter_map(|c| {
                let set = NumberSet::plausible(groups(&c, 5)?, None)?;
                Some(TextHit {
                    offset: c.get(0)?.start(),
                    set,
                })
            })
            .collect()
    }

    /// Try very hard to pull a ball set from a JSON value.
    ///
    /// Handles numeric lists, digit strings, and objects with separate
    /// main-ball / bonus-ball keys (`white_balls` + `powerball`, `N1..N5` + `MBall`).
    pub fn from_value(&self, value: &Value) -> Option<NumberSet> {
        match value {
            Value::Array(items) => {
                let flat: Vec<u32> = items.iter().filter_map(scalar_number).collect();
                if flat.len() != items.len() || !(5..=7).contains(&flat.len()) {
                    return None;
                }
                NumberSet::plausible(flat[..5].to_vec(), flat.get(5).copied())
            }
            Value::String(s) => self.from_text(s),
            Value::Object(map) => self.from_map(map),
            _ => None,
        }
    }

    /// Ball set from an object with separate main-ball and bonus-ball keys,
    /// falling back to scanning the object's flattened text.
    pub fn from_map(&self, map: &Map<String, Value>) -> Option<NumberSet> {
        let mut mains: Option<Vec<u32>> = None;
        let mut bonus = None;
        let mut indexed: Vec<(u32, u32)> = Vec::new();

        for (key, v) in map {
            let folded = fold_key(key);
            if mains.is_none() && MAIN_KEYS.contains(&folded.as_str()) {
                let found = self.collect_numbers(v);
                if found.len() >= 5 {
                    mains = Some(found);
                }
            } else if bonus.is_none() && is_bonus_key(&folded) {
                bonus = self.first_number(v);
            } else if let Some(idx) = folded
                .strip_prefix('n')
                .and_then(|rest| rest.parse::<u32>().ok())
            {
                if let Some(n) = scalar_number(v) {
                    indexed.push((idx, n));
                }
            }
        }

        if mains.is_none() && indexed.len() >= 5 {
            indexed.sort_unstable();
            mains = Some(indexed.into_iter().map(|(_, n)| n).collect());
        }

        if let Some(all) = mains {
            let bonus = bonus.or_else(|| all.get(5).copied());
            return NumberSet::plausible(all[..5].to_vec(), bonus);
        }

        serde_json::to_string(map)
            .ok()
            .and_then(|flat| self.from_text(&flat))
    }

    /// Every number a JSON value holds, flattening lists and digit strings.
    pub fn collect_numbers(&self, value: &Value) -> Vec<u32> {
        match value {
            Value::String(s) => self.digits(s),
            Value::Number(n) => n
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .into_iter()
                .collect(),
            Value::Array(items) => items.iter().flat_map(|v| self.collect_numbers(v)).collect(),
            Value::Object(map) => map.values().flat_map(|v| self.collect_numbers(v)).collect(),
            _ => Vec::new(),
        }
    }

    /// First number a JSON value holds (`10`, `"10"`, `"PB: 10"`, `[10]`).
    pub fn first_number(&self, value: &Value) -> Option<u32> {
        self.collect_numbers(value).into_iter().next()
    }

    /// Parse a money amount: `$1.2 Billion`, `$20,000,000`, `45 million`.
    pub fn money(&self, text: &str) -> Option<u64> {
        let c = self.money.captures(text)?;
        let base: f64 = c[1].replace(',', "").parse().ok()?;
        let scale = match c.get(2).map(|m| m.as_str().to_lowercase()).as_deref() {
            Some("billion") | Some("b") => 1e9,
            Some("million") | Some("m") => 1e6,
            Some("thousand") | Some("k") => 1e3,
            _ => 1.0,
        };
        let amount = (base * scale).round();
        (amount.is_finite() && amount >= 0.0).then_some(amount as u64)
    }

    /// Money amount from a JSON value (number or money string).
    pub fn money_value(&self, value: &Value) -> Option<u64> {
        match value {
            Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.round() as u64)),
            Value::String(s) => self.money(s),
            Value::Object(map) => map.values().find_map(|v| self.money_value(v)),
            _ => None,
        }
    }

    /// Jackpot amount announced after a "jackpot" keyword in free text.
    pub fn jackpot_in_text(&self, text: &str) -> Option<u64> {
        let c = self.jackpot.captures(text)?;
        self.money(&c[1])
    }
}

/// True for folded keys that name ball values: main-ball lists, bonus
/// balls, or indexed `N1`..`N7` fields.
pub fn is_ball_key(folded: &str) -> bool {
    MAIN_KEYS.contains(&folded)
        || folded == "results"
        || is_bonus_key(folded)
        || folded
            .strip_prefix('n')
            .is_some_and(|rest| rest.len() == 1 && rest.parse::<u32>().is_ok())
}

fn bonus_label_pattern(game: Game) -> &'static str {
    match game {
        Game::Powerball => r"power\s*ball",
        Game::MegaMillions => r"mega\s*ball",
        Game::LuckyForLife => r"lucky\s*ball",
        Game::Cash4Life => r"cash\s*ball",
        Game::LottoAmerica => r"star\s*ball",
    }
}

fn is_bonus_key(folded: &str) -> bool {
    GENERIC_BONUS_KEYS.contains(&folded)
        || Game::ALL.iter().any(|g| g.bonus_keys().contains(&folded))
}

fn scalar_number(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn groups(c: &regex::Captures<'_>, count: usize) -> Option<Vec<u32>> {
    (1..=count)
        .map(|i| c.get(i).and_then(|m| m.as_str().parse().ok()))
        .collect()
}
