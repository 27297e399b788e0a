use std::borrow::Cow;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::games::Game;

/// Sidecar metadata written next to every captured body by the fetch layer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaptureMeta {
    pub url: String,
    #[serde(default)]
    pub final_url: Option<String>,
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub content_type: Option<String>,
    /// Hex SHA-256 of the body as written by the fetcher.
    #[serde(default)]
    pub sha256: Option<String>,
}

/// One fetched unit: raw body plus the metadata describing where it came from.
///
/// Never mutated after construction; lanes only borrow it.
#[derive(Debug, Clone)]
pub struct RawCapture {
    pub source_url: String,
    pub final_url: String,
    pub fetched_at: Option<DateTime<Utc>>,
    pub content_type: Option<String>,
    pub status: Option<u16>,
    pub body: Vec<u8>,
    /// Lowercased host of `final_url`, empty if the URL does not parse.
    pub host: String,
    /// Full-page screenshot handed to the OCR bridge, if one was captured.
    pub screenshot: Option<PathBuf>,
}

impl RawCapture {
    pub fn new(meta: CaptureMeta, body: Vec<u8>) -> Self {
        let final_url = meta
            .final_url
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| meta.url.clone());
        let host = Url::parse(&final_url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_lowercase))
            .unwrap_or_default();

        Self {
            source_url: meta.url,
            final_url,
            fetched_at: meta.fetched_at,
            content_type: meta.content_type,
            status: meta.status,
            body,
            host,
            screenshot: None,
        }
    }

    pub fn with_screenshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.screenshot = Some(path.into());
        self
    }

    /// Body decoded as UTF-8 (lossy), without a leading byte-order mark.
    pub fn text(&self) -> Cow<'_, str> {
        let bytes = self
            .body
            .strip_prefix(b"\xEF\xBB\xBF".as_slice())
            .unwrap_or(&self.body);
        String::from_utf8_lossy(bytes)
    }

    /// Lowercased URL path, used as a game hint alongside the host.
    pub fn path(&self) -> String {
        Url::parse(&self.final_url)
            .map(|u| u.path().to_lowercase())
            .unwrap_or_default()
    }

    /// True when the fetch layer recorded a non-2xx status.
    pub fn is_error_status(&self) -> bool {
        self.status.is_some_and(|s| !(200..=299).contains(&s))
    }

    /// True when the body starts (after whitespace) like a JSON document.
    pub fn looks_like_json(&self) -> bool {
        matches!(
            self.text().trim_start().chars().next(),
            Some('{') | Some('[')
        )
    }
}

/// How a candidate was extracted. Ordered by trust: `Json > Html > Vision`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMethod {
    Vision,
    Html,
    Json,
}

impl ExtractionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractionMethod::Json => "json",
            ExtractionMethod::Html => "html",
            ExtractionMethod::Vision => "vision",
        }
    }

    /// Confidence rank used only to break ties during deduplication.
    pub fn rank(&self) -> u8 {
        match self {
            ExtractionMethod::Json => 3,
            ExtractionMethod::Html => 2,
            ExtractionMethod::Vision => 1,
        }
    }
}

impl fmt::Display for ExtractionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ExtractionMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExtractionMethod::Json),
            "html" => Ok(ExtractionMethod::Html),
            "vision" => Ok(ExtractionMethod::Vision),
            _ => Err(format!("Unknown extraction method: {}", s)),
        }
    }
}

/// A draw pulled out of a capture by one lane. May still be invalid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateRecord {
    /// Game name as found; validated against the rule table later.
    pub game: String,
    pub raw_date: String,
    /// Main balls in draw order.
    pub numbers: Vec<u32>,
    pub bonus: Option<u32>,
    pub jackpot_amount: Option<u64>,
    pub winners_count: Option<u64>,
    pub source_url: String,
    pub extraction_method: ExtractionMethod,
    pub confidence: Option<f32>,
}

impl CandidateRecord {
    pub fn new(
        game: Game,
        raw_date: impl Into<String>,
        numbers: Vec<u32>,
        bonus: Option<u32>,
        source_url: impl Into<String>,
        extraction_method: ExtractionMethod,
    ) -> Self {
        Self {
            game: game.name().to_string(),
            raw_date: raw_date.into(),
            numbers,
            bonus,
            jackpot_amount: None,
            winners_count: None,
            source_url: source_url.into(),
            extraction_method,
            confidence: None,
        }
    }

    pub fn with_jackpot(mut self, jackpot: Option<u64>) -> Self {
        self.jackpot_amount = jackpot;
        self
    }

    pub fn with_winners(mut self, winners: Option<u64>) -> Self {
        self.winners_count = winners;
        self
    }
}

/// A validated, date-normalized draw record.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalRecord {
    pub game: Game,
    pub date: NaiveDate,
    pub numbers: Vec<u32>,
    pub bonus: u32,
    pub jackpot_usd: Option<u64>,
    pub winners: Option<u64>,
    pub source_url: String,
    pub fetched_at: Option<DateTime<Utc>>,
    pub extraction_method: ExtractionMethod,
    pub confidence: Option<f32>,
}

/// Uniqueness key of a canonical record: game, date, and every ball in order.
pub type RecordKey = (Game, NaiveDate, Vec<u32>);

impl CanonicalRecord {
    /// Main balls followed by the bonus ball.
    pub fn all_numbers(&self) -> Vec<u32> {
        let mut all = self.numbers.clone();
        all.push(self.bonus);
        all
    }

    pub fn key(&self) -> RecordKey {
        (self.game, self.date, self.all_numbers())
    }
}
