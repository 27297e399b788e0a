//! The ordered extraction strategies tried per capture.
//!
//! Every lane is a pure function of one capture and the shared, read-only
//! [`LaneContext`]. Lanes return raw candidates; validation happens at the
//! lane boundary in the pipeline.

pub mod adapter;
pub mod direct_json;
pub mod embedded_json;
pub mod json_mining;
pub mod rendered_text;
pub mod vision;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

use crate::assembler::RecordAssembler;
use crate::config::PipelineConfig;
use crate::dates::DateNormalizer;
use crate::error::AppError;
use crate::games::{Game, GameRuleTable};
use crate::markup::MarkupScanner;
use crate::models::{CandidateRecord, RawCapture};
use crate::numbers::NumberExtractor;
use crate::rules::AdapterRegistry;
use crate::traits::VisionBridge;
use crate::validator::GameRuleValidator;

/// Identifier of one extraction lane, in trust order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LaneId {
    DirectJson,
    JsonMining,
    EmbeddedJson,
    AdapterRules,
    RenderedText,
    Vision,
}

impl LaneId {
    pub const ALL: [LaneId; 6] = [
        LaneId::DirectJson,
        LaneId::JsonMining,
        LaneId::EmbeddedJson,
        LaneId::AdapterRules,
        LaneId::RenderedText,
        LaneId::Vision,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LaneId::DirectJson => "direct_json",
            LaneId::JsonMining => "json_mining",
            LaneId::EmbeddedJson => "embedded_json",
            LaneId::AdapterRules => "adapter_rules",
            LaneId::RenderedText => "rendered_text",
            LaneId::Vision => "vision",
        }
    }
}

impl fmt::Display for LaneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for LaneId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LaneId::ALL
            .into_iter()
            .find(|lane| lane.as_str() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown lane: {}", s))
    }
}

/// Everything a lane may read: compiled patterns, rule registries, config,
/// and the optional OCR bridge. Built once per run and shared by reference.
pub struct LaneContext {
    pub assembler: RecordAssembler,
    pub numbers: NumberExtractor,
    pub markup: MarkupScanner,
    pub adapters: AdapterRegistry,
    pub vision: Option<Arc<dyn VisionBridge>>,
    pub config: PipelineConfig,
}

impl LaneContext {
    pub fn new(
        config: PipelineConfig,
        adapters: AdapterRegistry,
        vision: Option<Arc<dyn VisionBridge>>,
    ) -> Result<Self, AppError> {
        let dates = DateNormalizer::new(config.as_of, config.recency_window_days)?;
        Ok(Self {
            assembler: RecordAssembler::new(GameRuleValidator::new(GameRuleTable::new()), dates),
            numbers: NumberExtractor::new()?,
            markup: MarkupScanner::new()?,
            adapters,
            vision,
            config,
        })
    }

    pub fn dates(&self) -> &DateNormalizer {
        self.assembler.dates()
    }

    pub fn validator(&self) -> &GameRuleValidator {
        self.assembler.validator()
    }
}

/// Run one lane against one capture.
pub fn run(
    lane: LaneId,
    capture: &RawCapture,
    ctx: &LaneContext,
) -> Result<Vec<CandidateRecord>, AppError> {
    match lane {
        LaneId::DirectJson => direct_json::extract(capture, ctx),
        LaneId::JsonMining => json_mining::extract(capture, ctx),
        LaneId::EmbeddedJson => embedded_json::extract(capture, ctx),
        LaneId::AdapterRules => adapter::extract(capture, ctx),
        LaneId::RenderedText => rendered_text::extract(capture, ctx),
        LaneId::Vision => vision::extract(capture, ctx),
    }
}

/// Game named by the capture's host or path, if any.
pub fn hint_game(capture: &RawCapture) -> Option<Game> {
    Game::detect(&format!("{} {}", capture.host, capture.path()))
}
