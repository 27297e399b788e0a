pub mod assembler;
pub mod config;
pub mod dates;
pub mod dedup;
pub mod error;
pub mod games;
pub mod json;
pub mod lanes;
pub mod markup;
pub mod models;
pub mod numbers;
pub mod output;
pub mod pipeline;
pub mod router;
pub mod rules;
pub mod traits;
pub mod validator;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::PipelineConfig;
pub use error::AppError;
pub use games::{Game, GameRule, GameRuleTable};
pub use lanes::{LaneContext, LaneId};
pub use models::{CandidateRecord, CanonicalRecord, CaptureMeta, ExtractionMethod, RawCapture};
pub use pipeline::{Dataset, ExtractionStats, Pipeline, PipelineReporter, TracingPipelineReporter};
pub use router::SourceRouter;
pub use rules::{AdapterRegistry, AdapterRule};
pub use traits::{CaptureSource, VisionBridge};
pub use validator::GameRuleValidator;
