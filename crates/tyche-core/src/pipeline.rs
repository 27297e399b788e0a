//! The batch driver: route, run lanes, validate, assemble, deduplicate.

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;

use crate::config::PipelineConfig;
use crate::dedup::{deduplicate, sort_records};
use crate::error::AppError;
use crate::lanes::{self, LaneContext, LaneId};
use crate::markup;
use crate::models::{CanonicalRecord, RawCapture};
use crate::router::SourceRouter;
use crate::rules::AdapterRegistry;
use crate::traits::VisionBridge;
use crate::validator::Rejection;

/// Events emitted by the pipeline for monitoring/logging.
#[derive(Debug, Clone)]
pub enum PipelineEvent<'a> {
    Started {
        captures: usize,
        adapter_rules: usize,
    },
    CaptureSkipped {
        url: &'a str,
        reason: SkipReason,
    },
    LaneFailed {
        url: &'a str,
        lane: LaneId,
        error: &'a AppError,
    },
    /// A lane hit an error that is not confined to this capture; the
    /// remaining lanes are not tried.
    CaptureAborted {
        url: &'a str,
        lane: LaneId,
        error: &'a AppError,
    },
    CandidateRejected {
        url: &'a str,
        lane: LaneId,
        reason: Rejection,
    },
    CaptureCompleted {
        url: &'a str,
        host: &'a str,
        lane: Option<LaneId>,
        records: usize,
    },
    Finished {
        records: usize,
        duplicates: usize,
    },
}

/// Why a capture never reached the lanes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    ErrorStatus(u16),
    Soft404,
}

/// Trait for receiving pipeline events (decoupled logging).
pub trait PipelineReporter: Send + Sync {
    fn report(&self, event: PipelineEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPipelineReporter;

impl PipelineReporter for TracingPipelineReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        match event {
            PipelineEvent::Started {
                captures,
                adapter_rules,
            } => {
                tracing::info!(%captures, %adapter_rules, "Pipeline started");
            }
            PipelineEvent::CaptureSkipped { url, reason } => match reason {
                SkipReason::ErrorStatus(status) => {
                    tracing::info!(%url, %status, "Skipping capture with error status");
                }
                SkipReason::Soft404 => {
                    tracing::info!(%url, "Skipping soft 404 page");
                }
            },
            PipelineEvent::LaneFailed { url, lane, error } => {
                tracing::warn!(%url, %lane, %error, "Lane failed");
            }
            PipelineEvent::CaptureAborted { url, lane, error } => {
                tracing::error!(%url, %lane, %error, "Capture aborted");
            }
            PipelineEvent::CandidateRejected { url, lane, reason } => {
                tracing::debug!(%url, %lane, %reason, "Candidate rejected");
            }
            PipelineEvent::CaptureCompleted {
                url,
                host,
                lane,
                records,
            } => match lane {
                Some(lane) => tracing::debug!(%url, %host, %lane, %records, "Capture extracted"),
                None => tracing::info!(%url, %host, "No lane produced a valid record"),
            },
            PipelineEvent::Finished {
                records,
                duplicates,
            } => {
                tracing::info!(%records, %duplicates, "Pipeline finished");
            }
        }
    }
}

/// Diagnostic counters for one run. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExtractionStats {
    pub captures: usize,
    pub skipped_status: usize,
    pub soft_404: usize,
    /// Captures for which every lane came up empty.
    pub unresolved: usize,
    /// Captures abandoned after a lane error that was not capture-local.
    pub aborted: usize,
    pub rejected: usize,
    pub duplicates: usize,
    /// Accepted records per capture host, before deduplication.
    pub per_host: BTreeMap<String, usize>,
    /// Accepted records per winning lane, before deduplication.
    pub per_lane: BTreeMap<String, usize>,
}

/// The deduplicated, publication-ordered result of a run.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub records: Vec<CanonicalRecord>,
    pub stats: ExtractionStats,
}

/// Result of pushing one capture through its lanes.
#[derive(Debug, Default)]
struct CaptureOutcome {
    host: String,
    lane: Option<LaneId>,
    records: Vec<CanonicalRecord>,
    rejected: usize,
    skipped: Option<SkipReason>,
    aborted: bool,
}

/// Runs every capture through its routed lanes and merges the results.
pub struct Pipeline {
    ctx: LaneContext,
    router: SourceRouter,
}

impl Pipeline {
    pub fn new(
        config: PipelineConfig,
        adapters: AdapterRegistry,
        vision: Option<Arc<dyn VisionBridge>>,
    ) -> Result<Self, AppError> {
        Ok(Self {
            ctx: LaneContext::new(config, adapters, vision)?,
            router: SourceRouter::new(),
        })
    }

    pub fn context(&self) -> &LaneContext {
        &self.ctx
    }

    pub fn router(&self) -> &SourceRouter {
        &self.router
    }

    /// Lane order the router picks for `host`.
    pub fn route(&self, host: &str) -> Vec<LaneId> {
        self.router.route(host, &self.ctx.adapters)
    }

    /// Extract every capture, then deduplicate and sort.
    ///
    /// Captures are independent until the deduplication barrier, so the
    /// extraction phase runs on the rayon pool unless `sequential` is set.
    /// Collection preserves input order either way.
    pub fn run<R: PipelineReporter>(&self, captures: &[RawCapture], reporter: &R) -> Dataset {
        reporter.report(PipelineEvent::Started {
            captures: captures.len(),
            adapter_rules: self.ctx.adapters.len(),
        });

        let outcomes: Vec<CaptureOutcome> = if self.ctx.config.sequential {
            captures
                .iter()
                .map(|c| self.process(c, reporter))
                .collect()
        } else {
            captures
                .par_iter()
                .map(|c| self.process(c, reporter))
                .collect()
        };

        let mut stats = ExtractionStats {
            captures: captures.len(),
            ..Default::default()
        };
        let mut accepted = Vec::new();
        for outcome in outcomes {
            stats.rejected += outcome.rejected;
            match outcome.skipped {
                Some(SkipReason::ErrorStatus(_)) => stats.skipped_status += 1,
                Some(SkipReason::Soft404) => stats.soft_404 += 1,
                None => {}
            }
            match outcome.lane {
                Some(lane) => {
                    *stats.per_host.entry(outcome.host).or_default() += outcome.records.len();
                    *stats.per_lane.entry(lane.to_string()).or_default() += outcome.records.len();
                }
                None if outcome.aborted => stats.aborted += 1,
                None if outcome.skipped.is_none() => stats.unresolved += 1,
                None => {}
            }
            accepted.extend(outcome.records);
        }

        let before = accepted.len();
        let mut records = deduplicate(accepted);
        sort_records(&mut records);
        stats.duplicates = before - records.len();

        reporter.report(PipelineEvent::Finished {
            records: records.len(),
            duplicates: stats.duplicates,
        });

        Dataset { records, stats }
    }

    /// Walk the routed lanes; the first lane with at least one record that
    /// passes validation wins and later lanes are never run.
    ///
    /// Capture-local lane errors count as zero candidates. Any other error
    /// abandons this capture only; the batch carries on.
    fn process<R: PipelineReporter>(&self, capture: &RawCapture, reporter: &R) -> CaptureOutcome {
        let url = capture.source_url.as_str();
        let mut outcome = CaptureOutcome {
            host: capture.host.clone(),
            ..Default::default()
        };

        if let Some(reason) = self.skip_reason(capture) {
            reporter.report(PipelineEvent::CaptureSkipped { url, reason });
            outcome.skipped = Some(reason);
            return outcome;
        }

        for lane in self.route(&capture.host) {
            let candidates = match lanes::run(lane, capture, &self.ctx) {
                Ok(candidates) => candidates,
                Err(error) if error.is_capture_local() => {
                    reporter.report(PipelineEvent::LaneFailed {
                        url,
                        lane,
                        error: &error,
                    });
                    continue;
                }
                Err(error) => {
                    reporter.report(PipelineEvent::CaptureAborted {
                        url,
                        lane,
                        error: &error,
                    });
                    outcome.aborted = true;
                    break;
                }
            };

            let mut records = Vec::new();
            for candidate in candidates {
                match self.ctx.assembler.assemble(candidate, capture.fetched_at) {
                    Ok(record) => records.push(record),
                    Err(reason) => {
                        outcome.rejected += 1;
                        reporter.report(PipelineEvent::CandidateRejected { url, lane, reason });
                    }
                }
            }

            if !records.is_empty() {
                outcome.lane = Some(lane);
                outcome.records = records;
                break;
            }
        }

        reporter.report(PipelineEvent::CaptureCompleted {
            url,
            host: &capture.host,
            lane: outcome.lane,
            records: outcome.records.len(),
        });
        outcome
    }

    fn skip_reason(&self, capture: &RawCapture) -> Option<SkipReason> {
        if capture.is_error_status() {
            return capture.status.map(SkipReason::ErrorStatus);
        }
        if !capture.looks_like_json()
            && self
                .ctx
                .markup
                .is_soft_404(&markup::html_to_text(&capture.text()))
        {
            return Some(SkipReason::Soft404);
        }
        None
    }
}
