use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tyche_core::error::AppError;
use tyche_core::games::Game;
use tyche_core::models::{CandidateRecord, ExtractionMethod};
use tyche_core::traits::VisionBridge;

/// OCR bridge that shells out to an external program.
///
/// Runs `PROGRAM <image>` and reads a JSON list of draws from stdout. Any
/// failure (spawn error, non-zero exit, unparseable output) is logged and
/// yields no candidates.
#[derive(Debug, Clone)]
pub struct CommandVisionBridge {
    program: PathBuf,
    args: Vec<String>,
}

/// One draw as printed by the OCR program.
#[derive(Debug, Deserialize)]
struct VisionDraw {
    game: String,
    #[serde(alias = "draw_date")]
    date: String,
    numbers: Vec<u32>,
    #[serde(default)]
    bonus: Option<u32>,
    #[serde(default)]
    jackpot_usd: Option<u64>,
    #[serde(default)]
    source_url: Option<String>,
    #[serde(default)]
    confidence: Option<f32>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VisionOutput {
    List(Vec<VisionDraw>),
    Wrapped { records: Vec<VisionDraw> },
}

impl CommandVisionBridge {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Extra arguments placed before the image path.
    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    fn run(&self, image: &Path) -> Result<String, AppError> {
        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(image)
            .output()
            .map_err(|e| AppError::VisionError(format!("spawn {}: {e}", self.program.display())))?;

        if !output.status.success() {
            return Err(AppError::VisionError(format!(
                "{} exited with {}",
                self.program.display(),
                output.status
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl VisionBridge for CommandVisionBridge {
    fn extract_from_image(&self, image: &Path) -> Result<Vec<CandidateRecord>, AppError> {
        let parsed = self.run(image).and_then(|stdout| parse_output(&stdout));
        match parsed {
            Ok(candidates) => {
                tracing::debug!(image = %image.display(), found = candidates.len(), "OCR bridge finished");
                Ok(candidates)
            }
            Err(e) => {
                tracing::warn!(image = %image.display(), error = %e, "OCR bridge failed");
                Ok(Vec::new())
            }
        }
    }
}

/// Convert the OCR program's stdout into candidates. Entries naming an
/// unknown game are dropped; a six-number list with no bonus is read as five
/// main balls plus the bonus.
pub fn parse_output(stdout: &str) -> Result<Vec<CandidateRecord>, AppError> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let draws = match serde_json::from_str::<VisionOutput>(trimmed)
        .map_err(|e| AppError::VisionError(format!("unparseable output: {e}")))?
    {
        VisionOutput::List(draws) | VisionOutput::Wrapped { records: draws } => draws,
    };

    Ok(draws.into_iter().filter_map(into_candidate).collect())
}

fn into_candidate(draw: VisionDraw) -> Option<CandidateRecord> {
    let game: Game = draw.game.parse().ok()?;
    let mut numbers = draw.numbers;
    let mut bonus = draw.bonus;
    if bonus.is_none() && numbers.len() == 6 {
        bonus = numbers.pop();
    }

    let mut candidate = CandidateRecord::new(
        game,
        draw.date,
        numbers,
        bonus,
        draw.source_url.unwrap_or_default(),
        ExtractionMethod::Vision,
    )
    .with_jackpot(draw.jackpot_usd);
    candidate.confidence = draw.confidence;
    Some(candidate)
}
