//! Serialization of the canonical dataset for the publishing layer.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::{CanonicalRecord, ExtractionMethod};
use crate::pipeline::Dataset;

pub const JSON_FILE: &str = "latest-draws.json";
pub const CSV_FILE: &str = "latest-draws.csv";
pub const MANIFEST_FILE: &str = "manifest.json";

pub const CSV_HEADER: [&str; 7] = [
    "date",
    "game",
    "numbers",
    "jackpot_usd",
    "winners",
    "source_url",
    "fetched_at",
];

/// Published shape of one record. `numbers` holds the main balls followed by
/// the bonus ball.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRecord {
    pub date: String,
    pub game: String,
    pub numbers: Vec<u32>,
    pub jackpot_usd: Option<u64>,
    pub winners: Option<u64>,
    pub source_url: String,
    pub fetched_at: Option<String>,
    pub extraction_method: ExtractionMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

impl From<&CanonicalRecord> for JsonRecord {
    fn from(record: &CanonicalRecord) -> Self {
        Self {
            date: record.date.format("%Y-%m-%d").to_string(),
            game: record.game.name().to_string(),
            numbers: record.all_numbers(),
            jackpot_usd: record.jackpot_usd,
            winners: record.winners,
            source_url: record.source_url.clone(),
            fetched_at: record.fetched_at.map(timestamp),
            extraction_method: record.extraction_method,
            confidence: record.confidence,
        }
    }
}

/// Run summary written next to the dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: String,
    pub last_updated: String,
    pub records: usize,
    pub parse_stats: BTreeMap<String, usize>,
    pub lanes: BTreeMap<String, usize>,
    pub rejected: usize,
    pub skipped_status: usize,
}

impl Manifest {
    pub fn new(dataset: &Dataset, as_of: DateTime<Utc>) -> Self {
        Self {
            version: as_of.format("%Y.%m.%d").to_string(),
            last_updated: timestamp(as_of),
            records: dataset.records.len(),
            parse_stats: dataset.stats.per_host.clone(),
            lanes: dataset.stats.per_lane.clone(),
            rejected: dataset.stats.rejected,
            skipped_status: dataset.stats.skipped_status,
        }
    }
}

/// Paths of the files written by [`write_dataset`].
#[derive(Debug, Clone)]
pub struct WrittenFiles {
    pub json: PathBuf,
    pub csv: PathBuf,
    pub manifest: PathBuf,
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// One CSV row in [`CSV_HEADER`] order. Absent values are empty cells.
pub fn csv_row(record: &CanonicalRecord) -> [String; 7] {
    let numbers = record
        .all_numbers()
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    [
        record.date.format("%Y-%m-%d").to_string(),
        record.game.name().to_string(),
        numbers,
        record.jackpot_usd.map(|j| j.to_string()).unwrap_or_default(),
        record.winners.map(|w| w.to_string()).unwrap_or_default(),
        record.source_url.clone(),
        record.fetched_at.map(timestamp).unwrap_or_default(),
    ]
}

pub fn write_json<W: Write>(writer: W, records: &[CanonicalRecord]) -> Result<(), AppError> {
    let rows: Vec<JsonRecord> = records.iter().map(JsonRecord::from).collect();
    serde_json::to_writer_pretty(writer, &rows)?;
    Ok(())
}

pub fn write_csv<W: Write>(writer: W, records: &[CanonicalRecord]) -> Result<(), AppError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(CSV_HEADER)?;
    for record in records {
        wtr.write_record(csv_row(record))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write the JSON dataset, the CSV dataset and the manifest into `dir`,
/// creating it if needed.
pub fn write_dataset(
    dir: &Path,
    dataset: &Dataset,
    as_of: DateTime<Utc>,
) -> Result<WrittenFiles, AppError> {
    fs::create_dir_all(dir)?;
    let files = WrittenFiles {
        json: dir.join(JSON_FILE),
        csv: dir.join(CSV_FILE),
        manifest: dir.join(MANIFEST_FILE),
    };

    let mut json = Vec::new();
    write_json(&mut json, &dataset.records)?;
    json.push(b'\n');
    fs::write(&files.json, json)?;

    let mut rows = Vec::new();
    write_csv(&mut rows, &dataset.records)?;
    fs::write(&files.csv, rows)?;

    let mut manifest = serde_json::to_vec_pretty(&Manifest::new(dataset, as_of))?;
    manifest.push(b'\n');
    fs::write(&files.manifest, manifest)?;

    tracing::info!(
        dir = %dir.display(),
        records = dataset.records.len(),
        "Dataset written"
    );
    Ok(files)
}
