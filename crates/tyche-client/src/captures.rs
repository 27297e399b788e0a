use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use sha2::{Digest, Sha256};
use tokio::fs;
use tyche_core::error::AppError;
use tyche_core::models::{CaptureMeta, RawCapture};
use tyche_core::traits::CaptureSource;

const META_SUFFIX: &str = ".meta.json";
const SCREENSHOT_SUFFIX: &str = ".full.png";

/// Body file suffixes tried next to a sidecar, most specific first.
const BODY_SUFFIXES: &[&str] = &[".body.json", ".json", ".html", ".htm", ".txt", ".xml", ".bin"];

/// Capture source backed by a snapshot directory.
///
/// Each capture is a `<stem>.meta.json` sidecar plus a body file with the same
/// stem, and optionally a `<stem>.full.png` screenshot for the OCR bridge.
/// A capture with an unreadable sidecar or no body is skipped with a warning.
#[derive(Debug, Clone)]
pub struct DirCaptureSource {
    dir: PathBuf,
}

impl DirCaptureSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn sidecars(&self) -> Result<Vec<PathBuf>, AppError> {
        let mut entries = fs::read_dir(&self.dir).await.map_err(|e| {
            AppError::CaptureError(format!("Cannot read {}: {e}", self.dir.display()))
        })?;

        let mut sidecars = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::CaptureError(e.to_string()))?
        {
            let path = entry.path();
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.ends_with(META_SUFFIX))
            {
                sidecars.push(path);
            }
        }
        // Directory order is platform dependent.
        sidecars.sort();
        Ok(sidecars)
    }

    async fn load_one(&self, sidecar: &Path) -> Result<RawCapture, AppError> {
        let raw = fs::read(sidecar)
            .await
            .map_err(|e| AppError::CaptureError(format!("{}: {e}", sidecar.display())))?;
        let meta: CaptureMeta = serde_json::from_slice(&raw).map_err(|e| {
            AppError::MalformedCapture {
                url: sidecar.display().to_string(),
                message: format!("bad sidecar: {e}"),
            }
        })?;

        let base = stem(sidecar);
        let body_path = first_existing(&base, BODY_SUFFIXES).await.ok_or_else(|| {
            AppError::MalformedCapture {
                url: meta.url.clone(),
                message: "no body file next to sidecar".into(),
            }
        })?;
        let body = decode_body(
            fs::read(&body_path)
                .await
                .map_err(|e| AppError::CaptureError(format!("{}: {e}", body_path.display())))?,
        );

        if let Some(expected) = meta.sha256.as_deref() {
            let actual = sha256_hex(&body);
            if !expected.eq_ignore_ascii_case(&actual) {
                tracing::warn!(url = %meta.url, %expected, %actual, "Capture checksum mismatch");
            }
        }

        let mut capture = RawCapture::new(meta, body);
        let screenshot = PathBuf::from(format!("{base}{SCREENSHOT_SUFFIX}"));
        if fs::try_exists(&screenshot).await.unwrap_or(false) {
            capture = capture.with_screenshot(screenshot);
        }
        Ok(capture)
    }
}

impl CaptureSource for DirCaptureSource {
    async fn load(&self) -> Result<Vec<RawCapture>, AppError> {
        let sidecars = self.sidecars().await?;
        let mut captures = Vec::with_capacity(sidecars.len());

        for sidecar in &sidecars {
            match self.load_one(sidecar).await {
                Ok(capture) => captures.push(capture),
                Err(e) => {
                    tracing::warn!(sidecar = %sidecar.display(), error = %e, "Skipping capture")
                }
            }
        }

        tracing::info!(
            dir = %self.dir.display(),
            loaded = captures.len(),
            skipped = sidecars.len() - captures.len(),
            "Captures loaded"
        );
        Ok(captures)
    }
}

/// `dir/name.meta.json` → `dir/name`.
fn stem(sidecar: &Path) -> String {
    let full = sidecar.to_string_lossy();
    full.strip_suffix(META_SUFFIX).unwrap_or(&full).to_string()
}

async fn first_existing(base: &str, suffixes: &[&str]) -> Option<PathBuf> {
    for suffix in suffixes {
        let candidate = PathBuf::from(format!("{base}{suffix}"));
        if fs::try_exists(&candidate).await.unwrap_or(false) {
            return Some(candidate);
        }
    }
    None
}

/// Inflate gzip bodies (magic `1f 8b`); anything else passes through.
/// A truncated gzip stream keeps the raw bytes.
pub fn decode_body(bytes: Vec<u8>) -> Vec<u8> {
    if !bytes.starts_with(&[0x1f, 0x8b]) {
        return bytes;
    }
    let mut inflated = Vec::new();
    match GzDecoder::new(bytes.as_slice()).read_to_end(&mut inflated) {
        Ok(_) => inflated,
        Err(e) => {
            tracing::debug!(error = %e, "Body looked gzipped but did not inflate");
            bytes
        }
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    digest.iter().map(|b| format!("{b:02x}")).collect()
}
