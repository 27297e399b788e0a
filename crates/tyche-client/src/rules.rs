use std::path::Path;

use serde::Deserialize;
use tokio::fs;
use tyche_core::error::AppError;
use tyche_core::rules::{AdapterRegistry, AdapterRule};

/// A rule file holds either a bare list of rules or `{ "rules": [...] }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RuleFile {
    List(Vec<AdapterRule>),
    Wrapped { rules: Vec<AdapterRule> },
    Single(AdapterRule),
}

impl RuleFile {
    fn into_rules(self) -> Vec<AdapterRule> {
        match self {
            RuleFile::List(rules) | RuleFile::Wrapped { rules } => rules,
            RuleFile::Single(rule) => vec![rule],
        }
    }
}

/// Parse one rule file by extension (`.json`, `.yaml`, `.yml`).
pub fn parse_rules(name: &str, text: &str) -> Result<Vec<AdapterRule>, AppError> {
    let lower = name.to_lowercase();
    let file: RuleFile = if lower.ends_with(".json") {
        serde_json::from_str(text)?
    } else if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        serde_yaml_ng::from_str(text).map_err(|e| AppError::RuleError {
            host: name.to_string(),
            message: e.to_string(),
        })?
    } else {
        return Err(AppError::RuleError {
            host: name.to_string(),
            message: "unsupported rule file extension".into(),
        });
    };
    Ok(file.into_rules())
}

/// Load every rule file in `dir` (or the single file `dir`) in name order.
///
/// A file that fails to parse is skipped with a warning; a rule that fails
/// to compile is skipped by the registry.
pub async fn load_rules(path: &Path) -> Result<AdapterRegistry, AppError> {
    let meta = fs::metadata(path)
        .await
        .map_err(|e| AppError::ConfigError(format!("Rules path {}: {e}", path.display())))?;

    let mut files = Vec::new();
    if meta.is_dir() {
        let mut entries = fs::read_dir(path)
            .await
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| AppError::ConfigError(e.to_string()))?
        {
            let p = entry.path();
            let supported = p
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| matches!(e.to_lowercase().as_str(), "json" | "yaml" | "yml"));
            if supported {
                files.push(p);
            }
        }
        files.sort();
    } else {
        files.push(path.to_path_buf());
    }

    let mut rules = Vec::new();
    for file in &files {
        let name = file.to_string_lossy();
        let parsed = match fs::read_to_string(file).await {
            Ok(text) => parse_rules(&name, &text),
            Err(e) => Err(AppError::ConfigError(e.to_string())),
        };
        match parsed {
            Ok(found) => rules.extend(found),
            Err(e) => tracing::warn!(file = %name, error = %e, "Skipping rule file"),
        }
    }

    let registry = AdapterRegistry::new(rules);
    tracing::info!(files = files.len(), rules = registry.len(), "Adapter rules loaded");
    Ok(registry)
}
