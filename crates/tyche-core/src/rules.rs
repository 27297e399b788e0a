//! Declarative per-host adapter rules and their compiled, read-only registry.

use std::collections::HashMap;

use regex::{Regex, RegexBuilder};
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::games::Game;
use crate::markup::parse_selector;

/// One adapter rule as stored on disk.
///
/// Only `host` and `game` are required; every pattern is optional and falls
/// back to the built-in heuristics when absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdapterRule {
    pub host: String,
    #[serde(default)]
    pub game: String,
    #[serde(default, alias = "scopeContains")]
    pub scope_contains: Vec<String>,
    #[serde(default, alias = "cssScope")]
    pub css_scope: Option<String>,
    #[serde(default, alias = "dateRegex")]
    pub date_regex: Option<String>,
    #[serde(default, alias = "numbersRegex")]
    pub numbers_regex: Option<String>,
    #[serde(default, alias = "bonusRegex")]
    pub bonus_regex: Option<String>,
    #[serde(default, alias = "jackpotRegex")]
    pub jackpot_regex: Option<String>,
}

/// An [`AdapterRule`] with its patterns compiled.
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub host: String,
    pub game: Game,
    /// Lowercased keywords; a scope must contain at least one of them.
    pub scope_contains: Vec<String>,
    pub css_scope: Option<Selector>,
    pub date: Option<Regex>,
    pub numbers: Option<Regex>,
    pub bonus: Option<Regex>,
    pub jackpot: Option<Regex>,
}

impl CompiledRule {
    pub fn compile(rule: &AdapterRule) -> Result<Self, AppError> {
        let host = normalize_host(&rule.host);
        let fail = |message: String| AppError::RuleError {
            host: host.clone(),
            message,
        };

        if host.is_empty() {
            return Err(fail("missing host".into()));
        }
        let game: Game = rule.game.parse().map_err(fail)?;

        let pattern = |source: &Option<String>, field: &str| -> Result<Option<Regex>, AppError> {
            source
                .as_deref()
                .filter(|s| !s.trim().is_empty())
                .map(|s| {
                    RegexBuilder::new(s)
                        .case_insensitive(true)
                        .dot_matches_new_line(true)
                        .build()
                        .map_err(|e| fail(format!("bad {field}: {e}")))
                })
                .transpose()
        };

        let css_scope = rule
            .css_scope
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|css| parse_selector(css).map_err(|e| fail(format!("bad css_scope: {e}"))))
            .transpose()?;

        Ok(Self {
            game,
            scope_contains: rule
                .scope_contains
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
            css_scope,
            date: pattern(&rule.date_regex, "date_regex")?,
            numbers: pattern(&rule.numbers_regex, "numbers_regex")?,
            bonus: pattern(&rule.bonus_regex, "bonus_regex")?,
            jackpot: pattern(&rule.jackpot_regex, "jackpot_regex")?,
            host,
        })
    }

    /// True when `text` passes this rule's keyword filter.
    pub fn in_scope(&self, text: &str) -> bool {
        if self.scope_contains.is_empty() {
            return true;
        }
        let lower = text.to_lowercase();
        self.scope_contains.iter().any(|k| lower.contains(k))
    }
}

/// Immutable map from host to its compiled rules, in load order.
#[derive(Debug, Clone, Default)]
pub struct AdapterRegistry {
    by_host: HashMap<String, Vec<CompiledRule>>,
}

impl AdapterRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile `rules`. A malformed rule is logged and skipped; the other
    /// rules for its host still load.
    pub fn new(rules: impl IntoIterator<Item = AdapterRule>) -> Self {
        let mut by_host: HashMap<String, Vec<CompiledRule>> = HashMap::new();
        for rule in rules {
            match CompiledRule::compile(&rule) {
                Ok(compiled) => by_host
                    .entry(compiled.host.clone())
                    .or_default()
                    .push(compiled),
                Err(e) => tracing::warn!(host = %rule.host, error = %e, "Skipping adapter rule"),
            }
        }
        Self { by_host }
    }

    /// Rules registered for `host` (case and `www.` insensitive).
    pub fn for_host(&self, host: &str) -> &[CompiledRule] {
        self.by_host
            .get(&normalize_host(host))
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn has_rules(&self, host: &str) -> bool {
        !self.for_host(host).is_empty()
    }

    /// Total number of compiled rules.
    pub fn len(&self) -> usize {
        self.by_host.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.by_host.is_empty()
    }
}

/// Lowercase a host and drop a leading `www.` and any port.
pub fn normalize_host(host: &str) -> String {
    let lower = host.trim().to_lowercase();
    let bare = lower.strip_prefix("www.").unwrap_or(&lower);
    bare.split(':').next().unwrap_or_default().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(host: &str, game: &str) -> AdapterRule {
        AdapterRule {
            host: host.into(),
            game: game.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize_host() {
        assert_eq!(normalize_host("WWW.WaLottery.com"), "walottery.com");
        assert_eq!(normalize_host("rilot.com:443"), "rilot.com");
        assert_eq!(normalize_host(""), "");
    }

    #[test]
    fn test_registry_skips_malformed_rules() {
        let registry = AdapterRegistry::new([
            AdapterRule {
                numbers_regex: Some("(unclosed".into()),
                ..rule("example.org", "Powerball")
            },
            rule("example.org", "EuroJackpot"),
            AdapterRule {
                css_scope: Some("div[[".into()),
                ..rule("example.org", "Powerball")
            },
            rule("", "Powerball"),
            AdapterRule {
                scope_contains: vec!["Lucky".into()],
                ..rule("www.example.org", "Lucky for Life")
            },
        ]);
        assert_eq!(registry.len(), 1);
        let rules = registry.for_host("EXAMPLE.org");
        assert_eq!(rules[0].game, Game::LuckyForLife);
        assert_eq!(rules[0].scope_contains, vec!["lucky"]);
        assert!(!registry.has_rules("other.org"));
    }

    #[test]
    fn test_rule_patterns_are_case_insensitive() {
        let compiled = CompiledRule::compile(&AdapterRule {
            date_regex: Some(r"draw date:\s*(\S+)".into()),
            ..rule("example.org", "Cash4Life")
        })
        .unwrap();
        let date = compiled.date.unwrap();
        assert_eq!(&date.captures("DRAW DATE: 09/12/2025").unwrap()[1], "09/12/2025");
    }

    #[test]
    fn test_in_scope() {
        let compiled = CompiledRule::compile(&AdapterRule {
            scope_contains: vec!["Star Ball".into(), "lotto america".into()],
            ..rule("example.org", "Lotto America")
        })
        .unwrap();
        assert!(compiled.in_scope("Lotto America results"));
        assert!(compiled.in_scope("STAR BALL 4"));
        assert!(!compiled.in_scope("Powerball 10"));
    }

    #[test]
    fn test_rule_deserializes_from_yaml_style_keys() {
        let rule: AdapterRule = serde_json::from_str(
            r#"{"host":"mdlottery.com","game":"Cash4Life","scopeContains":["cash"],"css_scope":".results"}"#,
        )
        .unwrap();
        assert_eq!(rule.scope_contains, vec!["cash"]);
        assert_eq!(rule.css_scope.as_deref(), Some(".results"));
        assert!(rule.date_regex.is_none());
    }
}
