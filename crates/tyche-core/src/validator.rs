use std::fmt;

use crate::games::{Game, GameRule, GameRuleTable};
use crate::models::CandidateRecord;

/// Why a candidate never became a canonical record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rejection {
    UnknownGame,
    MainCount,
    MainRange,
    MissingBonus,
    BonusRange,
    UnparseableDate,
    OutsideWindow,
}

impl Rejection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Rejection::UnknownGame => "unknown_game",
            Rejection::MainCount => "main_count",
            Rejection::MainRange => "main_range",
            Rejection::MissingBonus => "missing_bonus",
            Rejection::BonusRange => "bonus_range",
            Rejection::UnparseableDate => "unparseable_date",
            Rejection::OutsideWindow => "outside_window",
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks candidates against the per-game ball rules.
#[derive(Debug, Clone, Default)]
pub struct GameRuleValidator {
    table: GameRuleTable,
}

impl GameRuleValidator {
    pub fn new(table: GameRuleTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &GameRuleTable {
        &self.table
    }

    /// True iff `game` is known, `numbers` has the game's main count with every
    /// ball in range, and `bonus` is present and in range.
    pub fn validate(&self, game: &str, numbers: &[u32], bonus: Option<u32>) -> bool {
        self.check(game, numbers, bonus).is_ok()
    }

    /// Like [`validate`](Self::validate), naming the first failed rule.
    pub fn check(&self, game: &str, numbers: &[u32], bonus: Option<u32>) -> Result<Game, Rejection> {
        let rule = self.table.lookup(game).ok_or(Rejection::UnknownGame)?;
        check_rule(rule, numbers, bonus)?;
        Ok(rule.game)
    }

    pub fn check_candidate(&self, candidate: &CandidateRecord) -> Result<Game, Rejection> {
        self.check(&candidate.game, &candidate.numbers, candidate.bonus)
    }

    pub fn accepts(&self, candidate: &CandidateRecord) -> bool {
        self.check_candidate(candidate).is_ok()
    }
}

fn check_rule(rule: &GameRule, numbers: &[u32], bonus: Option<u32>) -> Result<(), Rejection> {
    if numbers.len() != rule.main_count {
        return Err(Rejection::MainCount);
    }
    if !numbers.iter().all(|n| rule.main_range.contains(n)) {
        return Err(Rejection::MainRange);
    }
    let bonus = bonus.ok_or(Rejection::MissingBonus)?;
    if !rule.bonus_range.contains(&bonus) {
        return Err(Rejection::BonusRange);
    }
    Ok(())
}
