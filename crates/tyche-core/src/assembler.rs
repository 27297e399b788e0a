use chrono::{DateTime, Utc};

use crate::dates::DateNormalizer;
use crate::models::{CandidateRecord, CanonicalRecord};
use crate::validator::{GameRuleValidator, Rejection};

/// Promotes validated candidates to canonical records.
#[derive(Debug, Clone)]
pub struct RecordAssembler {
    validator: GameRuleValidator,
    dates: DateNormalizer,
}

impl RecordAssembler {
    pub fn new(validator: GameRuleValidator, dates: DateNormalizer) -> Self {
        Self { validator, dates }
    }

    pub fn validator(&self) -> &GameRuleValidator {
        &self.validator
    }

    pub fn dates(&self) -> &DateNormalizer {
        &self.dates
    }

    /// Validate the balls, normalize the date, and attach provenance.
    pub fn assemble(
        &self,
        candidate: CandidateRecord,
        fetched_at: Option<DateTime<Utc>>,
    ) -> Result<CanonicalRecord, Rejection> {
        let game = self.validator.check_candidate(&candidate)?;
        let parsed = self
            .dates
            .parse(&candidate.raw_date)
            .ok_or(Rejection::UnparseableDate)?;
        if !self.dates.in_window(parsed) {
            return Err(Rejection::OutsideWindow);
        }
        let bonus = candidate.bonus.ok_or(Rejection::MissingBonus)?;

        Ok(CanonicalRecord {
            game,
            date: parsed,
            numbers: candidate.numbers,
            bonus,
            jackpot_usd: candidate.jackpot_amount,
            winners: candidate.winners_count,
            source_url: candidate.source_url,
            fetched_at,
            extraction_method: candidate.extraction_method,
            confidence: candidate.confidence,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone};

    use super::*;
    use crate::games::Game;
    use crate::models::ExtractionMethod;

    fn assembler() -> RecordAssembler {
        let as_of = Utc.with_ymd_and_hms(2025, 9, 14, 12, 0, 0).unwrap();
        RecordAssembler::new(
            GameRuleValidator::default(),
            DateNormalizer::new(as_of, 14).unwrap(),
        )
    }

    fn candidate(raw_date: &str) -> CandidateRecord {
        CandidateRecord::new(
            Game::Powerball,
            raw_date,
            vec![1, 12, 23, 34, 45],
            Some(10),
            "https://www.powerball.com/api",
            ExtractionMethod::Json,
        )
        .with_jackpot(Some(20_000_000))
    }

    #[test]
    fn test_assemble_canonical_record() {
        let fetched_at = Utc.with_ymd_and_hms(2025, 9, 13, 23, 0, 0).unwrap();
        let record = assembler()
            .assemble(candidate("09/13/2025"), Some(fetched_at))
            .unwrap();
        assert_eq!(record.game, Game::Powerball);
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 9, 13).unwrap());
        assert_eq!(record.numbers, vec![1, 12, 23, 34, 45]);
        assert_eq!(record.bonus, 10);
        assert_eq!(record.jackpot_usd, Some(20_000_000));
        assert_eq!(record.fetched_at, Some(fetched_at));
    }

    #[test]
    fn test_assemble_rejects_bad_dates() {
        let a = assembler();
        assert_eq!(
            a.assemble(candidate("soon"), None).unwrap_err(),
            Rejection::UnparseableDate
        );
        assert_eq!(
            a.assemble(candidate("2025-08-30"), None).unwrap_err(),
            Rejection::OutsideWindow
        );
    }

    #[test]
    fn test_assemble_rejects_invalid_balls_before_dates() {
        let mut bad = candidate("soon");
        bad.bonus = None;
        assert_eq!(
            assembler().assemble(bad, None).unwrap_err(),
            Rejection::MissingBonus
        );
    }
}
