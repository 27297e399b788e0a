//! Canonicalization of the many date shapes lottery sources publish.
//!
//! A date after a "Draw Date" label wins; otherwise shapes are tried in a
//! fixed order and the first valid match wins. Text that matches none of
//! them is rejected outright: an undetermined date must never
//! turn into a wrong one.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;

use crate::error::AppError;

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Parses date-like text and enforces the recency window.
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    iso: Regex,
    month_day_year: Regex,
    month_name: Regex,
    labeled: Regex,
    asmx_epoch: Regex,
    today: NaiveDate,
    window_days: i64,
}

impl DateNormalizer {
    pub fn new(as_of: DateTime<Utc>, window_days: i64) -> Result<Self, AppError> {
        Ok(Self {
            iso: Regex::new(r"\b(\d{4})[-/](\d{1,2})[-/](\d{1,2})")?,
            month_day_year: Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b")?,
            month_name: Regex::new(
                r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})\b",
            )?,
            labeled: Regex::new(r"(?i)draw(?:ing)?\s*date[^0-9a-z]{0,8}([^\n]{1,40})")?,
            asmx_epoch: Regex::new(r"/Date\((-?\d{10,13})[^)]*\)/")?,
            today: as_of.date_naive(),
            window_days,
        })
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn window_days(&self) -> i64 {
        self.window_days
    }

    /// Parse `text` into a date and accept it only inside the recency window.
    pub fn normalize(&self, text: &str) -> Option<NaiveDate> {
        self.parse(text).filter(|date| self.in_window(*date))
    }

    /// `today - window_days <= date <= today`
    pub fn in_window(&self, date: NaiveDate) -> bool {
        let earliest = self.today - Duration::days(self.window_days);
        earliest <= date && date <= self.today
    }

    /// Parse without the recency check.
    pub fn parse(&self, text: &str) -> Option<NaiveDate> {
        self.parse_inner(text, true)
    }

    /// Locate the date a page most likely means: the one after a "Draw Date"
    /// label if there is one, else the first date-shaped substring in shape
    /// order.
    ///
    /// Returns the matched slice, suitable as a candidate's raw date.
    pub fn find<'t>(&self, text: &'t str) -> Option<&'t str> {
        self.labeled_date(text)
            .or_else(|| self.find_all(text).into_iter().next())
            .map(|(_, m)| m)
    }

    /// Every parseable date-shaped substring with its byte offset, grouped by
    /// shape (ISO, numeric, month name) and in text order within a shape.
    pub fn find_all<'t>(&self, text: &'t str) -> Vec<(usize, &'t str)> {
        self.shapes()
            .into_iter()
            .flat_map(|re| re.find_iter(text))
            .filter(|m| self.parse_inner(m.as_str(), false).is_some())
            .map(|m| (m.start(), m.as_str()))
            .collect()
    }

    /// The parseable date closest to byte `offset`, ties going to the earlier shape.
    pub fn nearest<'t>(&self, text: &'t str, offset: usize) -> Option<&'t str> {
        self.find_all(text)
            .into_iter()
            .min_by_key(|(start, _)| start.abs_diff(offset))
            .map(|(_, m)| m)
    }

    fn shapes(&self) -> [&Regex; 3] {
        [&self.iso, &self.month_day_year, &self.month_name]
    }

    /// First parseable date inside the text that follows a "Draw Date" label.
    fn labeled_date<'t>(&self, text: &'t str) -> Option<(usize, &'t str)> {
        self.labeled.captures_iter(text).find_map(|c| {
            let tail = c.get(1)?;
            let (start, m) = self.find_all(tail.as_str()).into_iter().next()?;
            Some((tail.start() + start, m))
        })
    }

    fn parse_inner(&self, text: &str, allow_label: bool) -> Option<NaiveDate> {
        if allow_label {
            let labeled = self
                .labeled
                .captures_iter(text)
                .find_map(|c| self.parse_inner(&c[1], false));
            if labeled.is_some() {
                return labeled;
            }
        }

        self.iso
            .captures_iter(text)
            .find_map(|c| ymd(&c[1], &c[2], &c[3]))
            .or_else(|| {
                self.month_day_year.captures_iter(text).find_map(|c| {
                    let year = if c[3].len() == 2 {
                        format!("20{}", &c[3])
                    } else {
                        c[3].to_string()
                    };
                    ymd(&year, &c[1], &c[2])
                })
            })
            .or_else(|| {
                self.month_name.captures_iter(text).find_map(|c| {
                    let prefix = c[1].to_lowercase();
                    let month = MONTHS.iter().position(|m| *m == prefix)? + 1;
                    ymd(&c[3], &month.to_string(), &c[2])
                })
            })
            .or_else(|| {
                let c = self.asmx_epoch.captures(text)?;
                let raw: i64 = c[1].parse().ok()?;
                let millis = if c[1].trim_start_matches('-').len() > 10 {
                    raw
                } else {
                    raw * 1000
                };
                DateTime::from_timestamp_millis(millis).map(|dt| dt.date_naive())
            })
    }
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}
