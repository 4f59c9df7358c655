//! Fiscal year handling
//!
//! Serial numbers embed the April-to-March fiscal year as `YY-YY`, e.g.
//! `25-26` for April 2025 through March 2026.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};

use crate::error::{Error, Result};

/// Month (1-based) in which a new fiscal year begins
const FISCAL_START_MONTH: u32 = 4;

/// A fiscal year identified by the calendar year it starts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FiscalYear {
    pub start_year: i32,
}

impl FiscalYear {
    pub fn new(start_year: i32) -> Self {
        Self { start_year }
    }

    /// Fiscal year containing `date`
    pub fn from_date(date: NaiveDate) -> Self {
        if date.month() >= FISCAL_START_MONTH {
            Self::new(date.year())
        } else {
            Self::new(date.year() - 1)
        }
    }

    /// Fiscal year containing today's local date
    pub fn current() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    /// Parse a fiscal year
    ///
    /// Supported formats:
    /// - `"25-26"` → starts 2025 (the two halves must be consecutive)
    /// - `"2025-26"` or `"2025-2026"` → starts 2025
    /// - `"2025"` → starts 2025
    pub fn parse(expr: &str) -> Result<Self> {
        let expr = expr.trim();
        if expr.is_empty() {
            return Err(Error::InvalidFiscalYear("empty".to_string()));
        }

        let invalid = || Error::InvalidFiscalYear(expr.to_string());

        match expr.split_once('-') {
            Some((start, end)) => {
                let start_year = expand_year(start.trim()).ok_or_else(invalid)?;
                let end: i32 = end.trim().parse().map_err(|_| invalid())?;
                let expected_end = start_year + 1;
                let matches = match end {
                    0..=99 => end == expected_end % 100,
                    _ => end == expected_end,
                };
                if !matches {
                    return Err(Error::InvalidFiscalYear(format!(
                        "{} (years must be consecutive)",
                        expr
                    )));
                }
                Ok(Self::new(start_year))
            }
            None => expand_year(expr).map(Self::new).ok_or_else(invalid),
        }
    }

    /// The fiscal years offered for override, current one first then previous ones
    pub fn recent(count: usize) -> Vec<Self> {
        let current = Self::current();
        (0..count as i32).map(|back| Self::new(current.start_year - back)).collect()
    }
}

/// Two-digit years are taken to be in the 2000s
fn expand_year(s: &str) -> Option<i32> {
    if s.is_empty() || !s.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let year: i32 = s.parse().ok()?;
    match s.len() {
        1 | 2 => Some(2000 + year),
        4 => Some(year),
        _ => None,
    }
}

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}-{:02}",
            self.start_year.rem_euclid(100),
            (self.start_year + 1).rem_euclid(100)
        )
    }
}

impl FromStr for FiscalYear {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
