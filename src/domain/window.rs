use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{AggregationError, YearMonth};

pub const DEFAULT_TREND_MONTHS: u32 = 12;
pub const MAX_TREND_MONTHS: u32 = 1200;
pub const DEFAULT_RECENT_LIMIT: usize = 5;

/// Bounds and display knobs for one summary request.
///
/// `start` and `end` are inclusive. `reference_date` anchors the trend
/// series and selects the budget period; it is always passed in, never read
/// from the clock here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub reference_date: NaiveDate,
    pub trend_months: u32,
    pub recent_limit: usize,
}

impl SummaryWindow {
    pub fn new(start: NaiveDate, end: NaiveDate, reference_date: NaiveDate) -> Self {
        Self {
            start,
            end,
            reference_date,
            trend_months: DEFAULT_TREND_MONTHS,
            recent_limit: DEFAULT_RECENT_LIMIT,
        }
    }

    /// The last 365 days up to and including `reference_date`.
    pub fn trailing_year(reference_date: NaiveDate) -> Self {
        let start = reference_date
            .checked_sub_signed(Duration::days(365))
            .unwrap_or(NaiveDate::MIN);
        Self::new(start, reference_date, reference_date)
    }

    pub fn with_trend_months(mut self, months: u32) -> Self {
        self.trend_months = months;
        self
    }

    pub fn with_recent_limit(mut self, limit: usize) -> Self {
        self.recent_limit = limit;
        self
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Budget period the summary compares against.
    pub fn budget_period(&self) -> YearMonth {
        YearMonth::of(self.reference_date)
    }

    pub fn validate(&self) -> Result<(), AggregationError> {
        if self.start > self.end {
            return Err(AggregationError::InvalidArgument(format!(
                "window start {} is after end {}",
                self.start, self.end
            )));
        }
        validate_month_count(self.trend_months)?;
        if self.recent_limit == 0 {
            return Err(AggregationError::InvalidArgument(
                "recent transaction limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn validate_month_count(month_count: u32) -> Result<(), AggregationError> {
    if month_count == 0 || month_count > MAX_TREND_MONTHS {
        return Err(AggregationError::InvalidArgument(format!(
            "month count must be between 1 and {}, got {}",
            MAX_TREND_MONTHS, month_count
        )));
    }
    Ok(())
}

/// Parse a `YYYY-MM-DD` reference date.
pub fn parse_reference_date(input: &str) -> Result<NaiveDate, AggregationError> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").map_err(|_| {
        AggregationError::InvalidArgument(format!(
            "malformed reference date '{}', expected YYYY-MM-DD",
            input
        ))
    })
}
