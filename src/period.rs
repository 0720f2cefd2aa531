//! Calendar months used by the earnings endpoints.

use std::fmt;
use std::sync::LazyLock;

use jiff::civil::Date;
use jiff::tz::TimeZone;
use jiff::Timestamp;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

/// How many months must have fully elapsed before a month's earnings
/// history can be queried.
pub const HISTORY_MIN_AGE_MONTHS: u32 = 2;

static YEAR_MONTH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([0-9]{4})([0-9]{2})$").expect("Invalid year-month regex"));

/// A calendar month, `month` in `1..=12`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawPeriod")]
pub struct EarningsPeriod {
    year: i16,
    month: u8,
}

#[derive(Deserialize)]
struct RawPeriod {
    year: i16,
    month: u8,
}

impl TryFrom<RawPeriod> for EarningsPeriod {
    type Error = ApiError;

    fn try_from(raw: RawPeriod) -> Result<Self> {
        Self::new(raw.year, raw.month)
    }
}

impl EarningsPeriod {
    pub fn new(year: i16, month: u8) -> Result<Self> {
        if !(1..=12).contains(&month) {
            return Err(ApiError::Validation(format!(
                "month must be between 1 and 12, got {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    /// The month containing `date`.
    pub fn containing(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month() as u8,
        }
    }

    /// Parse a `YYYYMM` string.
    pub fn parse(raw: &str) -> Result<Self> {
        let (year, month) = split_year_month(raw).ok_or_else(|| {
            ApiError::Validation(format!("malformed period '{}', expected YYYYMM", raw))
        })?;
        Self::new(year, month).map_err(|_| {
            ApiError::Validation(format!("malformed period '{}', month out of range", raw))
        })
    }

    pub fn year(&self) -> i16 {
        self.year
    }

    pub fn month(&self) -> u8 {
        self.month
    }

    /// The calendar month before this one; January wraps to December of the
    /// previous year.
    pub fn previous(self) -> Self {
        self.months_back(1)
    }

    pub fn months_back(self, months: u32) -> Self {
        let index = self.index() - i64::from(months);
        Self {
            year: index.div_euclid(12) as i16,
            month: (index.rem_euclid(12) + 1) as u8,
        }
    }

    /// `YYYYMM`, as the upstream expects it in query strings.
    pub fn compact(&self) -> String {
        format!("{:04}{:02}", self.year, self.month)
    }

    fn index(self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }
}

impl fmt::Display for EarningsPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

fn split_year_month(raw: &str) -> Option<(i16, u8)> {
    let caps = YEAR_MONTH.captures(raw.trim())?;
    let year = caps.get(1)?.as_str().parse().ok()?;
    let month = caps.get(2)?.as_str().parse().ok()?;
    Some((year, month))
}

/// Validate the month requested from the earnings history endpoint.
///
/// The period must be well formed, not in the future, and at least
/// [`HISTORY_MIN_AGE_MONTHS`] months before the current month, since more
/// recent months are still being aggregated upstream.
pub fn validate_history_period(raw: &str, today: Date) -> Result<EarningsPeriod> {
    let requested = EarningsPeriod::parse(raw)?;
    let current = EarningsPeriod::containing(today);

    if requested > current {
        return Err(ApiError::Validation(format!(
            "period {} is in the future (current month is {})",
            requested.compact(),
            current.compact()
        )));
    }

    let latest = current.months_back(HISTORY_MIN_AGE_MONTHS);
    if requested > latest {
        return Err(ApiError::Validation(format!(
            "period {} is not finalized yet; the latest queryable month is {}",
            requested.compact(),
            latest.compact()
        )));
    }

    Ok(requested)
}

/// Source of "today" for the earnings logic.
pub trait Clock: Send + Sync {
    fn today(&self) -> Date;
}

/// Wall-clock date in a fixed time zone.
#[derive(Debug, Clone)]
pub struct SystemClock {
    time_zone: TimeZone,
}

impl SystemClock {
    /// Clock for the named IANA zone, falling back to the system zone if the
    /// name is unknown.
    pub fn new(time_zone: &str) -> Self {
        let time_zone = TimeZone::get(time_zone).unwrap_or_else(|e| {
            tracing::warn!(time_zone, error = %e, "unknown time zone, using system zone");
            TimeZone::system()
        });
        Self { time_zone }
    }
}

impl Clock for SystemClock {
    fn today(&self) -> Date {
        Timestamp::now().to_zoned(self.time_zone.clone()).date()
    }
}

/// A clock stuck on one date.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}
