use chrono::{Datelike, Duration, Month, NaiveDate};
use num_traits::FromPrimitive;
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, ErrorKind, Result};

/// Number of days in `month` (1-based) of `year`.
///
/// Computed as "day zero" of the following month, i.e. the day before its first.
/// `None` when chrono cannot represent that month.
pub fn days_of_month(year: i32, month: u32) -> Option<u32> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month >= 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };

    let last = match NaiveDate::from_ymd_opt(next_year, next_month, 1) {
        Some(next) => next.pred_opt()?,
        // December of chrono's last year
        None => NaiveDate::from_ymd_opt(first.year(), month, 31)?,
    };
    Some(last.day())
}

/// Days a grid row may reach into the neighbouring months.
const FILLER_REACH: i64 = 6;

/// The month currently shown, as a year and a zero-based month index.
///
/// Only months whose whole grid, filler days included, lies within chrono's
/// date range can be constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplayedMonth {
    year: i32,
    index: u32,
    first: NaiveDate,
    last: NaiveDate,
}

fn out_of_range(what: impl fmt::Display) -> Error {
    Error::new(
        ErrorKind::DateParse,
        &format!("{} is outside the supported calendar range", what),
    )
}

impl DisplayedMonth {
    /// `index` wraps into the neighbouring years, like date overflow does.
    ///
    /// Months outside the supported range are clamped to its nearest end.
    pub fn new(year: i32, index: i32) -> Self {
        let total = Self::total(year as i64, index as i64);
        Self::from_total(total).unwrap_or_else(|| {
            if total < 0 {
                Self::earliest()
            } else {
                Self::latest()
            }
        })
    }

    /// Like [`DisplayedMonth::new`], but refuses unsupported months instead of clamping.
    pub fn try_new(year: i64, index: i64) -> Result<Self> {
        year.checked_mul(12)
            .and_then(|months| months.checked_add(index))
            .and_then(Self::from_total)
            .ok_or_else(|| out_of_range(format!("month {} of year {}", index.saturating_add(1), year)))
    }

    /// The earliest month with a complete grid.
    pub fn earliest() -> Self {
        Self::scan(NaiveDate::MIN, 1)
    }

    /// The latest month with a complete grid.
    pub fn latest() -> Self {
        Self::scan(NaiveDate::MAX, -1)
    }

    fn total(year: i64, index: i64) -> i64 {
        year * 12 + index
    }

    fn scan(edge: NaiveDate, step: i64) -> Self {
        let start = Self::total(edge.year() as i64, edge.month0() as i64);
        (0..3)
            .find_map(|k| Self::from_total(start + k * step))
            .unwrap_or_else(|| Self::from_date(NaiveDate::default()))
    }

    /// Month `total` counted from January of year zero.
    fn from_total(total: i64) -> Option<Self> {
        let year = i32::try_from(total.div_euclid(12)).ok()?;
        let index = total.rem_euclid(12) as u32;
        let first = NaiveDate::from_ymd_opt(year, index + 1, 1)?;
        let last = NaiveDate::from_ymd_opt(year, index + 1, days_of_month(year, index + 1)?)?;

        first.checked_sub_signed(Duration::days(FILLER_REACH))?;
        last.checked_add_signed(Duration::days(FILLER_REACH))?;

        Some(DisplayedMonth {
            year,
            index,
            first,
            last,
        })
    }

    fn from_date(date: NaiveDate) -> Self {
        DisplayedMonth {
            year: date.year(),
            index: date.month0(),
            first: date,
            last: date,
        }
    }

    /// The month `date` falls into, if it is supported.
    pub fn of<T: Datelike>(date: &T) -> Result<Self> {
        Self::try_new(date.year() as i64, date.month0() as i64)
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    /// Zero-based month index (January is 0).
    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn number_from_month(&self) -> u32 {
        self.index + 1
    }

    pub fn month(&self) -> Month {
        Month::from_u32(self.number_from_month()).unwrap_or(Month::January)
    }

    /// `count` months later, or an error past the latest supported month.
    pub fn checked_add(&self, count: u32) -> Result<Self> {
        Self::total(self.year as i64, self.index as i64)
            .checked_add(count as i64)
            .and_then(Self::from_total)
            .ok_or_else(|| out_of_range(format!("{} plus {} months", self, count)))
    }

    /// `count` months earlier, or an error before the earliest supported month.
    pub fn checked_sub(&self, count: u32) -> Result<Self> {
        Self::total(self.year as i64, self.index as i64)
            .checked_sub(count as i64)
            .and_then(Self::from_total)
            .ok_or_else(|| out_of_range(format!("{} minus {} months", self, count)))
    }

    /// The following month; the latest month is its own successor.
    pub fn next(&self) -> Self {
        self.checked_add(1).unwrap_or(*self)
    }

    /// The preceding month; the earliest month is its own predecessor.
    pub fn prev(&self) -> Self {
        self.checked_sub(1).unwrap_or(*self)
    }

    pub fn num_days(&self) -> u32 {
        self.last.day()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last
    }

    /// Day `day` of this month, clamped into the month's range.
    pub fn day(&self, day: u32) -> NaiveDate {
        let day = day.clamp(1, self.num_days());
        self.first.with_day(day).unwrap_or(self.last)
    }

    pub fn contains(&self, date: &NaiveDate) -> bool {
        date.year() == self.year && date.month0() == self.index
    }
}

/// Dates outside the supported range map to its nearest end.
impl<T: Datelike> From<T> for DisplayedMonth {
    fn from(date: T) -> Self {
        DisplayedMonth::new(date.year(), date.month0() as i32)
    }
}

impl PartialOrd for DisplayedMonth {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DisplayedMonth {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (self.year, self.index).cmp(&(other.year, other.index))
    }
}

impl fmt::Display for DisplayedMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.number_from_month())
    }
}

impl FromStr for DisplayedMonth {
    type Err = Error;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self> {
        let date = NaiveDate::parse_from_str(&format!("{}-01", s.trim()), "%Y-%m-%d")
            .map_err(|_| Error::new(ErrorKind::DateParse, &format!("'{}' is not YYYY-MM", s)))?;
        DisplayedMonth::of(&date)
    }
}
