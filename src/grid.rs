use chrono::{Datelike, Duration, NaiveDate};
use std::fmt;

use crate::month::DisplayedMonth;

pub const DAYS_PER_WEEK: usize = 7;

/// Key under which the note of a day is stored, `YYYY-MM-DD`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DayKey(String);

impl DayKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<NaiveDate> for DayKey {
    fn from(date: NaiveDate) -> Self {
        DayKey(format!(
            "{:04}-{:02}-{:02}",
            date.year(),
            date.month(),
            date.day()
        ))
    }
}

impl From<&NaiveDate> for DayKey {
    fn from(date: &NaiveDate) -> Self {
        DayKey::from(*date)
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDayCell {
    pub date: NaiveDate,
    pub in_month: bool,
    pub is_today: bool,
    pub key: DayKey,
}

impl CalendarDayCell {
    fn new(date: NaiveDate, in_month: bool, today: NaiveDate) -> Self {
        CalendarDayCell {
            date,
            in_month,
            is_today: date == today,
            key: DayKey::from(date),
        }
    }

    pub fn day_num(&self) -> u32 {
        self.date.day()
    }
}

/// Builds the cells of the full weeks covering `month`, weeks starting on Sunday.
///
/// Leading cells are the last days of the previous month, trailing cells the first
/// days of the next one, so the result is always a whole number of weeks (35 or 42
/// cells, 28 for a February starting on a Sunday in a common year). Every
/// [`DisplayedMonth`] leaves room for its filler days, so no cell is dropped.
pub fn build_grid(month: DisplayedMonth, today: NaiveDate) -> Vec<CalendarDayCell> {
    let first = month.first_day();
    let leading = first.weekday().num_days_from_sunday() as i64;
    let in_month = month.num_days() as usize;

    let total = leading as usize + in_month;
    let total = total.div_ceil(DAYS_PER_WEEK) * DAYS_PER_WEEK;

    (0..total as i64)
        .filter_map(|offset| first.checked_add_signed(Duration::days(offset - leading)))
        .map(|date| CalendarDayCell::new(date, month.contains(&date), today))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_keys() {
        assert_eq!(DayKey::from(date(2024, 2, 14)).as_str(), "2024-02-14");
        assert_eq!(DayKey::from(date(987, 12, 1)).to_string(), "0987-12-01");
    }

    #[test]
    fn leap_february() {
        let cells = build_grid(DisplayedMonth::new(2024, 1), date(2024, 2, 10));
        let in_month: Vec<_> = cells.iter().filter(|c| c.in_month).collect();

        assert_eq!(in_month.len(), 29);
        assert_eq!(in_month.first().unwrap().date, date(2024, 2, 1));
        assert_eq!(in_month.last().unwrap().date, date(2024, 2, 29));

        // Feb 1st 2024 is a Thursday
        assert_eq!(cells.len(), 35);
        assert_eq!(cells[0].date, date(2024, 1, 28));
        assert_eq!(cells[4].date, date(2024, 2, 1));
        assert_eq!(cells.last().unwrap().date, date(2024, 3, 2));

        let today: Vec<_> = cells.iter().filter(|c| c.is_today).collect();
        assert_eq!(today.len(), 1);
        assert_eq!(today[0].key.as_str(), "2024-02-10");
    }

    #[test]
    fn six_week_month() {
        // March 2024 starts on a Friday and has 31 days
        let cells = build_grid(DisplayedMonth::new(2024, 2), date(2000, 1, 1));
        assert_eq!(cells.len(), 42);
        assert!(cells.iter().all(|c| !c.is_today));
    }

    #[test]
    fn four_week_month() {
        // February 2015 starts on a Sunday in a common year
        let cells = build_grid(DisplayedMonth::new(2015, 1), date(2015, 2, 1));
        assert_eq!(cells.len(), 28);
        assert!(cells.iter().all(|c| c.in_month));
    }

    #[test]
    fn every_month_is_complete_and_padded() {
        let today = date(2024, 6, 15);
        let mut month = DisplayedMonth::new(1995, 0);

        for _ in 0..(12 * 40) {
            let cells = build_grid(month, today);
            assert_eq!(cells.len() % DAYS_PER_WEEK, 0, "{}", month);
            assert_eq!(cells[0].date.weekday(), chrono::Weekday::Sun);

            let days: Vec<u32> = cells
                .iter()
                .filter(|c| c.in_month)
                .map(|c| c.day_num())
                .collect();
            assert_eq!(days, (1..=month.num_days()).collect::<Vec<_>>(), "{}", month);

            let leading: Vec<_> = cells.iter().take_while(|c| !c.in_month).collect();
            let prev = month.prev();
            for (i, cell) in leading.iter().enumerate() {
                let expected = prev.num_days() - (leading.len() - 1 - i) as u32;
                assert_eq!(cell.date, prev.day(expected));
            }

            let trailing: Vec<_> = cells.iter().rev().take_while(|c| !c.in_month).collect();
            for (i, cell) in trailing.iter().rev().enumerate() {
                assert_eq!(cell.date, month.next().day(i as u32 + 1));
            }

            assert!(trailing.len() < DAYS_PER_WEEK);
            month = month.next();
        }
    }

    #[test]
    fn grids_at_the_ends_of_the_range_are_complete() {
        let today = date(2024, 6, 15);
        for month in [DisplayedMonth::earliest(), DisplayedMonth::latest()] {
            let cells = build_grid(month, today);
            assert_eq!(cells.len() % DAYS_PER_WEEK, 0, "{}", month);
            assert_eq!(cells[0].date.weekday(), chrono::Weekday::Sun);
            assert_eq!(
                cells.iter().filter(|c| c.in_month).count(),
                month.num_days() as usize
            );
            for pair in cells.windows(2) {
                assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
            }
        }
    }
}
