//! Week arithmetic for the life grid

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};

/// Columns per row: one row is one year of weeks
pub const COLS: u32 = 52;

/// Week counts for one render, derived from settings and the current time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeekGrid {
    pub total_weeks: u32,
    pub weeks_lived: u32,
    pub cols: u32,
    pub rows: u32,
}

impl WeekGrid {
    pub fn new(birth_date: NaiveDate, life_expectancy: u32, now: DateTime<Utc>) -> Self {
        let total_weeks = total_weeks(life_expectancy);
        WeekGrid {
            total_weeks,
            weeks_lived: weeks_lived(birth_date, now),
            cols: COLS,
            rows: total_weeks.div_ceil(COLS),
        }
    }

    pub fn is_lived(&self, week_index: u32) -> bool {
        week_index < self.weeks_lived
    }
}

pub fn total_weeks(life_expectancy: u32) -> u32 {
    life_expectancy * COLS
}

/// Whole weeks between midnight UTC of the birth date and `now`, never negative
pub fn weeks_lived(birth_date: NaiveDate, now: DateTime<Utc>) -> u32 {
    let birth = birth_date.and_time(NaiveTime::MIN).and_utc();
    let weeks = (now - birth).num_weeks();
    weeks.clamp(0, u32::MAX as i64) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_total_weeks_and_rows() {
        for years in [1u32, 7, 77, 80, 150] {
            let grid = WeekGrid::new(NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(), years, now());
            assert_eq!(grid.total_weeks, 52 * years);
            assert_eq!(grid.rows, (52 * years).div_ceil(52));
            assert_eq!(grid.cols, 52);
        }
    }

    #[test]
    fn test_weeks_lived_exact_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let birth = (now - Duration::weeks(520)).date_naive();
        assert_eq!(weeks_lived(birth, now), 520);
        // One second short of the boundary is still the previous week
        assert_eq!(weeks_lived(birth, now - Duration::seconds(1)), 519);
    }

    #[test]
    fn test_weeks_lived_future_birth_is_zero() {
        let birth = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();
        assert_eq!(weeks_lived(birth, now()), 0);
    }

    #[test]
    fn test_weeks_lived_is_monotonic() {
        let birth = NaiveDate::from_ymd_opt(1999, 12, 31).unwrap();
        let mut previous = 0;
        for day in 0..400 {
            let at = now() + Duration::hours(day * 13);
            let lived = weeks_lived(birth, at);
            assert!(lived >= previous);
            previous = lived;
        }
    }

    #[test]
    fn test_every_cell_lived_past_expectancy() {
        let birth = NaiveDate::from_ymd_opt(1900, 1, 1).unwrap();
        let grid = WeekGrid::new(birth, 10, now());
        assert!(grid.weeks_lived > grid.total_weeks);
        assert!((0..grid.total_weeks).all(|i| grid.is_lived(i)));
    }
}
