//! 날짜 범위 타입.

use crate::error::CoreError;
use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 양 끝을 포함하는 달력 날짜 범위.
///
/// 생성 시 `start <= end`를 검증합니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    /// 새 날짜 범위 생성.
    ///
    /// # Errors
    /// `start > end`이면 `CoreError::InvalidDateRange`를 반환합니다.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, CoreError> {
        if start > end {
            return Err(CoreError::InvalidDateRange { start, end });
        }
        Ok(Self { start, end })
    }

    /// 문자열(YYYY-MM-DD)에서 생성.
    pub fn parse(start: &str, end: &str) -> Result<Self, CoreError> {
        let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
            .map_err(|_| CoreError::InvalidDate(start.to_string()))?;
        let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
            .map_err(|_| CoreError::InvalidDate(end.to_string()))?;
        Self::new(start, end)
    }

    /// 범위에 포함된 날짜 수.
    pub fn num_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// 날짜가 범위 안에 있는지 확인.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// 범위의 모든 달력 날짜를 순서대로 순회.
    pub fn iter_days(&self) -> impl Iterator<Item = NaiveDate> {
        let start = self.start;
        let n = self.num_days();
        (0..n).map(move |i| start + Duration::days(i))
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_new_rejects_inverted() {
        assert!(DateRange::new(d("2024-01-05"), d("2024-01-01")).is_err());
        assert!(DateRange::new(d("2024-01-01"), d("2024-01-01")).is_ok());
    }

    #[test]
    fn test_iter_days() {
        let range = DateRange::parse("2024-01-01", "2024-01-03").unwrap();
        let days: Vec<_> = range.iter_days().collect();
        assert_eq!(days, vec![d("2024-01-01"), d("2024-01-02"), d("2024-01-03")]);
        assert_eq!(range.num_days(), 3);
    }

    #[test]
    fn test_parse_rejects_bad_date() {
        assert!(DateRange::parse("2024-13-01", "2024-01-05").is_err());
    }
}
