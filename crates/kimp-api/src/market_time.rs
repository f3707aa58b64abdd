//! 데이터 가용 시각 보정.
//!
//! 일별 데이터는 KST 09:30 이후에야 당일분이 안정적으로 제공되므로,
//! 그 이전에는 요청 끝을 전일로 내립니다. 요청 시작은 심볼의 상장
//! 시작일 이전으로 내려가지 않도록 올립니다.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Asia::Seoul;

use kimp_core::{Asset, CoreError, DateRange};

/// 주어진 시각 기준으로 제공 가능한 마지막 날짜 (KST 09:30 컷오프).
pub fn available_end(now: DateTime<Utc>) -> NaiveDate {
    let kst = now.with_timezone(&Seoul);
    // NaiveTime 생성은 상수 인자라 실패하지 않음
    let cutoff = NaiveTime::from_hms_opt(9, 30, 0).unwrap_or(NaiveTime::MIN);
    if kst.time() < cutoff {
        kst.date_naive() - Duration::days(1)
    } else {
        kst.date_naive()
    }
}

/// 요청 범위를 상장 시작일과 가용 마지막 날짜로 보정합니다.
///
/// 보정 결과 범위가 비면 (전체가 미래이거나 상장 이전)
/// `CoreError::InvalidDateRange`를 반환합니다.
pub fn clamp_range(
    asset: Asset,
    range: DateRange,
    now: DateTime<Utc>,
) -> Result<DateRange, CoreError> {
    let start = range.start.max(asset.listing_start());
    let end = range.end.min(available_end(now));
    DateRange::new(start, end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at_kst(date: &str, hour: u32, min: u32) -> DateTime<Utc> {
        let d: NaiveDate = date.parse().unwrap();
        Seoul
            .from_local_datetime(&d.and_hms_opt(hour, min, 0).unwrap())
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_before_cutoff_uses_yesterday() {
        let end = available_end(at_kst("2024-06-10", 9, 0));
        assert_eq!(end.to_string(), "2024-06-09");
    }

    #[test]
    fn test_at_cutoff_uses_today() {
        let end = available_end(at_kst("2024-06-10", 9, 30));
        assert_eq!(end.to_string(), "2024-06-10");
    }

    #[test]
    fn test_clamp_applies_listing_start() {
        // DOGE는 2021-01-01 상장 기준
        let range = DateRange::parse("2020-06-01", "2021-03-01").unwrap();
        let clamped = clamp_range(Asset::Doge, range, at_kst("2024-06-10", 12, 0)).unwrap();
        assert_eq!(clamped.start.to_string(), "2021-01-01");
        assert_eq!(clamped.end.to_string(), "2021-03-01");
    }

    #[test]
    fn test_future_only_range_is_rejected() {
        let range = DateRange::parse("2024-07-01", "2024-07-10").unwrap();
        assert!(clamp_range(Asset::Btc, range, at_kst("2024-06-10", 12, 0)).is_err());
    }
}
