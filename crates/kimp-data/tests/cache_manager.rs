//! 증분 캐시 관리자 통합 테스트.
//!
//! 실제 CSV 저장소를 임시 디렉토리에 두고, 어떤 범위가 재생성되는지
//! 기록하는 스텁 빌더로 캐시 상태 전이를 검증합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Mutex;

use kimp_core::{compute_premium_pct, Asset, DailyRecord, DateRange};
use kimp_data::{
    CacheConfig, CacheManager, CsvDatasetStore, DatasetBuilder, DatasetStore, Result,
};

/// 요청된 모든 날짜에 대해 결정적 레코드를 만들고 호출 범위를 기록하는 빌더.
struct RecordingBuilder {
    calls: Mutex<Vec<DateRange>>,
}

impl RecordingBuilder {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<DateRange> {
        self.calls.lock().unwrap().clone()
    }
}

fn synthetic_record(date: NaiveDate) -> DailyRecord {
    // 날짜에 따라 값이 달라지는 결정적 레코드
    let day = date.format("%d").to_string().parse::<i64>().unwrap_or(1);
    let intl_close = dec!(100) + Decimal::from(day);
    let local_close = dec!(145000) + Decimal::from(day * 100);
    let fx_rate = dec!(1400);
    let premium_pct = compute_premium_pct(local_close, intl_close, fx_rate).unwrap_or(0.0);
    DailyRecord {
        date,
        intl_close,
        local_close,
        fx_rate,
        fx_is_filled: false,
        sentiment: 40 + day,
        sentiment_is_filled: false,
        premium_pct,
    }
}

#[async_trait]
impl DatasetBuilder for RecordingBuilder {
    async fn build(&self, _asset: Asset, range: DateRange) -> Result<Vec<DailyRecord>> {
        self.calls.lock().unwrap().push(range);
        Ok(range.iter_days().map(synthetic_record).collect())
    }
}

fn temp_store(tag: &str) -> CsvDatasetStore {
    let dir = std::env::temp_dir().join(format!("kimp-manager-{}-{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    CsvDatasetStore::new(dir)
}

fn manager(tag: &str) -> CacheManager<RecordingBuilder, CsvDatasetStore> {
    CacheManager::new(
        RecordingBuilder::new(),
        temp_store(tag),
        CacheConfig::default(),
    )
}

fn range(start: &str, end: &str) -> DateRange {
    DateRange::parse(start, end).unwrap()
}

async fn seed_cache(store: &CsvDatasetStore, asset: Asset, r: DateRange) {
    let records: Vec<DailyRecord> = r.iter_days().map(synthetic_record).collect();
    store.save(asset, &records).await.unwrap();
}

#[tokio::test]
async fn test_empty_cache_builds_requested_range_once() {
    let mgr = manager("empty");
    let req = range("2024-01-01", "2024-01-05");

    let result = mgr.get_or_build(Asset::Btc, req).await.unwrap();

    // 정확히 한 번, 요청 범위 그대로 빌드
    let calls = mgr.builder().calls();
    assert_eq!(calls, vec![req]);
    assert_eq!(result.len(), 5);

    // 반환 슬라이스는 영속화된 행과 일치
    let persisted = mgr.store().load(Asset::Btc).await.unwrap().unwrap();
    assert_eq!(persisted, result);
}

#[tokio::test]
async fn test_trailing_extension_reuses_leading_cache() {
    let mgr = manager("trailing");
    seed_cache(mgr.store(), Asset::Btc, range("2024-01-01", "2024-01-10")).await;

    let result = mgr
        .get_or_build(Asset::Btc, range("2024-01-01", "2024-01-15"))
        .await
        .unwrap();

    // 최근 3일 창이 요청 끝까지 확장되어 단일 빌드 [1/8..1/15]로 처리됨,
    // 앞쪽 1/1..1/7은 건드리지 않음
    let calls = mgr.builder().calls();
    assert_eq!(calls, vec![range("2024-01-08", "2024-01-15")]);

    assert_eq!(result.len(), 15);
    let dates: Vec<NaiveDate> = result.iter().map(|r| r.date).collect();
    let mut unique = dates.clone();
    unique.dedup();
    assert_eq!(dates, unique);
    assert_eq!(dates[0].to_string(), "2024-01-01");
    assert_eq!(dates[14].to_string(), "2024-01-15");
}

#[tokio::test]
async fn test_leading_gap_builds_prefix() {
    let mgr = manager("leading");
    seed_cache(mgr.store(), Asset::Eth, range("2024-01-10", "2024-01-20")).await;

    let result = mgr
        .get_or_build(Asset::Eth, range("2024-01-05", "2024-01-20"))
        .await
        .unwrap();

    let calls = mgr.builder().calls();
    // 최근 창 [1/18..1/20] + 앞쪽 구간 [1/5..1/9]
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0], range("2024-01-18", "2024-01-20"));
    assert_eq!(calls[1], range("2024-01-05", "2024-01-09"));
    assert_eq!(result.len(), 16);
}

#[tokio::test]
async fn test_internal_gap_within_threshold_is_repaired() {
    let mgr = manager("repair");
    // 2/10..2/12 결손: 2/5..2/9와 2/13..2/20만 캐시
    let mut records: Vec<DailyRecord> = range("2024-02-05", "2024-02-09")
        .iter_days()
        .chain(range("2024-02-13", "2024-02-20").iter_days())
        .map(synthetic_record)
        .collect();
    records.sort_by_key(|r| r.date);
    mgr.store().save(Asset::Btc, &records).await.unwrap();

    let result = mgr
        .get_or_build(Asset::Btc, range("2024-02-01", "2024-02-20"))
        .await
        .unwrap();

    // 최근 창 [2/18..2/20] + 앞쪽 구간 [2/1..2/4] + 결손 복구 [2/10..2/12]
    let calls = mgr.builder().calls();
    assert_eq!(calls.len(), 3);
    assert!(calls.contains(&range("2024-02-01", "2024-02-04")));
    assert!(calls.contains(&range("2024-02-10", "2024-02-12")));
    assert_eq!(result.len(), 20);
}

#[tokio::test]
async fn test_gap_beyond_threshold_left_untouched() {
    let mgr = manager("longgap");
    // 2/02..2/09 결손 (8일) → 임계값 7 초과, 복구 대상 아님
    let mut records: Vec<DailyRecord> = range("2024-02-01", "2024-02-01")
        .iter_days()
        .chain(range("2024-02-10", "2024-02-20").iter_days())
        .map(synthetic_record)
        .collect();
    records.sort_by_key(|r| r.date);
    mgr.store().save(Asset::Sol, &records).await.unwrap();

    // 앞쪽 구간이 생기도록 1/30부터 요청 → 복구 패스는 돌지만 긴 결손은 건너뜀
    let result = mgr
        .get_or_build(Asset::Sol, range("2024-01-30", "2024-02-20"))
        .await
        .unwrap();

    let calls = mgr.builder().calls();
    assert!(calls.contains(&range("2024-01-30", "2024-01-31")));
    assert!(!calls.contains(&range("2024-02-02", "2024-02-09")));
    // 결손 8일은 그대로 비어 있음 (1/30..1/31 + 2/1 + 2/10..2/20)
    assert_eq!(result.len(), 14);
}

#[tokio::test]
async fn test_cached_range_survives_degraded_rebuild() {
    // 모든 소스가 장애 상태여서 항상 빈 부분 결과만 내는 빌더
    struct UnavailableBuilder;

    #[async_trait]
    impl DatasetBuilder for UnavailableBuilder {
        async fn build(&self, _asset: Asset, _range: DateRange) -> Result<Vec<DailyRecord>> {
            Ok(Vec::new())
        }
    }

    let store = temp_store("degraded");
    let cached = range("2024-05-01", "2024-05-20");
    seed_cache(&store, Asset::Btc, cached).await;

    let mgr = CacheManager::new(UnavailableBuilder, store, CacheConfig::default());
    let req = range("2024-05-05", "2024-05-15");

    // 최신 구간 재생성이 비어 돌아와도 캐시로 충족되는 요청은 성공
    let result = mgr.get_or_build(Asset::Btc, req).await.unwrap();
    assert_eq!(result.len(), 11);
    assert!(result.iter().zip(req.iter_days()).all(|(r, d)| r.date == d));

    // 기존 캐시 행은 그대로 보존
    let persisted = mgr.store().load(Asset::Btc).await.unwrap().unwrap();
    assert_eq!(persisted.len(), cached.num_days() as usize);
}

#[tokio::test]
async fn test_repeated_request_is_idempotent() {
    let mgr = manager("idempotent");
    let req = range("2024-03-01", "2024-03-10");

    mgr.get_or_build(Asset::Btc, req).await.unwrap();
    let first = std::fs::read_to_string(mgr.store().file_path(Asset::Btc)).unwrap();

    mgr.get_or_build(Asset::Btc, req).await.unwrap();
    let second = std::fs::read_to_string(mgr.store().file_path(Asset::Btc)).unwrap();

    // 같은 범위를 두 번 병합해도 파일이 바이트 단위로 동일
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_subset_request_returns_exact_slice() {
    let mgr = manager("slice");
    seed_cache(mgr.store(), Asset::Xrp, range("2024-01-01", "2024-01-31")).await;

    let result = mgr
        .get_or_build(Asset::Xrp, range("2024-01-10", "2024-01-15"))
        .await
        .unwrap();

    assert_eq!(result.len(), 6);
    assert!(result
        .iter()
        .all(|r| r.date >= "2024-01-10".parse().unwrap() && r.date <= "2024-01-15".parse().unwrap()));
}

#[tokio::test]
async fn test_premium_consistency_in_persisted_rows() {
    let mgr = manager("premium");
    mgr.get_or_build(Asset::Btc, range("2024-04-01", "2024-04-10"))
        .await
        .unwrap();

    let persisted = mgr.store().load(Asset::Btc).await.unwrap().unwrap();
    for rec in persisted {
        let expected =
            compute_premium_pct(rec.local_close, rec.intl_close, rec.fx_rate).unwrap();
        assert!((rec.premium_pct - expected).abs() < 1e-9);
    }
}
