//! 증분 캐시 관리자.
//!
//! 심볼별로 영속화된 일별 시계열을 앞뒤로 확장하거나 내부 결손을
//! 메우며, 전체 재계산 없이 요청 범위를 서빙합니다. 요청 처리 순서:
//!
//! 1. 최근 N일 창은 캐시 여부와 무관하게 항상 재생성 (늦게 도착하는
//!    소스 정정 흡수)
//! 2. 요청 끝이 캐시 최신일을 넘으면 뒤쪽 구간 생성 후 병합
//! 3. 요청 시작이 캐시 최초일보다 앞서면 앞쪽 구간 생성 후 병합
//! 4. 범위를 확장한 병합 뒤에는 내부 결손을 스캔해 임계값 이하
//!    구간만 정확히 재생성
//!
//! 병합은 날짜 기준 합집합에 새 값 우선이라 같은 구간을 두 번 병합해도
//! 결과가 같습니다. 저장은 요청당 한 번, 모든 병합이 끝난 뒤 수행합니다.

use chrono::{Duration, NaiveDate};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::builder::DatasetBuilder;
use crate::store::DatasetStore;
use crate::Result;
use kimp_core::{Asset, DailyRecord, DateRange};

/// 캐시 관리자 동작 파라미터.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// 항상 재생성하는 최근 창의 길이 (일)
    pub recency_window_days: i64,
    /// 자동 복구 대상 내부 결손의 최대 길이 (일)
    pub internal_gap_max_days: i64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            recency_window_days: 3,
            internal_gap_max_days: 7,
        }
    }
}

/// 심볼별 증분 캐시 관리자.
///
/// 같은 심볼에 대한 동시 요청은 내부 잠금 맵으로 직렬화해
/// 읽기-수정-쓰기 경합에 의한 갱신 유실을 막습니다.
pub struct CacheManager<B, S> {
    builder: B,
    store: S,
    config: CacheConfig,
    locks: Mutex<HashMap<Asset, Arc<Mutex<()>>>>,
}

impl<B, S> CacheManager<B, S>
where
    B: DatasetBuilder,
    S: DatasetStore,
{
    pub fn new(builder: B, store: S, config: CacheConfig) -> Self {
        Self {
            builder,
            store,
            config,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// 저장소 참조 (실시간 조회 등 보조 경로용).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// 빌더 참조.
    pub fn builder(&self) -> &B {
        &self.builder
    }

    async fn lock_for(&self, asset: Asset) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        locks.entry(asset).or_default().clone()
    }

    /// 요청 범위를 캐시에서 서빙합니다. 필요한 구간만 증분 생성하며,
    /// 반환값은 항상 병합된 시계열에서 잘라낸 요청 범위입니다.
    pub async fn get_or_build(&self, asset: Asset, range: DateRange) -> Result<Vec<DailyRecord>> {
        let lock = self.lock_for(asset).await;
        let _guard = lock.lock().await;

        let cached = self.store.load(asset).await?.unwrap_or_default();

        let merged = if cached.is_empty() {
            info!(asset = %asset, range = %range, "캐시 없음, 전체 생성");
            let built = self.builder.build(asset, range).await?;
            built.into_iter().map(|r| (r.date, r)).collect()
        } else {
            self.extend_cache(asset, range, cached).await?
        };

        let merged: Vec<DailyRecord> = merged.into_values().collect();
        self.store.save(asset, &merged).await?;

        Ok(merged
            .into_iter()
            .filter(|r| range.contains(r.date))
            .collect())
    }

    async fn extend_cache(
        &self,
        asset: Asset,
        range: DateRange,
        cached: Vec<DailyRecord>,
    ) -> Result<BTreeMap<NaiveDate, DailyRecord>> {
        let mut merged: BTreeMap<NaiveDate, DailyRecord> =
            cached.into_iter().map(|r| (r.date, r)).collect();
        // extend_cache는 비어 있지 않은 캐시에서만 호출됨
        let earliest = *merged.keys().next().ok_or_else(|| {
            crate::DataError::StoreError("빈 캐시로 확장 요청".to_string())
        })?;
        let latest = *merged.keys().next_back().ok_or_else(|| {
            crate::DataError::StoreError("빈 캐시로 확장 요청".to_string())
        })?;

        // 1. 최근 창 재생성: 창 끝은 max(latest, reqEnd)에 고정
        let recent_start = earliest.max(latest - Duration::days(self.config.recency_window_days - 1));
        let recent_end = latest.max(range.end);
        if recent_start <= recent_end {
            let window = DateRange::new(recent_start, recent_end)?;
            debug!(asset = %asset, window = %window, "최근 창 재생성");
            let rebuilt = self.builder.build(asset, window).await?;
            if rebuilt.is_empty() {
                warn!(asset = %asset, window = %window, "최근 창 재생성 결과 없음, 기존 값 유지");
            } else {
                merged.retain(|date, _| *date < recent_start);
                for record in rebuilt {
                    merged.insert(record.date, record);
                }
            }
        }

        // 2. 뒤쪽 구간
        if let Some(&latest) = merged.keys().next_back() {
            if range.end > latest {
                let gap = DateRange::new(latest + Duration::days(1), range.end)?;
                debug!(asset = %asset, gap = %gap, "뒤쪽 구간 생성");
                let built = self.builder.build(asset, gap).await?;
                if !built.is_empty() {
                    for record in built {
                        merged.insert(record.date, record);
                    }
                    self.repair_internal_gaps(asset, &mut merged).await?;
                }
            }
        }

        // 3. 앞쪽 구간
        if let Some(&earliest) = merged.keys().next() {
            if range.start < earliest {
                let gap = DateRange::new(range.start, earliest - Duration::days(1))?;
                debug!(asset = %asset, gap = %gap, "앞쪽 구간 생성");
                let built = self.builder.build(asset, gap).await?;
                if !built.is_empty() {
                    for record in built {
                        merged.insert(record.date, record);
                    }
                    self.repair_internal_gaps(asset, &mut merged).await?;
                }
            }
        }

        Ok(merged)
    }

    /// 임계값 이하의 내부 결손만 정확히 재생성해 병합합니다.
    async fn repair_internal_gaps(
        &self,
        asset: Asset,
        merged: &mut BTreeMap<NaiveDate, DailyRecord>,
    ) -> Result<()> {
        let gaps = find_internal_gaps(merged, self.config.internal_gap_max_days);
        for gap in gaps {
            debug!(asset = %asset, gap = %gap, "내부 결손 복구");
            let built = self.builder.build(asset, gap).await?;
            for record in built {
                merged.insert(record.date, record);
            }
        }
        Ok(())
    }
}

/// 연속 날짜 사이의 결손 중 `max_days` 이하인 구간만 찾습니다.
/// 임계값을 넘는 결손은 정당한 공백(신규 상장 등)으로 보고 건너뜁니다.
fn find_internal_gaps(
    records: &BTreeMap<NaiveDate, DailyRecord>,
    max_days: i64,
) -> Vec<DateRange> {
    let mut gaps = Vec::new();
    let mut dates = records.keys();
    let Some(mut prev) = dates.next().copied() else {
        return gaps;
    };
    for &date in dates {
        let gap_len = (date - prev).num_days() - 1;
        if gap_len >= 1 && gap_len <= max_days {
            if let Ok(gap) = DateRange::new(prev + Duration::days(1), date - Duration::days(1)) {
                gaps.push(gap);
            }
        }
        prev = date;
    }
    gaps
}
