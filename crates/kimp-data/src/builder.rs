//! 김치 프리미엄 일별 데이터셋 빌더.
//!
//! 네 개의 독립 소스(해외 선물 종가, 국내 현물 종가, USD/KRW 환율,
//! 공포·탐욕 지수)를 날짜로 내부 조인하고 프리미엄을 계산합니다.
//! 네 소스가 모두 값을 낸 날짜만 결과에 남으며, 환율 기준 가격이 0인
//! 날은 직전 프리미엄을 이어받습니다.
//!
//! 개별 소스 장애는 해당 구간의 데이터 부재로 취급해 빈 부분 결과로
//! 전파하며, 전체 빌드를 실패시키지 않습니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::{info, warn};

use crate::provider::{
    FxRateSource, IntlPriceSource, LocalPriceSource, SentimentSource,
};
use crate::Result;
use kimp_core::{compute_premium_pct, Asset, DailyRecord, DateRange};

/// 일별 데이터셋 빌더 추상화.
#[async_trait]
pub trait DatasetBuilder: Send + Sync {
    /// 요청 범위의 일별 레코드를 생성합니다. 날짜 오름차순 정렬.
    async fn build(&self, asset: Asset, range: DateRange) -> Result<Vec<DailyRecord>>;
}

/// 네 소스를 합성하는 기본 빌더.
pub struct PremiumDatasetBuilder<I, L, F, S> {
    intl: I,
    local: L,
    fx: F,
    sentiment: S,
}

impl<I, L, F, S> PremiumDatasetBuilder<I, L, F, S> {
    pub fn new(intl: I, local: L, fx: F, sentiment: S) -> Self {
        Self {
            intl,
            local,
            fx,
            sentiment,
        }
    }
}

#[async_trait]
impl<I, L, F, S> DatasetBuilder for PremiumDatasetBuilder<I, L, F, S>
where
    I: IntlPriceSource + Send + Sync,
    L: LocalPriceSource + Send + Sync,
    F: FxRateSource + Send + Sync,
    S: SentimentSource + Send + Sync,
{
    async fn build(&self, asset: Asset, range: DateRange) -> Result<Vec<DailyRecord>> {
        // 소스 장애는 해당 구간에 데이터가 없는 것으로 취급 (전체 빌드 실패 금지)
        let intl = match self.intl.fetch_intl_daily(asset, range).await {
            Ok(v) => v,
            Err(e) => {
                warn!(asset = %asset, range = %range, error = %e, "해외 종가 조회 실패, 빈 결과로 처리");
                Vec::new()
            }
        };
        let local = match self.local.fetch_local_daily(asset, range).await {
            Ok(v) => v,
            Err(e) => {
                warn!(asset = %asset, range = %range, error = %e, "국내 종가 조회 실패, 빈 결과로 처리");
                Vec::new()
            }
        };
        let fx = match self.fx.fetch_fx_range(range).await {
            Ok(v) => v,
            Err(e) => {
                warn!(range = %range, error = %e, "환율 조회 실패, 빈 결과로 처리");
                Vec::new()
            }
        };
        let sentiment = match self.sentiment.fetch_sentiment_range(range).await {
            Ok(v) => v,
            Err(e) => {
                warn!(range = %range, error = %e, "공포·탐욕 지수 조회 실패, 빈 결과로 처리");
                Vec::new()
            }
        };

        if intl.is_empty() || local.is_empty() || fx.is_empty() || sentiment.is_empty() {
            warn!(
                asset = %asset,
                range = %range,
                intl = intl.len(),
                local = local.len(),
                fx = fx.len(),
                sentiment = sentiment.len(),
                "소스 일부가 비어 있어 빈 데이터셋 반환"
            );
            return Ok(Vec::new());
        }

        let intl: BTreeMap<NaiveDate, Decimal> =
            intl.into_iter().map(|c| (c.date, c.close)).collect();
        let local: BTreeMap<NaiveDate, Decimal> =
            local.into_iter().map(|c| (c.date, c.close)).collect();
        let fx: BTreeMap<NaiveDate, _> = fx.into_iter().map(|q| (q.date, q)).collect();
        let sentiment: BTreeMap<NaiveDate, _> =
            sentiment.into_iter().map(|q| (q.date, q)).collect();

        let mut records = Vec::new();
        let mut last_premium: Option<f64> = None;
        for date in range.iter_days() {
            // 내부 조인: 네 소스가 모두 값을 낸 날짜만 남김
            let (Some(&intl_close), Some(&local_close), Some(fx_quote), Some(senti)) = (
                intl.get(&date),
                local.get(&date),
                fx.get(&date),
                sentiment.get(&date),
            ) else {
                continue;
            };

            // 환율/해외가가 0이면 직전 프리미엄을 이어받음
            let premium_pct = compute_premium_pct(local_close, intl_close, fx_quote.rate)
                .or(last_premium)
                .unwrap_or(0.0);
            last_premium = Some(premium_pct);

            records.push(DailyRecord {
                date,
                intl_close,
                local_close,
                fx_rate: fx_quote.rate,
                fx_is_filled: fx_quote.is_filled,
                sentiment: senti.value,
                sentiment_is_filled: senti.is_filled,
                premium_pct,
            });
        }

        info!(asset = %asset, range = %range, rows = records.len(), "데이터셋 생성 완료");
        Ok(records)
    }
}
