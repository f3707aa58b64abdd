//! 환율 소스 합성.
//!
//! 1차 소스(Fixer)를 전체 범위에 대해 실행한 뒤, 빠진 날짜들을 연속
//! 구간으로 묶어 폴백 소스(고시 환율 스크레이퍼)에 위임합니다. 같은
//! 날짜에 대해 두 소스 모두 값이 있으면 1차 소스가 우선합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use crate::provider::{FxQuote, FxRateSource};
use crate::Result;
use kimp_core::DateRange;

/// 1차 + 폴백 환율 소스.
pub struct CompositeFxSource<P, F> {
    primary: P,
    fallback: F,
}

impl<P, F> CompositeFxSource<P, F> {
    pub fn new(primary: P, fallback: F) -> Self {
        Self { primary, fallback }
    }
}

/// 범위 내에서 `have`에 없는 날짜들을 연속 구간으로 묶습니다.
fn missing_spans(range: DateRange, have: &BTreeSet<NaiveDate>) -> Vec<DateRange> {
    let mut spans = Vec::new();
    let mut span_start: Option<NaiveDate> = None;
    let mut prev = range.start;

    for date in range.iter_days() {
        if have.contains(&date) {
            if let Some(start) = span_start.take() {
                // prev는 직전 누락 날짜
                if let Ok(span) = DateRange::new(start, prev) {
                    spans.push(span);
                }
            }
        } else if span_start.is_none() {
            span_start = Some(date);
        }
        prev = date;
    }
    if let Some(start) = span_start {
        if let Ok(span) = DateRange::new(start, range.end) {
            spans.push(span);
        }
    }
    spans
}

#[async_trait]
impl<P, F> FxRateSource for CompositeFxSource<P, F>
where
    P: FxRateSource + Send + Sync,
    F: FxRateSource + Send + Sync,
{
    async fn fetch_fx_range(&self, range: DateRange) -> Result<Vec<FxQuote>> {
        let primary_quotes = match self.primary.fetch_fx_range(range).await {
            Ok(quotes) => quotes,
            Err(e) => {
                warn!(error = %e, "1차 환율 소스 실패, 전체를 폴백으로 위임");
                Vec::new()
            }
        };

        let mut merged: BTreeMap<NaiveDate, FxQuote> = primary_quotes
            .into_iter()
            .map(|q| (q.date, q))
            .collect();

        let have: BTreeSet<NaiveDate> = merged.keys().copied().collect();
        let spans = missing_spans(range, &have);

        for span in spans {
            match self.fallback.fetch_fx_range(span).await {
                Ok(quotes) => {
                    for quote in quotes {
                        merged.entry(quote.date).or_insert(quote);
                    }
                }
                Err(e) => {
                    warn!(span = %span, error = %e, "폴백 환율 소스 실패");
                }
            }
        }

        info!(range = %range, count = merged.len(), "환율 범위 합성 완료");
        Ok(merged.into_values().collect())
    }
}
