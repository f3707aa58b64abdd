//! alternative.me Fear & Greed 지수 어댑터.
//!
//! `limit=0`으로 전체 이력을 한 번에 받아 요청 범위에 맞춰 재배열합니다.
//! 지수가 없는 날짜는 직전 관측값으로 전진 채움하고 `is_filled`로
//! 표시합니다. 첫 관측 이전 날짜는 결과에서 빠집니다.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

use crate::provider::{SentimentQuote, SentimentSource};
use crate::{DataError, Result};
use kimp_core::DateRange;

/// Fear & Greed 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct FearGreedConfig {
    /// API 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for FearGreedConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.alternative.me".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Deserialize)]
struct FngResponse {
    data: Vec<FngEntry>,
}

#[derive(Debug, Deserialize)]
struct FngEntry {
    value: String,
    timestamp: String,
}

/// alternative.me Fear & Greed 클라이언트.
pub struct FearGreedClient {
    config: FearGreedConfig,
    client: Client,
}

impl FearGreedClient {
    /// 새 클라이언트 생성.
    pub fn new(config: FearGreedConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DataError::NetworkError(format!("HTTP 클라이언트 생성 실패: {}", e)))?;

        Ok(Self { config, client })
    }

    /// 기본 URL을 변경합니다 (테스트용).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into();
        self
    }

    /// 전체 이력을 날짜별 지수 맵으로 조회.
    async fn fetch_history(&self) -> Result<BTreeMap<NaiveDate, i64>> {
        let url = format!("{}/fng/?limit=0", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DataError::NetworkError(format!("Fear & Greed 요청 실패: {}", e)))?;

        let payload: FngResponse = response.json().await.map_err(|e| {
            DataError::ParseError(format!("Fear & Greed 응답 파싱 실패: {}", e))
        })?;

        let mut history = BTreeMap::new();
        for entry in payload.data {
            let ts: i64 = entry.timestamp.parse().map_err(|_| {
                DataError::ParseError(format!("잘못된 타임스탬프: {}", entry.timestamp))
            })?;
            let value: i64 = entry.value.parse().map_err(|_| {
                DataError::ParseError(format!("잘못된 지수값: {}", entry.value))
            })?;
            let Some(dt) = DateTime::from_timestamp(ts, 0) else {
                return Err(DataError::ParseError(format!(
                    "타임스탬프 범위 초과: {}",
                    ts
                )));
            };
            history.insert(dt.date_naive(), value);
        }
        Ok(history)
    }
}

#[async_trait]
impl SentimentSource for FearGreedClient {
    async fn fetch_sentiment_range(&self, range: DateRange) -> Result<Vec<SentimentQuote>> {
        let history = self.fetch_history().await?;

        let mut quotes = Vec::new();
        let mut last: Option<i64> = None;
        for date in range.iter_days() {
            match history.get(&date) {
                Some(&value) => {
                    quotes.push(SentimentQuote {
                        date,
                        value,
                        is_filled: false,
                    });
                    last = Some(value);
                }
                None => {
                    // 과거 관측으로만 전진 채움, 첫 관측 이전은 제외
                    let fill = last.or_else(|| {
                        history
                            .range(..date)
                            .next_back()
                            .map(|(_, &v)| v)
                    });
                    if let Some(value) = fill {
                        quotes.push(SentimentQuote {
                            date,
                            value,
                            is_filled: true,
                        });
                        last = Some(value);
                    }
                }
            }
        }

        debug!(range = %range, count = quotes.len(), "Fear & Greed 지수 수집 완료");
        Ok(quotes)
    }
}
