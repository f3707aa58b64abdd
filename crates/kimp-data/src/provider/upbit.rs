//! Upbit KRW 마켓 일봉 어댑터.
//!
//! 긴 기간을 한 번에 요청하면 실패하는 경우가 있어, `end`에서 과거 방향으로
//! 200건 단위 배치 페이징합니다. 수집한 가장 오래된 날짜가 `start` 이전이
//! 되거나 반복 상한에 도달하면 중단합니다 (폭주 방지 안전장치).

use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::provider::{DailyClose, LocalPriceSource};
use crate::{DataError, Result};
use kimp_core::{Asset, DateRange};

/// Upbit 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct UpbitConfig {
    /// REST API 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 호출당 최대 캔들 수
    pub batch_size: u32,
    /// 하드 반복 상한 (최대 batch_size * max_iters 일)
    pub max_iters: u32,
    /// 배치 호출 사이 대기 시간 (밀리초)
    pub request_delay_ms: u64,
}

impl Default for UpbitConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.upbit.com".to_string(),
            timeout_secs: 30,
            batch_size: 200,
            max_iters: 200,
            request_delay_ms: 200,
        }
    }
}

/// Upbit 일봉 응답 행.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct UpbitDayCandle {
    market: String,
    candle_date_time_utc: String,
    trade_price: Decimal,
}

/// 현재가 응답 행.
#[derive(Debug, Deserialize)]
struct UpbitTicker {
    trade_price: Decimal,
}

/// Upbit 거래소 클라이언트.
pub struct UpbitClient {
    config: UpbitConfig,
    client: Client,
}

impl UpbitClient {
    /// 새 클라이언트 생성.
    pub fn new(config: UpbitConfig) -> Result<Self> {
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

    /// `to` 이전의 일봉 배치 한 건 조회 (최신순).
    async fn fetch_batch(&self, market: &str, to: NaiveDateTime) -> Result<Vec<UpbitDayCandle>> {
        let url = format!(
            "{}/v1/candles/days?market={}&count={}&to={}",
            self.config.base_url,
            market,
            self.config.batch_size,
            to.format("%Y-%m-%dT%H:%M:%S")
        );

        debug!("GET {}", url);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DataError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DataError::ApiError {
                source_name: "upbit".to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        response
            .json::<Vec<UpbitDayCandle>>()
            .await
            .map_err(|e| DataError::ParseError(format!("Upbit 캔들 파싱 오류: {}", e)))
    }

    /// KRW 마켓 최신 체결가 조회 (실시간 스냅샷용).
    pub async fn fetch_latest_price(&self, asset: Asset) -> Result<Decimal> {
        let url = format!(
            "{}/v1/ticker?markets={}",
            self.config.base_url,
            asset.upbit_market()
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DataError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DataError::ApiError {
                source_name: "upbit".to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let tickers: Vec<UpbitTicker> = response
            .json()
            .await
            .map_err(|e| DataError::ParseError(format!("Upbit 시세 파싱 오류: {}", e)))?;
        tickers
            .first()
            .map(|t| t.trade_price)
            .ok_or_else(|| DataError::ApiError {
                source_name: "upbit".to_string(),
                message: "시세 응답이 비어 있음".to_string(),
            })
    }
}

#[async_trait]
impl LocalPriceSource for UpbitClient {
    async fn fetch_local_daily(&self, asset: Asset, range: DateRange) -> Result<Vec<DailyClose>> {
        let market = asset.upbit_market();

        // 최신에서 과거로 페이징: end 다음 날 자정부터 시작
        let mut to_ptr = (range.end + ChronoDuration::days(1))
            .and_hms_opt(0, 0, 0)
            .unwrap_or_default();
        let mut rows: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();

        for _ in 0..self.config.max_iters {
            let batch = self.fetch_batch(&market, to_ptr).await?;
            if batch.is_empty() {
                break;
            }

            let mut oldest: Option<NaiveDateTime> = None;
            for candle in &batch {
                let Ok(ts) = NaiveDateTime::parse_from_str(
                    &candle.candle_date_time_utc,
                    "%Y-%m-%dT%H:%M:%S",
                ) else {
                    warn!(market = %market, raw = %candle.candle_date_time_utc, "캔들 시각 파싱 실패, 건너뜀");
                    continue;
                };
                // 날짜 충돌 시 최근 배치 값이 우선
                rows.insert(ts.date(), candle.trade_price);
                if oldest.is_none_or(|o| ts < o) {
                    oldest = Some(ts);
                }
            }

            let Some(oldest_ts) = oldest else {
                break;
            };

            // 다음 루프 포인터를 가장 오래된 캔들 직전 시각으로 이동
            to_ptr = oldest_ts - ChronoDuration::minutes(1);

            // 수집한 가장 오래된 날짜가 시작일 이전이면 중단
            if oldest_ts.date() <= range.start {
                break;
            }
            tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;
        }

        let result: Vec<DailyClose> = rows
            .into_iter()
            .filter(|(date, _)| range.contains(*date))
            .map(|(date, close)| DailyClose { date, close })
            .collect();

        debug!(
            market = %market,
            range = %range,
            count = result.len(),
            "Upbit 일봉 수집 완료"
        );

        Ok(result)
    }
}
