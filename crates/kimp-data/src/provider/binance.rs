//! Binance USD-M 선물 일봉 어댑터.
//!
//! `{BASE}USDT` 선물 마켓의 일봉 종가를 국제 기준 가격으로 사용합니다.
//! 캔들 API는 호출당 개수 제한이 있어 `start`에서 앞으로 페이징하며,
//! 마지막으로 받은 캔들의 날짜가 `end`에 도달하면 중단합니다.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::provider::{DailyClose, IntlPriceSource};
use crate::{DataError, Result};
use kimp_core::{Asset, DateRange};

/// Binance 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// REST API 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 호출당 최대 캔들 수
    pub page_limit: u32,
    /// 페이지 호출 사이 대기 시간 (밀리초)
    pub request_delay_ms: u64,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://fapi.binance.com".to_string(),
            timeout_secs: 30,
            page_limit: 1500,
            request_delay_ms: 200,
        }
    }
}

/// Binance 선물 일봉 응답 행.
#[derive(Debug, Deserialize)]
#[allow(dead_code)] // API 응답 필드 전체 매핑 (일부만 사용)
struct BinanceKline(
    i64,    // 0: Open time (ms)
    String, // 1: Open
    String, // 2: High
    String, // 3: Low
    String, // 4: Close
    String, // 5: Volume
    i64,    // 6: Close time (ms)
    String, // 7: Quote asset volume
    i64,    // 8: Number of trades
    String, // 9: Taker buy base asset volume
    String, // 10: Taker buy quote asset volume
    String, // 11: Ignore
);

/// 최신 체결가 응답.
#[derive(Debug, Deserialize)]
struct BinanceTicker {
    price: Decimal,
}

/// Binance USD-M 선물 클라이언트.
pub struct BinanceFuturesClient {
    config: BinanceConfig,
    client: Client,
}

impl BinanceFuturesClient {
    /// 새 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `DataError::NetworkError`를 반환합니다.
    pub fn new(config: BinanceConfig) -> Result<Self> {
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

    /// 캔들 한 페이지 조회.
    async fn fetch_page(&self, market: &str, since_ms: i64) -> Result<Vec<BinanceKline>> {
        let url = format!(
            "{}/fapi/v1/klines?symbol={}&interval=1d&startTime={}&limit={}",
            self.config.base_url, market, since_ms, self.config.page_limit
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
                source_name: "binance".to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        response
            .json::<Vec<BinanceKline>>()
            .await
            .map_err(|e| DataError::ParseError(format!("Binance 캔들 파싱 오류: {}", e)))
    }

    /// 선물 최신 체결가 조회 (실시간 스냅샷용).
    pub async fn fetch_latest_price(&self, asset: Asset) -> Result<Decimal> {
        let url = format!(
            "{}/fapi/v1/ticker/price?symbol={}",
            self.config.base_url,
            asset.binance_market()
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DataError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DataError::ApiError {
                source_name: "binance".to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let ticker: BinanceTicker = response
            .json()
            .await
            .map_err(|e| DataError::ParseError(format!("Binance 시세 파싱 오류: {}", e)))?;
        Ok(ticker.price)
    }
}

/// ms 타임스탬프를 UTC 달력 날짜로 변환.
fn ms_to_date(ms: i64) -> Option<NaiveDate> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|dt| dt.date_naive())
}

/// 날짜를 UTC 자정 ms 타임스탬프로 변환.
fn date_to_since_ms(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp_millis())
        .unwrap_or(0)
}

#[async_trait]
impl IntlPriceSource for BinanceFuturesClient {
    async fn fetch_intl_daily(&self, asset: Asset, range: DateRange) -> Result<Vec<DailyClose>> {
        let market = asset.binance_market();
        let mut since = date_to_since_ms(range.start);
        let mut rows: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();

        loop {
            let batch = self.fetch_page(&market, since).await?;
            if batch.is_empty() {
                break;
            }

            let last_ts = batch[batch.len() - 1].0;
            for kline in &batch {
                let Some(date) = ms_to_date(kline.0) else {
                    continue;
                };
                match kline.4.parse::<Decimal>() {
                    Ok(close) => {
                        // 날짜 기준 중복 제거, 나중 캔들이 우선
                        rows.insert(date, close);
                    }
                    Err(e) => {
                        warn!(market = %market, date = %date, error = %e, "종가 파싱 실패, 건너뜀");
                    }
                }
            }

            // 마지막 캔들이 요청 종료일에 도달하면 중단
            if ms_to_date(last_ts).is_some_and(|d| d >= range.end) {
                break;
            }
            since = last_ts + 1;
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
            "Binance 일봉 수집 완료"
        );

        Ok(result)
    }
}
