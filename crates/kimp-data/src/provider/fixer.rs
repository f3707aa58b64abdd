//! Fixer API 환율 어댑터 (1차 소스).
//!
//! Free 플랜은 EUR 고정 기준이라 USD/KRW를 교차 환율로 계산합니다:
//! `USD/KRW = KRW_per_EUR / USD_per_EUR`.
//!
//! 날짜별로 조회하며, API가 요청일과 다른 기준일을 보고하면 (공휴일 등)
//! 해당 값은 `is_filled`로 표시합니다. 키가 없거나 특정 날짜 조회가
//! 실패하면 그 날짜는 결과에서 빠질 뿐 전체 조회가 실패하지 않습니다.

use async_trait::async_trait;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

use crate::provider::{FxQuote, FxRateSource};
use crate::{DataError, Result};
use kimp_core::DateRange;

/// Fixer 클라이언트 설정.
#[derive(Clone)]
pub struct FixerConfig {
    /// API 키 (없으면 소스 전체를 건너뜀)
    pub api_key: Option<String>,
    /// API 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 날짜별 호출 사이 대기 시간 (밀리초)
    pub request_delay_ms: u64,
}

impl Default for FixerConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("FIXER_API_KEY").ok(),
            base_url: "https://data.fixer.io/api".to_string(),
            timeout_secs: 10,
            request_delay_ms: 100,
        }
    }
}

impl std::fmt::Debug for FixerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixerConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("request_delay_ms", &self.request_delay_ms)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct FixerResponse {
    success: bool,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    rates: HashMap<String, Decimal>,
}

/// Fixer 기반 환율 소스.
pub struct FixerFxSource {
    config: FixerConfig,
    client: Client,
}

impl FixerFxSource {
    /// 새 소스 생성.
    pub fn new(config: FixerConfig) -> Result<Self> {
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

    /// 특정 날짜의 USD/KRW 조회. 실패 시 `None`.
    async fn fetch_for_date(&self, date: chrono::NaiveDate, api_key: &str) -> Option<FxQuote> {
        let date_str = date.format("%Y-%m-%d").to_string();
        let url = format!(
            "{}/{}?access_key={}&symbols=USD,KRW",
            self.config.base_url, date_str, api_key
        );

        let response = match self.client.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(date = %date_str, error = %e, "Fixer 요청 실패");
                return None;
            }
        };

        let payload: FixerResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!(date = %date_str, error = %e, "Fixer 응답 파싱 실패");
                return None;
            }
        };

        if !payload.success {
            return None;
        }

        let usd = *payload.rates.get("USD")?;
        let krw = *payload.rates.get("KRW")?;
        if usd <= Decimal::ZERO || krw <= Decimal::ZERO {
            return None;
        }

        let rate = krw.checked_div(usd)?;
        // 요청일과 API가 보고한 기준일이 다르면 채워진 값으로 간주
        let is_filled = payload.date.as_deref().is_some_and(|d| d != date_str);

        Some(FxQuote {
            date,
            rate,
            is_filled,
        })
    }
}

#[async_trait]
impl FxRateSource for FixerFxSource {
    async fn fetch_fx_range(&self, range: DateRange) -> Result<Vec<FxQuote>> {
        let Some(api_key) = self.config.api_key.clone() else {
            debug!("Fixer API 키 없음, 1차 환율 소스 건너뜀");
            return Ok(Vec::new());
        };

        let mut quotes = Vec::new();
        for date in range.iter_days() {
            if let Some(quote) = self.fetch_for_date(date, &api_key).await {
                quotes.push(quote);
            }
            tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;
        }

        debug!(range = %range, count = quotes.len(), "Fixer 환율 수집 완료");
        Ok(quotes)
    }
}
