//! BTC 도미넌스 일별 캐시.
//!
//! CoinMarketCap 글로벌 지표에서 BTC 도미넌스를 조회하고
//! `{data_dir}/btc_dominance.csv`에 일자(KST)별 추가 전용으로 보관합니다.
//! 최근 1시간 내 갱신된 오늘 자 레코드가 있으면 API 호출을 생략하고,
//! API 장애 시에는 직전 값으로 대체합니다.

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, warn};

use crate::{DataError, Result};

/// 오늘 레코드가 이미 있을 때 재조회를 생략하는 최소 간격 (초).
const REFRESH_MIN_SECS: i64 = 3600;

/// CoinMarketCap 클라이언트 설정.
#[derive(Clone)]
pub struct CmcConfig {
    /// API 키 (없으면 조회 실패)
    pub api_key: Option<String>,
    /// API 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for CmcConfig {
    fn default() -> Self {
        Self {
            api_key: std::env::var("CMC_API_KEY").ok(),
            base_url: "https://pro-api.coinmarketcap.com".to_string(),
            timeout_secs: 15,
        }
    }
}

impl std::fmt::Debug for CmcConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CmcConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "***REDACTED***"))
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CmcGlobalResponse {
    #[serde(default)]
    data: Option<CmcGlobalData>,
    #[serde(default)]
    status: Option<CmcStatus>,
}

#[derive(Debug, Deserialize)]
struct CmcGlobalData {
    btc_dominance: f64,
}

#[derive(Debug, Deserialize)]
struct CmcStatus {
    #[serde(default)]
    timestamp: Option<String>,
}

/// CoinMarketCap 글로벌 지표 클라이언트.
pub struct CmcDominanceClient {
    config: CmcConfig,
    client: Client,
}

impl CmcDominanceClient {
    /// 새 클라이언트 생성.
    pub fn new(config: CmcConfig) -> Result<Self> {
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

    /// 최신 BTC 도미넌스와 보고 시각 조회.
    pub async fn fetch_latest(&self) -> Result<(f64, String)> {
        let Some(api_key) = self.config.api_key.as_deref() else {
            return Err(DataError::ApiError {
                source_name: "CoinMarketCap".to_string(),
                message: "CMC_API_KEY 환경 변수가 설정되지 않았습니다".to_string(),
            });
        };

        let url = format!("{}/v1/global-metrics/quotes/latest", self.config.base_url);
        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .header("X-CMC_PRO_API_KEY", api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(DataError::ApiError {
                source_name: "CoinMarketCap".to_string(),
                message: format!("HTTP {}", response.status()),
            });
        }

        let payload: CmcGlobalResponse = response.json().await?;
        let dominance = payload
            .data
            .map(|d| d.btc_dominance)
            .ok_or_else(|| DataError::ParseError("btc_dominance 필드 누락".to_string()))?;
        let timestamp = payload
            .status
            .and_then(|s| s.timestamp)
            .unwrap_or_else(|| Utc::now().to_rfc3339());

        Ok((dominance, timestamp))
    }
}

/// 도미넌스 스냅샷 응답.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominanceSnapshot {
    /// BTC 도미넌스 (%)
    pub btc_dominance: f64,
    /// 최종 갱신 시각 (ISO 8601)
    pub last_updated: String,
    /// 값의 기준일 (KST)
    pub date: NaiveDate,
}

#[derive(Debug, Serialize, Deserialize)]
struct DominanceRow {
    date: NaiveDate,
    btc_dominance: f64,
}

/// 일자별 추가 전용 도미넌스 캐시.
pub struct DominanceCache {
    client: CmcDominanceClient,
    data_dir: PathBuf,
}

impl DominanceCache {
    pub fn new(client: CmcDominanceClient, data_dir: impl Into<PathBuf>) -> Self {
        Self {
            client,
            data_dir: data_dir.into(),
        }
    }

    fn csv_path(&self) -> PathBuf {
        self.data_dir.join("btc_dominance.csv")
    }

    fn marker_path(&self) -> PathBuf {
        self.data_dir.join("btc_dominance.last")
    }

    fn read_rows(&self) -> Result<Vec<DominanceRow>> {
        let path = self.csv_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut reader = csv::Reader::from_path(&path)?;
        let mut rows = Vec::new();
        for row in reader.deserialize() {
            let row: DominanceRow = row?;
            rows.push(row);
        }
        Ok(rows)
    }

    fn append_row(&self, date: NaiveDate, value: f64) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let path = self.csv_path();
        let is_new = !path.exists();
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            writer.write_record(["date", "btc_dominance"])?;
        }
        writer.serialize(DominanceRow {
            date,
            btc_dominance: value,
        })?;
        writer.flush()?;
        Ok(())
    }

    /// 마지막 갱신 시각. 읽기/파싱 실패는 갱신 이력 없음으로 취급.
    fn last_refreshed_at(&self) -> Option<DateTime<Utc>> {
        let raw = std::fs::read_to_string(self.marker_path()).ok()?;
        DateTime::parse_from_rfc3339(raw.trim())
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
    }

    /// 현재 BTC 도미넌스 조회.
    ///
    /// 오늘(KST) 자 레코드가 있고 최근 1시간 내 갱신됐으면 캐시를 그대로
    /// 반환합니다. 오늘 레코드가 없으면 API를 호출해 추가하고, 호출이
    /// 실패하면 직전 레코드로 대체합니다.
    pub async fn get_btc_dominance(&self, now: DateTime<Utc>) -> Result<DominanceSnapshot> {
        let today = now.with_timezone(&chrono_tz::Asia::Seoul).date_naive();
        let rows = self.read_rows()?;
        let has_today = rows.iter().any(|r| r.date == today);

        if has_today {
            if let Some(refreshed) = self.last_refreshed_at() {
                if (now - refreshed).num_seconds() < REFRESH_MIN_SECS {
                    debug!(date = %today, "도미넌스 캐시 적중 (1시간 내 갱신)");
                    let last = rows.last().ok_or_else(|| {
                        DataError::StoreError("도미넌스 캐시가 비어 있음".to_string())
                    })?;
                    return Ok(DominanceSnapshot {
                        btc_dominance: last.btc_dominance,
                        last_updated: refreshed.to_rfc3339(),
                        date: last.date,
                    });
                }
            }
        }

        if !has_today {
            match self.client.fetch_latest().await {
                Ok((dominance, timestamp)) => {
                    self.append_row(today, dominance)?;
                    if let Err(e) = std::fs::write(self.marker_path(), &timestamp) {
                        warn!(error = %e, "도미넌스 갱신 시각 기록 실패");
                    }
                    return Ok(DominanceSnapshot {
                        btc_dominance: dominance,
                        last_updated: timestamp,
                        date: today,
                    });
                }
                Err(e) => {
                    // API 장애 시 직전 값으로 대체 (휴일/장마감 등)
                    if let Some(last) = rows.last() {
                        warn!(error = %e, fallback_date = %last.date, "도미넌스 조회 실패, 직전 값으로 대체");
                        return Ok(DominanceSnapshot {
                            btc_dominance: last.btc_dominance,
                            last_updated: now.to_rfc3339(),
                            date: last.date,
                        });
                    }
                    return Err(e);
                }
            }
        }

        // 오늘 데이터가 이미 있으면 그대로 반환
        let last = rows
            .last()
            .ok_or_else(|| DataError::StoreError("도미넌스 캐시가 비어 있음".to_string()))?;
        Ok(DominanceSnapshot {
            btc_dominance: last.btc_dominance,
            last_updated: now.to_rfc3339(),
            date: last.date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "kimp-dominance-{}-{}",
            tag,
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn cache_with(server_url: &str, tag: &str) -> DominanceCache {
        let client = CmcDominanceClient::new(CmcConfig {
            api_key: Some("test-key".to_string()),
            ..Default::default()
        })
        .unwrap()
        .with_base_url(server_url);
        DominanceCache::new(client, temp_dir(tag))
    }

    fn at_utc(s: &str) -> DateTime<Utc> {
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
            .unwrap()
            .and_utc()
    }

    #[tokio::test]
    async fn test_empty_cache_fetches_and_appends() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/global-metrics/quotes/latest")
            .match_header("X-CMC_PRO_API_KEY", "test-key")
            .with_status(200)
            .with_body(
                r#"{"data":{"btc_dominance":54.32},"status":{"timestamp":"2024-06-03T01:00:00.000Z"}}"#,
            )
            .create_async()
            .await;

        let cache = cache_with(&server.url(), "fetch");
        // UTC 01:30 = KST 10:30
        let snapshot = cache.get_btc_dominance(at_utc("2024-06-03 01:30:00")).await.unwrap();

        mock.assert_async().await;
        assert!((snapshot.btc_dominance - 54.32).abs() < 1e-9);
        assert_eq!(snapshot.date.to_string(), "2024-06-03");

        let content = std::fs::read_to_string(cache.csv_path()).unwrap();
        assert!(content.starts_with("date,btc_dominance"));
        assert!(content.contains("2024-06-03,54.32"));
    }

    #[tokio::test]
    async fn test_fresh_today_record_skips_api_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/global-metrics/quotes/latest")
            .expect(0)
            .create_async()
            .await;

        let cache = cache_with(&server.url(), "fresh");
        std::fs::create_dir_all(&cache.data_dir).unwrap();
        std::fs::write(cache.csv_path(), "date,btc_dominance\n2024-06-03,55.1\n").unwrap();
        std::fs::write(cache.marker_path(), "2024-06-03T01:00:00+00:00").unwrap();

        // 갱신 30분 뒤 재요청
        let snapshot = cache.get_btc_dominance(at_utc("2024-06-03 01:30:00")).await.unwrap();

        mock.assert_async().await;
        assert!((snapshot.btc_dominance - 55.1).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_api_failure_falls_back_to_last_row() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/global-metrics/quotes/latest")
            .with_status(500)
            .with_body("{}")
            .create_async()
            .await;

        let cache = cache_with(&server.url(), "fallback");
        std::fs::create_dir_all(&cache.data_dir).unwrap();
        std::fs::write(cache.csv_path(), "date,btc_dominance\n2024-06-02,53.7\n").unwrap();

        let snapshot = cache.get_btc_dominance(at_utc("2024-06-03 01:30:00")).await.unwrap();

        assert!((snapshot.btc_dominance - 53.7).abs() < 1e-9);
        assert_eq!(snapshot.date.to_string(), "2024-06-02");
    }

    #[tokio::test]
    async fn test_api_failure_with_empty_cache_is_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/v1/global-metrics/quotes/latest")
            .with_status(500)
            .with_body("{}")
            .create_async()
            .await;

        let cache = cache_with(&server.url(), "error");
        let result = cache.get_btc_dominance(at_utc("2024-06-03 01:30:00")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_stale_marker_with_today_record_serves_cache() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/global-metrics/quotes/latest")
            .expect(0)
            .create_async()
            .await;

        let cache = cache_with(&server.url(), "stale");
        std::fs::create_dir_all(&cache.data_dir).unwrap();
        std::fs::write(cache.csv_path(), "date,btc_dominance\n2024-06-03,55.1\n").unwrap();
        // 2시간 전 갱신: 스로틀 만료, 단 오늘 레코드가 있으므로 재조회 없이 반환
        std::fs::write(cache.marker_path(), "2024-06-02T23:30:00+00:00").unwrap();

        let snapshot = cache.get_btc_dominance(at_utc("2024-06-03 01:30:00")).await.unwrap();

        mock.assert_async().await;
        assert!((snapshot.btc_dominance - 55.1).abs() < 1e-9);
    }
}
