//! 서울외국환중개 고시 환율 스크레이퍼 (2차/폴백 소스).
//!
//! 날짜별 평문 응답(`USD=1,404.50|JPY=...` 형태)에서 USD 항목만 뽑아냅니다.
//! 주말/공휴일처럼 고시가 없는 날짜는 보류했다가 인접 영업일 값으로 채우고
//! `is_filled`로 표시합니다.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use rust_decimal::Decimal;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::provider::{FxQuote, FxRateSource};
use crate::{DataError, Result};
use kimp_core::DateRange;

/// 스크레이퍼 설정.
#[derive(Debug, Clone)]
pub struct SmbsConfig {
    /// 고시 환율 엔드포인트 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
    /// 날짜별 호출 사이 대기 시간 (밀리초)
    pub request_delay_ms: u64,
}

impl Default for SmbsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://www.smbs.biz".to_string(),
            timeout_secs: 10,
            request_delay_ms: 100,
        }
    }
}

/// smbs.biz 기반 환율 소스.
pub struct SmbsFxScraper {
    config: SmbsConfig,
    client: Client,
}

impl SmbsFxScraper {
    /// 새 스크레이퍼 생성.
    pub fn new(config: SmbsConfig) -> Result<Self> {
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

    /// 특정 날짜의 고시 USD/KRW 조회. 고시가 없으면 `None`.
    async fn fetch_for_date(&self, date: NaiveDate) -> Option<Decimal> {
        let url = format!(
            "{}/Flash/TodayExRate_flash.jsp?tr_date={}",
            self.config.base_url,
            date.format("%Y-%m-%d")
        );

        let body = match self.client.get(&url).send().await {
            Ok(r) => match r.text().await {
                Ok(t) => t,
                Err(e) => {
                    warn!(date = %date, error = %e, "고시 환율 응답 읽기 실패");
                    return None;
                }
            },
            Err(e) => {
                warn!(date = %date, error = %e, "고시 환율 요청 실패");
                return None;
            }
        };

        if body.contains("오류가 발생하였습니다") {
            return None;
        }

        parse_usd_rate(&body)
    }
}

/// 평문 응답에서 `USD=1,404.50` 패턴을 찾아 숫자로 변환.
fn parse_usd_rate(body: &str) -> Option<Decimal> {
    let start = body.find("USD=")? + 4;
    let raw: String = body[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit() || *c == ',' || *c == '.')
        .collect();
    let cleaned = raw.replace(',', "");
    if cleaned.is_empty() {
        return None;
    }
    Decimal::from_str(&cleaned).ok()
}

#[async_trait]
impl FxRateSource for SmbsFxScraper {
    async fn fetch_fx_range(&self, range: DateRange) -> Result<Vec<FxQuote>> {
        let mut quotes: Vec<FxQuote> = Vec::new();
        let mut pending: Vec<NaiveDate> = Vec::new();
        let mut last_rate: Option<Decimal> = None;

        for date in range.iter_days() {
            match self.fetch_for_date(date).await {
                Some(rate) => {
                    // 보류 중이던 비영업일은 인접 고시값으로 채움
                    for held in pending.drain(..) {
                        quotes.push(FxQuote {
                            date: held,
                            rate,
                            is_filled: true,
                        });
                    }
                    quotes.push(FxQuote {
                        date,
                        rate,
                        is_filled: false,
                    });
                    last_rate = Some(rate);
                }
                None => pending.push(date),
            }
            tokio::time::sleep(Duration::from_millis(self.config.request_delay_ms)).await;
        }

        // 범위 끝자락의 비영업일은 마지막 고시값으로 채움
        if let Some(rate) = last_rate {
            for held in pending.drain(..) {
                quotes.push(FxQuote {
                    date: held,
                    rate,
                    is_filled: true,
                });
            }
        }

        quotes.sort_by_key(|q| q.date);
        debug!(range = %range, count = quotes.len(), "고시 환율 수집 완료");
        Ok(quotes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_parse_usd_rate() {
        assert_eq!(
            parse_usd_rate("CNY=190.11|USD=1,404.50|JPY=915.32"),
            Some(dec!(1404.50))
        );
        assert_eq!(parse_usd_rate("JPY=915.32"), None);
        assert_eq!(parse_usd_rate("USD=|JPY=915.32"), None);
    }

    #[tokio::test]
    async fn test_weekend_fill_from_adjacent_quote() {
        let mut server = mockito::Server::new_async().await;
        // 금요일 고시, 주말 무고시, 월요일 고시
        let _fri = server
            .mock("GET", "/Flash/TodayExRate_flash.jsp")
            .match_query(mockito::Matcher::UrlEncoded(
                "tr_date".into(),
                "2024-01-05".into(),
            ))
            .with_body("USD=1,400.00|JPY=900.00")
            .create_async()
            .await;
        for weekend in ["2024-01-06", "2024-01-07"] {
            server
                .mock("GET", "/Flash/TodayExRate_flash.jsp")
                .match_query(mockito::Matcher::UrlEncoded(
                    "tr_date".into(),
                    weekend.into(),
                ))
                .with_body("오류가 발생하였습니다")
                .create_async()
                .await;
        }
        let _mon = server
            .mock("GET", "/Flash/TodayExRate_flash.jsp")
            .match_query(mockito::Matcher::UrlEncoded(
                "tr_date".into(),
                "2024-01-08".into(),
            ))
            .with_body("USD=1,410.00|JPY=905.00")
            .create_async()
            .await;

        let scraper = SmbsFxScraper::new(SmbsConfig {
            request_delay_ms: 0,
            ..Default::default()
        })
        .unwrap()
        .with_base_url(server.url());

        let range = DateRange::parse("2024-01-05", "2024-01-08").unwrap();
        let quotes = scraper.fetch_fx_range(range).await.unwrap();

        assert_eq!(quotes.len(), 4);
        assert!(!quotes[0].is_filled);
        assert_eq!(quotes[0].rate, dec!(1400.00));
        // 주말은 다음 영업일(월) 고시값으로 채워짐
        assert!(quotes[1].is_filled);
        assert_eq!(quotes[1].rate, dec!(1410.00));
        assert!(quotes[2].is_filled);
        assert!(!quotes[3].is_filled);
    }

    #[tokio::test]
    async fn test_trailing_pending_uses_last_rate() {
        let mut server = mockito::Server::new_async().await;
        let _m1 = server
            .mock("GET", "/Flash/TodayExRate_flash.jsp")
            .match_query(mockito::Matcher::UrlEncoded(
                "tr_date".into(),
                "2024-01-05".into(),
            ))
            .with_body("USD=1,400.00")
            .create_async()
            .await;
        let _m2 = server
            .mock("GET", "/Flash/TodayExRate_flash.jsp")
            .match_query(mockito::Matcher::UrlEncoded(
                "tr_date".into(),
                "2024-01-06".into(),
            ))
            .with_body("오류가 발생하였습니다")
            .create_async()
            .await;

        let scraper = SmbsFxScraper::new(SmbsConfig {
            request_delay_ms: 0,
            ..Default::default()
        })
        .unwrap()
        .with_base_url(server.url());

        let range = DateRange::parse("2024-01-05", "2024-01-06").unwrap();
        let quotes = scraper.fetch_fx_range(range).await.unwrap();

        assert_eq!(quotes.len(), 2);
        assert!(quotes[1].is_filled);
        assert_eq!(quotes[1].rate, dec!(1400.00));
    }
}
