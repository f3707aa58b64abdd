//! 데이터 소스 어댑터 모듈.
//!
//! 네 계열의 독립 소스에서 일별 시계열을 가져오는 어댑터들을 정의합니다.
//!
//! ## 시장 가격
//! - `BinanceFuturesClient`: Binance USD-M 선물 일봉 종가 (앞으로 페이징)
//! - `UpbitClient`: Upbit KRW 마켓 일봉 종가 (뒤에서 과거로 페이징)
//!
//! ## 환율 (USD/KRW)
//! - `FixerFxSource`: Fixer API 1차 소스 (날짜별 조회)
//! - `SmbsFxScraper`: smbs.biz 폴백 스크래퍼
//! - `CompositeFxSource`: 1차 우선, 결손 구간만 폴백에 위임
//!
//! ## 심리 지표
//! - `FearGreedClient`: 공포/탐욕 지수 전체 히스토리 조회 + 재색인
//!
//! 모든 어댑터는 best-effort입니다: 업스트림이 빈 응답을 주면 빈 결과를
//! 반환하며, 소스 하나의 장애가 전체 빌드를 중단시키지 않습니다.

pub mod binance;
pub mod fixer;
pub mod fng;
pub mod fx;
pub mod smbs;
pub mod upbit;

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::Result;
use kimp_core::{Asset, DateRange};

pub use binance::{BinanceConfig, BinanceFuturesClient};
pub use fixer::{FixerConfig, FixerFxSource};
pub use fng::{FearGreedClient, FearGreedConfig};
pub use fx::CompositeFxSource;
pub use smbs::{SmbsConfig, SmbsFxScraper};
pub use upbit::{UpbitClient, UpbitConfig};

/// 일봉 종가 한 건.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailyClose {
    pub date: NaiveDate,
    pub close: Decimal,
}

/// 일별 환율 한 건.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FxQuote {
    pub date: NaiveDate,
    pub rate: Decimal,
    /// 관측값이 아닌 이전/기준일 값으로 채워졌는지 여부
    pub is_filled: bool,
}

/// 일별 심리 지수 한 건.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SentimentQuote {
    pub date: NaiveDate,
    pub value: i64,
    /// 관측값이 아닌 이전 값으로 채워졌는지 여부
    pub is_filled: bool,
}

/// 국제 USDT 일봉 종가 소스.
#[async_trait]
pub trait IntlPriceSource: Send + Sync {
    /// `[start, end]` 구간의 일봉 종가를 날짜 오름차순으로 반환합니다.
    ///
    /// 업스트림에 데이터가 없는 날짜는 결과에서 빠집니다 (오류 아님).
    async fn fetch_intl_daily(&self, asset: Asset, range: DateRange) -> Result<Vec<DailyClose>>;
}

/// 한국 거래소 KRW 일봉 종가 소스.
#[async_trait]
pub trait LocalPriceSource: Send + Sync {
    /// `[start, end]` 구간의 KRW 일봉 종가를 날짜 오름차순으로 반환합니다.
    async fn fetch_local_daily(&self, asset: Asset, range: DateRange) -> Result<Vec<DailyClose>>;
}

/// USD/KRW 일별 환율 소스.
#[async_trait]
pub trait FxRateSource: Send + Sync {
    /// `[start, end]` 구간의 환율을 날짜 오름차순으로 반환합니다.
    ///
    /// 완전한 커버리지를 보장하지 않습니다. 1차/폴백 모두 실패한 날짜는
    /// 결과에서 빠지며, 호출자는 부분 결과를 정상 복구 가능한 상태로
    /// 다뤄야 합니다.
    async fn fetch_fx_range(&self, range: DateRange) -> Result<Vec<FxQuote>>;
}

/// 일별 심리 지수 소스.
#[async_trait]
pub trait SentimentSource: Send + Sync {
    /// `[start, end]`의 모든 달력 날짜로 재색인된 지수를 반환합니다.
    ///
    /// 관측값이 없는 날짜는 이전 값으로 채워지고 `is_filled`가 켜집니다.
    /// 최초 관측 이전의 날짜는 결과에 포함되지 않습니다.
    async fn fetch_sentiment_range(&self, range: DateRange) -> Result<Vec<SentimentQuote>>;
}
