//! 김치 프리미엄 데이터셋 파이프라인.
//!
//! 이 crate는 다음을 제공합니다:
//! - 네 가지 독립 소스 어댑터 (Binance 선물, Upbit, USD/KRW 환율, 공포/탐욕 지수)
//! - 날짜 기준 inner join + forward fill로 데이터셋을 조립하는 빌더
//! - 심볼별 CSV 저장소와 증분 캐시 매니저 (앞/뒤/내부 결손 보정)
//! - BTC 도미넌스 일별 캐시 (CoinMarketCap 글로벌 지표)

pub mod builder;
pub mod dominance;
pub mod error;
pub mod manager;
pub mod provider;
pub mod store;

pub use error::{DataError, Result};

pub use builder::{DatasetBuilder, PremiumDatasetBuilder};
pub use dominance::{CmcConfig, CmcDominanceClient, DominanceCache, DominanceSnapshot};
pub use manager::{CacheConfig, CacheManager};
pub use store::{CsvDatasetStore, DatasetStore};

// 소스 어댑터 재내보내기
pub use provider::{
    BinanceFuturesClient, CompositeFxSource, DailyClose, FearGreedClient, FixerFxSource, FxQuote,
    FxRateSource, IntlPriceSource, LocalPriceSource, SentimentQuote, SentimentSource,
    SmbsFxScraper, UpbitClient,
};
