//! 모든 핸들러에서 공유되는 애플리케이션 상태.

use std::sync::Arc;

use kimp_core::AppConfig;
use kimp_data::provider::{FearGreedConfig, FixerConfig, SmbsConfig};
use kimp_data::{
    BinanceFuturesClient, CacheConfig, CacheManager, CmcConfig, CmcDominanceClient,
    CompositeFxSource, CsvDatasetStore, DominanceCache, FearGreedClient, FixerFxSource,
    PremiumDatasetBuilder, SmbsFxScraper, UpbitClient,
};

use crate::error::ApiError;

/// 설정값이 없으면 `FIXER_API_KEY` 환경 변수로 폴백.
fn fixer_api_key(configured: Option<&str>) -> Option<String> {
    configured
        .map(str::to_owned)
        .or_else(|| std::env::var("FIXER_API_KEY").ok())
}

/// 기본 소스 구성의 빌더 타입.
pub type DefaultBuilder = PremiumDatasetBuilder<
    BinanceFuturesClient,
    UpbitClient,
    CompositeFxSource<FixerFxSource, SmbsFxScraper>,
    FearGreedClient,
>;

/// 기본 구성의 캐시 관리자 타입.
pub type DefaultCacheManager = CacheManager<DefaultBuilder, CsvDatasetStore>;

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 증분 캐시 관리자 - 데이터셋 조회/백필의 단일 진입점
    pub manager: Arc<DefaultCacheManager>,

    /// 실시간 스냅샷용 Binance 클라이언트
    pub binance: Arc<BinanceFuturesClient>,

    /// 실시간 스냅샷용 Upbit 클라이언트
    pub upbit: Arc<UpbitClient>,

    /// 실시간 스냅샷의 환율 폴백 소스
    pub fx: Arc<CompositeFxSource<FixerFxSource, SmbsFxScraper>>,

    /// BTC 도미넌스 일별 캐시
    pub dominance: Arc<DominanceCache>,
}

impl AppState {
    /// 설정에서 전체 소스 스택과 캐시 관리자를 조립합니다.
    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        let binance_config = kimp_data::provider::BinanceConfig {
            request_delay_ms: config.pipeline.request_delay_ms,
            ..Default::default()
        };
        let upbit_config = kimp_data::provider::UpbitConfig {
            request_delay_ms: config.pipeline.request_delay_ms,
            ..Default::default()
        };
        let fixer_config = FixerConfig {
            api_key: fixer_api_key(config.fx.fixer_api_key.as_deref()),
            timeout_secs: config.fx.timeout_secs,
            ..Default::default()
        };
        let smbs_config = SmbsConfig {
            timeout_secs: config.fx.timeout_secs,
            ..Default::default()
        };

        let fx_source = || -> Result<_, ApiError> {
            Ok(CompositeFxSource::new(
                FixerFxSource::new(fixer_config.clone())?,
                SmbsFxScraper::new(smbs_config.clone())?,
            ))
        };

        let builder = PremiumDatasetBuilder::new(
            BinanceFuturesClient::new(binance_config.clone())?,
            UpbitClient::new(upbit_config.clone())?,
            fx_source()?,
            FearGreedClient::new(FearGreedConfig::default())?,
        );

        let store = CsvDatasetStore::new(config.pipeline.data_dir.clone());
        let dominance = DominanceCache::new(
            CmcDominanceClient::new(CmcConfig::default())?,
            config.pipeline.data_dir.clone(),
        );
        let cache_config = CacheConfig {
            recency_window_days: config.pipeline.recency_window_days,
            internal_gap_max_days: config.pipeline.internal_gap_max_days,
        };

        Ok(Self {
            manager: Arc::new(CacheManager::new(builder, store, cache_config)),
            binance: Arc::new(BinanceFuturesClient::new(binance_config)?),
            upbit: Arc::new(UpbitClient::new(upbit_config)?),
            fx: Arc::new(fx_source()?),
            dominance: Arc::new(dominance),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixer_key_prefers_config_then_env() {
        std::env::set_var("FIXER_API_KEY", "env-key");
        assert_eq!(fixer_api_key(Some("cfg-key")).as_deref(), Some("cfg-key"));
        assert_eq!(fixer_api_key(None).as_deref(), Some("env-key"));
        std::env::remove_var("FIXER_API_KEY");
        assert!(fixer_api_key(None).is_none());
    }
}
