//! 설정 관리.
//!
//! 이 모듈은 애플리케이션 설정을 정의하고 관리합니다.
//! 전역 싱글톤 대신 명시적인 설정 값을 파이프라인 구성 요소에 전달합니다.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
    /// 파이프라인 설정
    pub pipeline: PipelineConfig,
    /// 환율 소스 설정
    pub fx: FxConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

/// 파이프라인 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// 심볼별 CSV 캐시 디렉토리
    pub data_dir: String,
    /// 최근 재확인 윈도우 (일) - 캐시 여부와 무관하게 항상 다시 빌드
    pub recency_window_days: i64,
    /// 내부 결손 보정 상한 (일) - 이보다 긴 결손은 정상 공백으로 간주
    pub internal_gap_max_days: i64,
    /// 업스트림 페이지 호출 사이 대기 시간 (밀리초)
    pub request_delay_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            recency_window_days: 3,
            internal_gap_max_days: 7,
            request_delay_ms: 200,
        }
    }
}

/// 환율 소스 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FxConfig {
    /// Fixer API 키 (없으면 1차 소스 건너뜀)
    pub fixer_api_key: Option<String>,
    /// 개별 환율 조회 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for FxConfig {
    fn default() -> Self {
        Self {
            fixer_api_key: None,
            timeout_secs: 10,
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            // 파일에서 로드
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("KIMP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, config::ConfigError> {
        Self::load("config/default.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.pipeline.recency_window_days, 3);
        assert_eq!(config.pipeline.internal_gap_max_days, 7);
        assert!(config.fx.fixer_api_key.is_none());
    }
}
