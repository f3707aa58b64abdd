//! 김치 프리미엄 API 서버.
//!
//! Axum 기반 REST API 서버를 시작합니다.
//! 일별 데이터셋 조회/다운로드, 실시간 스냅샷, 백필 엔드포인트를 제공합니다.

use std::net::SocketAddr;
use std::time::Duration;

use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use kimp_api::routes::create_api_router;
use kimp_api::AppState;
use kimp_core::{init_logging, AppConfig, LogConfig, LogFormat};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // .env 파일 로드 (없어도 무방)
    dotenvy::dotenv().ok();

    let config = AppConfig::load_default()?;

    let format: LogFormat = config.logging.format.parse().unwrap_or_default();
    init_logging(LogConfig::new(&config.logging.level).with_format(format))?;

    let state = AppState::from_config(&config)?;

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_api_router()
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(300)))
        .layer(cors)
        .with_state(state);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!(%addr, "API 서버 시작");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
