//! 헬스 체크 endpoint.

use axum::Json;
use serde::{Deserialize, Serialize};

/// 헬스 체크 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// 서비스 상태
    pub status: String,
    /// API 버전
    pub version: String,
    /// 현재 시간 (ISO 8601)
    pub timestamp: String,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}
