//! 김치 프리미엄 API 서버 라이브러리.
//!
//! Axum 기반 REST API로 일별 데이터셋 조회/다운로드, 실시간 스냅샷,
//! 백필 트리거 엔드포인트를 제공합니다.

pub mod error;
pub mod market_time;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiErrorResponse};
pub use state::AppState;
