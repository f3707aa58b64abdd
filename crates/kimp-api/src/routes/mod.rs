//! API 라우트 구성.

pub mod backfill;
pub mod dataset;
pub mod dominance;
pub mod health;
pub mod realtime;

use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/dataset", get(dataset::get_dataset))
        .route("/download", get(dataset::download_csv))
        .route("/realtime/{symbol}", get(realtime::get_realtime))
        .route("/btc_dominance", get(dominance::get_btc_dominance))
        .route("/backfill/{symbol}", post(backfill::run_backfill))
}
