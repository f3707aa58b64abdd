//! 심볼 백필 엔드포인트.
//!
//! 상장 시작일부터 가용 마지막 날짜까지 전체 구간을 증분 캐시로
//! 보장합니다. 이미 캐시된 구간은 다시 생성하지 않습니다.

use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::info;

use kimp_core::{Asset, DateRange};

use crate::error::ApiError;
use crate::market_time::available_end;
use crate::state::AppState;

/// 백필 결과.
#[derive(Debug, Serialize)]
pub struct BackfillResponse {
    /// 대상 심볼
    pub symbol: String,
    /// 백필 시작 날짜
    pub start: String,
    /// 백필 끝 날짜
    pub end: String,
    /// 보장된 구간의 레코드 수
    pub rows: usize,
}

/// POST /backfill/{symbol}
pub async fn run_backfill(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<BackfillResponse>, ApiError> {
    let asset: Asset = symbol.parse()?;
    let range = DateRange::new(asset.listing_start(), available_end(Utc::now()))?;

    info!(asset = %asset, range = %range, "백필 시작");
    let records = state.manager.get_or_build(asset, range).await?;
    info!(asset = %asset, rows = records.len(), "백필 완료");

    Ok(Json(BackfillResponse {
        symbol: asset.code().to_string(),
        start: range.start.to_string(),
        end: range.end.to_string(),
        rows: records.len(),
    }))
}
