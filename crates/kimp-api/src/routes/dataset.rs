//! 일별 데이터셋 조회/다운로드 엔드포인트.

use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::Json;
use chrono::NaiveDate;
use serde::Deserialize;
use tracing::info;

use kimp_core::{Asset, DailyRecord, DateRange};

use crate::error::ApiError;
use crate::market_time::clamp_range;
use crate::state::AppState;

/// 데이터셋 조회 쿼리 파라미터.
#[derive(Debug, Deserialize)]
pub struct DatasetQuery {
    /// 시작 날짜 (YYYY-MM-DD)
    pub start: NaiveDate,
    /// 끝 날짜 (YYYY-MM-DD)
    pub end: NaiveDate,
    /// 심볼 (기본 BTC)
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

fn default_symbol() -> String {
    "BTC".to_string()
}

async fn build_slice(
    state: &AppState,
    query: &DatasetQuery,
) -> Result<(Asset, Vec<DailyRecord>), ApiError> {
    let asset: Asset = query.symbol.parse()?;
    let requested = DateRange::new(query.start, query.end)?;
    let range = clamp_range(asset, requested, chrono::Utc::now())?;

    info!(asset = %asset, requested = %requested, effective = %range, "데이터셋 요청");
    let records = state.manager.get_or_build(asset, range).await?;
    Ok((asset, records))
}

/// GET /dataset — 요청 범위의 일별 레코드를 JSON 배열로 반환.
pub async fn get_dataset(
    State(state): State<AppState>,
    Query(query): Query<DatasetQuery>,
) -> Result<Json<Vec<DailyRecord>>, ApiError> {
    let (_, records) = build_slice(&state, &query).await?;
    Ok(Json(records))
}

/// GET /download — 같은 범위를 CSV 파일로 내려받기.
pub async fn download_csv(
    State(state): State<AppState>,
    Query(query): Query<DatasetQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let (asset, records) = build_slice(&state, &query).await?;

    let mut writer = csv::Writer::from_writer(Vec::new());
    for record in &records {
        writer
            .serialize(record)
            .map_err(|e| ApiError::Internal(format!("CSV 직렬화 실패: {}", e)))?;
    }
    let body = writer
        .into_inner()
        .map_err(|e| ApiError::Internal(format!("CSV 버퍼 쓰기 실패: {}", e)))?;

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!(
                "attachment; filename=\"kimchi_premium_daily_{}.csv\"",
                asset.code()
            ),
        ),
    ];
    Ok((headers, body))
}
