//! BTC 도미넌스 엔드포인트.

use axum::extract::State;
use axum::Json;
use chrono::Utc;

use kimp_data::DominanceSnapshot;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /btc_dominance
pub async fn get_btc_dominance(
    State(state): State<AppState>,
) -> Result<Json<DominanceSnapshot>, ApiError> {
    let snapshot = state.dominance.get_btc_dominance(Utc::now()).await?;
    Ok(Json(snapshot))
}
