//! 실시간 프리미엄 스냅샷 엔드포인트.
//!
//! 두 거래소의 최신 체결가와 가장 최근 가용 환율로 현재 프리미엄을
//! 계산합니다. 환율은 캐시 마지막 값 → 최근 14일 재조회 → 고정 상수
//! 순으로 폴백하는 최선 노력 조회입니다.

use axum::extract::{Path, State};
use axum::Json;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::warn;

use kimp_core::{compute_premium_pct, Asset, DateRange};
use kimp_data::provider::FxRateSource;
use kimp_data::DatasetStore;

use crate::error::ApiError;
use crate::state::AppState;

/// 환율을 전혀 구할 수 없을 때의 비상 상수.
const FX_LAST_RESORT: i64 = 1300;

/// 실시간 스냅샷 응답.
#[derive(Debug, Serialize)]
pub struct RealtimeResponse {
    /// 스냅샷 시각 (UTC, ISO 8601)
    pub timestamp: String,
    /// Binance 선물 최신가 (USDT)
    pub binance_usdt: Decimal,
    /// Upbit 최신가 (KRW)
    pub upbit_krw: Decimal,
    /// 적용된 USD/KRW 환율
    pub usdkrw: Decimal,
    /// 현재 프리미엄 (%)
    pub kimchi_pct: f64,
}

/// 최근 환율 조회: 캐시 → 최근 14일 재조회 → 상수.
async fn latest_fx(state: &AppState, asset: Asset) -> Decimal {
    // 요청 심볼 캐시 우선, 없으면 다른 심볼 캐시라도 사용
    let mut candidates = vec![asset];
    candidates.extend(Asset::all().iter().copied().filter(|a| *a != asset));
    for candidate in candidates {
        if let Ok(Some(records)) = state.manager.store().load(candidate).await {
            if let Some(last) = records.last() {
                return last.fx_rate;
            }
        }
    }

    let today = Utc::now().date_naive();
    if let Ok(range) = DateRange::new(today - Duration::days(14), today) {
        match state.fx.fetch_fx_range(range).await {
            Ok(quotes) => {
                if let Some(last) = quotes.last() {
                    return last.rate;
                }
            }
            Err(e) => warn!(error = %e, "실시간 환율 재조회 실패"),
        }
    }

    warn!("환율 소스 전체 불가, 비상 상수 사용");
    Decimal::from(FX_LAST_RESORT)
}

/// GET /realtime/{symbol}
pub async fn get_realtime(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<RealtimeResponse>, ApiError> {
    let asset: Asset = symbol.parse()?;

    let (binance_usdt, upbit_krw) = tokio::join!(
        state.binance.fetch_latest_price(asset),
        state.upbit.fetch_latest_price(asset),
    );
    let binance_usdt = binance_usdt?;
    let upbit_krw = upbit_krw?;

    let usdkrw = latest_fx(&state, asset).await;
    let kimchi_pct = compute_premium_pct(upbit_krw, binance_usdt, usdkrw).unwrap_or(0.0);

    Ok(Json(RealtimeResponse {
        timestamp: Utc::now().to_rfc3339(),
        binance_usdt,
        upbit_krw,
        usdkrw,
        kimchi_pct,
    }))
}
