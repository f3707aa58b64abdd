//! 일별 데이터셋 레코드.

use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// 심볼별 시계열의 한 행 (달력 날짜당 하나).
///
/// 필드 순서는 저장 포맷의 컬럼 순서와 동일합니다:
/// `date, intl_close, local_close, fx_rate, fx_is_filled, sentiment,
/// sentiment_is_filled, premium_pct`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    /// 달력 날짜 (시간 성분 없음, 심볼 내 고유 키)
    pub date: NaiveDate,
    /// 국제 기준 가격 (USDT 일봉 종가)
    pub intl_close: Decimal,
    /// 한국 거래소 KRW 종가
    pub local_close: Decimal,
    /// 기준 통화 1단위당 원화 환율 (USD/KRW)
    pub fx_rate: Decimal,
    /// 환율이 관측값이 아닌 이전 값으로 채워졌는지 여부
    pub fx_is_filled: bool,
    /// 공포/탐욕 지수 (0-100)
    pub sentiment: i64,
    /// 지수가 이전 값으로 채워졌는지 여부
    pub sentiment_is_filled: bool,
    /// 파생 지표: `(local_close / (intl_close * fx_rate) - 1) * 100`
    pub premium_pct: f64,
}

impl DailyRecord {
    /// 나머지 수치 필드로부터 프리미엄을 다시 계산합니다.
    ///
    /// 분모가 0이면 `None`을 반환합니다.
    pub fn recompute_premium(&self) -> Option<f64> {
        compute_premium_pct(self.local_close, self.intl_close, self.fx_rate)
    }
}

/// 김치 프리미엄 계산: `(local / (intl * fx) - 1) * 100`.
///
/// 분모가 0이면 `None`을 반환합니다 (호출자가 이전 값으로 채움).
pub fn compute_premium_pct(local: Decimal, intl: Decimal, fx: Decimal) -> Option<f64> {
    let denom = intl * fx;
    let ratio = local.checked_div(denom)?;
    let pct = (ratio - Decimal::ONE) * Decimal::from(100);
    pct.to_f64()
}
