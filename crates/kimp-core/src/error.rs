//! 핵심 도메인 오류 타입.

use thiserror::Error;

/// 입력 검증 오류.
///
/// 검증 오류는 즉시 반환되며 재시도나 부분 결과가 없습니다.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 지원하지 않는 자산 심볼
    #[error("Unsupported symbol: {0}")]
    UnsupportedSymbol(String),

    /// 시작일이 종료일보다 이후
    #[error("Invalid date range: start {start} is after end {end}")]
    InvalidDateRange {
        start: chrono::NaiveDate,
        end: chrono::NaiveDate,
    },

    /// 잘못된 날짜 형식
    #[error("Invalid date: {0}")]
    InvalidDate(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
