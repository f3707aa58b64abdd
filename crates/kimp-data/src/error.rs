//! 데이터 파이프라인 오류 타입.

use thiserror::Error;

/// 데이터 관련 오류.
#[derive(Debug, Error)]
pub enum DataError {
    /// 입력 검증 오류 (지원하지 않는 심볼, 역전된 날짜 범위)
    #[error(transparent)]
    Validation(#[from] kimp_core::CoreError),

    /// 네트워크/연결 오류
    #[error("Network error: {0}")]
    NetworkError(String),

    /// 업스트림 API 오류
    #[error("API error ({source_name}): {message}")]
    ApiError { source_name: String, message: String },

    /// 파싱/역직렬화 오류
    #[error("Parse error: {0}")]
    ParseError(String),

    /// 저장소 I/O 오류
    #[error("Store error: {0}")]
    StoreError(String),

    /// 직렬화 오류
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<std::io::Error> for DataError {
    fn from(err: std::io::Error) -> Self {
        DataError::StoreError(err.to_string())
    }
}

impl From<csv::Error> for DataError {
    fn from(err: csv::Error) -> Self {
        DataError::SerializationError(err.to_string())
    }
}

impl From<reqwest::Error> for DataError {
    fn from(err: reqwest::Error) -> Self {
        DataError::NetworkError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, DataError>;
