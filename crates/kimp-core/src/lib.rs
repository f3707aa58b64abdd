//! # Kimp Core
//!
//! 김치 프리미엄 파이프라인의 핵심 도메인 모델 및 타입을 제공합니다.
//!
//! 이 크레이트는 시스템 전반에서 사용되는 기본 타입을 제공합니다:
//! - 지원 자산 정의 (고정 허용 목록)
//! - 일별 데이터셋 레코드
//! - 날짜 범위 타입
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
