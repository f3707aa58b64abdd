//! 도메인 타입 정의.

pub mod asset;
pub mod range;
pub mod record;

pub use asset::Asset;
pub use range::DateRange;
pub use record::{compute_premium_pct, DailyRecord};
