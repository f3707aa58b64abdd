//! 데이터셋 영속화 계층.

mod csv;

pub use csv::CsvDatasetStore;

use async_trait::async_trait;

use crate::Result;
use kimp_core::{Asset, DailyRecord};

/// 심볼별 데이터셋 저장소 추상화.
#[async_trait]
pub trait DatasetStore: Send + Sync {
    /// 캐시된 데이터셋 로드. 파일이 없으면 `None`.
    async fn load(&self, asset: Asset) -> Result<Option<Vec<DailyRecord>>>;

    /// 데이터셋 전체를 저장합니다 (기존 파일 대체).
    async fn save(&self, asset: Asset, records: &[DailyRecord]) -> Result<()>;
}
