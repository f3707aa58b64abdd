//! 심볼별 CSV 파일 저장소.
//!
//! `{data_dir}/kimchi_premium_daily_{심볼}.csv` 한 파일에 전체 시계열을
//! 보관합니다. 저장은 임시 파일에 쓴 뒤 원자적으로 교체하며, 교체가
//! 불가능한 파일시스템에서는 직접 쓰기로 폴백합니다.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::store::DatasetStore;
use crate::Result;
use kimp_core::{Asset, DailyRecord};

// DailyRecord 필드 순서와 일치해야 함
const CSV_COLUMNS: [&str; 8] = [
    "date",
    "intl_close",
    "local_close",
    "fx_rate",
    "fx_is_filled",
    "sentiment",
    "sentiment_is_filled",
    "premium_pct",
];

/// CSV 기반 데이터셋 저장소.
pub struct CsvDatasetStore {
    data_dir: PathBuf,
}

impl CsvDatasetStore {
    /// 지정 디렉토리를 사용하는 저장소 생성. 디렉토리는 저장 시 생성됩니다.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// 심볼별 캐시 파일 경로.
    pub fn file_path(&self, asset: Asset) -> PathBuf {
        self.data_dir
            .join(format!("kimchi_premium_daily_{}.csv", asset.code()))
    }

    fn read_records(path: &Path) -> Result<Vec<DailyRecord>> {
        let mut reader = csv::Reader::from_path(path)?;
        let mut records = Vec::new();
        for row in reader.deserialize() {
            let record: DailyRecord = row?;
            records.push(record);
        }

        // 날짜 정렬 후 중복 제거 (나중 행 우선)
        records.sort_by_key(|r| r.date);
        records.reverse();
        records.dedup_by_key(|r| r.date);
        records.reverse();
        Ok(records)
    }

    fn write_records(path: &Path, records: &[DailyRecord]) -> Result<()> {
        let mut writer = csv::Writer::from_path(path)?;
        if records.is_empty() {
            // serialize가 없으면 헤더가 생략되므로 직접 기록
            writer.write_record(CSV_COLUMNS)?;
        }
        for record in records {
            writer.serialize(record)?;
        }
        writer.flush()?;
        Ok(())
    }
}

#[async_trait]
impl DatasetStore for CsvDatasetStore {
    async fn load(&self, asset: Asset) -> Result<Option<Vec<DailyRecord>>> {
        let path = self.file_path(asset);
        if !path.exists() {
            return Ok(None);
        }
        let records = Self::read_records(&path)?;
        debug!(asset = %asset, rows = records.len(), path = %path.display(), "캐시 로드");
        Ok(Some(records))
    }

    async fn save(&self, asset: Asset, records: &[DailyRecord]) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let path = self.file_path(asset);
        let tmp_path = path.with_extension("csv.tmp");

        Self::write_records(&tmp_path, records)?;
        if let Err(e) = std::fs::rename(&tmp_path, &path) {
            // 원자적 교체 불가 시 직접 쓰기로 폴백
            warn!(path = %path.display(), error = %e, "원자적 교체 실패, 직접 쓰기로 저장");
            let _ = std::fs::remove_file(&tmp_path);
            Self::write_records(&path, records)?;
        }

        debug!(asset = %asset, rows = records.len(), path = %path.display(), "캐시 저장");
        Ok(())
    }
}
