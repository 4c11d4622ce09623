//! 저장소 드라이버 선택

mod sqlite;

use std::sync::Arc;

use mk_core::storage::{MemoryStorage, Storage};

use crate::config::StorageUrl;

use sqlite::SqliteStorage;

/// 설정에 맞는 저장소 연결
pub async fn connect(url: &StorageUrl, collections: &[String]) -> anyhow::Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match url {
        StorageUrl::Memory => Arc::new(MemoryStorage::new()),
        StorageUrl::Sqlite(url) => Arc::new(SqliteStorage::connect(url, collections).await?),
    };

    tracing::info!(
        "Using {} storage ({} collections)",
        storage.kind(),
        collections.len()
    );
    Ok(storage)
}
