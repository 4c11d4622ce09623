//! 인메모리 저장소
//!
//! 테스트와 `MK_STORAGE_URL=memory` 용도입니다. 프로세스 종료 시 내용이 사라집니다.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use super::{ensure_id, matches, Filter, Record, Storage};
use crate::error::{Error, Result};

/// 컬렉션별 레코드 목록
#[derive(Debug, Default)]
pub struct MemoryStorage {
    collections: RwLock<HashMap<String, Vec<Record>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// 컬렉션 레코드 수 (테스트용)
    pub fn count(&self, collection: &str) -> Result<usize> {
        let guard = self.collections.read().map_err(poisoned)?;
        Ok(guard.get(collection).map_or(0, Vec::len))
    }
}

fn poisoned<T>(_: T) -> Error {
    Error::storage("memory storage lock poisoned")
}

#[async_trait]
impl Storage for MemoryStorage {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Record>> {
        let guard = self.collections.read().map_err(poisoned)?;
        Ok(guard
            .get(collection)
            .and_then(|rows| rows.iter().find(|row| matches(row, filter)))
            .cloned())
    }

    async fn find_all(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>> {
        let guard = self.collections.read().map_err(poisoned)?;
        Ok(guard
            .get(collection)
            .map(|rows| {
                rows.iter()
                    .filter(|row| matches(row, filter))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn insert_one(&self, collection: &str, mut values: Record) -> Result<Record> {
        ensure_id(&mut values);

        let mut guard = self.collections.write().map_err(poisoned)?;
        guard
            .entry(collection.to_string())
            .or_default()
            .push(values.clone());
        Ok(values)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        values: Record,
    ) -> Result<Option<Record>> {
        let mut guard = self.collections.write().map_err(poisoned)?;
        let Some(row) = guard
            .get_mut(collection)
            .and_then(|rows| rows.iter_mut().find(|row| matches(row, filter)))
        else {
            return Ok(None);
        };

        for (key, value) in values {
            row.insert(key, value);
        }
        Ok(Some(row.clone()))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<bool> {
        let mut guard = self.collections.write().map_err(poisoned)?;
        let Some(rows) = guard.get_mut(collection) else {
            return Ok(false);
        };

        match rows.iter().position(|row| matches(row, filter)) {
            Some(index) => {
                rows.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
