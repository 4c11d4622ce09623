//! SQLite 저장소
//!
//! 컬렉션마다 `(_id TEXT PRIMARY KEY, doc TEXT)` 테이블 하나를 두고 레코드를 JSON 문서로 보관합니다.
//! 필터는 `json_extract`로 비교합니다.

use std::str::FromStr;

use async_trait::async_trait;
use mk_core::id::ID_FIELD;
use mk_core::storage::{ensure_id, Filter, Record, Storage};
use mk_core::{Error, Result};
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

/// SQLite 저장소
#[derive(Debug, Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

fn storage_error(e: sqlx::Error) -> Error {
    Error::storage(e.to_string())
}

impl SqliteStorage {
    /// 연결 후 컬렉션 테이블 준비
    pub async fn connect(url: &str, collections: &[String]) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(storage_error)?
            .create_if_missing(true);

        // 인메모리 DB는 연결마다 별개이므로 연결 하나만 사용
        let max_connections = if url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .map_err(storage_error)?;

        let storage = Self { pool };
        for collection in collections {
            storage.ensure_collection(collection).await?;
        }
        Ok(storage)
    }

    async fn ensure_collection(&self, collection: &str) -> Result<()> {
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (_id TEXT PRIMARY KEY, doc TEXT NOT NULL)",
            table(collection)?
        );
        sqlx::query(&sql)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        tracing::debug!("Ensured collection table '{}'", collection);
        Ok(())
    }
}

/// 테이블 이름 (식별자만 허용, 따옴표 처리)
fn table(collection: &str) -> Result<String> {
    let valid = collection
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && collection
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(Error::storage(format!(
            "invalid collection name '{}'",
            collection
        )));
    }
    Ok(format!("\"{}\"", collection))
}

/// WHERE 절과 바인딩 값 (json path, json 값)
fn where_clause(filter: &Filter) -> (String, Vec<(String, String)>) {
    if filter.is_empty() {
        return ("1 = 1".to_string(), Vec::new());
    }

    let clause = vec!["json_extract(doc, ?) = json_extract(?, '$')"; filter.len()].join(" AND ");
    let binds = filter
        .iter()
        .map(|(key, value)| (format!("$.\"{}\"", key), value.to_string()))
        .collect();
    (clause, binds)
}

fn decode(row: &SqliteRow) -> Result<Record> {
    let doc: String = row.try_get("doc").map_err(storage_error)?;
    match serde_json::from_str(&doc) {
        Ok(Value::Object(record)) => Ok(record),
        Ok(_) => Err(Error::storage("stored document is not an object")),
        Err(e) => Err(Error::storage(format!("corrupt stored document: {}", e))),
    }
}

fn encode(record: &Record) -> Result<String> {
    serde_json::to_string(record).map_err(|e| Error::storage(e.to_string()))
}

fn record_id(record: &Record) -> Result<String> {
    record
        .get(ID_FIELD)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::storage("record has no string identifier"))
}

#[async_trait]
impl Storage for SqliteStorage {
    fn kind(&self) -> &'static str {
        "sqlite"
    }

    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Record>> {
        let (clause, binds) = where_clause(filter);
        let sql = format!(
            "SELECT doc FROM {} WHERE {} ORDER BY rowid LIMIT 1",
            table(collection)?,
            clause
        );

        let mut query = sqlx::query(&sql);
        for (path, value) in binds {
            query = query.bind(path).bind(value);
        }

        let row = query
            .fetch_optional(&self.pool)
            .await
            .map_err(storage_error)?;
        row.as_ref().map(decode).transpose()
    }

    async fn find_all(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>> {
        let (clause, binds) = where_clause(filter);
        let sql = format!(
            "SELECT doc FROM {} WHERE {} ORDER BY rowid",
            table(collection)?,
            clause
        );

        let mut query = sqlx::query(&sql);
        for (path, value) in binds {
            query = query.bind(path).bind(value);
        }

        let rows = query.fetch_all(&self.pool).await.map_err(storage_error)?;
        rows.iter().map(decode).collect()
    }

    async fn insert_one(&self, collection: &str, mut values: Record) -> Result<Record> {
        ensure_id(&mut values);
        let id = record_id(&values)?;

        let sql = format!("INSERT INTO {} (_id, doc) VALUES (?, ?)", table(collection)?);
        sqlx::query(&sql)
            .bind(id)
            .bind(encode(&values)?)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;

        Ok(values)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        values: Record,
    ) -> Result<Option<Record>> {
        let table = table(collection)?;
        let (clause, binds) = where_clause(filter);
        let select = format!(
            "SELECT doc FROM {} WHERE {} ORDER BY rowid LIMIT 1",
            table, clause
        );
        let update = format!("UPDATE {} SET doc = ? WHERE _id = ?", table);

        let mut tx = self.pool.begin().await.map_err(storage_error)?;

        let mut query = sqlx::query(&select);
        for (path, value) in binds {
            query = query.bind(path).bind(value);
        }
        let Some(row) = query.fetch_optional(&mut *tx).await.map_err(storage_error)? else {
            return Ok(None);
        };

        let mut record = decode(&row)?;
        for (key, value) in values {
            record.insert(key, value);
        }

        sqlx::query(&update)
            .bind(encode(&record)?)
            .bind(record_id(&record)?)
            .execute(&mut *tx)
            .await
            .map_err(storage_error)?;
        tx.commit().await.map_err(storage_error)?;

        Ok(Some(record))
    }

    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<bool> {
        let table = table(collection)?;
        let (clause, binds) = where_clause(filter);
        let sql = format!(
            "DELETE FROM {table} WHERE _id = (SELECT _id FROM {table} WHERE {clause} ORDER BY rowid LIMIT 1)"
        );

        let mut query = sqlx::query(&sql);
        for (path, value) in binds {
            query = query.bind(path).bind(value);
        }

        let result = query.execute(&self.pool).await.map_err(storage_error)?;
        Ok(result.rows_affected() > 0)
    }
}
