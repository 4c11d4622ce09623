//! 저장소 인터페이스
//!
//! 엔진은 컬렉션 이름과 동등 조건 필터만으로 저장소를 호출합니다.
//! 조인이나 복합 쿼리는 없고, 요청 하나는 쓰기 호출을 최대 한 번 합니다.

mod memory;

pub use memory::MemoryStorage;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::id::{ObjectId, ID_FIELD};

/// 저장 레코드 (필드 이름 → 값)
pub type Record = Map<String, Value>;

/// 동등 조건 필터 (모든 키가 일치해야 함)
pub type Filter = Map<String, Value>;

/// 저장소 드라이버
///
/// 각 메서드는 저장소 호출 한 번에 대응합니다. 엔진은 실패한 호출을 재시도하지 않습니다.
#[async_trait]
pub trait Storage: Send + Sync {
    /// 드라이버 이름 (로그용)
    fn kind(&self) -> &'static str;

    /// 조건에 맞는 첫 레코드
    async fn find_one(&self, collection: &str, filter: &Filter) -> Result<Option<Record>>;

    /// 조건에 맞는 모든 레코드 (삽입 순서)
    async fn find_all(&self, collection: &str, filter: &Filter) -> Result<Vec<Record>>;

    /// 레코드 삽입
    ///
    /// `_id`가 없으면 저장소가 새 ObjectId를 부여합니다. 저장된 레코드를 반환합니다.
    async fn insert_one(&self, collection: &str, values: Record) -> Result<Record>;

    /// 조건에 맞는 첫 레코드에 값을 덮어씀
    ///
    /// 대상이 없으면 `None`입니다.
    async fn update_one(
        &self,
        collection: &str,
        filter: &Filter,
        values: Record,
    ) -> Result<Option<Record>>;

    /// 조건에 맞는 첫 레코드 삭제 (삭제했으면 true)
    async fn delete_one(&self, collection: &str, filter: &Filter) -> Result<bool>;
}

/// 필터 일치 여부
pub fn matches(record: &Record, filter: &Filter) -> bool {
    filter
        .iter()
        .all(|(key, expected)| record.get(key) == Some(expected))
}

/// 필터 생성 헬퍼
pub fn filter_eq(field: impl Into<String>, value: Value) -> Filter {
    let mut filter = Filter::new();
    filter.insert(field.into(), value);
    filter
}

/// 식별자가 없으면 부여
pub fn ensure_id(values: &mut Record) {
    if !values.get(ID_FIELD).is_some_and(|v| v.is_string()) {
        values.insert(ID_FIELD.to_string(), Value::String(ObjectId::new().to_hex()));
    }
}
