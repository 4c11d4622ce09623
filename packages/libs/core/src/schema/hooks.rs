//! 내장 훅
//!
//! 설정 파일의 `hooks` 섹션에서 이름으로 참조할 수 있는 훅입니다.
//!
//! - `timestamps`: create 시 `created_at`, `updated_at` / update 시 `updated_at` 설정
//! - `trim`: 모든 문자열 값의 앞뒤 공백 제거

use std::sync::Arc;

use serde_json::Value;

use super::field::now_string;
use super::model::Hook;
use super::ops::Operation;
use crate::storage::Record;

/// 생성 시각 필드
pub const CREATED_AT: &str = "created_at";

/// 수정 시각 필드
pub const UPDATED_AT: &str = "updated_at";

/// 내장 훅 이름 목록
pub const BUILTIN_HOOKS: &[&str] = &["timestamps", "trim"];

/// 이름과 작업으로 내장 훅 조회
pub fn builtin(name: &str, op: Operation) -> Option<Hook> {
    let hook = match (name, op) {
        ("timestamps", Operation::Create) => Hook::new(
            name,
            Arc::new(|mut values: Record| {
                let now = Value::String(now_string());
                values.insert(CREATED_AT.to_string(), now.clone());
                values.insert(UPDATED_AT.to_string(), now);
                values
            }),
        ),
        ("timestamps", Operation::Update) => Hook::new(
            name,
            Arc::new(|mut values: Record| {
                values.insert(UPDATED_AT.to_string(), Value::String(now_string()));
                values
            }),
        ),
        ("trim", Operation::Create | Operation::Update) => Hook::new(
            name,
            Arc::new(|values: Record| {
                values
                    .into_iter()
                    .map(|(k, v)| match v {
                        Value::String(s) => (k, Value::String(s.trim().to_string())),
                        other => (k, other),
                    })
                    .collect()
            }),
        ),
        _ => return None,
    };

    Some(hook)
}
