//! 모델 정의
//!
//! 리소스 타입 하나의 레이블, 저장소 이름, 필드 목록, 작업별 훅을 정의합니다.
//! ModelSpec은 시작 시 한 번 만들어지고 프로세스 수명 동안 변경되지 않습니다.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::field::FieldSpec;
use super::ops::Operation;
use crate::storage::Record;

/// 훅 함수 (값 맵 → 값 맵)
pub type HookFn = Arc<dyn Fn(Record) -> Record + Send + Sync>;

/// `before` 변환 훅
#[derive(Clone)]
pub struct Hook {
    /// 훅 이름 (로그/진단용)
    pub name: String,

    func: HookFn,
}

impl Hook {
    /// 새 훅 생성
    pub fn new(name: impl Into<String>, func: HookFn) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }

    /// 훅 실행
    pub fn run(&self, values: Record) -> Record {
        (self.func)(values)
    }
}

impl fmt::Debug for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hook").field("name", &self.name).finish()
    }
}

/// 작업별 훅 목록
///
/// 쓰기 작업(create/update)에만 훅이 있습니다.
#[derive(Debug, Clone, Default)]
pub struct HookSet {
    pub create: Vec<Hook>,
    pub update: Vec<Hook>,
}

impl HookSet {
    /// 작업별 훅 목록 조회
    pub fn for_operation(&self, op: Operation) -> &[Hook] {
        match op {
            Operation::Create => &self.create,
            Operation::Update => &self.update,
            Operation::Read | Operation::Delete => &[],
        }
    }

    /// 훅 추가 (create/update 외에는 false)
    pub fn push(&mut self, op: Operation, hook: Hook) -> bool {
        match op {
            Operation::Create => self.create.push(hook),
            Operation::Update => self.update.push(hook),
            Operation::Read | Operation::Delete => return false,
        }
        true
    }
}

/// 모델 레이블 (단수/복수)
///
/// 단수형 소문자 레이블은 권한 표현식에서 바인딩된 리소스의 이름이 됩니다 (`@user._id`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    pub singular: String,
    pub plural: String,
}

impl Label {
    /// 단수/복수 지정
    pub fn new(singular: impl Into<String>, plural: impl Into<String>) -> Self {
        Self {
            singular: singular.into(),
            plural: plural.into(),
        }
    }

    /// 단수형만 지정 (복수형은 `s` 접미사)
    pub fn from_singular(singular: &str) -> Self {
        let singular = singular.to_lowercase();
        let plural = pluralize(&singular);
        Self { singular, plural }
    }

    /// 모델 이름에서 유도 (`Users` → user/users)
    pub fn from_model_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        match lower.strip_suffix('s') {
            Some(stem) if !stem.is_empty() && !stem.ends_with('s') => Self {
                singular: stem.to_string(),
                plural: lower,
            },
            _ => Self::from_singular(&lower),
        }
    }
}

fn pluralize(singular: &str) -> String {
    if singular.ends_with('s') {
        format!("{}es", singular)
    } else {
        format!("{}s", singular)
    }
}

/// 모델 정의
#[derive(Debug, Clone)]
pub struct ModelSpec {
    /// 모델 이름 (설정 키, 예: `Users`)
    pub name: String,

    /// 레이블
    pub label: Label,

    /// 저장소 컬렉션/테이블 이름
    pub storage_name: String,

    /// 필드 (삽입 순서 = 기본 출력 순서)
    pub fields: IndexMap<String, FieldSpec>,

    /// 소유자 필드 (행 단위 소유권)
    pub owner: Option<String>,

    /// 작업별 훅
    pub hooks: HookSet,
}

impl ModelSpec {
    /// 필드 조회
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// 요청 컨텍스트에서 이 모델의 리소스가 바인딩되는 이름
    pub fn binding_name(&self) -> &str {
        &self.label.singular
    }

    /// 작업별 훅 실행
    ///
    /// 훅이 스키마에 없는 필드를 추가하면 저장 전에 제거합니다.
    pub fn apply_hooks(&self, op: Operation, values: Record) -> Record {
        let hooks = self.hooks.for_operation(op);
        if hooks.is_empty() {
            return values;
        }

        let mut values = values;
        for hook in hooks {
            values = hook.run(values);
        }

        values.retain(|name, _| self.fields.contains_key(name));
        values
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldType, OperationSet};
    use serde_json::Value;

    fn model_with_hook(hook: Hook) -> ModelSpec {
        let mut fields = IndexMap::new();
        for (name, ops) in [("_id", "rd"), ("email", "cru"), ("created_at", "r")] {
            let ty = if name == "_id" {
                FieldType::ObjectId
            } else {
                FieldType::String
            };
            fields.insert(
                name.to_string(),
                FieldSpec::new(name, ty, OperationSet::from_letters(ops).unwrap()),
            );
        }

        let mut hooks = HookSet::default();
        hooks.push(Operation::Create, hook);

        ModelSpec {
            name: "Users".to_string(),
            label: Label::from_model_name("Users"),
            storage_name: "users".to_string(),
            fields,
            owner: None,
            hooks,
        }
    }

    #[test]
    fn test_label_derivation() {
        assert_eq!(Label::from_model_name("Users"), Label::new("user", "users"));
        assert_eq!(Label::from_model_name("File"), Label::new("file", "files"));
        assert_eq!(Label::from_model_name("Address"), Label::new("address", "addresses"));
        assert_eq!(Label::from_singular("Post"), Label::new("post", "posts"));
    }

    #[test]
    fn test_hooks_only_for_writes() {
        let mut hooks = HookSet::default();
        let noop = Hook::new("noop", Arc::new(|v| v));
        assert!(hooks.push(Operation::Update, noop.clone()));
        assert!(!hooks.push(Operation::Read, noop));
        assert_eq!(hooks.for_operation(Operation::Update).len(), 1);
        assert!(hooks.for_operation(Operation::Delete).is_empty());
    }

    #[test]
    fn test_apply_hooks_drops_undeclared_fields() {
        let model = model_with_hook(Hook::new(
            "stamp",
            Arc::new(|mut values: Record| {
                values.insert("created_at".to_string(), Value::from("2024-01-01T00:00:00.000Z"));
                values.insert("is_admin".to_string(), Value::Bool(true));
                values
            }),
        ));

        let mut input = Record::new();
        input.insert("email".to_string(), Value::from("a@b.com"));

        let out = model.apply_hooks(Operation::Create, input);
        assert_eq!(out.get("email"), Some(&Value::from("a@b.com")));
        assert!(out.contains_key("created_at"));
        assert!(!out.contains_key("is_admin"));
    }
}
