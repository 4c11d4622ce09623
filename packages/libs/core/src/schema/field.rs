//! 필드 정의
//!
//! 모델 속성 하나의 타입, 작업별 가시성, 기본값을 정의합니다.

use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use super::ops::{Operation, OperationSet};
use super::types::FieldType;
use crate::id::ObjectId;

/// 기본값 생성 함수 (인자 없음)
pub type GeneratorFn = Arc<dyn Fn() -> Value + Send + Sync>;

/// 필드 기본값
///
/// `create` 시 입력에서 필드가 빠진 경우에만 적용됩니다.
#[derive(Clone)]
pub enum DefaultValue {
    /// 고정 값 (시작 시 필드 타입으로 변환 완료)
    Literal(Value),

    /// `$now` - 현재 시각
    Now,

    /// `$objectId` - 새 ObjectId
    NewObjectId,

    /// 코드로 등록한 생성 함수
    Generator(GeneratorFn),
}

impl DefaultValue {
    /// 설정 문자열의 생성기 이름 파싱 (`$now`, `$objectId`)
    pub fn from_generator_name(name: &str) -> Option<Self> {
        match name {
            "$now" => Some(DefaultValue::Now),
            "$objectId" | "$object_id" => Some(DefaultValue::NewObjectId),
            _ => None,
        }
    }

    /// 기본값 생성
    pub fn produce(&self) -> Value {
        match self {
            DefaultValue::Literal(value) => value.clone(),
            DefaultValue::Now => Value::String(now_string()),
            DefaultValue::NewObjectId => Value::String(ObjectId::new().to_hex()),
            DefaultValue::Generator(f) => f(),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultValue::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            DefaultValue::Now => f.write_str("Now"),
            DefaultValue::NewObjectId => f.write_str("NewObjectId"),
            DefaultValue::Generator(_) => f.write_str("Generator(..)"),
        }
    }
}

/// 현재 시각의 정규 문자열 (RFC 3339, 밀리초, UTC)
pub fn now_string() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// 필드 정의
#[derive(Debug, Clone)]
pub struct FieldSpec {
    /// 필드 이름 (모델 내 유일)
    pub name: String,

    /// 필드 타입
    pub field_type: FieldType,

    /// 허용 작업
    pub operations: OperationSet,

    /// 기본값
    pub default: Option<DefaultValue>,
}

impl FieldSpec {
    /// 새 필드 정의
    pub fn new(name: impl Into<String>, field_type: FieldType, operations: OperationSet) -> Self {
        Self {
            name: name.into(),
            field_type,
            operations,
            default: None,
        }
    }

    /// 기본값 설정
    pub fn with_default(mut self, default: DefaultValue) -> Self {
        self.default = Some(default);
        self
    }

    /// 작업 허용 여부
    pub fn allows(&self, op: Operation) -> bool {
        self.operations.allows(op)
    }

    /// 응답에 노출되는 필드인지
    pub fn is_readable(&self) -> bool {
        self.allows(Operation::Read)
    }
}
