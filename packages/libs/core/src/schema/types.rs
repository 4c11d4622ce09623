//! 논리적 필드 타입 정의
//!
//! 설정 파일의 타입 태그(`String`, `ObjectId`, `Array<ObjectId>` 등)를 표현합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 논리적 필드 타입
///
/// # JSON 표현
///
/// - `Date`는 ISO 8601(RFC 3339) 문자열로 저장/전송됩니다.
/// - `ObjectId`는 24자 소문자 hex 문자열입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
    ObjectId,
    /// 요소 타입을 강제하지 않는 배열
    Array,
    /// ObjectId 배열
    ObjectIdArray,
}

impl FieldType {
    /// 타입 태그에서 파싱
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag.trim() {
            "String" | "string" => Some(FieldType::String),
            "Number" | "number" => Some(FieldType::Number),
            "Boolean" | "boolean" | "bool" => Some(FieldType::Boolean),
            "Date" | "date" => Some(FieldType::Date),
            "ObjectId" | "objectId" => Some(FieldType::ObjectId),
            "Array" | "array" => Some(FieldType::Array),
            "Array<ObjectId>" | "[ObjectId]" => Some(FieldType::ObjectIdArray),
            _ => None,
        }
    }

    /// 타입 태그 문자열
    pub fn tag(&self) -> &'static str {
        match self {
            FieldType::String => "String",
            FieldType::Number => "Number",
            FieldType::Boolean => "Boolean",
            FieldType::Date => "Date",
            FieldType::ObjectId => "ObjectId",
            FieldType::Array => "Array",
            FieldType::ObjectIdArray => "Array<ObjectId>",
        }
    }

    /// 식별자 타입인지 (비교 시 정규 문자열 형태 사용)
    pub fn is_identifier(&self) -> bool {
        matches!(self, FieldType::ObjectId)
    }

    /// 검증 에러 메시지용 예상 JSON 타입
    pub fn expected_json_type(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date string or epoch millis",
            FieldType::ObjectId => "24-character hex string",
            FieldType::Array => "array",
            FieldType::ObjectIdArray => "array of 24-character hex strings",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_parsing() {
        assert_eq!(FieldType::from_tag("String"), Some(FieldType::String));
        assert_eq!(FieldType::from_tag("ObjectId"), Some(FieldType::ObjectId));
        assert_eq!(
            FieldType::from_tag("Array<ObjectId>"),
            Some(FieldType::ObjectIdArray)
        );
        assert_eq!(FieldType::from_tag("bool"), Some(FieldType::Boolean));
        assert_eq!(FieldType::from_tag("Decimal"), None);
    }

    #[test]
    fn test_tag_is_stable() {
        for ty in [
            FieldType::String,
            FieldType::Number,
            FieldType::Boolean,
            FieldType::Date,
            FieldType::ObjectId,
            FieldType::Array,
            FieldType::ObjectIdArray,
        ] {
            assert_eq!(FieldType::from_tag(ty.tag()), Some(ty));
        }
    }
}
