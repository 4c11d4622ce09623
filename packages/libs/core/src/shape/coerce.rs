//! 타입 변환
//!
//! 입력 JSON 값을 필드 타입의 정규 형태로 변환합니다.
//! `null`은 모든 타입에서 그대로 통과합니다 (값 해제).

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde_json::{Number, Value};

use crate::error::{Error, Result};
use crate::id::ObjectId;
use crate::schema::FieldType;

/// 필드 타입으로 값 변환
pub fn coerce(field: &str, field_type: FieldType, value: Value) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match field_type {
        FieldType::String => match value {
            Value::String(_) => Ok(value),
            Value::Number(n) => Ok(Value::String(n.to_string())),
            Value::Bool(b) => Ok(Value::String(b.to_string())),
            other => Err(mismatch(field, field_type, &other)),
        },
        FieldType::Number => match value {
            Value::Number(_) => Ok(value),
            Value::String(s) => parse_number(s.trim())
                .map(Value::Number)
                .ok_or_else(|| invalid(field, format!("'{}' is not a number", s))),
            other => Err(mismatch(field, field_type, &other)),
        },
        FieldType::Boolean => match value {
            Value::Bool(_) => Ok(value),
            Value::String(s) => match s.trim() {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(invalid(field, format!("'{}' is not a boolean", s))),
            },
            other => Err(mismatch(field, field_type, &other)),
        },
        FieldType::Date => match value {
            Value::String(s) => parse_date(s.trim())
                .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)))
                .ok_or_else(|| invalid(field, format!("'{}' is not a date", s))),
            Value::Number(n) => n
                .as_i64()
                .and_then(DateTime::<Utc>::from_timestamp_millis)
                .map(|dt| Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)))
                .ok_or_else(|| invalid(field, "epoch millis out of range")),
            other => Err(mismatch(field, field_type, &other)),
        },
        FieldType::ObjectId => match value {
            Value::String(s) => canonical_object_id(field, &s),
            other => Err(mismatch(field, field_type, &other)),
        },
        FieldType::Array => match value {
            Value::Array(_) => Ok(value),
            other => Err(mismatch(field, field_type, &other)),
        },
        FieldType::ObjectIdArray => match value {
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => canonical_object_id(field, &s),
                    other => Err(mismatch(field, field_type, &other)),
                })
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            other => Err(mismatch(field, field_type, &other)),
        },
    }
}

fn canonical_object_id(field: &str, s: &str) -> Result<Value> {
    ObjectId::parse_str(s.trim())
        .map(|id| Value::String(id.to_hex()))
        .map_err(|_| invalid(field, format!("'{}' is not a valid ObjectId", s)))
}

fn parse_number(s: &str) -> Option<Number> {
    if let Ok(i) = s.parse::<i64>() {
        return Some(Number::from(i));
    }
    s.parse::<f64>().ok().and_then(Number::from_f64)
}

fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn invalid(field: &str, message: impl Into<String>) -> Error {
    Error::Validation {
        field: field.to_string(),
        message: message.into(),
    }
}

fn mismatch(field: &str, expected: FieldType, got: &Value) -> Error {
    let got = match got {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    };
    invalid(
        field,
        format!("expected {}, got {}", expected.expected_json_type(), got),
    )
}
