//! 값 정형화 (Value Shaper)
//!
//! 모델과 작업에 따라 입력/출력 값 맵을 걸러냅니다.
//!
//! # 규칙
//!
//! - 입력: 스키마에 선언되고 해당 작업이 허용된 필드만 통과합니다 (화이트리스트).
//!   선언되지 않은 키는 조용히 버려집니다.
//! - 출력: `read`가 허용된 필드만 응답에 포함됩니다. 저장소가 무엇을 돌려주든 마찬가지입니다.
//! - create 시 입력에 없는 필드는 기본값이 있으면 채워집니다.
//! - `create`가 없는 필드(예: `[Date, "r", "$now"]`)의 기본값은 정형화가 아니라 쓰기 준비 단계에서
//!   서버가 채웁니다. 클라이언트 값은 정형화에서 이미 버려집니다.

mod coerce;

pub use coerce::coerce;

use serde_json::Value;

use crate::error::{Error, Result};
use crate::schema::{ModelSpec, Operation};
use crate::storage::Record;

/// 입력 값 정형화
///
/// 타입 변환에 실패하면 해당 필드 이름을 담은 `Validation` 에러를 반환합니다.
pub fn shape_input(model: &ModelSpec, op: Operation, raw: &Record) -> Result<Record> {
    let mut shaped = Record::new();

    for field in model.fields.values().filter(|f| f.allows(op)) {
        match raw.get(&field.name) {
            Some(value) => {
                let value = coerce(&field.name, field.field_type, value.clone())?;
                shaped.insert(field.name.clone(), value);
            }
            None if op == Operation::Create => {
                if let Some(default) = &field.default {
                    shaped.insert(field.name.clone(), default.produce());
                }
            }
            None => {}
        }
    }

    Ok(shaped)
}

/// 클라이언트가 보낼 수 없는 필드의 create 기본값 채우기
fn apply_server_defaults(model: &ModelSpec, values: &mut Record) {
    for field in model.fields.values() {
        if field.allows(Operation::Create) {
            continue;
        }
        if let Some(default) = &field.default {
            values.insert(field.name.clone(), default.produce());
        }
    }
}

/// 출력 값 정형화
///
/// 어떤 작업의 응답이든 노출 여부는 필드의 `read` 허용으로 판단합니다.
/// 저장된 값에 없는 필드는 생략되며, 이 단계는 실패하지 않습니다.
pub fn shape_output(model: &ModelSpec, _op: Operation, stored: &Record) -> Record {
    let mut out = Record::new();

    for field in model.fields.values() {
        if !field.is_readable() {
            continue;
        }
        if let Some(value) = stored.get(&field.name) {
            out.insert(field.name.clone(), value.clone());
        }
    }

    out
}

/// 요청 본문을 값 맵으로 변환
///
/// 빈 본문은 빈 맵으로 취급합니다. JSON 객체가 아니면 에러입니다.
pub fn body_to_record(body: Option<Value>) -> Result<Record> {
    match body {
        None | Some(Value::Null) => Ok(Record::new()),
        Some(Value::Object(map)) => Ok(map),
        Some(_) => Err(Error::InvalidBody {
            message: "request body must be a JSON object".to_string(),
        }),
    }
}

/// 쓰기 준비: 입력 정형화, 서버 기본값, 훅 순서
///
/// 훅은 정형화를 통과한 필드와 서버 기본값만 받습니다.
pub fn prepare_write(model: &ModelSpec, op: Operation, raw: &Record) -> Result<Record> {
    let mut values = shape_input(model, op, raw)?;
    if op == Operation::Create {
        apply_server_defaults(model, &mut values);
    }
    Ok(model.apply_hooks(op, values))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaParser;
    use serde_json::json;

    fn users() -> ModelSpec {
        let yaml = r#"
Users:
  fields:
    _id: [ObjectId, "rd"]
    email: [String, "cru"]
    password_hash: [String, "c"]
    role: [String, "cr", "member"]
    score: [Number, "cru"]
    created_at: [Date, "r"]
  hooks:
    create: [timestamps]
"#;
        SchemaParser::parse_models(yaml).unwrap().remove(0)
    }

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_input_whitelist() {
        let model = users();
        let raw = record(json!({
            "_id": "64b0000000000000000000ab",
            "email": "a@b.com",
            "password_hash": "x",
            "is_admin": true,
            "created_at": "2020-01-01"
        }));

        let shaped = shape_input(&model, Operation::Create, &raw).unwrap();
        assert_eq!(shaped.get("email"), Some(&json!("a@b.com")));
        assert_eq!(shaped.get("password_hash"), Some(&json!("x")));
        assert!(!shaped.contains_key("_id"));
        assert!(!shaped.contains_key("is_admin"));
        assert!(!shaped.contains_key("created_at"));
    }

    #[test]
    fn test_update_drops_create_only_fields() {
        let model = users();
        let raw = record(json!({ "password_hash": "y", "email": "b@c.com", "is_admin": true }));

        let shaped = shape_input(&model, Operation::Update, &raw).unwrap();
        assert_eq!(shaped.len(), 1);
        assert_eq!(shaped.get("email"), Some(&json!("b@c.com")));
    }

    #[test]
    fn test_defaults_only_on_create() {
        let model = users();
        let raw = record(json!({ "email": "a@b.com" }));

        let created = shape_input(&model, Operation::Create, &raw).unwrap();
        assert_eq!(created.get("role"), Some(&json!("member")));

        let updated = shape_input(&model, Operation::Update, &raw).unwrap();
        assert!(!updated.contains_key("role"));

        let stamped = shape_input(&model, Operation::Create, &raw).unwrap();
        assert!(!stamped.contains_key("created_at"));

        let explicit = record(json!({ "email": "a@b.com", "role": "owner" }));
        let created = shape_input(&model, Operation::Create, &explicit).unwrap();
        assert_eq!(created.get("role"), Some(&json!("owner")));
    }

    #[test]
    fn test_server_default_on_read_only_field() {
        let yaml = r#"
Posts:
  fields:
    _id: [ObjectId, "r"]
    title: [String, "cr"]
    created_at: [Date, "r", "$now"]
"#;
        let model = SchemaParser::parse_models(yaml).unwrap().remove(0);
        let raw = record(json!({ "title": "t", "created_at": "1999-01-01" }));

        let shaped = shape_input(&model, Operation::Create, &raw).unwrap();
        assert_eq!(shaped.keys().collect::<Vec<_>>(), vec!["title"]);

        let created = prepare_write(&model, Operation::Create, &raw).unwrap();
        let created_at = created.get("created_at").and_then(|v| v.as_str()).unwrap();
        assert!(!created_at.starts_with("1999"));

        let updated = prepare_write(&model, Operation::Update, &raw).unwrap();
        assert!(updated.is_empty());
    }

    #[test]
    fn test_input_never_includes_disallowed_fields() {
        let yaml = r#"
Posts:
  fields:
    _id: [ObjectId, "r"]
    title: [String, "cru"]
    slug: [String, "c", "draft"]
    views: [Number, "r", 0]
    created_at: [Date, "r", "$now"]
"#;
        let model = SchemaParser::parse_models(yaml).unwrap().remove(0);
        let raw = record(json!({
            "_id": "64b0000000000000000000ab",
            "title": "t",
            "slug": "s",
            "views": 99,
            "created_at": "1999-01-01",
            "extra": true
        }));

        for op in [Operation::Create, Operation::Update] {
            let shaped = shape_input(&model, op, &raw).unwrap();
            for name in shaped.keys() {
                let field = model.field(name).unwrap();
                assert!(field.allows(op), "{} passed {:?}", name, op);
            }
        }
    }

    #[test]
    fn test_coercion_failure_names_field() {
        let model = users();
        let raw = record(json!({ "email": "a@b.com", "score": "lots" }));

        match shape_input(&model, Operation::Create, &raw) {
            Err(Error::Validation { field, .. }) => assert_eq!(field, "score"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_output_only_readable_fields() {
        let model = users();
        let stored = record(json!({
            "_id": "64b0000000000000000000ab",
            "email": "a@b.com",
            "password_hash": "x",
            "internal_flag": 1
        }));

        for op in [Operation::Read, Operation::Create, Operation::Update] {
            let out = shape_output(&model, op, &stored);
            assert_eq!(out.len(), 2);
            assert!(out.contains_key("_id"));
            assert!(out.contains_key("email"));
        }
    }

    #[test]
    fn test_create_round_trip_is_create_and_read() {
        let model = users();
        let raw = record(json!({ "email": "a@b.com", "password_hash": "x", "score": "3" }));

        let shaped = shape_input(&model, Operation::Create, &raw).unwrap();
        let out = shape_output(&model, Operation::Create, &shaped);

        // create∩read: email, role(default), score
        let mut keys: Vec<_> = out.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["email", "role", "score"]);
        assert_eq!(out.get("score"), Some(&json!(3)));
    }

    #[test]
    fn test_prepare_write_runs_hooks_after_shaping() {
        let model = users();
        let raw = record(json!({ "email": "a@b.com", "created_at": "1999-01-01" }));

        let values = prepare_write(&model, Operation::Create, &raw).unwrap();
        let created_at = values.get("created_at").and_then(|v| v.as_str()).unwrap();
        assert!(!created_at.starts_with("1999"));
        // updated_at는 모델에 선언되지 않았으므로 제거됨
        assert!(!values.contains_key("updated_at"));
    }

    #[test]
    fn test_body_to_record() {
        assert!(body_to_record(None).unwrap().is_empty());
        assert!(body_to_record(Some(json!([1, 2]))).is_err());
        assert_eq!(body_to_record(Some(json!({"a": 1}))).unwrap().len(), 1);
    }
}
