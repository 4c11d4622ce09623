//! 모델 설정 파서
//!
//! 운영자가 작성한 모델 설정(YAML)을 검증하여 ModelSpec으로 변환합니다.
//!
//! # 필드 표기
//!
//! ```yaml
//! email: [String, "cru"]                  # [타입, 작업]
//! role: [String, "cr", "member"]          # [타입, 작업, 기본값]
//! created_at: [Date, "r", "$now"]         # 기본값 생성기
//! price_label: [String, "cr", "$$5 off"]  # `$`로 시작하는 리터럴은 `$$`로 이스케이프 ("$5 off")
//! tags: { type: "Array<ObjectId>", ops: "cru", default: [] }
//! ```

use indexmap::IndexMap;
use serde::Deserialize;
use serde_json::Value;

use super::field::{DefaultValue, FieldSpec};
use super::hooks;
use super::model::{HookSet, Label, ModelSpec};
use super::ops::{Operation, OperationSet};
use super::types::FieldType;
use crate::error::{Error, Result};
use crate::id::ID_FIELD;
use crate::shape::coerce;

/// 스키마 파서
pub struct SchemaParser;

impl SchemaParser {
    /// 모델 맵 YAML 문자열 파싱 (`모델 이름 → 모델 설정`)
    pub fn parse_models(yaml: &str) -> Result<Vec<ModelSpec>> {
        let raw: IndexMap<String, ModelConfig> = serde_yaml::from_str(yaml)?;
        raw.iter()
            .map(|(name, config)| Self::register_model(name, config))
            .collect()
    }

    /// 모델 설정 하나를 검증하여 ModelSpec 생성
    pub fn register_model(name: &str, config: &ModelConfig) -> Result<ModelSpec> {
        if name.trim().is_empty() {
            return Err(Error::schema("model name must not be empty"));
        }

        let label = match &config.label {
            None => Label::from_model_name(name),
            Some(LabelConfig::Singular(singular)) => Label::from_singular(singular),
            Some(LabelConfig::Full { singular, plural }) => match plural {
                Some(plural) => Label::new(singular.to_lowercase(), plural.to_lowercase()),
                None => Label::from_singular(singular),
            },
        };
        if !is_identifier(&label.singular) {
            return Err(Error::schema(format!(
                "model '{}' label '{}' must be an identifier",
                name, label.singular
            )));
        }

        let storage_name = config
            .storage
            .clone()
            .unwrap_or_else(|| label.plural.clone());
        if !is_identifier(&storage_name) {
            return Err(Error::schema(format!(
                "model '{}' storage name '{}' must be an identifier",
                name, storage_name
            )));
        }

        let mut fields = IndexMap::new();
        for (field_name, raw) in &config.fields {
            let field = Self::convert_field(name, field_name, raw)?;
            fields.insert(field_name.clone(), field);
        }

        Self::validate_identifier(name, &fields)?;

        if let Some(owner) = &config.owner {
            let field = fields.get(owner).ok_or_else(|| {
                Error::schema(format!(
                    "model '{}' owner field '{}' is not declared",
                    name, owner
                ))
            })?;
            if !matches!(field.field_type, FieldType::ObjectId | FieldType::String) {
                return Err(Error::schema(format!(
                    "model '{}' owner field '{}' must be ObjectId or String",
                    name, owner
                )));
            }
        }

        let hooks = Self::convert_hooks(name, &config.hooks)?;

        Ok(ModelSpec {
            name: name.to_string(),
            label,
            storage_name,
            fields,
            owner: config.owner.clone(),
            hooks,
        })
    }

    /// 필드 설정 변환
    fn convert_field(model: &str, name: &str, raw: &FieldConfig) -> Result<FieldSpec> {
        if !is_identifier(name) {
            return Err(Error::schema(format!(
                "model '{}' field '{}' must be an identifier",
                model, name
            )));
        }

        let (type_tag, ops, default) = raw.parts(model, name)?;

        let field_type = FieldType::from_tag(&type_tag).ok_or_else(|| Error::InvalidFieldType {
            model: model.to_string(),
            field: name.to_string(),
            type_name: type_tag.clone(),
        })?;

        let operations = OperationSet::from_letters(&ops).ok_or_else(|| Error::InvalidOperations {
            model: model.to_string(),
            field: name.to_string(),
            operations: ops.clone(),
        })?;

        let default = match default {
            None => None,
            Some(value) => Some(Self::convert_default(model, name, field_type, value)?),
        };

        Ok(FieldSpec {
            name: name.to_string(),
            field_type,
            operations,
            default,
        })
    }

    /// 기본값 변환 (리터럴은 시작 시 타입 변환)
    fn convert_default(
        model: &str,
        field: &str,
        field_type: FieldType,
        value: Value,
    ) -> Result<DefaultValue> {
        // `$$`로 시작하면 앞의 `$` 하나를 뗀 리터럴
        let value = match value {
            Value::String(s) if s.starts_with("$$") => Value::String(s[1..].to_string()),
            Value::String(s) if s.starts_with('$') => {
                return Self::generator_default(model, field, field_type, &s)
            }
            other => other,
        };

        let literal = coerce(field, field_type, value).map_err(|e| {
            Error::schema(format!("{}.{}: invalid default value: {}", model, field, e))
        })?;
        Ok(DefaultValue::Literal(literal))
    }

    /// 생성기 기본값 (`$now`, `$objectId`)
    fn generator_default(
        model: &str,
        field: &str,
        field_type: FieldType,
        name: &str,
    ) -> Result<DefaultValue> {
        let generator = DefaultValue::from_generator_name(name).ok_or_else(|| {
            Error::schema(format!(
                "{}.{}: unknown default generator '{}'",
                model, field, name
            ))
        })?;
        let compatible = match generator {
            DefaultValue::Now => matches!(field_type, FieldType::Date | FieldType::String),
            DefaultValue::NewObjectId => {
                matches!(field_type, FieldType::ObjectId | FieldType::String)
            }
            _ => true,
        };
        if !compatible {
            return Err(Error::schema(format!(
                "{}.{}: generator '{}' does not produce {}",
                model, field, name, field_type
            )));
        }
        Ok(generator)
    }

    /// 식별자 필드 불변식 검증
    ///
    /// `_id`는 반드시 존재하고, read 가능하며, create/update 입력으로 받지 않습니다.
    fn validate_identifier(model: &str, fields: &IndexMap<String, FieldSpec>) -> Result<()> {
        let id = fields.get(ID_FIELD).ok_or_else(|| {
            Error::schema(format!(
                "model '{}' must declare identifier field '{}'",
                model, ID_FIELD
            ))
        })?;

        if id.field_type != FieldType::ObjectId {
            return Err(Error::schema(format!(
                "model '{}' identifier '{}' must be ObjectId",
                model, ID_FIELD
            )));
        }
        if id.allows(Operation::Create) || id.allows(Operation::Update) {
            return Err(Error::schema(format!(
                "model '{}' identifier '{}' is assigned by storage and cannot accept create/update input",
                model, ID_FIELD
            )));
        }
        if !id.allows(Operation::Read) {
            return Err(Error::schema(format!(
                "model '{}' identifier '{}' must be readable",
                model, ID_FIELD
            )));
        }
        if id.default.is_some() {
            return Err(Error::schema(format!(
                "model '{}' identifier '{}' cannot have a default",
                model, ID_FIELD
            )));
        }

        Ok(())
    }

    /// 훅 이름 변환
    fn convert_hooks(model: &str, raw: &HooksConfig) -> Result<HookSet> {
        let mut set = HookSet::default();

        for (op, names) in [
            (Operation::Create, &raw.create),
            (Operation::Update, &raw.update),
        ] {
            for name in names {
                let hook = hooks::builtin(name, op).ok_or_else(|| {
                    Error::schema(format!(
                        "model '{}': unknown hook '{}' (available: {})",
                        model,
                        name,
                        hooks::BUILTIN_HOOKS.join(", ")
                    ))
                })?;
                set.push(op, hook);
            }
        }

        Ok(set)
    }
}

/// 식별자 형식 검사 (`[A-Za-z_][A-Za-z0-9_]*`)
pub(crate) fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

// ─────────────────────────────────────────────────────────────────────────────
// 설정 구조체 (serde 역직렬화용)
// ─────────────────────────────────────────────────────────────────────────────

/// 모델 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModelConfig {
    #[serde(default)]
    pub label: Option<LabelConfig>,

    /// 저장소 이름 (기본: 복수형 레이블)
    #[serde(default)]
    pub storage: Option<String>,

    /// 소유자 필드
    #[serde(default)]
    pub owner: Option<String>,

    pub fields: IndexMap<String, FieldConfig>,

    #[serde(default)]
    pub hooks: HooksConfig,
}

/// 레이블 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum LabelConfig {
    Singular(String),
    Full {
        singular: String,
        #[serde(default)]
        plural: Option<String>,
    },
}

/// 필드 설정 (배열 축약형 또는 객체형)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FieldConfig {
    Short(Vec<Value>),
    Long {
        #[serde(rename = "type")]
        field_type: String,
        #[serde(default)]
        ops: String,
        #[serde(default)]
        default: Option<Value>,
    },
}

impl FieldConfig {
    /// (타입, 작업, 기본값) 분해
    fn parts(&self, model: &str, field: &str) -> Result<(String, String, Option<Value>)> {
        match self {
            FieldConfig::Long {
                field_type,
                ops,
                default,
            } => Ok((field_type.clone(), ops.clone(), default.clone())),
            FieldConfig::Short(items) => {
                let malformed = || {
                    Error::schema(format!(
                        "{}.{}: expected [Type, \"ops\"] or [Type, \"ops\", default]",
                        model, field
                    ))
                };
                if items.len() < 2 || items.len() > 3 {
                    return Err(malformed());
                }
                let type_tag = items[0].as_str().ok_or_else(malformed)?;
                let ops = items[1].as_str().ok_or_else(malformed)?;
                Ok((type_tag.to_string(), ops.to_string(), items.get(2).cloned()))
            }
        }
    }
}

/// 훅 설정
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HooksConfig {
    #[serde(default)]
    pub create: Vec<String>,

    #[serde(default)]
    pub update: Vec<String>,
}
