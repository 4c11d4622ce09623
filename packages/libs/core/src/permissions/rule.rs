//! 라우트 바인딩과 권한 규칙
//!
//! 설정 파일의 `routes` 항목을 검증하여 모델과 작업별 규칙을 묶습니다.
//!
//! ```yaml
//! - path: /users
//!   model: Users
//!   rules:
//!     rA: "@req_user._id=@req_user._id"
//!     r: { allow: "@user._id=@req_user._id", where: "_id" }
//!     u: { allow: "@user._id=@req_user._id", where: { param: id, field: _id } }
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;

use super::context::REQ_USER;
use super::expr::Expr;
use crate::error::{Error, Result};
use crate::id::ID_FIELD;
use crate::schema::{is_identifier, ModelCatalog, ModelSpec, OpCode};

// ─────────────────────────────────────────────────────────────────────────────
// 설정 구조체
// ─────────────────────────────────────────────────────────────────────────────

/// 라우트 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConfig {
    pub path: String,
    pub model: String,
    #[serde(default)]
    pub rules: IndexMap<String, RuleConfig>,
}

/// 규칙 설정 (표현식 축약형 또는 객체형)
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RuleConfig {
    Expression(String),
    Full {
        allow: String,
        #[serde(default, rename = "where")]
        where_binding: Option<WhereConfig>,
    },
}

/// `where` 설정
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum WhereConfig {
    /// 파라미터 이름 = 필드 이름
    Field(String),
    Full { param: String, field: String },
}

// ─────────────────────────────────────────────────────────────────────────────
// 검증된 형태
// ─────────────────────────────────────────────────────────────────────────────

/// 경로 파라미터 → 필드 바인딩
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereBinding {
    /// 경로 파라미터 이름
    pub param: String,

    /// 조회할 필드 이름
    pub field: String,
}

impl WhereBinding {
    /// 기본 바인딩 (`:_id` → `_id`)
    pub fn identifier() -> Self {
        Self {
            param: ID_FIELD.to_string(),
            field: ID_FIELD.to_string(),
        }
    }
}

/// 작업 하나의 권한 규칙
#[derive(Debug, Clone)]
pub struct PermissionRule {
    /// 파싱된 표현식
    pub expression: Expr,

    /// 리소스 로드 바인딩 (`r`, `u`, `d`는 항상 있음)
    pub where_binding: Option<WhereBinding>,
}

impl PermissionRule {
    /// 인증 주체를 참조하는 규칙인지
    pub fn requires_principal(&self) -> bool {
        self.expression.references(REQ_USER)
    }
}

/// 라우트 바인딩
#[derive(Debug, Clone)]
pub struct RouteBinding {
    /// 마운트 경로 (예: `/users`)
    pub path: String,

    /// 바인딩된 모델
    pub model: Arc<ModelSpec>,

    /// 작업별 규칙 (없는 작업은 엔드포인트가 생성되지 않음)
    pub rules: BTreeMap<OpCode, PermissionRule>,
}

impl RouteBinding {
    /// 작업 규칙 조회
    pub fn rule(&self, op: OpCode) -> Option<&PermissionRule> {
        self.rules.get(&op)
    }

    /// 단건 경로의 파라미터 이름
    pub fn item_param(&self) -> Option<&str> {
        self.rules
            .values()
            .find_map(|rule| rule.where_binding.as_ref())
            .map(|binding| binding.param.as_str())
    }

    /// 단건 경로 (`/users/:_id`)
    pub fn item_path(&self) -> Option<String> {
        self.item_param()
            .map(|param| format!("{}/:{}", self.path, param))
    }

    /// 설정 검증 및 변환
    pub fn compile(config: &RouteConfig, catalog: &ModelCatalog) -> Result<Self> {
        validate_path(&config.path)?;

        let model = catalog.get(&config.model).ok_or_else(|| {
            Error::schema(format!(
                "route '{}' references unknown model '{}'",
                config.path, config.model
            ))
        })?;

        if model.binding_name() == REQ_USER {
            return Err(Error::schema(format!(
                "model '{}' label '{}' collides with the principal binding",
                model.name, REQ_USER
            )));
        }

        let mut rules = BTreeMap::new();
        for (code, raw) in &config.rules {
            let op = OpCode::from_code(code).ok_or_else(|| {
                Error::schema(format!(
                    "route '{}': unknown operation code '{}' (expected c, r, rA, u, d)",
                    config.path, code
                ))
            })?;

            let rule = compile_rule(&config.path, op, raw, &model)?;
            rules.insert(op, rule);
        }

        let binding = Self {
            path: config.path.clone(),
            model,
            rules,
        };
        binding.validate_item_param()?;

        Ok(binding)
    }

    /// 단건 작업들이 같은 경로 파라미터를 쓰는지 검증
    fn validate_item_param(&self) -> Result<()> {
        let Some(expected) = self.item_param() else {
            return Ok(());
        };

        for (op, rule) in &self.rules {
            if let Some(binding) = &rule.where_binding {
                if binding.param != expected {
                    return Err(Error::schema(format!(
                        "route '{}': '{}' binds path parameter '{}' but another operation binds '{}'",
                        self.path, op, binding.param, expected
                    )));
                }
            }
        }

        Ok(())
    }
}

fn compile_rule(
    path: &str,
    op: OpCode,
    raw: &RuleConfig,
    model: &ModelSpec,
) -> Result<PermissionRule> {
    let (source, where_config) = match raw {
        RuleConfig::Expression(source) => (source, None),
        RuleConfig::Full {
            allow,
            where_binding,
        } => (allow, where_binding.as_ref()),
    };

    let expression = Expr::parse(source)?;

    let where_binding = match (op.targets_single(), where_config) {
        (false, Some(_)) => {
            return Err(Error::schema(format!(
                "route '{}': '{}' does not target a single resource and cannot declare 'where'",
                path, op
            )));
        }
        (false, None) => None,
        (true, None) => Some(WhereBinding::identifier()),
        (true, Some(WhereConfig::Field(field))) => Some(WhereBinding {
            param: field.clone(),
            field: field.clone(),
        }),
        (true, Some(WhereConfig::Full { param, field })) => Some(WhereBinding {
            param: param.clone(),
            field: field.clone(),
        }),
    };

    if let Some(binding) = &where_binding {
        if !is_identifier(&binding.param) {
            return Err(Error::schema(format!(
                "route '{}': path parameter '{}' must be an identifier",
                path, binding.param
            )));
        }
        if model.field(&binding.field).is_none() {
            return Err(Error::schema(format!(
                "route '{}': where field '{}' is not declared on model '{}'",
                path, binding.field, model.name
            )));
        }
    }

    for root in expression.roots() {
        let bindable = root == REQ_USER
            || (where_binding.is_some() && root == model.binding_name());
        if !bindable {
            return Err(Error::InvalidExpression {
                expression: source.clone(),
                reason: format!(
                    "'@{}' is not available for '{}' on route '{}'",
                    root, op, path
                ),
            });
        }
    }

    Ok(PermissionRule {
        expression,
        where_binding,
    })
}

/// 서비스가 직접 제공하는 경로 (라우트로 설정 불가)
pub const HEALTH_PATH: &str = "/health";

fn validate_path(path: &str) -> Result<()> {
    let invalid = |reason: &str| Error::schema(format!("route path '{}' {}", path, reason));

    if path == HEALTH_PATH {
        return Err(invalid("is reserved"));
    }

    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| invalid("must start with '/'"))?;
    if rest.is_empty() {
        return Err(invalid("must not be the root path"));
    }
    for segment in rest.split('/') {
        if segment.is_empty() {
            return Err(invalid("must not contain empty segments or a trailing '/'"));
        }
        if !segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(invalid("segments may only contain letters, digits, '_' and '-'"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{CatalogBuilder, ModelConfig};

    fn catalog() -> ModelCatalog {
        let users: ModelConfig = serde_yaml::from_str(
            r#"
fields:
  _id: [ObjectId, "rd"]
  email: [String, "cru"]
"#,
        )
        .unwrap();
        CatalogBuilder::new()
            .model("Users", &users)
            .unwrap()
            .build()
    }

    fn route(yaml: &str) -> RouteConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_compile_route() {
        let config = route(
            r#"
path: /users
model: Users
rules:
  rA: "@req_user._id=@req_user._id"
  r: { allow: "@user._id=@req_user._id", where: "_id" }
  d: { allow: "@user._id=@req_user._id" }
"#,
        );

        let binding = RouteBinding::compile(&config, &catalog()).unwrap();
        assert_eq!(binding.rules.len(), 3);
        assert!(binding.rule(OpCode::Create).is_none());
        assert_eq!(binding.rule(OpCode::ReadAll).unwrap().where_binding, None);
        assert_eq!(
            binding.rule(OpCode::Delete).unwrap().where_binding,
            Some(WhereBinding::identifier())
        );
        assert_eq!(binding.item_path().as_deref(), Some("/users/:_id"));
        assert!(binding.rule(OpCode::Read).unwrap().requires_principal());
    }

    #[test]
    fn test_explicit_where_param() {
        let config = route(
            r#"
path: /users
model: Users
rules:
  u: { allow: "@user._id=@req_user._id", where: { param: id, field: _id } }
"#,
        );
        let binding = RouteBinding::compile(&config, &catalog()).unwrap();
        assert_eq!(binding.item_path().as_deref(), Some("/users/:id"));
    }

    #[test]
    fn test_rejects_invalid_routes() {
        let cases = [
            // 알 수 없는 모델
            "path: /posts\nmodel: Posts\nrules: {}",
            // 알 수 없는 작업 코드
            "path: /users\nmodel: Users\nrules: { x: \"@req_user._id=@req_user._id\" }",
            // c/rA에는 where 불가
            "path: /users\nmodel: Users\nrules: { c: { allow: \"@req_user._id=@req_user._id\", where: _id } }",
            // where 없는 작업에서 모델 레이블 참조
            "path: /users\nmodel: Users\nrules: { rA: \"@user._id=@req_user._id\" }",
            // 알 수 없는 루트
            "path: /users\nmodel: Users\nrules: { r: \"@file._id=@req_user._id\" }",
            // 선언되지 않은 where 필드
            "path: /users\nmodel: Users\nrules: { r: { allow: \"@user._id=@req_user._id\", where: slug } }",
            // 잘못된 경로
            "path: users\nmodel: Users\nrules: {}",
            "path: /users/\nmodel: Users\nrules: {}",
            "path: /users/:id\nmodel: Users\nrules: {}",
            // 예약된 경로
            "path: /health\nmodel: Users\nrules: { rA: \"@req_user._id=@req_user._id\" }",
            // 작업마다 다른 경로 파라미터
            "path: /users\nmodel: Users\nrules: { r: { allow: \"@user._id=@req_user._id\", where: _id }, u: { allow: \"@user._id=@req_user._id\", where: { param: id, field: _id } } }",
        ];

        for yaml in cases {
            let config = route(yaml);
            assert!(
                RouteBinding::compile(&config, &catalog()).is_err(),
                "expected rejection for {}",
                yaml
            );
        }
    }

    #[test]
    fn test_malformed_expression_fails_at_compile() {
        let config = route("path: /users\nmodel: Users\nrules: { r: \"@user._id == @req_user._id\" }");
        let err = RouteBinding::compile(&config, &catalog()).unwrap_err();
        assert!(matches!(err, Error::InvalidExpression { .. }));
        assert!(err.is_schema_error());
    }
}
