//! API 설정 파일
//!
//! `models`와 `routes` 두 섹션으로 구성된 YAML 문서를 읽어
//! 모델 카탈로그와 라우트 바인딩으로 변환합니다. 어떤 검증이라도 실패하면 서비스는 시작하지 않습니다.

use std::collections::HashSet;
use std::sync::Arc;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::info;

use crate::error::{Error, Result};
use crate::permissions::{RouteBinding, RouteConfig};
use crate::schema::{CatalogBuilder, ModelCatalog, ModelConfig};

/// 설정 파일 루트
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    #[serde(default)]
    pub models: IndexMap<String, ModelConfig>,

    #[serde(default)]
    pub routes: Vec<RouteConfig>,
}

/// 검증이 끝난 설정
#[derive(Debug, Clone)]
pub struct CompiledConfig {
    pub catalog: Arc<ModelCatalog>,
    pub routes: Vec<Arc<RouteBinding>>,
}

impl ApiConfig {
    /// YAML 문자열 파싱
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// 설정의 모델로 빌더 준비 (코드 훅을 덧붙일 때 사용)
    pub fn catalog_builder(&self) -> Result<CatalogBuilder> {
        self.models
            .iter()
            .try_fold(CatalogBuilder::new(), |builder, (name, config)| {
                builder.model(name, config)
            })
    }

    /// 카탈로그에 대해 라우트 검증
    pub fn bind_routes(&self, catalog: &ModelCatalog) -> Result<Vec<Arc<RouteBinding>>> {
        let mut seen = HashSet::new();
        let mut routes = Vec::with_capacity(self.routes.len());

        for config in &self.routes {
            if !seen.insert(config.path.as_str()) {
                return Err(Error::schema(format!(
                    "duplicate route path '{}'",
                    config.path
                )));
            }
            routes.push(Arc::new(RouteBinding::compile(config, catalog)?));
        }

        Ok(routes)
    }

    /// 전체 검증
    pub fn compile(&self) -> Result<CompiledConfig> {
        self.compile_with(self.catalog_builder()?)
    }

    /// 준비된 빌더로 전체 검증
    pub fn compile_with(&self, builder: CatalogBuilder) -> Result<CompiledConfig> {
        let catalog = Arc::new(builder.build());
        let routes = self.bind_routes(&catalog)?;

        info!(
            "Loaded {} models, {} routes",
            catalog.len(),
            routes.len()
        );

        Ok(CompiledConfig { catalog, routes })
    }
}

/// YAML 설정을 읽어 카탈로그와 라우트 바인딩 생성
pub fn register_config(yaml: &str) -> Result<CompiledConfig> {
    ApiConfig::from_yaml(yaml)?.compile()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{OpCode, Operation};
    use crate::storage::Record;
    use serde_json::Value;

    const CONFIG: &str = r#"
models:
  Users:
    fields:
      _id: [ObjectId, "rd"]
      email: [String, "cru"]
      password_hash: [String, "c"]
  Files:
    owner: owner_id
    fields:
      _id: [ObjectId, "rd"]
      owner_id: [ObjectId, "r"]
      name: [String, "cru"]
routes:
  - path: /users
    model: Users
    rules:
      c: "@req_user._id=@req_user._id"
      r: { allow: "@user._id=@req_user._id", where: "_id" }
  - path: /files
    model: Files
    rules:
      rA: "@req_user._id=@req_user._id"
      d: "@file.owner_id=@req_user._id"
"#;

    #[test]
    fn test_register_config() {
        let compiled = register_config(CONFIG).unwrap();
        assert_eq!(compiled.catalog.len(), 2);
        assert_eq!(compiled.routes.len(), 2);

        let files = &compiled.routes[1];
        assert_eq!(files.model.name, "Files");
        assert!(files.rule(OpCode::Delete).is_some());
        assert!(files.rule(OpCode::Create).is_none());
    }

    #[test]
    fn test_duplicate_route_path() {
        let yaml = format!(
            "{}  - path: /users\n    model: Users\n    rules: {{}}\n",
            CONFIG
        );
        let err = register_config(&yaml).unwrap_err();
        assert!(err.is_schema_error());
    }

    #[test]
    fn test_sample_config_compiles() {
        let compiled = register_config(include_str!("../../../../config/models.yaml")).unwrap();
        let notes = compiled.catalog.by_label("note").unwrap();
        assert_eq!(notes.owner.as_deref(), Some("owner_id"));
        assert_eq!(compiled.routes.len(), 2);
    }

    #[test]
    fn test_unknown_top_level_key() {
        assert!(ApiConfig::from_yaml("models: {}\npolicies: {}\n").is_err());
    }

    #[test]
    fn test_compile_with_code_hooks() {
        let config = ApiConfig::from_yaml(CONFIG).unwrap();
        let builder = config
            .catalog_builder()
            .unwrap()
            .hook("Users", Operation::Create, "mark", |mut values: Record| {
                values.insert("email".to_string(), Value::from("hooked@b.com"));
                values
            })
            .unwrap();

        let compiled = config.compile_with(builder).unwrap();
        let users = compiled.catalog.get("Users").unwrap();
        assert_eq!(users.hooks.create.len(), 1);
        assert!(Arc::ptr_eq(&compiled.routes[0].model, &users));
    }
}
