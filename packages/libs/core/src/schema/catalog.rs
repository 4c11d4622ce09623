//! 모델 카탈로그
//!
//! 시작 시 한 번 구성되어 `Arc`로 공유되는 읽기 전용 모델 레지스트리입니다.
//! 구성 후에는 변경 API가 없으므로 요청 간 동기화가 필요 없습니다.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;

use super::field::DefaultValue;
use super::model::{Hook, ModelSpec};
use super::ops::Operation;
use super::parser::{ModelConfig, SchemaParser};
use crate::error::{Error, Result};
use crate::id::ID_FIELD;
use crate::storage::Record;

/// 읽기 전용 모델 카탈로그
#[derive(Debug, Default)]
pub struct ModelCatalog {
    /// 모델 이름 → 모델
    models: IndexMap<String, Arc<ModelSpec>>,

    /// 단수 레이블 → 모델 이름
    labels: IndexMap<String, String>,
}

impl ModelCatalog {
    /// 모델 이름으로 조회
    pub fn get(&self, name: &str) -> Option<Arc<ModelSpec>> {
        self.models.get(name).cloned()
    }

    /// 레이블로 조회
    pub fn by_label(&self, label: &str) -> Option<Arc<ModelSpec>> {
        self.labels.get(label).and_then(|name| self.get(name))
    }

    /// 등록 순서대로 순회
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ModelSpec>> {
        self.models.values()
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }
}

/// 카탈로그 빌더
///
/// 설정 파일의 모델에 코드로 작성한 훅과 기본값 생성 함수를 덧붙일 수 있습니다.
///
/// ```ignore
/// let catalog = CatalogBuilder::new()
///     .model("Users", &config)?
///     .hook("Users", Operation::Create, "lowercase_email", |mut values| {
///         // ...
///         values
///     })?
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct CatalogBuilder {
    models: IndexMap<String, ModelSpec>,
}

impl CatalogBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// 설정에서 모델 등록
    pub fn model(self, name: &str, config: &ModelConfig) -> Result<Self> {
        let spec = SchemaParser::register_model(name, config)?;
        self.spec(spec)
    }

    /// 이미 검증된 모델 등록
    pub fn spec(mut self, spec: ModelSpec) -> Result<Self> {
        if self.models.contains_key(&spec.name) {
            return Err(Error::schema(format!("duplicate model '{}'", spec.name)));
        }
        if let Some(other) = self
            .models
            .values()
            .find(|m| m.label.singular == spec.label.singular)
        {
            return Err(Error::schema(format!(
                "models '{}' and '{}' share label '{}'",
                other.name, spec.name, spec.label.singular
            )));
        }

        self.models.insert(spec.name.clone(), spec);
        Ok(self)
    }

    /// 코드 훅 추가 (설정의 내장 훅 뒤에 실행)
    pub fn hook<F>(mut self, model: &str, op: Operation, name: &str, f: F) -> Result<Self>
    where
        F: Fn(Record) -> Record + Send + Sync + 'static,
    {
        let spec = self.model_mut(model)?;
        if !spec.hooks.push(op, Hook::new(name, Arc::new(f))) {
            return Err(Error::schema(format!(
                "model '{}': hook '{}' must target create or update, not {}",
                model, name, op
            )));
        }
        Ok(self)
    }

    /// 기본값 생성 함수 지정
    pub fn default_fn<F>(mut self, model: &str, field: &str, f: F) -> Result<Self>
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        if field == ID_FIELD {
            return Err(Error::schema(format!(
                "model '{}': identifier '{}' is assigned by storage",
                model, ID_FIELD
            )));
        }

        let spec = self.model_mut(model)?;
        let field_spec = spec.fields.get_mut(field).ok_or_else(|| {
            Error::schema(format!("model '{}' has no field '{}'", model, field))
        })?;
        field_spec.default = Some(DefaultValue::Generator(Arc::new(f)));
        Ok(self)
    }

    /// 불변 카탈로그로 고정
    pub fn build(self) -> ModelCatalog {
        let mut catalog = ModelCatalog::default();
        for (name, spec) in self.models {
            catalog
                .labels
                .insert(spec.label.singular.clone(), name.clone());
            catalog.models.insert(name, Arc::new(spec));
        }
        catalog
    }

    fn model_mut(&mut self, name: &str) -> Result<&mut ModelSpec> {
        self.models
            .get_mut(name)
            .ok_or_else(|| Error::schema(format!("unknown model '{}'", name)))
    }
}
