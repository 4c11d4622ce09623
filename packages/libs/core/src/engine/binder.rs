//! 컨텍스트 바인더
//!
//! 인증 주체와 `where`로 지정된 리소스를 요청 컨텍스트에 바인딩합니다.
//! 리소스 조회는 저장소 호출 한 번이며, 저장소를 변경하지 않습니다.

use serde_json::Value;
use tracing::debug;

use super::request::EngineRequest;
use crate::error::{Error, Result};
use crate::permissions::{PermissionRule, RequestContext, REQ_USER};
use crate::schema::ModelSpec;
use crate::shape::coerce;
use crate::storage::{Filter, Record, Storage};

/// 바인딩 결과
#[derive(Debug, Clone)]
pub struct BoundContext {
    /// 평가용 컨텍스트
    pub context: RequestContext,

    /// 로드된 리소스 (`where`가 있는 경우)
    pub resource: Option<Record>,
}

/// 컨텍스트 바인더
pub struct ContextBinder;

impl ContextBinder {
    /// 요청 컨텍스트 구성
    ///
    /// 리소스가 없거나, 경로 파라미터를 필드 타입으로 변환할 수 없거나,
    /// 소유권 스코프를 적용할 주체가 없으면 `NotFound`입니다.
    pub async fn bind(
        storage: &dyn Storage,
        model: &ModelSpec,
        rule: &PermissionRule,
        req: &EngineRequest,
    ) -> Result<BoundContext> {
        let mut context = match req.principal.claims() {
            Some(claims) => RequestContext::new().with_principal(claims),
            None => RequestContext::new(),
        };

        let Some(binding) = &rule.where_binding else {
            return Ok(BoundContext {
                context,
                resource: None,
            });
        };

        let not_found = || Error::NotFound {
            resource: model.binding_name().to_string(),
        };

        let raw = req.params.get(&binding.param).ok_or_else(not_found)?;
        let field = model.field(&binding.field).ok_or_else(not_found)?;
        let key = coerce(&field.name, field.field_type, Value::String(raw.clone())).map_err(|e| {
            debug!("Path parameter '{}' not usable as {}: {}", binding.param, field.field_type, e);
            not_found()
        })?;

        let mut filter = Filter::new();
        filter.insert(binding.field.clone(), key);

        if let Some(owner) = &model.owner {
            let owner_id = owner_value(model, &context).ok_or_else(not_found)?;
            filter.insert(owner.clone(), owner_id);
        }

        let record = storage
            .find_one(&model.storage_name, &filter)
            .await?
            .ok_or_else(not_found)?;

        debug!(
            "Bound {} via {}={}",
            model.binding_name(),
            binding.field,
            raw
        );
        context.bind(model.binding_name(), record.clone());

        Ok(BoundContext {
            context,
            resource: Some(record),
        })
    }
}

/// 소유자 필드에 쓸 주체 식별자 (필드 타입으로 정규화)
pub(crate) fn owner_value(model: &ModelSpec, context: &RequestContext) -> Option<Value> {
    let owner = model.owner.as_ref()?;
    let field = model.field(owner)?;
    let id = context.principal_id()?.clone();
    match coerce(&field.name, field.field_type, id) {
        Ok(Value::Null) => None,
        Ok(value) => Some(value),
        Err(e) => {
            debug!("{} id not usable as owner '{}': {}", REQ_USER, owner, e);
            None
        }
    }
}
