//! 리소스 핸들러
//!
//! 생성된 엔드포인트 하나의 요청 처리 순서:
//!
//! ```text
//! Authenticating → Binding → Authorizing → Shaping(input) → Persisting → Shaping(output) → Responding
//! ```
//!
//! 단계 순서는 바뀌지 않습니다. 권한 평가는 항상 리소스 바인딩 뒤, 저장/출력 전에 일어납니다.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, error, warn};

use super::binder::{owner_value, BoundContext, ContextBinder};
use super::request::{EngineRequest, EngineResponse};
use crate::auth::PrincipalState;
use crate::error::{Error, Result};
use crate::id::ID_FIELD;
use crate::permissions::{PermissionEvaluator, PermissionRule, RouteBinding};
use crate::schema::{ModelSpec, OpCode, Operation};
use crate::shape::{body_to_record, prepare_write, shape_output};
use crate::storage::{Filter, Record, Storage};

/// 작업 하나를 처리하는 핸들러
#[derive(Clone)]
pub struct ResourceHandler {
    route: Arc<RouteBinding>,
    op: OpCode,
    storage: Arc<dyn Storage>,
}

impl ResourceHandler {
    /// 규칙이 없는 작업이면 None (엔드포인트 미생성)
    pub fn new(route: Arc<RouteBinding>, op: OpCode, storage: Arc<dyn Storage>) -> Option<Self> {
        route.rule(op)?;
        Some(Self { route, op, storage })
    }

    pub fn op(&self) -> OpCode {
        self.op
    }

    pub fn route(&self) -> &RouteBinding {
        &self.route
    }

    /// 요청 처리 (에러는 상태 코드 응답으로 변환)
    pub async fn handle(&self, req: EngineRequest) -> EngineResponse {
        match self.execute(req).await {
            Ok(response) => response,
            Err(e) => EngineResponse::from_error(&e),
        }
    }

    /// 요청 처리
    ///
    /// 실패는 여기서 한 번 로그로 남깁니다. 호출자는 에러를 응답으로 바꾸기만 하면 됩니다.
    pub async fn execute(&self, req: EngineRequest) -> Result<EngineResponse> {
        let result = self.run(req).await;

        if let Err(e) = &result {
            let path = &self.route.path;
            match e.status_code() {
                s if s >= 500 => error!("{} {} failed: {}", self.op, path, e),
                401 | 403 => warn!("{} {} denied: {}", self.op, path, e),
                _ => debug!("{} {} rejected: {}", self.op, path, e),
            }
        }

        result
    }

    async fn run(&self, req: EngineRequest) -> Result<EngineResponse> {
        let model = self.route.model.as_ref();
        let rule = self.rule()?;

        // Authenticating
        let req = self.authenticate(rule, req)?;

        // Binding
        let BoundContext { context, resource } =
            ContextBinder::bind(self.storage.as_ref(), model, rule, &req).await?;

        // Authorizing
        let verdict = PermissionEvaluator::evaluate(&rule.expression, &context);
        if !verdict.allowed {
            return Err(Error::Forbidden {
                reason: verdict
                    .reason
                    .unwrap_or_else(|| "permission denied".to_string()),
            });
        }
        debug!("{} {} authorized by {}", self.op, self.route.path, rule.expression);

        let collection = model.storage_name.as_str();

        match self.op {
            OpCode::Create => {
                let raw = body_to_record(req.body)?;
                let mut values = prepare_write(model, Operation::Create, &raw)?;

                if let Some(owner) = &model.owner {
                    let owner_id = owner_value(model, &context).ok_or_else(|| Error::Forbidden {
                        reason: "owned resources require an authenticated principal".to_string(),
                    })?;
                    values.insert(owner.clone(), owner_id);
                }

                let stored = self.storage.insert_one(collection, values).await?;
                debug!("Created {} {}", model.binding_name(), id_of(&stored));
                Ok(EngineResponse::created(output(model, Operation::Create, &stored)))
            }

            OpCode::ReadAll => {
                let mut filter = Filter::new();
                if let Some(owner) = &model.owner {
                    match owner_value(model, &context) {
                        Some(owner_id) => {
                            filter.insert(owner.clone(), owner_id);
                        }
                        None => return Ok(EngineResponse::ok(Value::Array(Vec::new()))),
                    }
                }

                let records = self.storage.find_all(collection, &filter).await?;
                let items = records
                    .iter()
                    .map(|record| output(model, Operation::Read, record))
                    .collect();
                Ok(EngineResponse::ok(Value::Array(items)))
            }

            OpCode::Read => {
                let record = loaded(resource)?;
                Ok(EngineResponse::ok(output(model, Operation::Read, &record)))
            }

            OpCode::Update => {
                let record = loaded(resource)?;
                let raw = body_to_record(req.body)?;
                let mut values = prepare_write(model, Operation::Update, &raw)?;
                if let Some(owner) = &model.owner {
                    values.remove(owner);
                }

                let updated = self
                    .storage
                    .update_one(collection, &by_id(&record)?, values)
                    .await?
                    .ok_or_else(|| Error::NotFound {
                        resource: model.binding_name().to_string(),
                    })?;
                debug!("Updated {} {}", model.binding_name(), id_of(&updated));
                Ok(EngineResponse::ok(output(model, Operation::Update, &updated)))
            }

            OpCode::Delete => {
                let record = loaded(resource)?;
                if !self.storage.delete_one(collection, &by_id(&record)?).await? {
                    return Err(Error::NotFound {
                        resource: model.binding_name().to_string(),
                    });
                }
                debug!("Deleted {} {}", model.binding_name(), id_of(&record));
                Ok(EngineResponse::no_content())
            }
        }
    }

    fn rule(&self) -> Result<&PermissionRule> {
        self.route.rule(self.op).ok_or_else(|| Error::NotFound {
            resource: format!("{} {}", self.op, self.route.path),
        })
    }

    /// 검증 실패한 자격 증명 처리
    ///
    /// 규칙이 `req_user`를 참조할 때만 401이고, 그 외에는 익명으로 진행합니다.
    fn authenticate(&self, rule: &PermissionRule, mut req: EngineRequest) -> Result<EngineRequest> {
        if let PrincipalState::Rejected(reason) = &req.principal {
            if rule.requires_principal() {
                return Err(Error::Unauthorized {
                    reason: reason.clone(),
                });
            }
            debug!("Ignoring rejected credential for {} {}: {}", self.op, self.route.path, reason);
            req.principal = PrincipalState::Anonymous;
        }
        Ok(req)
    }
}

fn loaded(resource: Option<Record>) -> Result<Record> {
    resource.ok_or_else(|| Error::NotFound {
        resource: "resource".to_string(),
    })
}

fn by_id(record: &Record) -> Result<Filter> {
    let id = record
        .get(ID_FIELD)
        .filter(|id| !id.is_null())
        .ok_or_else(|| Error::storage("stored record has no identifier"))?;

    let mut filter = Filter::new();
    filter.insert(ID_FIELD.to_string(), id.clone());
    Ok(filter)
}

fn id_of(record: &Record) -> &str {
    record.get(ID_FIELD).and_then(Value::as_str).unwrap_or("?")
}

fn output(model: &ModelSpec, op: Operation, record: &Record) -> Value {
    Value::Object(shape_output(model, op, record))
}
