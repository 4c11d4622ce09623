//! 라우트 생성기
//!
//! 라우트 바인딩마다 규칙이 있는 작업에 대해서만 엔드포인트를 만듭니다.
//! 규칙이 없는 작업은 "거부"가 아니라 "존재하지 않음"입니다.

use std::sync::Arc;

use serde::Serialize;

use super::handler::ResourceHandler;
use super::request::Method;
use crate::permissions::RouteBinding;
use crate::schema::OpCode;
use crate::storage::Storage;

/// 엔드포인트 계획 (저장소 없이 계산 가능)
#[derive(Debug, Clone)]
pub struct RoutePlan {
    pub method: Method,

    /// 경로 템플릿 (`/users/:_id`)
    pub path: String,

    pub op: OpCode,

    pub route: Arc<RouteBinding>,
}

impl RoutePlan {
    /// 출력용 요약
    pub fn summary(&self) -> RouteSummary {
        let rule = self.route.rule(self.op);
        RouteSummary {
            method: self.method,
            path: self.path.clone(),
            op: self.op.code(),
            model: self.route.model.name.clone(),
            allow: rule.map(|r| r.expression.to_string()).unwrap_or_default(),
            where_field: rule
                .and_then(|r| r.where_binding.as_ref())
                .map(|w| w.field.clone()),
        }
    }
}

/// 엔드포인트 요약
#[derive(Debug, Clone, Serialize)]
pub struct RouteSummary {
    pub method: Method,
    pub path: String,
    pub op: &'static str,
    pub model: String,
    pub allow: String,
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_field: Option<String>,
}

/// 생성된 엔드포인트
#[derive(Clone)]
pub struct GeneratedRoute {
    pub method: Method,
    pub path: String,
    pub op: OpCode,
    pub handler: ResourceHandler,
}

/// 라우트 생성기
pub struct RouteGenerator;

impl RouteGenerator {
    /// 엔드포인트 계획 (라우트 순서, 작업 코드 순서)
    pub fn plan(routes: &[Arc<RouteBinding>]) -> Vec<RoutePlan> {
        let mut plans = Vec::new();

        for route in routes {
            for op in route.rules.keys().copied() {
                let path = if op.targets_single() {
                    match route.item_path() {
                        Some(path) => path,
                        None => continue,
                    }
                } else {
                    route.path.clone()
                };

                plans.push(RoutePlan {
                    method: Method::for_op(op),
                    path,
                    op,
                    route: route.clone(),
                });
            }
        }

        plans
    }

    /// 핸들러가 붙은 엔드포인트 생성
    pub fn generate(routes: &[Arc<RouteBinding>], storage: Arc<dyn Storage>) -> Vec<GeneratedRoute> {
        Self::plan(routes)
            .into_iter()
            .filter_map(|plan| {
                let handler = ResourceHandler::new(plan.route, plan.op, storage.clone())?;
                Some(GeneratedRoute {
                    method: plan.method,
                    path: plan.path,
                    op: plan.op,
                    handler,
                })
            })
            .collect()
    }
}
