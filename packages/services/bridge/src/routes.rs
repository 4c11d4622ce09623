//! 생성된 엔드포인트를 axum 라우터로 등록

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::Path,
    routing::{MethodFilter, MethodRouter},
    Extension, Router,
};
use mk_core::auth::PrincipalState;
use mk_core::engine::{GeneratedRoute, Method, RouteGenerator};

use crate::handlers::resource::{dispatch, not_found};
use crate::state::AppState;

/// 리소스 라우터 생성
///
/// 같은 경로의 엔드포인트는 하나의 `MethodRouter`로 묶습니다.
/// 등록되지 않은 메서드는 405가 아니라 404로 응답합니다.
pub fn resource_router(state: &AppState) -> Router<Arc<AppState>> {
    let generated = RouteGenerator::generate(&state.routes, state.storage.clone());
    tracing::info!(
        "Generated {} endpoints for {} models",
        generated.len(),
        state.catalog.len()
    );

    let mut grouped: BTreeMap<String, MethodRouter<Arc<AppState>>> = BTreeMap::new();
    for route in generated {
        let path = axum_path(&route.path);
        tracing::debug!("Registering {} {}", route.method, route.path);

        let method_router = grouped.remove(&path).unwrap_or_else(MethodRouter::new);
        grouped.insert(path, register(method_router, route));
    }

    grouped
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            router.route(&path, method_router.fallback(not_found))
        })
}

fn register(
    method_router: MethodRouter<Arc<AppState>>,
    route: GeneratedRoute,
) -> MethodRouter<Arc<AppState>> {
    let filter = method_filter(route.method);
    let handler = route.handler;

    if route.op.targets_single() {
        method_router.on(
            filter,
            move |Extension(principal): Extension<PrincipalState>,
                  Path(params): Path<HashMap<String, String>>,
                  body: Bytes| {
                let handler = handler.clone();
                async move { dispatch(&handler, principal, params, body).await }
            },
        )
    } else {
        method_router.on(
            filter,
            move |Extension(principal): Extension<PrincipalState>, body: Bytes| {
                let handler = handler.clone();
                async move { dispatch(&handler, principal, HashMap::new(), body).await }
            },
        )
    }
}

fn method_filter(method: Method) -> MethodFilter {
    match method {
        Method::Get => MethodFilter::GET,
        Method::Post => MethodFilter::POST,
        Method::Put => MethodFilter::PUT,
        Method::Delete => MethodFilter::DELETE,
    }
}

/// `/users/:_id` → `/users/{_id}`
fn axum_path(path: &str) -> String {
    path.split('/')
        .map(|segment| match segment.strip_prefix(':') {
            Some(param) => format!("{{{}}}", param),
            None => segment.to_string(),
        })
        .collect::<Vec<_>>()
        .join("/")
}
