//! Bridge 미들웨어
//!
//! 요청 ID 부여와 인증 상태 결정을 맡습니다.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{header::AUTHORIZATION, HeaderValue};
use axum::middleware::Next;
use axum::response::Response;
use mk_core::auth::PrincipalState;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::state::AppState;

#[derive(Clone, Debug)]
pub struct RequestId(#[allow(dead_code)] pub String);

tokio::task_local! {
    static REQUEST_ID: String;
}

pub fn current_request_id() -> Option<String> {
    REQUEST_ID.try_with(|id| id.clone()).ok()
}

pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = Uuid::new_v4().to_string();
    req.extensions_mut().insert(RequestId(id.clone()));
    let mut resp = REQUEST_ID.scope(id.clone(), async move { next.run(req).await }).await;
    if let Ok(value) = HeaderValue::from_str(&id) {
        resp.headers_mut().insert("x-request-id", value);
    }
    resp
}

/// 인증 상태 결정
///
/// 여기서는 요청을 거부하지 않습니다. 401 여부는 작업 규칙을 아는 핸들러가 판단합니다.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Response {
    let principal = match req.headers().get(AUTHORIZATION) {
        None => PrincipalState::Anonymous,
        Some(value) => match value.to_str() {
            Ok(header) => state.validator.authenticate(Some(header)),
            Err(_) => PrincipalState::Rejected("authorization header is not valid ASCII".to_string()),
        },
    };

    match &principal {
        PrincipalState::Authenticated(claims) => debug!("Authenticated principal {}", claims.id),
        PrincipalState::Rejected(reason) => warn!("Credential rejected: {}", reason),
        PrincipalState::Anonymous => {}
    }

    req.extensions_mut().insert(principal);
    next.run(req).await
}
