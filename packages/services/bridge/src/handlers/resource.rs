//! 생성된 리소스 엔드포인트 핸들러
//!
//! axum 추출 결과를 엔진 요청으로 옮기고, 엔진 응답을 HTTP 응답으로 바꿉니다.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mk_core::auth::PrincipalState;
use mk_core::engine::{parse_body, EngineRequest, EngineResponse, ResourceHandler};

use crate::error::{BridgeError, Result};

/// 엔드포인트 하나 처리
pub async fn dispatch(
    handler: &ResourceHandler,
    principal: PrincipalState,
    params: HashMap<String, String>,
    body: Bytes,
) -> Result<Response> {
    // 본문을 받지 않는 작업은 본문을 무시
    let body = if handler.op().accepts_body() {
        parse_body(&body).inspect_err(|e| {
            tracing::debug!("{} {} rejected body: {}", handler.op(), handler.route().path, e)
        })?
    } else {
        None
    };

    let req = EngineRequest {
        params,
        body,
        principal,
    };

    let response = handler.execute(req).await?;
    Ok(into_response(response))
}

fn into_response(response: EngineResponse) -> Response {
    let status = StatusCode::from_u16(response.status).unwrap_or(StatusCode::OK);
    match response.body {
        Some(body) => (status, Json(body)).into_response(),
        None => status.into_response(),
    }
}

/// 등록되지 않은 경로나 메서드
pub async fn not_found() -> BridgeError {
    BridgeError::NotFound {
        message: "route not found".to_string(),
    }
}
