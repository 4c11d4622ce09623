//! 전송 계층 독립 요청/응답
//!
//! HTTP 계층은 경로 파라미터, 본문, 인증 상태만 넘기고 상태 코드와 본문을 돌려받습니다.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use serde_json::{json, Value};

use crate::auth::PrincipalState;
use crate::error::{Error, Result};
use crate::schema::OpCode;

/// HTTP 메서드
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    /// 작업 코드에 대응하는 메서드
    pub fn for_op(op: OpCode) -> Self {
        match op {
            OpCode::Create => Method::Post,
            OpCode::ReadAll | OpCode::Read => Method::Get,
            OpCode::Update => Method::Put,
            OpCode::Delete => Method::Delete,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 엔진 요청
#[derive(Debug, Clone, Default)]
pub struct EngineRequest {
    /// 경로 파라미터
    pub params: HashMap<String, String>,

    /// 파싱된 본문 (없으면 None)
    pub body: Option<Value>,

    /// 인증 상태
    pub principal: PrincipalState,
}

impl EngineRequest {
    pub fn new(principal: PrincipalState) -> Self {
        Self {
            principal,
            ..Default::default()
        }
    }

    /// 경로 파라미터 추가
    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(name.into(), value.into());
        self
    }

    /// 본문 설정
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// 원시 본문 파싱
///
/// 빈 본문은 `None`, 잘못된 JSON은 `InvalidBody`입니다.
pub fn parse_body(bytes: &[u8]) -> Result<Option<Value>> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(None);
    }
    serde_json::from_slice(bytes)
        .map(Some)
        .map_err(|e| Error::InvalidBody {
            message: e.to_string(),
        })
}

/// 엔진 응답
#[derive(Debug, Clone, PartialEq)]
pub struct EngineResponse {
    /// 상태 코드
    pub status: u16,

    /// 응답 본문 (`204`는 None)
    pub body: Option<Value>,
}

impl EngineResponse {
    pub fn ok(body: Value) -> Self {
        Self {
            status: 200,
            body: Some(body),
        }
    }

    pub fn created(body: Value) -> Self {
        Self {
            status: 201,
            body: Some(body),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            body: None,
        }
    }

    /// 에러 응답 (내부 상세는 싣지 않음)
    pub fn from_error(error: &Error) -> Self {
        Self {
            status: error.status_code(),
            body: Some(json!({
                "error": {
                    "code": error.code(),
                    "message": error.public_message(),
                }
            })),
        }
    }
}
