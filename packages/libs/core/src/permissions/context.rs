//! 요청 컨텍스트
//!
//! 권한 표현식의 `@` 루트가 가리키는 객체들을 담습니다.
//! 요청마다 새로 만들어지고 요청이 끝나면 버려집니다.

use std::collections::HashMap;

use serde_json::Value;

use crate::auth::AccessTokenClaims;
use crate::storage::Record;

/// 인증 주체 루트 이름
pub const REQ_USER: &str = "req_user";

/// 요청 컨텍스트
///
/// # 바인딩
///
/// - `req_user`: 검증된 토큰 claims (인증된 요청에만 존재)
/// - `<label>`: `where`로 로드한 리소스 (예: `user`, `file`)
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    bindings: HashMap<String, Value>,
}

impl RequestContext {
    /// 빈 컨텍스트 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// 인증 주체 설정
    pub fn with_principal(mut self, claims: &AccessTokenClaims) -> Self {
        self.bindings.insert(REQ_USER.to_string(), claims.to_value());
        self
    }

    /// 리소스 바인딩
    pub fn bind(&mut self, name: impl Into<String>, record: Record) {
        self.bindings.insert(name.into(), Value::Object(record));
    }

    /// 루트 객체 조회
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    /// 인증 주체가 있는지
    pub fn has_principal(&self) -> bool {
        self.bindings.contains_key(REQ_USER)
    }

    /// 인증 주체의 `_id`
    pub fn principal_id(&self) -> Option<&Value> {
        self.get(REQ_USER)
            .and_then(|user| user.get(crate::id::ID_FIELD))
            .filter(|id| !id.is_null())
    }
}
