//! 토큰 Claims
//!
//! Access Token의 페이로드 구조입니다.
//! 검증된 claims 객체 전체가 권한 표현식의 `req_user`로 바인딩됩니다.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::ID_FIELD;

/// Access Token Claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// 사용자 ID (`sub`도 허용)
    #[serde(rename = "_id", alias = "sub")]
    pub id: String,

    /// Role 목록
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,

    /// 발급 시각
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<DateTime<Utc>>,

    /// 만료 시각 (없으면 만료되지 않음)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<DateTime<Utc>>,

    /// 그 밖의 claims (`@req_user.<field>`로 참조 가능)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccessTokenClaims {
    /// 새 claims 생성
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            roles: Vec::new(),
            iat: Some(Utc::now()),
            exp: None,
            extra: Map::new(),
        }
    }

    /// 유효 기간 설정
    pub fn with_ttl(mut self, ttl_seconds: i64) -> Self {
        let now = Utc::now();
        self.iat = Some(now);
        self.exp = Some(now + chrono::Duration::seconds(ttl_seconds));
        self
    }

    /// 추가 claim 설정
    pub fn with_claim(mut self, name: impl Into<String>, value: Value) -> Self {
        self.extra.insert(name.into(), value);
        self
    }

    /// 만료 여부 확인
    pub fn is_expired(&self) -> bool {
        self.exp.is_some_and(|exp| Utc::now() > exp)
    }

    /// 권한 컨텍스트용 객체로 변환
    ///
    /// `_id`는 항상 문자열로 포함되고, 추가 claims는 최상위 키로 펼쳐집니다.
    pub fn to_value(&self) -> Value {
        let mut obj = self.extra.clone();
        obj.insert(ID_FIELD.to_string(), Value::String(self.id.clone()));
        obj.insert(
            "roles".to_string(),
            Value::Array(self.roles.iter().cloned().map(Value::String).collect()),
        );
        if let Some(iat) = self.iat {
            obj.insert("iat".to_string(), Value::String(iat.to_rfc3339()));
        }
        if let Some(exp) = self.exp {
            obj.insert("exp".to_string(), Value::String(exp.to_rfc3339()));
        }
        Value::Object(obj)
    }
}
