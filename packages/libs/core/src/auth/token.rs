//! 토큰 검증 및 유틸리티
//!
//! Bridge에서 토큰을 검증하는 로직입니다.

use crate::error::{Error, Result};

use super::claims::AccessTokenClaims;
use base64::{engine::general_purpose, Engine as _};
use rusty_paseto::prelude::*;
use tracing::debug;

/// `Authorization: Bearer ...` 헤더에서 토큰 추출
pub fn bearer_token(auth_header: Option<&str>) -> Option<&str> {
    let token = auth_header?.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// 요청 주체 상태
///
/// 인증 미들웨어가 요청에 붙이고, 라우트 핸들러가 규칙에 따라 해석합니다.
#[derive(Debug, Clone, Default)]
pub enum PrincipalState {
    /// 검증된 토큰
    Authenticated(AccessTokenClaims),

    /// 자격 증명 없음
    #[default]
    Anonymous,

    /// 자격 증명이 있었지만 검증 실패
    Rejected(String),
}

impl PrincipalState {
    /// 검증된 claims
    pub fn claims(&self) -> Option<&AccessTokenClaims> {
        match self {
            PrincipalState::Authenticated(claims) => Some(claims),
            _ => None,
        }
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, PrincipalState::Rejected(_))
    }
}

/// 토큰 검증기
///
/// 키가 설정되어 있으면 PASETO v4.local만 받고,
/// 없으면 개발용 디코딩(`json:` 접두사, base64 JSON)을 사용합니다.
#[derive(Debug, Clone, Default)]
pub struct TokenValidator {
    /// PASETO 복호화 키 (현재 + 이전 키들)
    symmetric_keys: Vec<String>,
}

impl TokenValidator {
    /// 새 검증기 생성
    pub fn new(symmetric_keys: Vec<String>) -> Self {
        Self { symmetric_keys }
    }

    /// 개발용 디코딩 모드인지
    pub fn is_development(&self) -> bool {
        self.symmetric_keys.is_empty()
    }

    /// Authorization 헤더로 요청 주체 결정
    pub fn authenticate(&self, auth_header: Option<&str>) -> PrincipalState {
        let Some(token) = bearer_token(auth_header) else {
            return match auth_header {
                Some(_) => PrincipalState::Rejected("malformed authorization header".to_string()),
                None => PrincipalState::Anonymous,
            };
        };

        match self.validate_access_token(token) {
            Ok(claims) => PrincipalState::Authenticated(claims),
            Err(e) => {
                debug!("Token rejected: {}", e);
                PrincipalState::Rejected(e.to_string())
            }
        }
    }

    /// Access Token 검증 및 Claims 추출
    ///
    /// 만료된 토큰은 `TokenExpired`입니다.
    pub fn validate_access_token(&self, token: &str) -> Result<AccessTokenClaims> {
        let claims = self.decode(token.trim())?;
        if claims.is_expired() {
            return Err(Error::TokenExpired);
        }
        Ok(claims)
    }

    fn decode(&self, token: &str) -> Result<AccessTokenClaims> {
        if !self.symmetric_keys.is_empty() {
            if let Some(claims) = self.validate_paseto(token)? {
                return Ok(claims);
            }
            return Err(Error::InvalidToken {
                reason: "paseto validation failed".to_string(),
            });
        }

        // 1) json: prefix (테스트/개발용)
        if let Some(raw) = token.strip_prefix("json:") {
            return serde_json::from_str(raw).map_err(|e| Error::InvalidToken {
                reason: e.to_string(),
            });
        }

        // 2) base64url (no padding) -> JSON
        if let Ok(bytes) = general_purpose::URL_SAFE_NO_PAD.decode(token) {
            if let Ok(claims) = serde_json::from_slice::<AccessTokenClaims>(&bytes) {
                return Ok(claims);
            }
        }

        // 3) base64 (standard) -> JSON
        if let Ok(bytes) = general_purpose::STANDARD.decode(token) {
            if let Ok(claims) = serde_json::from_slice::<AccessTokenClaims>(&bytes) {
                return Ok(claims);
            }
        }

        Err(Error::InvalidToken {
            reason: "unable to decode access token".to_string(),
        })
    }

    fn validate_paseto(&self, token: &str) -> Result<Option<AccessTokenClaims>> {
        for key in &self.symmetric_keys {
            let Some(key_bytes) = parse_key_material(key) else {
                continue;
            };

            let key = PasetoSymmetricKey::<V4, Local>::from(Key::from(key_bytes));
            let parsed = PasetoParser::<V4, Local>::default().parse(token, &key);

            match parsed {
                Ok(value) => {
                    let claims: AccessTokenClaims =
                        serde_json::from_value(value).map_err(|e| Error::InvalidToken {
                            reason: e.to_string(),
                        })?;
                    return Ok(Some(claims));
                }
                Err(_) => continue,
            }
        }

        Ok(None)
    }
}

fn parse_key_material(raw: &str) -> Option<[u8; 32]> {
    let trimmed = raw.trim();

    if trimmed.len() == 64 {
        let mut key = [0u8; 32];
        if hex::decode_to_slice(trimmed, &mut key).is_ok() {
            return Some(key);
        }
    }

    if let Ok(bytes) = general_purpose::URL_SAFE_NO_PAD.decode(trimmed) {
        if bytes.len() == 32 {
            return bytes.as_slice().try_into().ok();
        }
    }

    if let Ok(bytes) = general_purpose::STANDARD.decode(trimmed) {
        if bytes.len() == 32 {
            return bytes.as_slice().try_into().ok();
        }
    }

    let raw_bytes = trimmed.as_bytes();
    if raw_bytes.len() == 32 {
        return raw_bytes.try_into().ok();
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token(Some("Bearer mytoken")), Some("mytoken"));
        assert_eq!(bearer_token(Some("Basic abc")), None);
        assert_eq!(bearer_token(Some("Bearer ")), None);
        assert_eq!(bearer_token(None), None);
    }

    #[test]
    fn test_dev_json_token() {
        let validator = TokenValidator::default();
        assert!(validator.is_development());

        let state = validator.authenticate(Some(r#"Bearer json:{"_id":"u1","roles":["admin"]}"#));
        let claims = state.claims().unwrap();
        assert_eq!(claims.id, "u1");
        assert_eq!(claims.roles, vec!["admin".to_string()]);
    }

    #[test]
    fn test_dev_base64_token() {
        let validator = TokenValidator::default();
        let token = general_purpose::URL_SAFE_NO_PAD.encode(r#"{"sub":"u2"}"#);
        let claims = validator.validate_access_token(&token).unwrap();
        assert_eq!(claims.id, "u2");
    }

    #[test]
    fn test_anonymous_and_rejected() {
        let validator = TokenValidator::default();
        assert!(matches!(validator.authenticate(None), PrincipalState::Anonymous));
        assert!(validator.authenticate(Some("Bearer garbage!")).is_rejected());
        assert!(validator.authenticate(Some("Token abc")).is_rejected());
    }

    #[test]
    fn test_expired_token_rejected() {
        let validator = TokenValidator::default();
        let err = validator
            .validate_access_token(r#"json:{"_id":"u1","exp":"2000-01-01T00:00:00Z"}"#)
            .unwrap_err();
        assert!(matches!(err, Error::TokenExpired));
    }

    #[test]
    fn test_keys_disable_dev_decoding() {
        let validator = TokenValidator::new(vec!["0".repeat(64)]);
        assert!(!validator.is_development());
        assert!(validator
            .validate_access_token(r#"json:{"_id":"u1"}"#)
            .is_err());
    }

    #[test]
    fn test_parse_key_material() {
        assert!(parse_key_material(&"ab".repeat(32)).is_some());
        assert!(parse_key_material("short").is_none());
    }
}
