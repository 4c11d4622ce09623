//! 인증 관련 타입 및 로직
//!
//! 엔진은 인증 결과만 소비합니다. 자격 증명 검증은 이 모듈의 `TokenValidator`가 맡고,
//! 결과는 `PrincipalState`로 요청에 붙습니다.
//!
//! # 토큰
//!
//! - **Access Token**: PASETO v4.local (암호화), `MK_PASETO_KEYS`로 키 설정
//! - **개발 토큰**: 키가 없을 때 `json:{...}` 또는 base64 JSON

mod claims;
mod token;

pub use claims::AccessTokenClaims;
pub use token::{bearer_token, PrincipalState, TokenValidator};
