//! mk-core: Modelkit 공통 핵심 라이브러리
//!
//! 선언적 모델/라우트 설정을 CRUD 엔드포인트로 바꾸는 엔진입니다.
//! Bridge(HTTP 서비스)와 CLI가 이 크레이트를 공유합니다.
//!
//! # 모듈 구조
//!
//! - `schema`: 모델 스키마 정의, 설정 파싱, 모델 카탈로그
//! - `shape`: 작업별 입력/출력 값 정형화
//! - `permissions`: 권한 표현식 파싱 및 평가, 라우트 바인딩
//! - `engine`: 컨텍스트 바인딩, 요청 처리 단계, 라우트 생성
//! - `storage`: 저장소 인터페이스와 인메모리 드라이버
//! - `auth`: 인증 토큰 구조 및 검증 로직
//! - `config`: 설정 파일 루트
//! - `error`: 공통 에러 타입
//! - `id`: ObjectId

pub mod auth;
pub mod config;
pub mod engine;
pub mod error;
pub mod id;
pub mod permissions;
pub mod schema;
pub mod shape;
pub mod storage;

pub use config::{register_config, ApiConfig, CompiledConfig};
pub use error::{Error, Result};
