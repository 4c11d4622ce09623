//! 라우트 생성 및 요청 처리
//!
//! # 모듈 구조
//!
//! - `request`: 전송 계층 독립 요청/응답
//! - `binder`: 컨텍스트 바인더 (`req_user`, `where` 리소스)
//! - `handler`: 작업 하나의 요청 처리 단계
//! - `generator`: 라우트 바인딩 → 엔드포인트 목록

mod binder;
mod generator;
mod handler;
mod request;

pub use binder::{BoundContext, ContextBinder};
pub use generator::{GeneratedRoute, RouteGenerator, RoutePlan, RouteSummary};
pub use handler::ResourceHandler;
pub use request::{parse_body, EngineRequest, EngineResponse, Method};
