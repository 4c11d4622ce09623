//! 권한 표현식 파싱 및 평가
//!
//! # 개요
//!
//! 라우트 설정의 작업별 규칙(`@user._id=@req_user._id`)을 시작 시 타입 있는 AST로 파싱하고,
//! 요청마다 바인딩된 컨텍스트에 대해 평가합니다.
//!
//! # 모듈 구조
//!
//! - `expr`: 표현식 AST와 파서
//! - `context`: 요청 컨텍스트
//! - `evaluator`: 권한 평가기
//! - `rule`: 라우트 바인딩과 작업별 규칙

mod context;
mod evaluator;
mod expr;
mod rule;

pub use context::{RequestContext, REQ_USER};
pub use evaluator::{EvalResult, PermissionEvaluator};
pub use expr::{Expr, PathExpr};
pub use rule::{
    PermissionRule, RouteBinding, RouteConfig, RuleConfig, WhereBinding, WhereConfig, HEALTH_PATH,
};
