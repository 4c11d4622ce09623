//! 권한 평가기
//!
//! 파싱된 표현식을 요청 컨텍스트에 대해 평가합니다.
//! 평가는 실패하지 않습니다. 해석할 수 없는 경로는 항상 거부로 이어집니다.

use serde_json::{Number, Value};

use super::context::RequestContext;
use super::expr::{Expr, PathExpr};
use crate::id::ObjectId;

/// 권한 평가 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalResult {
    /// 허용 여부
    pub allowed: bool,

    /// 거부 사유 (allowed=false인 경우)
    pub reason: Option<String>,
}

impl EvalResult {
    /// 허용 결과 생성
    pub fn allow() -> Self {
        Self {
            allowed: true,
            reason: None,
        }
    }

    /// 거부 결과 생성
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

/// 경로 해석 결과
#[derive(Debug, Clone, PartialEq)]
enum Resolved<'a> {
    Value(&'a Value),
    Unresolved,
}

/// 권한 평가기
pub struct PermissionEvaluator;

impl PermissionEvaluator {
    /// 표현식 평가
    pub fn evaluate(expr: &Expr, ctx: &RequestContext) -> EvalResult {
        match expr {
            Expr::Eq(lhs, rhs) => {
                let left = resolve(lhs, ctx);
                let right = resolve(rhs, ctx);

                match (left, right) {
                    (Resolved::Unresolved, _) => {
                        EvalResult::deny(format!("{} is unresolved", lhs))
                    }
                    (_, Resolved::Unresolved) => {
                        EvalResult::deny(format!("{} is unresolved", rhs))
                    }
                    (Resolved::Value(a), Resolved::Value(b)) => {
                        if values_equal(a, b) {
                            EvalResult::allow()
                        } else {
                            EvalResult::deny(format!("{} does not match", expr))
                        }
                    }
                }
            }
        }
    }

    /// 허용 여부만 반환
    pub fn check(expr: &Expr, ctx: &RequestContext) -> bool {
        Self::evaluate(expr, ctx).allowed
    }
}

/// 경로 해석
///
/// 루트나 중간 필드가 없거나, 객체가 아닌 값을 투영하거나, 결과가 `null`이면 Unresolved입니다.
fn resolve<'a>(path: &PathExpr, ctx: &'a RequestContext) -> Resolved<'a> {
    let value = match path {
        PathExpr::Root(name) => ctx.get(name),
        PathExpr::Field(parent, name) => match resolve(parent, ctx) {
            Resolved::Value(Value::Object(map)) => map.get(name),
            _ => None,
        },
    };

    match value {
        Some(Value::Null) | None => Resolved::Unresolved,
        Some(value) => Resolved::Value(value),
    }
}

/// 같은 타입끼리만 비교
///
/// ObjectId 형태의 문자열은 대소문자 구분 없이 정규 형태로 비교합니다.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::String(x), Value::String(y)) => {
            if ObjectId::is_valid(x) && ObjectId::is_valid(y) {
                x.eq_ignore_ascii_case(y)
            } else {
                x == y
            }
        }
        (Value::Number(x), Value::Number(y)) => numbers_equal(x, y),
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_)) => a == b,
        _ => false,
    }
}

/// 정수끼리는 정확히, 한쪽이라도 실수면 f64로 비교
fn numbers_equal(x: &Number, y: &Number) -> bool {
    if let (Some(a), Some(b)) = (x.as_i64(), y.as_i64()) {
        return a == b;
    }
    if let (Some(a), Some(b)) = (x.as_u64(), y.as_u64()) {
        return a == b;
    }
    if x.is_f64() || y.is_f64() {
        return matches!((x.as_f64(), y.as_f64()), (Some(a), Some(b)) if a == b);
    }
    false
}
