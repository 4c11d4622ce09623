//! 권한 표현식 AST
//!
//! ```text
//! expr := path "=" path
//! path := "@" identifier ("." identifier)*
//! ```
//!
//! 표현식은 설정 로드 시 한 번 파싱되어 라우트 바인딩에 저장됩니다.
//! 요청 처리 중에는 문자열을 다시 파싱하지 않습니다.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::schema::is_identifier;

/// 컨텍스트 경로 (`@req_user._id`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathExpr {
    /// 컨텍스트 루트 객체 (`@req_user`)
    Root(String),

    /// 필드 투영 (`<path>.name`)
    Field(Box<PathExpr>, String),
}

impl PathExpr {
    /// 루트 이름
    pub fn root(&self) -> &str {
        match self {
            PathExpr::Root(name) => name,
            PathExpr::Field(parent, _) => parent.root(),
        }
    }

    /// 루트 뒤의 필드 이름들 (앞에서부터)
    pub fn segments(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_segments(&mut out);
        out
    }

    fn collect_segments<'a>(&'a self, out: &mut Vec<&'a str>) {
        if let PathExpr::Field(parent, name) = self {
            parent.collect_segments(out);
            out.push(name);
        }
    }

    /// 경로 하나 파싱
    pub fn parse(source: &str) -> Result<Self> {
        let text = source.trim();
        let body = text
            .strip_prefix('@')
            .ok_or_else(|| invalid(source, "path must start with '@'"))?;

        let mut parts = body.split('.');
        let root = parts.next().unwrap_or_default();
        if !is_identifier(root) {
            return Err(invalid(source, format!("invalid root name '{}'", root)));
        }

        let mut path = PathExpr::Root(root.to_string());
        for part in parts {
            if !is_identifier(part) {
                return Err(invalid(source, format!("invalid field name '{}'", part)));
            }
            path = PathExpr::Field(Box::new(path), part.to_string());
        }

        Ok(path)
    }
}

impl fmt::Display for PathExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathExpr::Root(name) => write!(f, "@{}", name),
            PathExpr::Field(parent, name) => write!(f, "{}.{}", parent, name),
        }
    }
}

/// 권한 표현식
///
/// 현재 문법은 동등 비교 하나뿐입니다. 연산자를 추가할 때는 변형을 늘립니다.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    /// `lhs = rhs`
    Eq(PathExpr, PathExpr),
}

impl Expr {
    /// 표현식 파싱
    pub fn parse(source: &str) -> Result<Self> {
        let (lhs, rhs) = source
            .split_once('=')
            .ok_or_else(|| invalid(source, "expected '<path>=<path>'"))?;

        if rhs.contains('=') {
            return Err(invalid(source, "only a single '=' comparison is supported"));
        }

        let lhs = PathExpr::parse(lhs).map_err(|_| invalid(source, "invalid left-hand path"))?;
        let rhs = PathExpr::parse(rhs).map_err(|_| invalid(source, "invalid right-hand path"))?;

        Ok(Expr::Eq(lhs, rhs))
    }

    /// 참조하는 모든 경로
    pub fn paths(&self) -> Vec<&PathExpr> {
        match self {
            Expr::Eq(lhs, rhs) => vec![lhs, rhs],
        }
    }

    /// 참조하는 루트 이름 (중복 제거, 등장 순서)
    pub fn roots(&self) -> Vec<&str> {
        let mut roots: Vec<&str> = Vec::new();
        for path in self.paths() {
            if !roots.contains(&path.root()) {
                roots.push(path.root());
            }
        }
        roots
    }

    /// 특정 루트를 참조하는지
    pub fn references(&self, root: &str) -> bool {
        self.paths().iter().any(|p| p.root() == root)
    }
}

impl FromStr for Expr {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Expr::parse(s)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Eq(lhs, rhs) => write!(f, "{}={}", lhs, rhs),
        }
    }
}

fn invalid(expression: &str, reason: impl Into<String>) -> Error {
    Error::InvalidExpression {
        expression: expression.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_equality() {
        let expr = Expr::parse("@user._id=@req_user._id").unwrap();
        let Expr::Eq(lhs, rhs) = &expr;

        assert_eq!(lhs.root(), "user");
        assert_eq!(lhs.segments(), vec!["_id"]);
        assert_eq!(rhs.root(), "req_user");
        assert_eq!(expr.roots(), vec!["user", "req_user"]);
        assert!(expr.references("req_user"));
        assert!(!expr.references("file"));
    }

    #[test]
    fn test_whitespace_and_display() {
        let expr: Expr = " @req_user._id = @req_user._id ".parse().unwrap();
        assert_eq!(expr.to_string(), "@req_user._id=@req_user._id");
        assert_eq!(expr.roots(), vec!["req_user"]);
    }

    #[test]
    fn test_nested_path() {
        let path = PathExpr::parse("@req_user.profile.org_id").unwrap();
        assert_eq!(path.segments(), vec!["profile", "org_id"]);
        assert_eq!(path.to_string(), "@req_user.profile.org_id");
    }

    #[test]
    fn test_malformed_expressions() {
        for source in [
            "",
            "@user._id",
            "user._id=@req_user._id",
            "@user._id==@req_user._id",
            "@user._id=@req_user.",
            "@user.1x=@req_user._id",
            "@=@req_user._id",
            "@user._id=@req_user._id=@x",
            "@user._id && @req_user._id",
        ] {
            let err = Expr::parse(source).unwrap_err();
            assert!(
                matches!(err, Error::InvalidExpression { .. }),
                "expected InvalidExpression for {:?}",
                source
            );
        }
    }
}
