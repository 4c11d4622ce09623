//! 공통 에러 타입
//!
//! Modelkit 전체에서 사용되는 에러 타입을 정의합니다.
//! 스키마 에러는 시작 시점에만 발생하며, 나머지는 요청 단위로 HTTP 상태 코드에 매핑됩니다.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Modelkit 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Schema Errors (startup-fatal)
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("schema validation error: {message}")]
    SchemaValidation { message: String },

    #[error("invalid field type '{type_name}' on {model}.{field}")]
    InvalidFieldType {
        model: String,
        field: String,
        type_name: String,
    },

    #[error("invalid operations '{operations}' on {model}.{field}")]
    InvalidOperations {
        model: String,
        field: String,
        operations: String,
    },

    #[error("invalid permission expression '{expression}': {reason}")]
    InvalidExpression { expression: String, reason: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Request Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("invalid value for field '{field}': {message}")]
    Validation { field: String, message: String },

    #[error("invalid request body: {message}")]
    InvalidBody { message: String },

    #[error("authentication required: {reason}")]
    Unauthorized { reason: String },

    #[error("access denied: {reason}")]
    Forbidden { reason: String },

    #[error("{resource} not found")]
    NotFound { resource: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Collaborator Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("storage error: {message}")]
    Storage { message: String },

    #[error("token expired")]
    TokenExpired,

    #[error("invalid token: {reason}")]
    InvalidToken { reason: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // IO/Serialization Errors
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// 스키마 검증 에러 생성 헬퍼
    pub fn schema(message: impl Into<String>) -> Self {
        Error::SchemaValidation {
            message: message.into(),
        }
    }

    /// 스토리지 에러 생성 헬퍼
    pub fn storage(message: impl Into<String>) -> Self {
        Error::Storage {
            message: message.into(),
        }
    }

    /// 시작 시점 설정 에러인지 여부
    pub fn is_schema_error(&self) -> bool {
        matches!(
            self,
            Error::SchemaValidation { .. }
                | Error::InvalidFieldType { .. }
                | Error::InvalidOperations { .. }
                | Error::InvalidExpression { .. }
                | Error::Yaml(_)
        )
    }

    /// HTTP 상태 코드로 변환
    pub fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request
            Error::Validation { .. } | Error::InvalidBody { .. } | Error::Json(_) => 400,

            // 401 Unauthorized
            Error::Unauthorized { .. } | Error::TokenExpired | Error::InvalidToken { .. } => 401,

            // 403 Forbidden
            Error::Forbidden { .. } => 403,

            // 404 Not Found
            Error::NotFound { .. } => 404,

            // 500 Internal Server Error
            _ => 500,
        }
    }

    /// 에러 코드 (클라이언트용)
    pub fn code(&self) -> &'static str {
        match self {
            Error::SchemaValidation { .. } => "SCHEMA_VALIDATION_ERROR",
            Error::InvalidFieldType { .. } => "INVALID_FIELD_TYPE",
            Error::InvalidOperations { .. } => "INVALID_OPERATIONS",
            Error::InvalidExpression { .. } => "INVALID_EXPRESSION",
            Error::Validation { .. } => "VALIDATION_ERROR",
            Error::InvalidBody { .. } => "INVALID_BODY",
            Error::Unauthorized { .. } => "UNAUTHORIZED",
            Error::Forbidden { .. } => "FORBIDDEN",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::Storage { .. } => "STORAGE_ERROR",
            Error::TokenExpired => "TOKEN_EXPIRED",
            Error::InvalidToken { .. } => "INVALID_TOKEN",
            Error::Yaml(_) => "YAML_ERROR",
            Error::Json(_) => "JSON_ERROR",
        }
    }

    /// 클라이언트에 노출할 메시지
    ///
    /// 스토리지 등 내부 인프라 에러의 상세는 응답에 싣지 않습니다.
    pub fn public_message(&self) -> String {
        match self {
            Error::Storage { .. } => "storage operation failed".to_string(),
            e if e.status_code() >= 500 => "internal error".to_string(),
            e => e.to_string(),
        }
    }
}
