//! Bridge 설정

use std::env;
use std::path::PathBuf;

use mk_core::auth::TokenValidator;

/// 저장소 위치
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageUrl {
    /// 프로세스 메모리 (재시작 시 초기화)
    Memory,

    /// SQLite (`sqlite://path` 또는 `sqlite::memory:`)
    Sqlite(String),
}

impl StorageUrl {
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() || raw == "memory" {
            return Ok(StorageUrl::Memory);
        }
        if raw.starts_with("sqlite:") {
            return Ok(StorageUrl::Sqlite(raw.to_string()));
        }
        anyhow::bail!("unsupported MK_STORAGE_URL '{}' (expected 'memory' or 'sqlite://...')", raw)
    }
}

/// Bridge 설정
#[derive(Debug, Clone)]
pub struct Config {
    /// 서버 포트
    pub port: u16,

    /// 모델/라우트 설정 파일
    pub models_path: PathBuf,

    /// 저장소
    pub storage_url: StorageUrl,

    /// PASETO keys
    pub paseto_keys: Vec<String>,

    /// Auth 비활성화 (개발용, 개발 토큰 디코딩 강제)
    pub disable_auth: bool,
}

impl Config {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            port: env::var("MK_BRIDGE_PORT")
                .unwrap_or_else(|_| "3000".to_string())
                .parse()?,

            models_path: env::var("MK_MODELS_PATH")
                .unwrap_or_else(|_| "config/models.yaml".to_string())
                .into(),

            storage_url: StorageUrl::parse(
                &env::var("MK_STORAGE_URL").unwrap_or_else(|_| "memory".to_string()),
            )?,

            paseto_keys: env::var("MK_PASETO_KEYS")
                .ok()
                .map(|v| {
                    v.split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect::<Vec<_>>()
                })
                .unwrap_or_default(),

            disable_auth: env::var("MK_DISABLE_AUTH")
                .unwrap_or_else(|_| "false".to_string())
                .parse()
                .unwrap_or(false),
        })
    }

    /// 토큰 검증기 구성
    pub fn token_validator(&self) -> TokenValidator {
        if self.disable_auth {
            TokenValidator::new(Vec::new())
        } else {
            TokenValidator::new(self.paseto_keys.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_url() {
        assert_eq!(StorageUrl::parse("memory").unwrap(), StorageUrl::Memory);
        assert_eq!(StorageUrl::parse("").unwrap(), StorageUrl::Memory);
        assert_eq!(
            StorageUrl::parse("sqlite://data/app.db").unwrap(),
            StorageUrl::Sqlite("sqlite://data/app.db".to_string())
        );
        assert!(StorageUrl::parse("postgres://localhost").is_err());
    }

    #[test]
    fn test_disable_auth_forces_dev_tokens() {
        let config = Config {
            port: 3000,
            models_path: "config/models.yaml".into(),
            storage_url: StorageUrl::Memory,
            paseto_keys: vec!["0".repeat(64)],
            disable_auth: true,
        };
        assert!(config.token_validator().is_development());

        let strict = Config {
            disable_auth: false,
            ..config
        };
        assert!(!strict.token_validator().is_development());
    }
}
