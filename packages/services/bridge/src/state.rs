//! Bridge 앱 상태

use std::sync::Arc;

use anyhow::Context;
use mk_core::auth::TokenValidator;
use mk_core::permissions::RouteBinding;
use mk_core::schema::ModelCatalog;
use mk_core::storage::Storage;
use mk_core::{ApiConfig, CompiledConfig};

use crate::config::Config;

/// 앱 상태
///
/// 시작 시 한 번 만들어지고 이후 읽기 전용입니다.
pub struct AppState {
    /// 모델 카탈로그
    pub catalog: Arc<ModelCatalog>,

    /// 라우트 바인딩
    pub routes: Vec<Arc<RouteBinding>>,

    /// 저장소 드라이버
    pub storage: Arc<dyn Storage>,

    /// 토큰 검증기
    pub validator: TokenValidator,
}

impl AppState {
    /// 설정 파일 로드, 검증, 저장소 연결
    ///
    /// 설정 에러가 있으면 리스너를 열기 전에 실패합니다.
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let yaml = std::fs::read_to_string(&config.models_path).with_context(|| {
            format!("failed to read models file {}", config.models_path.display())
        })?;

        let compiled = ApiConfig::from_yaml(&yaml)
            .and_then(|api| api.compile())
            .with_context(|| format!("invalid configuration in {}", config.models_path.display()))?;

        let collections = compiled
            .catalog
            .iter()
            .map(|model| model.storage_name.clone())
            .collect::<Vec<_>>();
        let storage = crate::storage::connect(&config.storage_url, &collections).await?;

        Ok(Self::from_parts(config, compiled, storage))
    }

    /// 이미 준비된 구성 요소로 상태 생성
    pub fn from_parts(config: &Config, compiled: CompiledConfig, storage: Arc<dyn Storage>) -> Self {
        let validator = config.token_validator();
        if config.disable_auth {
            tracing::warn!("MK_DISABLE_AUTH is set: accepting unsigned development tokens");
        }

        Self {
            catalog: compiled.catalog,
            routes: compiled.routes,
            storage,
            validator,
        }
    }
}
