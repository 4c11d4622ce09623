//! CLI 명령어 구현

pub mod check;
pub mod routes;

use std::path::Path;

use anyhow::Context;
use mk_core::CompiledConfig;

/// 설정 파일 읽기 및 컴파일
pub fn load(path: &Path) -> anyhow::Result<CompiledConfig> {
    let yaml = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    mk_core::register_config(&yaml).with_context(|| format!("invalid configuration in {}", path.display()))
}
