//! check 명령어

use std::path::Path;

use mk_core::engine::RouteGenerator;

pub fn run(path: &Path) -> anyhow::Result<()> {
    let compiled = super::load(path)?;
    let endpoints = RouteGenerator::plan(&compiled.routes).len();

    println!(
        "{}: OK ({} models, {} routes, {} endpoints)",
        path.display(),
        compiled.catalog.len(),
        compiled.routes.len(),
        endpoints
    );
    Ok(())
}
