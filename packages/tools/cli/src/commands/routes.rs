//! routes 명령어

use std::path::Path;

use mk_core::engine::{RouteGenerator, RouteSummary};

use crate::OutputFormat;

pub fn run(path: &Path, format: OutputFormat) -> anyhow::Result<()> {
    let compiled = super::load(path)?;
    let summaries: Vec<RouteSummary> = RouteGenerator::plan(&compiled.routes)
        .iter()
        .map(|plan| plan.summary())
        .collect();

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        OutputFormat::Text => print!("{}", render_table(&summaries)),
    }
    Ok(())
}

fn render_table(summaries: &[RouteSummary]) -> String {
    if summaries.is_empty() {
        return "No routes.\n".to_string();
    }

    let path_width = summaries
        .iter()
        .map(|s| s.path.len())
        .max()
        .unwrap_or(0)
        .max("PATH".len());

    let mut out = format!(
        "{:<7} {:<path_width$} {:<3} {:<12} ALLOW\n",
        "METHOD", "PATH", "OP", "MODEL"
    );
    for s in summaries {
        let allow = match &s.where_field {
            Some(field) => format!("{} (where {})", s.allow, field),
            None => s.allow.clone(),
        };
        out.push_str(&format!(
            "{:<7} {:<path_width$} {:<3} {:<12} {}\n",
            s.method.as_str(),
            s.path,
            s.op,
            s.model,
            allow
        ));
    }
    out
}
