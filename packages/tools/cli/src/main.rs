//! Modelkit CLI (`mk`)
//!
//! 서버를 띄우지 않고 모델/라우트 설정을 검증하고 생성될 엔드포인트를 확인합니다.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mk")]
#[command(author, version, about = "Modelkit CLI - validate models and inspect generated routes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a models/routes configuration file
    Check {
        /// Configuration file
        #[arg(long, default_value = "config/models.yaml")]
        config: PathBuf,
    },

    /// List the endpoints a configuration generates
    Routes {
        /// Configuration file
        #[arg(long, default_value = "config/models.yaml")]
        config: PathBuf,

        /// Output format
        #[arg(long, default_value = "text")]
        format: OutputFormat,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check { config } => commands::check::run(&config),
        Commands::Routes { config, format } => commands::routes::run(&config, format),
    }
}
