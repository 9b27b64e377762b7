use clap::Args;
use std::path::PathBuf;

#[derive(Args, Clone, Debug, Default)]
pub struct ConfigArgs {
    /// Configuration file (default: ./firemigrate.toml when present)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Args, Clone, Debug, Default)]
pub struct RunArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Read the source but write into memory instead of Firestore
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the rollup and slug passes after placement
    #[arg(long)]
    pub skip_post_processing: bool,

    /// Migrate only these collections (repeatable or comma separated)
    #[arg(long, value_name = "COLLECTION", value_delimiter = ',')]
    pub only: Vec<String>,

    /// Emit the final report as terminal-friendly text or machine-readable JSON
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: ReportFormat,
}

#[derive(Args, Clone, Debug, Default)]
pub struct PassArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Emit the pass summary as text or JSON
    #[arg(long, default_value = "text", value_name = "FORMAT")]
    pub format: ReportFormat,
}

#[derive(Args, Clone, Debug, Default)]
pub struct PlanArgs {
    #[command(flatten)]
    pub config: ConfigArgs,
}

#[derive(Clone, Copy, clap::ValueEnum, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}
