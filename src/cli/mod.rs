pub mod args;
pub mod commands;

pub use args::{ConfigArgs, PassArgs, PlanArgs, ReportFormat, RunArgs};
use crate::core::config::ConfigLoader;
use crate::core::error::DefaultErrorReporter;
use clap::{Parser, Subcommand};
use std::process::ExitCode;

const HELP_TEMPLATE: &str = "\
{name} {version}\n\
{about-with-newline}\n\
USAGE:\n    {usage}\n\
\nOPTIONS:\n{options}\n\
MIGRATION COMMANDS:\n{subcommands}\n\
{after-help}";

#[derive(Parser)]
#[command(name = "firemigrate")]
#[command(version = crate::VERSION)]
#[command(about = "Migrate the improv games MongoDB database into Firestore")]
#[command(help_template = HELP_TEMPLATE)]
#[command(args_conflicts_with_subcommands = true)]
#[command(after_long_help = long_help())]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub run: RunArgs,
}

fn long_help() -> String {
    let mut help = String::from(
        "Typical flow: check `plan`, rehearse with `--dry-run`, then run for real. \
         Without a subcommand firemigrate runs the full migration.\n\nENVIRONMENT:\n",
    );
    for doc in ConfigLoader::env_var_documentation() {
        help.push_str("    ");
        help.push_str(doc);
        help.push('\n');
    }
    help.push_str("\nBlank values are ignored. A .env file in the working directory is loaded first.");
    help
}

impl Args {
    /// The selected subcommand, or a full run built from the top-level flags.
    pub fn command_or_default(self) -> Command {
        self.command.unwrap_or(Command::Run(self.run))
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    #[command(
        about = "Migrate every collection, then run the post-processing passes",
        long_about = "Run reads each source collection in dependency order, rewrites references into document paths, nests names, votes, invites and histories under their parents, writes every record to Firestore and finally derives game names and slugs.",
        after_help = "Examples:\n    firemigrate run --dry-run\n    firemigrate run --only users,tags --skip-post-processing"
    )]
    Run(RunArgs),
    #[command(
        about = "Copy each game's top-ranked name onto the game",
        long_about = "Rollup scans every game, picks its name with the highest weight (newest first on ties) and writes it to the game's `name` field.",
        after_help = "Example:\n    firemigrate rollup --format json"
    )]
    Rollup(PassArgs),
    #[command(
        about = "Derive URL slugs from game names",
        long_about = "Slugs lower-cases every game's name, replaces spaces with dashes, strips other punctuation and writes the result to `slug`.",
        after_help = "Example:\n    firemigrate slugs"
    )]
    Slugs(PassArgs),
    #[command(
        about = "Show where each collection will be written",
        long_about = "Plan resolves configuration without touching either database and prints the placement of every configured collection.",
        after_help = "Example:\n    firemigrate plan --config ./firemigrate.toml"
    )]
    Plan(PlanArgs),
}

impl Command {
    pub fn config_args(&self) -> &ConfigArgs {
        match self {
            Command::Run(args) => &args.config,
            Command::Rollup(args) | Command::Slugs(args) => &args.config,
            Command::Plan(args) => &args.config,
        }
    }
}

/// Run `command`, reporting any failure once before mapping it to an exit code.
pub async fn run(command: Command) -> ExitCode {
    let result = match command {
        Command::Run(run_args) => commands::run(run_args).await,
        Command::Rollup(pass_args) => commands::rollup(pass_args).await,
        Command::Slugs(pass_args) => commands::slugs(pass_args).await,
        Command::Plan(plan_args) => commands::plan(plan_args).await,
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            commands::report_failure(&DefaultErrorReporter::new(), err);
            ExitCode::FAILURE
        }
    }
}
