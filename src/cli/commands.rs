use crate::cli::args::{ConfigArgs, PassArgs, PlanArgs, ReportFormat, RunArgs};
use crate::core::config::{ConfigLoader, ConfigValidator, MigrationConfig};
use crate::core::error::{AppError, DefaultErrorReporter, ErrorReporter};
use crate::core::migrator::{order_collections, MigrationReport, Migrator};
use crate::core::placement::{describe, PlacementRouter};
use crate::core::postprocess::{run_pass, PassSummary};
use crate::core::types::{ErrorCategory, PassKind};
use crate::source::MongoSource;
use crate::target::{DocumentStore, FirestoreStore, MemoryStore};
use crate::Result;
use std::env;

/// Resolve configuration: defaults, then file, then environment.
pub fn load_config(args: &ConfigArgs) -> Result<MigrationConfig> {
    let working_dir = env::current_dir()?;
    let config = ConfigLoader::load(args.config.as_deref(), &working_dir)?;
    ConfigValidator::validate(&config)?;
    Ok(config)
}

pub async fn run(args: RunArgs) -> Result<()> {
    tracing::info!(dry_run = args.dry_run, "Starting migration run");

    let config = load_config(&args.config)?;
    let reporter = DefaultErrorReporter::new();
    tracing::info!(uri = %config.mongo.redacted_uri(), "connecting to source");
    let source = MongoSource::connect(&config.mongo).await?;

    let post_process = !args.skip_post_processing;
    let report = if args.dry_run {
        let store = MemoryStore::new();
        let report = migrate(&source, &store, &reporter, &config, &args.only, post_process, true).await?;
        tracing::info!(documents = store.len(), "dry run finished; nothing was written");
        report
    } else {
        let store = FirestoreStore::connect(&config.firestore)?;
        migrate(&source, &store, &reporter, &config, &args.only, post_process, false).await?
    };

    print_report(&report, args.format)
}

async fn migrate(
    source: &MongoSource,
    store: &dyn DocumentStore,
    reporter: &DefaultErrorReporter,
    config: &MigrationConfig,
    only: &[String],
    post_process: bool,
    dry_run: bool,
) -> Result<MigrationReport> {
    let mut migrator = Migrator::new(source, store, reporter, config.migration.clone()).dry_run(dry_run);
    Ok(migrator.run(only, post_process).await?)
}

fn print_report(report: &MigrationReport, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Text => println!("{}", report.render_text()),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(report)?),
    }
    Ok(())
}

pub async fn rollup(args: PassArgs) -> Result<()> {
    run_single_pass(PassKind::Rollup, args).await
}

pub async fn slugs(args: PassArgs) -> Result<()> {
    run_single_pass(PassKind::Slug, args).await
}

async fn run_single_pass(kind: PassKind, args: PassArgs) -> Result<()> {
    tracing::info!(pass = %kind, "Starting post-processing pass");
    let config = load_config(&args.config)?;
    let reporter = DefaultErrorReporter::new();
    let store = FirestoreStore::connect(&config.firestore)?;
    let summary = run_pass(kind, &store, &reporter).await?;
    print_pass(&summary, args.format)
}

fn print_pass(summary: &PassSummary, format: ReportFormat) -> Result<()> {
    match format {
        ReportFormat::Text => println!(
            "{} pass: scanned {}, updated {}, skipped {}",
            summary.pass, summary.scanned, summary.updated, summary.skipped
        ),
        ReportFormat::Json => println!("{}", serde_json::to_string_pretty(summary)?),
    }
    Ok(())
}

/// Report a failed command once, in the operator-facing format.
pub fn report_failure(reporter: &dyn ErrorReporter, err: anyhow::Error) {
    let err = match err.downcast::<AppError>() {
        Ok(err) => err,
        Err(other) => AppError::new(ErrorCategory::InternalError, format!("{:#}", other))
            .with_code("FIREMIGRATE-001"),
    };
    reporter.report_error(&err);
}

pub async fn plan(args: PlanArgs) -> Result<()> {
    let config = load_config(&args.config)?;
    let router = PlacementRouter::default();

    let ordered = order_collections(&config.migration.collection_order, &config.migration);
    for (index, collection) in ordered.iter().enumerate() {
        println!("{:>2}. {}", index + 1, describe(collection, router.rule_for(collection)));
    }
    println!("Other collections follow in lexical order as top-level collections.");
    println!("Skipped: {}", config.migration.blacklist.join(", "));
    if !config.migration.post_process {
        println!("Post-processing: disabled");
    }
    Ok(())
}
