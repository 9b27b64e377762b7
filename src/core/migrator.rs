//! The migration driver: reads every collection, transforms each record and
//! writes it to its placed path, then runs the post-processing passes.

use crate::core::config::MigrationSettings;
use crate::core::error::{AppError, ErrorReporter};
use crate::core::placement::{PlacementRouter, RouteOutcome};
use crate::core::postprocess::{run_pass, PassSummary};
use crate::core::record::{project_record, SourceRecord};
use crate::core::types::PassKind;
use crate::source::SourceDatabase;
use crate::target::DocumentStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt::Write as _;
use std::time::Duration;

/// Per-collection counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionReport {
    pub name: String,
    pub read: usize,
    pub written: usize,
    pub skipped: usize,
}

/// Outcome of a full run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MigrationReport {
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub collections: Vec<CollectionReport>,
    pub passes: Vec<PassSummary>,
    /// Paths a dry run would have written, in write order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub planned_writes: Vec<String>,
}

impl MigrationReport {
    fn start(dry_run: bool) -> Self {
        let now = Utc::now();
        MigrationReport {
            dry_run,
            started_at: now,
            finished_at: now,
            collections: Vec::new(),
            passes: Vec::new(),
            planned_writes: Vec::new(),
        }
    }

    pub fn total_read(&self) -> usize {
        self.collections.iter().map(|c| c.read).sum()
    }

    pub fn total_written(&self) -> usize {
        self.collections.iter().map(|c| c.written).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.collections.iter().map(|c| c.skipped).sum()
    }

    /// Wall-clock duration, truncated to milliseconds.
    pub fn elapsed(&self) -> Duration {
        let millis = (self.finished_at - self.started_at).num_milliseconds().max(0);
        Duration::from_millis(millis as u64)
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Migration finished in {}{}",
            humantime::format_duration(self.elapsed()),
            if self.dry_run { " (dry run)" } else { "" }
        );
        for collection in &self.collections {
            let _ = writeln!(
                out,
                "  {}: read {}, written {}, skipped {}",
                collection.name, collection.read, collection.written, collection.skipped
            );
        }
        for pass in &self.passes {
            let _ = writeln!(
                out,
                "  {} pass: scanned {}, updated {}, skipped {}",
                pass.pass, pass.scanned, pass.updated, pass.skipped
            );
        }
        if !self.planned_writes.is_empty() {
            let _ = writeln!(out, "  Would write:");
            for path in &self.planned_writes {
                let _ = writeln!(out, "    {}", path);
            }
        }
        let _ = write!(
            out,
            "Total: read {}, written {}, skipped {}",
            self.total_read(),
            self.total_written(),
            self.total_skipped()
        );
        out
    }
}

/// Blacklisted collections are dropped; configured ones come first in their
/// configured order, the rest follow in lexical order.
pub fn order_collections(available: &[String], settings: &MigrationSettings) -> Vec<String> {
    let eligible: Vec<&String> = available
        .iter()
        .filter(|name| !settings.blacklist.contains(name))
        .collect();

    let mut ordered: Vec<String> = settings
        .collection_order
        .iter()
        .filter(|name| eligible.contains(name))
        .cloned()
        .collect();

    let mut remaining: Vec<String> = eligible
        .into_iter()
        .filter(|name| !settings.collection_order.contains(name))
        .cloned()
        .collect();
    remaining.sort();
    remaining.dedup();

    ordered.extend(remaining);
    ordered
}

pub struct Migrator<'a> {
    source: &'a dyn SourceDatabase,
    store: &'a dyn DocumentStore,
    reporter: &'a dyn ErrorReporter,
    settings: MigrationSettings,
    router: PlacementRouter,
    dry_run: bool,
    planned_writes: Vec<String>,
}

impl<'a> Migrator<'a> {
    pub fn new(
        source: &'a dyn SourceDatabase,
        store: &'a dyn DocumentStore,
        reporter: &'a dyn ErrorReporter,
        settings: MigrationSettings,
    ) -> Self {
        Migrator {
            source,
            store,
            reporter,
            settings,
            router: PlacementRouter::default(),
            dry_run: false,
            planned_writes: Vec::new(),
        }
    }

    /// Mark the report as a dry run. The store decides whether anything is persisted.
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Collections a run would process, in processing order.
    pub async fn plan(&self, only: &[String]) -> Result<Vec<String>, AppError> {
        let available = self.source.list_collections().await?;
        let ordered = order_collections(&available, &self.settings);
        if only.is_empty() {
            return Ok(ordered);
        }

        for name in only {
            if !ordered.contains(name) {
                self.reporter.report_warning(
                    &format!("requested collection '{}' is not available", name),
                    None,
                );
            }
        }
        Ok(ordered.into_iter().filter(|name| only.contains(name)).collect())
    }

    pub async fn run(
        &mut self,
        only: &[String],
        post_process: bool,
    ) -> Result<MigrationReport, AppError> {
        let mut report = MigrationReport::start(self.dry_run);
        let collections = self.plan(only).await?;

        self.reporter.report_info(&format!(
            "Importing {} collections. This may take a while...",
            collections.len()
        ));

        for collection in &collections {
            let summary = self.migrate_collection(collection).await?;
            report.collections.push(summary);
        }

        if post_process && self.settings.post_process {
            for kind in [PassKind::Rollup, PassKind::Slug] {
                report.passes.push(run_pass(kind, self.store, self.reporter).await?);
            }
        } else {
            self.reporter.report_debug("post-processing disabled");
        }

        report.planned_writes = std::mem::take(&mut self.planned_writes);
        report.finished_at = Utc::now();
        tracing::info!(
            collections = report.collections.len(),
            written = report.total_written(),
            skipped = report.total_skipped(),
            "migration complete"
        );
        Ok(report)
    }

    async fn migrate_collection(&mut self, collection: &str) -> Result<CollectionReport, AppError> {
        let records = self.source.fetch_all(collection).await?;
        let mut summary = CollectionReport {
            name: collection.to_string(),
            read: records.len(),
            ..Default::default()
        };
        self.reporter
            .report_info(&format!("collection {} count: {}", collection, records.len()));

        for record in &records {
            let Some(legacy_id) = record.legacy_id() else {
                summary.skipped += 1;
                self.reporter
                    .report_warning(&format!("no id? {} {}", collection, record), None);
                continue;
            };

            let written = self
                .migrate_record(collection, &legacy_id, record)
                .await
                .map_err(|mut err| {
                    err.add_context("collection", collection);
                    err.add_context("id", &legacy_id);
                    err
                })?;
            if written {
                summary.written += 1;
            } else {
                summary.skipped += 1;
            }
        }

        Ok(summary)
    }

    /// Returns `false` when the record was skipped.
    async fn migrate_record(
        &mut self,
        collection: &str,
        legacy_id: &str,
        record: &SourceRecord,
    ) -> Result<bool, AppError> {
        let placement = match self.router.route(collection, legacy_id, record)? {
            RouteOutcome::Placed(placement) => placement,
            RouteOutcome::Skipped { reason } => {
                self.reporter.report_warning(&reason, None);
                return Ok(false);
            }
        };

        let mut target = project_record(record, placement.suppressed, self.store)?;
        for (field, value) in placement.extra_fields {
            target.insert(field, value);
        }
        self.store.set(&placement.path, &target).await?;
        if self.dry_run {
            self.planned_writes.push(placement.path.to_string());
        }
        tracing::debug!(path = %placement.path, "record migrated");
        Ok(true)
    }
}
