//! Passes that run once every collection has been placed.

use crate::core::error::{AppError, ErrorReporter};
use crate::core::record::{TargetRecord, IS_DELETED_FIELD};
use crate::core::types::PassKind;
use crate::core::value::TargetValue;
use crate::target::{CollectionQuery, DocumentStore, OrderBy};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

pub const PARENT_COLLECTION: &str = "games";
pub const CHILD_COLLECTION: &str = "names";
pub const DISPLAY_NAME_FIELD: &str = "name";
pub const SLUG_FIELD: &str = "slug";
pub const WEIGHT_FIELD: &str = "weight";
pub const ADDED_AT_FIELD: &str = "dateAdded";

const SLUG_STRIP_PATTERN: &str = r"[^a-z0-9\-]";

/// Counts produced by one post-processing pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassSummary {
    pub pass: String,
    pub scanned: usize,
    pub updated: usize,
    pub skipped: usize,
}

impl PassSummary {
    fn new(kind: PassKind) -> Self {
        PassSummary {
            pass: kind.to_string(),
            ..Default::default()
        }
    }
}

/// Derive a URL slug from a display name.
///
/// Lower-cases, turns each space into `-`, then drops anything outside
/// `[a-z0-9-]`.
pub fn slugify(name: &str) -> String {
    static STRIP: OnceLock<Regex> = OnceLock::new();
    let strip = STRIP.get_or_init(|| Regex::new(SLUG_STRIP_PATTERN).expect("slug pattern is valid"));
    let spaced = name.to_lowercase().replace(' ', "-");
    strip.replace_all(&spaced, "").into_owned()
}

/// Copy the top-ranked child name onto every game.
///
/// Only live children are ranked, by `weight` then `dateAdded`, both descending.
pub async fn rollup_top_names(
    store: &dyn DocumentStore,
    reporter: &dyn ErrorReporter,
) -> Result<PassSummary, AppError> {
    let mut summary = PassSummary::new(PassKind::Rollup);
    let games = store.list(&CollectionQuery::all(PARENT_COLLECTION)).await?;

    for game in games {
        summary.scanned += 1;
        let query = CollectionQuery::all(format!("{}/{}", game.path, CHILD_COLLECTION))
            .where_equal(IS_DELETED_FIELD, TargetValue::Boolean(false))
            .order_by(OrderBy::descending(WEIGHT_FIELD))
            .order_by(OrderBy::descending(ADDED_AT_FIELD))
            .limit(1);
        let top = store.list(&query).await?;

        let Some(top_name) = top.into_iter().next() else {
            summary.skipped += 1;
            reporter.report_warning(&format!("game {} has no ranked names", game.path), None);
            continue;
        };
        let Some(name) = top_name.record.get(DISPLAY_NAME_FIELD).cloned() else {
            summary.skipped += 1;
            reporter.report_warning(
                &format!("top name {} has no '{}'", top_name.path, DISPLAY_NAME_FIELD),
                None,
            );
            continue;
        };

        let mut fields = TargetRecord::new();
        fields.insert(DISPLAY_NAME_FIELD, name);
        store.update(&game.path, &fields).await?;
        summary.updated += 1;
        reporter.report_debug(&format!("game {} named after {}", game.path, top_name.path));
    }

    reporter.report_info(&format!(
        "rollup: {} games, {} updated, {} skipped",
        summary.scanned, summary.updated, summary.skipped
    ));
    Ok(summary)
}

/// Write a `slug` derived from `name` onto every game.
pub async fn derive_slugs(
    store: &dyn DocumentStore,
    reporter: &dyn ErrorReporter,
) -> Result<PassSummary, AppError> {
    let mut summary = PassSummary::new(PassKind::Slug);
    let games = store.list(&CollectionQuery::all(PARENT_COLLECTION)).await?;

    for game in games {
        summary.scanned += 1;
        let Some(name) = game.record.get(DISPLAY_NAME_FIELD).and_then(TargetValue::as_str) else {
            summary.skipped += 1;
            reporter.report_warning(&format!("no name for game {}", game.path), None);
            continue;
        };

        let mut fields = TargetRecord::new();
        fields.insert(SLUG_FIELD, TargetValue::String(slugify(name)));
        store.update(&game.path, &fields).await?;
        summary.updated += 1;
    }

    reporter.report_info(&format!(
        "slugs: {} games, {} updated, {} skipped",
        summary.scanned, summary.updated, summary.skipped
    ));
    Ok(summary)
}

pub async fn run_pass(
    kind: PassKind,
    store: &dyn DocumentStore,
    reporter: &dyn ErrorReporter,
) -> Result<PassSummary, AppError> {
    match kind {
        PassKind::Rollup => rollup_top_names(store, reporter).await,
        PassKind::Slug => derive_slugs(store, reporter).await,
    }
}
