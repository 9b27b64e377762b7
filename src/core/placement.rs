//! Decides where each migrated record lands in the target hierarchy.
//!
//! Most source collections map one-to-one onto a top-level collection. A few
//! are folded into subcollections of the record they belong to; see
//! [`default_rules`].

use crate::core::error::AppError;
use crate::core::path::DocumentPath;
use crate::core::record::SourceRecord;
use crate::core::types::ErrorCategory;
use crate::core::value::TargetValue;
use std::collections::HashMap;

/// How the parent document of a nested record is found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParentRule {
    /// The parent is the document referenced by `field`, in `collection`.
    Reference {
        field: &'static str,
        collection: &'static str,
    },
    /// The parent is shared with an already placed record of
    /// `sibling_collection` whose legacy id is stored in `field`. The sibling's
    /// id is copied onto the record as `link_field`.
    Sibling {
        field: &'static str,
        sibling_collection: &'static str,
        link_field: &'static str,
    },
}

/// Placement for one special source collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementRule {
    pub source: &'static str,
    pub parent: ParentRule,
    pub subcollection: &'static str,
    pub suppressed: &'static [&'static str],
}

/// The four collections that become subcollections.
pub fn default_rules() -> Vec<PlacementRule> {
    vec![
        PlacementRule {
            source: "names",
            parent: ParentRule::Reference {
                field: "game",
                collection: "games",
            },
            subcollection: "names",
            suppressed: &["game"],
        },
        PlacementRule {
            source: "namevotes",
            parent: ParentRule::Sibling {
                field: "name",
                sibling_collection: "names",
                link_field: "nameId",
            },
            subcollection: "namevotes",
            suppressed: &["name", "game"],
        },
        PlacementRule {
            source: "invites",
            parent: ParentRule::Reference {
                field: "team",
                collection: "teams",
            },
            subcollection: "invites",
            suppressed: &["team"],
        },
        PlacementRule {
            source: "histories",
            parent: ParentRule::Reference {
                field: "user",
                collection: "users",
            },
            subcollection: "histories",
            suppressed: &["user"],
        },
    ]
}

/// Where a record goes and what to strip or add on the way.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub path: DocumentPath,
    pub suppressed: &'static [&'static str],
    pub extra_fields: Vec<(String, TargetValue)>,
}

impl Placement {
    pub fn is_nested(&self) -> bool {
        self.path.depth() > 1
    }
}

/// Outcome of routing a single record.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteOutcome {
    Placed(Placement),
    /// The record cannot be placed but the batch may continue.
    Skipped { reason: String },
}

/// Legacy `(collection, id)` to assigned target path, filled as records are placed.
#[derive(Debug, Default)]
pub struct LookupTable {
    entries: HashMap<(String, String), DocumentPath>,
}

impl LookupTable {
    pub fn record(&mut self, collection: &str, legacy_id: &str, path: DocumentPath) {
        self.entries
            .insert((collection.to_string(), legacy_id.to_string()), path);
    }

    pub fn get(&self, collection: &str, legacy_id: &str) -> Option<&DocumentPath> {
        self.entries
            .get(&(collection.to_string(), legacy_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct PlacementRouter {
    rules: HashMap<&'static str, PlacementRule>,
    lookup: LookupTable,
}

impl Default for PlacementRouter {
    fn default() -> Self {
        Self::new(default_rules())
    }
}

impl PlacementRouter {
    pub fn new(rules: Vec<PlacementRule>) -> Self {
        PlacementRouter {
            rules: rules.into_iter().map(|rule| (rule.source, rule)).collect(),
            lookup: LookupTable::default(),
        }
    }

    pub fn rule_for(&self, collection: &str) -> Option<&PlacementRule> {
        self.rules.get(collection)
    }

    pub fn lookup(&self) -> &LookupTable {
        &self.lookup
    }

    /// Route `record` (already known to carry `legacy_id`) and remember where it went.
    ///
    /// Fails only when a sibling lookup misses, which means collections were
    /// processed out of dependency order.
    pub fn route(
        &mut self,
        collection: &str,
        legacy_id: &str,
        record: &SourceRecord,
    ) -> Result<RouteOutcome, AppError> {
        let outcome = match self.rules.get(collection) {
            None => RouteOutcome::Placed(Placement {
                path: DocumentPath::new(collection, legacy_id)?,
                suppressed: &[],
                extra_fields: Vec::new(),
            }),
            Some(rule) => Self::route_nested(rule, &self.lookup, legacy_id, record)?,
        };

        if let RouteOutcome::Placed(placement) = &outcome {
            self.lookup
                .record(collection, legacy_id, placement.path.clone());
        }
        Ok(outcome)
    }

    fn route_nested(
        rule: &PlacementRule,
        lookup: &LookupTable,
        legacy_id: &str,
        record: &SourceRecord,
    ) -> Result<RouteOutcome, AppError> {
        match &rule.parent {
            ParentRule::Reference { field, collection } => {
                let Some(parent_id) = record.get(field).and_then(|value| value.as_key()) else {
                    return Ok(RouteOutcome::Skipped {
                        reason: format!("{} {} has no '{}' to nest under", rule.source, legacy_id, field),
                    });
                };
                let parent = DocumentPath::new(collection, &parent_id)?;
                Ok(RouteOutcome::Placed(Placement {
                    path: parent.child(rule.subcollection, legacy_id)?,
                    suppressed: rule.suppressed,
                    extra_fields: Vec::new(),
                }))
            }
            ParentRule::Sibling {
                field,
                sibling_collection,
                link_field,
            } => {
                let Some(sibling_id) = record.get(field).and_then(|value| value.as_key()) else {
                    return Ok(RouteOutcome::Skipped {
                        reason: format!("{} {} has no '{}' to nest under", rule.source, legacy_id, field),
                    });
                };
                let sibling = lookup.get(sibling_collection, &sibling_id).ok_or_else(|| {
                    AppError::new(
                        ErrorCategory::LookupError,
                        format!(
                            "{} {} refers to {} {} which has not been placed",
                            rule.source, legacy_id, sibling_collection, sibling_id
                        ),
                    )
                    .with_code("PLACE-001")
                    .with_suggestion(format!(
                        "migrate '{}' before '{}'",
                        sibling_collection, rule.source
                    ))
                })?;
                let parent = sibling.parent().ok_or_else(|| {
                    AppError::new(
                        ErrorCategory::LookupError,
                        format!(
                            "{} {} was placed at top level {}; expected a nested path",
                            sibling_collection, sibling_id, sibling
                        ),
                    )
                    .with_code("PLACE-002")
                })?;
                Ok(RouteOutcome::Placed(Placement {
                    path: parent.child(rule.subcollection, legacy_id)?,
                    suppressed: rule.suppressed,
                    extra_fields: vec![(
                        link_field.to_string(),
                        TargetValue::String(sibling.id().to_string()),
                    )],
                }))
            }
        }
    }
}

/// One-line description of where a collection's records land.
pub fn describe(collection: &str, rule: Option<&PlacementRule>) -> String {
    match rule {
        None => format!("{collection} -> {collection}/{{id}}"),
        Some(rule) => match &rule.parent {
            ParentRule::Reference { field, collection: parent } => format!(
                "{} -> {}/{{{}}}/{}/{{id}} (drops {})",
                collection,
                parent,
                field,
                rule.subcollection,
                rule.suppressed.join(", ")
            ),
            ParentRule::Sibling {
                field,
                sibling_collection,
                link_field,
            } => format!(
                "{} -> <parent of {} {{{}}}>/{}/{{id}} (drops {}; adds {})",
                collection,
                sibling_collection,
                field,
                rule.subcollection,
                rule.suppressed.join(", "),
                link_field
            ),
        },
    }
}
