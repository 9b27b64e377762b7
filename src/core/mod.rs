pub mod classifier;
pub mod config;
pub mod error;
pub mod migrator;
pub mod path;
pub mod placement;
pub mod postprocess;
pub mod record;
pub mod types;
pub mod value;

pub use classifier::{classify_field, classify_value, resolve_collection, ReferenceFactory};
pub use config::{ConfigLoader, ConfigValidator, MigrationConfig};
pub use error::{AppError, DefaultErrorReporter, ErrorReporter, MemoryReporter};
pub use migrator::{MigrationReport, Migrator};
pub use path::DocumentPath;
pub use placement::{PlacementRouter, RouteOutcome};
pub use record::{project_record, SourceRecord, TargetRecord};
pub use types::*;
pub use value::{SourceValue, TargetValue};
