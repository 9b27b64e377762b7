use firemigrate::core::error::{AppError, ErrorReporter, MemoryReporter, ReportedLine};
use firemigrate::core::types::{ErrorCategory, ErrorSeverity};

#[test]
fn test_error_creation_all_categories() {
    let categories = vec![
        ErrorCategory::ConfigError,
        ErrorCategory::SourceError,
        ErrorCategory::TargetError,
        ErrorCategory::TimestampError,
        ErrorCategory::ReferenceError,
        ErrorCategory::LookupError,
        ErrorCategory::SerializationError,
        ErrorCategory::IoError,
        ErrorCategory::InternalError,
        ErrorCategory::Unknown,
    ];

    for category in categories {
        let error = AppError::new(category, "test message");
        assert_eq!(error.category, category);
        assert_eq!(error.message, "test message");
        assert!(error.code.starts_with("ERR-"));
        assert!(error.context.is_empty());
        assert!(error.recovery_suggestions.is_empty());
        assert!(error.occurred_at <= chrono::Utc::now());
        assert!(error.source.is_none());
    }
}

#[test]
fn test_error_severity_mapping() {
    assert_eq!(
        AppError::new(ErrorCategory::LookupError, "x").severity(),
        ErrorSeverity::Error
    );
    assert_eq!(
        AppError::new(ErrorCategory::Unknown, "x").severity(),
        ErrorSeverity::Info
    );
}

#[test]
fn test_error_display_includes_sorted_context() {
    let mut error = AppError::new(ErrorCategory::LookupError, "name n404 not placed")
        .with_code("PLACE-001");
    error.add_context("id", "v1");
    error.add_context("collection", "namevotes");

    let rendered = error.to_string();
    assert!(rendered.starts_with("[PLACE-001] LookupError: name n404 not placed"));
    let collection_at = rendered.find("collection").unwrap();
    let id_at = rendered.find("\"id\"").unwrap();
    assert!(collection_at < id_at);
}

#[test]
fn test_error_with_source_chains_cause() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "cert.json missing");
    let error = AppError::with_source(ErrorCategory::ConfigError, "cannot read certificate", Box::new(io));
    assert!(error.to_string().contains("Caused by: cert.json missing"));
}

#[test]
fn test_io_error_conversion() {
    let error: AppError = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied").into();
    assert_eq!(error.category, ErrorCategory::IoError);
    assert_eq!(error.code, "IO_ERROR");
}

#[test]
fn test_app_error_converts_into_anyhow() {
    fn fails() -> firemigrate::Result<()> {
        Err(AppError::new(ErrorCategory::TargetError, "write rejected").with_code("FIRESTORE-002"))?;
        Ok(())
    }
    let err = fails().unwrap_err();
    assert!(err.to_string().contains("FIRESTORE-002"));
    let app_error = err.downcast_ref::<AppError>().unwrap();
    assert_eq!(app_error.category, ErrorCategory::TargetError);
}

#[test]
fn test_memory_reporter_captures_lines_in_order() {
    let reporter = MemoryReporter::new();
    reporter.report_info("Importing 2 collections. This may take a while...");
    reporter.report_warning("no id? tags {name: x}", None);
    reporter.report_error(&AppError::new(ErrorCategory::SourceError, "boom").with_code("SOURCE-003"));
    reporter.report_debug("detail");

    let lines = reporter.lines();
    assert_eq!(lines.len(), 4);
    assert_eq!(
        lines[0],
        ReportedLine::Info("Importing 2 collections. This may take a while...".to_string())
    );
    assert_eq!(reporter.warnings(), vec!["no id? tags {name: x}"]);
    assert!(matches!(&lines[2], ReportedLine::Error(line) if line.contains("SOURCE-003")));
}
