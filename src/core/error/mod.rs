use crate::core::types::{ErrorCategory, ErrorSeverity};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

#[derive(Debug)]
pub struct AppError {
    pub category: ErrorCategory,
    pub severity: ErrorSeverity,
    pub code: String,
    pub message: String,
    pub context: HashMap<String, String>,
    pub recovery_suggestions: Vec<String>,
    pub occurred_at: DateTime<Utc>,
    pub source: Option<anyhow::Error>,
}

impl AppError {
    pub fn new<T: Into<String>>(category: ErrorCategory, message: T) -> Self {
        let severity = match category {
            ErrorCategory::ConfigError
            | ErrorCategory::SourceError
            | ErrorCategory::TargetError
            | ErrorCategory::TimestampError
            | ErrorCategory::ReferenceError
            | ErrorCategory::LookupError
            | ErrorCategory::SerializationError
            | ErrorCategory::IoError
            | ErrorCategory::InternalError => ErrorSeverity::Error,
            ErrorCategory::Unknown => ErrorSeverity::Info,
        };
        AppError {
            category,
            severity,
            code: format!("ERR-{}", uuid::Uuid::new_v4()),
            message: message.into(),
            context: HashMap::new(),
            recovery_suggestions: vec![],
            occurred_at: chrono::Utc::now(),
            source: None,
        }
    }

    pub fn with_source<T: Into<String>>(
        category: ErrorCategory,
        message: T,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        let mut error = AppError::new(category, message);
        error.source = Some(anyhow::anyhow!(source));
        error
    }

    pub fn with_context<T: Into<String>>(mut self, context: T) -> Self {
        self.context.insert("context".to_string(), context.into());
        self
    }

    pub fn with_code<T: Into<String>>(mut self, code: T) -> Self {
        self.code = code.into();
        self
    }

    pub fn with_suggestion<T: Into<String>>(mut self, suggestion: T) -> Self {
        self.recovery_suggestions.push(suggestion.into());
        self
    }

    pub fn severity(&self) -> ErrorSeverity {
        self.severity
    }

    pub fn add_context(&mut self, key: &str, value: &str) {
        self.context.insert(key.to_string(), value.to_string());
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.code, self.category, self.message)?;
        if !self.context.is_empty() {
            let mut entries: Vec<_> = self.context.iter().collect();
            entries.sort();
            write!(f, " (Context: {:?})", entries)?;
        }
        if let Some(ref source) = self.source {
            write!(f, "\nCaused by: {}", source)?;
        }
        Ok(())
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(e: anyhow::Error) -> Self {
        AppError {
            category: ErrorCategory::InternalError,
            severity: ErrorSeverity::Error,
            code: "ANYHOW_ERROR".to_string(),
            message: e.to_string(),
            context: HashMap::new(),
            recovery_suggestions: vec!["Check the error details".to_string()],
            occurred_at: Utc::now(),
            source: Some(e),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError {
            category: ErrorCategory::IoError,
            severity: ErrorSeverity::Error,
            code: "IO_ERROR".to_string(),
            message: e.to_string(),
            context: HashMap::new(),
            recovery_suggestions: vec!["Check file permissions and paths".to_string()],
            occurred_at: Utc::now(),
            source: Some(anyhow::anyhow!(e)),
        }
    }
}

/// Sink for operator-facing progress lines and recoverable problems.
pub trait ErrorReporter: Send + Sync {
    fn report_error(&self, error: &AppError);
    fn report_warning(&self, message: &str, context: Option<String>);
    fn report_info(&self, message: &str);
    fn report_debug(&self, message: &str);
}

/// Prints progress to stdout and problems to stderr, mirroring both into tracing.
pub struct DefaultErrorReporter;

impl DefaultErrorReporter {
    pub fn new() -> Self {
        DefaultErrorReporter
    }
}

impl Default for DefaultErrorReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ErrorReporter for DefaultErrorReporter {
    fn report_error(&self, error: &AppError) {
        tracing::error!(code = %error.code, category = %error.category, "{}", error.message);
        eprintln!("[ERROR] {}: {}", error.code, error.message);
        if !error.context.is_empty() {
            eprintln!("  Context: {:?}", error.context);
        }
        if let Some(ref source) = error.source {
            eprintln!("  Caused by: {}", source);
        }
    }

    fn report_warning(&self, message: &str, context: Option<String>) {
        tracing::warn!(context = context.as_deref().unwrap_or(""), "{}", message);
        println!("{}", message);
        if let Some(ref ctx) = context {
            eprintln!("  Context: {}", ctx);
        }
    }

    fn report_info(&self, message: &str) {
        tracing::info!("{}", message);
        println!("{}", message);
    }

    fn report_debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }
}

/// Line captured by [`MemoryReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportedLine {
    Error(String),
    Warning(String),
    Info(String),
    Debug(String),
}

/// Reporter that keeps every line in memory, for tests and embedding callers.
#[derive(Clone, Default)]
pub struct MemoryReporter {
    lines: Arc<Mutex<Vec<ReportedLine>>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<ReportedLine> {
        self.lines
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|line| match line {
                ReportedLine::Warning(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    pub fn infos(&self) -> Vec<String> {
        self.lines()
            .into_iter()
            .filter_map(|line| match line {
                ReportedLine::Info(message) => Some(message),
                _ => None,
            })
            .collect()
    }

    fn push(&self, line: ReportedLine) {
        if let Ok(mut guard) = self.lines.lock() {
            guard.push(line);
        }
    }
}

impl ErrorReporter for MemoryReporter {
    fn report_error(&self, error: &AppError) {
        self.push(ReportedLine::Error(format!("{}: {}", error.code, error.message)));
    }

    fn report_warning(&self, message: &str, _context: Option<String>) {
        self.push(ReportedLine::Warning(message.to_string()));
    }

    fn report_info(&self, message: &str) {
        self.push(ReportedLine::Info(message.to_string()));
    }

    fn report_debug(&self, message: &str) {
        self.push(ReportedLine::Debug(message.to_string()));
    }
}
