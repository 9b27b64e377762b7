use crate::cli::Command;

/// Execution contexts that influence how logging is routed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExecutionContext {
    /// Operator commands that write to real databases; progress lines already
    /// go to stdout, so tracing stays in the log file.
    LocalDev,
    /// Rehearsal runs, where tracing is echoed to the console as well.
    DryRun,
}

impl ExecutionContext {
    /// Returns `true` when console sinks should be disabled by default.
    pub fn disables_console(self) -> bool {
        matches!(self, ExecutionContext::LocalDev)
    }
}

/// Derive the active execution context from a parsed CLI command.
pub fn detect_context(command: &Command) -> ExecutionContext {
    match command {
        Command::Run(args) if args.dry_run => ExecutionContext::DryRun,
        Command::Run(_) | Command::Rollup(_) | Command::Slugs(_) | Command::Plan(_) => {
            ExecutionContext::LocalDev
        }
    }
}
