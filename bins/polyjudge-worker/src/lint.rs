// Static analysis of the submission under a shrinking time budget.

use crate::engine::{self, Invocation, Termination};
use crate::interrupt::Interrupt;
use crate::languages::LanguageAdapter;
use polyjudge_common::report::LintReport;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Deadline shared by every linter invocation of one run
#[derive(Debug, Clone)]
pub struct LintBudget {
    deadline: Instant,
    interrupt: Option<Interrupt>,
}

impl LintBudget {
    pub fn new(total: Duration) -> Self {
        Self::until(Instant::now() + total)
    }

    pub fn until(deadline: Instant) -> Self {
        Self { deadline, interrupt: None }
    }

    pub fn interruptible(mut self, interrupt: &Interrupt) -> Self {
        self.interrupt = Some(interrupt.clone());
        self
    }

    pub fn remaining(&self) -> Duration {
        self.deadline.saturating_duration_since(Instant::now())
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining().is_zero() || self.interrupt.as_ref().is_some_and(Interrupt::is_set)
    }
}

fn note(message: impl Into<String>) -> LintReport {
    LintReport { messages: vec![message.into()], annotations: Vec::new() }
}

/// Run the adapter's linter on `submission` inside `dir`
///
/// Never fails: a missing tool, a timeout or unparsable output all
/// degrade to a report without annotations.
#[tracing::instrument(skip(adapter, budget), fields(language = %adapter.language()))]
pub async fn lint(
    adapter: &dyn LanguageAdapter,
    dir: &Path,
    submission: &str,
    budget: &LintBudget,
    memory_limit_kb: u64,
) -> LintReport {
    let Some(linter) = adapter.linter(submission) else {
        return LintReport::default();
    };
    if budget.is_exhausted() {
        info!("Lint budget exhausted, skipping linter");
        return note("Linting skipped: time budget exhausted");
    }

    let invocation = Invocation {
        command: &linter.command,
        cwd: dir,
        stdin: None,
        timeout: budget.remaining(),
        memory_limit_kb,
        interrupt: budget.interrupt.as_ref(),
    };
    let output = match engine::run(invocation).await {
        Ok(output) => output,
        Err(e) => {
            warn!(error = %e, "Linter unavailable");
            return note(format!("Linter {} is not available", linter.command[0]));
        }
    };

    if output.termination != Termination::Exited {
        warn!(termination = ?output.termination, "Linter did not finish");
        return note("Linting timed out");
    }

    match (linter.parse)(&output.stdout) {
        Ok(annotations) => {
            debug!(count = annotations.len(), "Linter finished");
            let annotations = annotations
                .into_iter()
                .map(|mut a| {
                    a.message = adapter.cleanup_stacktrace(&a.message);
                    a
                })
                .collect();
            LintReport { messages: Vec::new(), annotations }
        }
        Err(e) => {
            warn!(error = %e, "Linter output could not be parsed");
            note("Linter output could not be read")
        }
    }
}
