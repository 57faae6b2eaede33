/// Judge Pipeline - High-Level Orchestration
///
/// **Responsibility:**
/// Drive every context of a test plan through
/// generate → compile → execute → decode, then hand the values to the
/// evaluator and aggregate a `JudgeReport`.
///
/// **Architecture:**
/// 1. Gate each context against the adapter's type and construct support
/// 2. Generate harness files in a working directory owned by the context
/// 3. Compile and execute through the process engine (engine.rs)
/// 4. Decode the wire stream and score it (evaluator.rs)
///
/// Languages that need a selector compile all admitted contexts once in a
/// shared build directory; every context then runs the shared executable
/// from its own directory. When that shared build does not compile, each
/// context is built again on its own so one broken context cannot fail
/// the others.
///
/// This module is the glue layer - it knows nothing about:
/// - How a language prints or compiles (the adapter's job)
/// - How a child is limited and reaped (the engine's job)
/// - How verdicts are decided (the evaluator's job)
///
/// **Failure isolation:**
/// A context that fails, for whatever reason, ends as a `Failed` outcome
/// in its own report. Only failing to set up the run itself is an `Err`.
///
/// **Interruption:**
/// Once the run's `Interrupt` fires, running children are killed and no
/// new stage starts. The report still covers every context.

use crate::config::RunOptions;
use crate::engine::{self, Invocation, ProcessOutput, Termination};
use crate::evaluator;
use crate::features;
use crate::interrupt::Interrupt;
use crate::languages::{Compilation, ExecutionUnit, LanguageAdapter};
use crate::lint::{self, LintBudget};
use anyhow::{Context as _, Result};
use futures_util::stream::{self, StreamExt};
use polyjudge_common::plan::{Context, TestPlan};
use polyjudge_common::report::{
    ContextFailure, ContextOutcome, ContextReport, JudgeReport, LimitKind, LintReport, Stage,
};
use polyjudge_common::serialization::{decode_prefix, decode_stream};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Why a context stopped before producing an outcome of its own
enum Halt {
    Failed(ContextFailure),
    Internal(anyhow::Error),
}

impl From<ContextFailure> for Halt {
    fn from(failure: ContextFailure) -> Self {
        Halt::Failed(failure)
    }
}

impl From<anyhow::Error> for Halt {
    fn from(error: anyhow::Error) -> Self {
        Halt::Internal(error)
    }
}

impl Halt {
    fn into_failure(self) -> ContextFailure {
        match self {
            Halt::Failed(failure) => failure,
            Halt::Internal(e) => ContextFailure::Internal { message: format!("{:#}", e) },
        }
    }
}

/// Result of running one context's program
struct Execution {
    outcome: ContextOutcome,
    stderr: String,
    peak_memory_kb: Option<u64>,
}

async fn write_file(dir: &Path, name: &str, content: &str) -> Result<()> {
    tokio::fs::write(dir.join(name), content)
        .await
        .with_context(|| format!("Failed to write {}", name))
}

async fn create_dir(dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("Failed to create {}", dir.display()))
}

fn failed(failure: ContextFailure, partial_values: Vec<polyjudge_common::types::Value>) -> ContextOutcome {
    ContextOutcome::Failed { failure, partial_values }
}

/// Executable shared by the admitted contexts of a selector language
enum SelectorBuild {
    Shared { artifacts: Vec<String>, executable: String },
    /// The shared build did not compile; every context builds alone
    PerContext,
    Failed(ContextFailure),
}

/// State shared by every context of one judging run
struct Pipeline<'a> {
    adapter: &'a dyn LanguageAdapter,
    options: &'a RunOptions,
    submission: &'a str,
    root: PathBuf,
    deadline: Instant,
    interrupt: &'a Interrupt,
}

impl<'a> Pipeline<'a> {
    fn language(&self) -> String {
        self.adapter.language().to_string()
    }

    fn context_dir(&self, index: usize) -> PathBuf {
        self.root.join(format!("context_{}", index))
    }

    /// Deadline for the next child: per-invocation limit or what is left of the run
    fn budget(&self, stage: Stage) -> Result<(Duration, LimitKind), ContextFailure> {
        if self.interrupt.is_set() {
            return Err(ContextFailure::TimedOut { stage, limit: LimitKind::Interrupted });
        }
        let remaining = self.deadline.saturating_duration_since(Instant::now());
        let time_limit = self.options.limits.time_limit;
        if remaining.is_zero() {
            warn!(%stage, "Run budget exhausted - not starting");
            return Err(ContextFailure::TimedOut { stage, limit: LimitKind::RunBudget });
        }
        if remaining < time_limit {
            Ok((remaining, LimitKind::RunBudget))
        } else {
            Ok((time_limit, LimitKind::WallClock))
        }
    }

    async fn spawn(&self, stage: Stage, command: &[String], dir: &Path) -> Result<(ProcessOutput, LimitKind), Halt> {
        let (timeout, limit) = self.budget(stage)?;
        let output = engine::run(Invocation {
            command,
            cwd: dir,
            stdin: None,
            timeout,
            memory_limit_kb: self.options.limits.memory_limit_kb,
            interrupt: Some(self.interrupt),
        })
        .await?;
        Ok((output, limit))
    }

    /// Write dependencies and the submission; returns the file names in compile order
    async fn prepare(&self, dir: &Path) -> Result<Vec<String>> {
        create_dir(dir).await?;
        let mut files = Vec::new();
        for dependency in self.adapter.initial_dependencies() {
            write_file(dir, dependency.name, dependency.content).await?;
            files.push(dependency.name.to_string());
        }
        let submission = self.adapter.submission_file();
        write_file(dir, &submission, self.submission).await?;
        self.adapter.modify_solution(&dir.join(&submission))?;
        files.push(submission);
        Ok(files)
    }

    async fn write_unit(&self, dir: &Path, index: usize, context: &Context) -> Result<String> {
        let name = self.adapter.context_name(index);
        let source = self.adapter.generate_execution_unit(&ExecutionUnit { index, name: &name, context });
        let file = self.adapter.with_extension(&name);
        write_file(dir, &file, &source).await?;
        debug!(index, file = %file, bytes = source.len(), "Generated execution unit");
        Ok(file)
    }

    #[tracing::instrument(skip(self, dir, files), fields(dir = %dir.display()))]
    async fn compile(&self, dir: &Path, files: &[String]) -> Result<Compilation, Halt> {
        let compilation = self.adapter.compilation(files);
        if compilation.is_noop() {
            debug!("Nothing to compile");
            return Ok(compilation);
        }

        let (output, limit) = self.spawn(Stage::Compilation, &compilation.command, dir).await?;
        match output.termination {
            Termination::Exited => {}
            Termination::TimedOut => {
                return Err(ContextFailure::TimedOut { stage: Stage::Compilation, limit }.into())
            }
            Termination::MemoryExceeded => {
                return Err(ContextFailure::TimedOut { stage: Stage::Compilation, limit: LimitKind::Memory }.into())
            }
            Termination::Interrupted => {
                return Err(ContextFailure::TimedOut { stage: Stage::Compilation, limit: LimitKind::Interrupted }.into())
            }
        }

        let missing: Vec<&String> = compilation.outputs.iter().filter(|f| !dir.join(f).exists()).collect();
        if !output.success() || !missing.is_empty() {
            let mut diagnostics = self.adapter.cleanup_stacktrace(&output.combined());
            if output.success() && diagnostics.trim().is_empty() {
                let names: Vec<String> = missing.iter().map(|f| self.adapter.cleanup_stacktrace(f)).collect();
                diagnostics = format!("Compilation did not produce {}", names.join(", "));
            }
            info!(exit_code = ?output.exit_code, missing = missing.len(), "Compilation failed");
            return Err(ContextFailure::CompileFailure { diagnostics }.into());
        }

        info!(elapsed_ms = output.elapsed.as_millis() as u64, "Compilation succeeded");
        Ok(compilation)
    }

    #[tracing::instrument(skip(self, dir, arguments, context), fields(dir = %dir.display()))]
    async fn execute(&self, dir: &Path, file: &str, arguments: &[String], context: &Context) -> Result<Execution, Halt> {
        let command = self.adapter.execution(dir, file, arguments);
        let (output, limit) = self.spawn(Stage::Execution, &command, dir).await?;
        let stderr = self.adapter.cleanup_stacktrace(&output.stderr);

        let outcome = match output.termination {
            Termination::TimedOut => failed(
                ContextFailure::TimedOut { stage: Stage::Execution, limit },
                decode_prefix(&output.stdout).0,
            ),
            Termination::MemoryExceeded => failed(
                ContextFailure::TimedOut { stage: Stage::Execution, limit: LimitKind::Memory },
                decode_prefix(&output.stdout).0,
            ),
            Termination::Interrupted => failed(
                ContextFailure::TimedOut { stage: Stage::Execution, limit: LimitKind::Interrupted },
                decode_prefix(&output.stdout).0,
            ),
            Termination::Exited if !output.success() => failed(
                ContextFailure::RuntimeFailure { exit_code: output.exit_code, diagnostics: stderr.clone() },
                decode_prefix(&output.stdout).0,
            ),
            Termination::Exited => match decode_stream(&output.stdout, context.expected_line_count()) {
                Ok(values) => ContextOutcome::Evaluated { values },
                Err(e) => {
                    warn!(error = %e, "Harness output could not be decoded");
                    failed(
                        ContextFailure::DecodeError { message: e.to_string(), diagnostics: stderr.clone() },
                        decode_prefix(&output.stdout).0,
                    )
                }
            },
        };

        Ok(Execution { outcome, stderr, peak_memory_kb: output.peak_memory_kb })
    }

    /// Whole pipeline for a language without a selector
    async fn run_standalone(&self, index: usize, context: &Context) -> Result<Execution, Halt> {
        self.budget(Stage::Generation)?;
        let dir = self.context_dir(index);
        let mut files = self.prepare(&dir).await?;
        let unit = self.write_unit(&dir, index, context).await?;
        files.push(unit.clone());

        let compilation = self.compile(&dir, &files).await?;
        let executable = compilation.executable.unwrap_or(unit);
        self.execute(&dir, &executable, &context.arguments, context).await
    }

    /// Run one context against a shared selector build
    async fn run_selected(&self, index: usize, context: &Context, build: &Path, artifacts: &[String], executable: &str) -> Result<Execution, Halt> {
        self.budget(Stage::Execution)?;
        let dir = self.context_dir(index);
        create_dir(&dir).await?;
        for artifact in artifacts {
            tokio::fs::copy(build.join(artifact), dir.join(artifact))
                .await
                .with_context(|| format!("Failed to copy {}", artifact))?;
        }

        let mut arguments = vec![self.adapter.context_name(index)];
        arguments.extend(context.arguments.iter().cloned());
        self.execute(&dir, executable, &arguments, context).await
    }

    /// Generate the given contexts plus the selector in `build` and compile them once
    async fn build_selector(&self, build: &Path, admitted: &[(usize, &Context)]) -> Result<(Vec<String>, String), Halt> {
        self.budget(Stage::Generation)?;
        let mut files = self.prepare(build).await?;
        let mut names = Vec::new();
        for (index, context) in admitted {
            files.push(self.write_unit(build, *index, context).await?);
            names.push(self.adapter.context_name(*index));
        }

        let selector = self.adapter.selector_name();
        let source = self
            .adapter
            .generate_selector(&names)
            .with_context(|| format!("{} needs a selector but generated none", self.language()))?;
        let selector_file = self.adapter.with_extension(&selector);
        write_file(build, &selector_file, &source).await?;
        files.push(selector_file.clone());

        let compilation = self.compile(build, &files).await?;
        let executable = compilation.executable.clone().unwrap_or(selector_file);
        let artifacts = if compilation.is_noop() { files } else { compilation.outputs };
        Ok((artifacts, executable))
    }

    /// Selector build holding this context alone
    async fn run_alone(&self, index: usize, context: &Context) -> Result<Execution, Halt> {
        let build = self.root.join(format!("build_{}", index));
        let (artifacts, executable) = self.build_selector(&build, &[(index, context)]).await?;
        self.run_selected(index, context, &build, &artifacts, &executable).await
    }

    fn gate(&self, context: &Context) -> Result<(), ContextFailure> {
        features::check_context(
            &self.language(),
            self.adapter.type_support(),
            &self.adapter.supported_constructs(),
            |value| self.adapter.unrepresentable(value),
            context,
        )
    }

    fn report(&self, index: usize, context: &Context, result: Result<Execution, Halt>, started: Instant) -> ContextReport {
        let execution = result.unwrap_or_else(|halt| Execution {
            outcome: failed(halt.into_failure(), Vec::new()),
            stderr: String::new(),
            peak_memory_kb: None,
        });
        let name = context.name.clone().unwrap_or_else(|| self.adapter.context_name(index));
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &execution.outcome {
            ContextOutcome::Evaluated { values } => {
                info!(index, name = %name, values = values.len(), elapsed_ms, "Context evaluated")
            }
            ContextOutcome::Failed { failure, .. } if failure.is_harness_fault() => {
                warn!(index, name = %name, failure = %failure, elapsed_ms, "Context failed (harness)")
            }
            ContextOutcome::Failed { failure, .. } => {
                info!(index, name = %name, failure = %failure, elapsed_ms, "Context failed")
            }
        }

        ContextReport {
            index,
            name,
            testcases: evaluator::evaluate_context(context, &execution.outcome),
            outcome: execution.outcome,
            stderr: execution.stderr,
            elapsed_ms,
            peak_memory_kb: execution.peak_memory_kb,
        }
    }

    async fn run_contexts(&self, plan: &TestPlan) -> Vec<ContextReport> {
        let parallelism = self.options.parallelism.max(1);
        let mut reports: Vec<ContextReport> = if self.adapter.needs_selector() {
            self.run_with_selector(plan, parallelism).await
        } else {
            stream::iter(plan.contexts.iter().enumerate())
                .map(|(index, context)| async move {
                    let started = Instant::now();
                    let result = match self.gate(context) {
                        Ok(()) => self.run_standalone(index, context).await,
                        Err(failure) => Err(failure.into()),
                    };
                    self.report(index, context, result, started)
                })
                .buffer_unordered(parallelism)
                .collect()
                .await
        };
        reports.sort_by_key(|r| r.index);
        reports
    }

    async fn run_with_selector(&self, plan: &TestPlan, parallelism: usize) -> Vec<ContextReport> {
        let started = Instant::now();
        let gates: Vec<Result<(), ContextFailure>> = plan.contexts.iter().map(|c| self.gate(c)).collect();
        let admitted: Vec<(usize, &Context)> = plan
            .contexts
            .iter()
            .enumerate()
            .filter(|(i, _)| gates[*i].is_ok())
            .collect();

        let build_dir = self.root.join("build");
        let build = if admitted.is_empty() {
            SelectorBuild::Failed(ContextFailure::InvalidPlan { message: "no runnable contexts".to_string() })
        } else {
            match self.build_selector(&build_dir, &admitted).await.map_err(Halt::into_failure) {
                Ok((artifacts, executable)) => SelectorBuild::Shared { artifacts, executable },
                Err(ContextFailure::CompileFailure { .. }) if admitted.len() > 1 => {
                    info!(contexts = admitted.len(), "Shared selector build failed; building contexts one by one");
                    SelectorBuild::PerContext
                }
                Err(failure) => {
                    info!(failure = %failure, "Selector build failed; failing every admitted context");
                    SelectorBuild::Failed(failure)
                }
            }
        };

        stream::iter(plan.contexts.iter().zip(gates).enumerate())
            .map(|(index, (context, gate))| {
                let build = &build;
                let build_dir = &build_dir;
                async move {
                    let result = match (gate, build) {
                        (Err(failure), _) => Err(failure.into()),
                        (Ok(()), SelectorBuild::Failed(failure)) => Err(failure.clone().into()),
                        (Ok(()), SelectorBuild::Shared { artifacts, executable }) => {
                            self.run_selected(index, context, build_dir, artifacts, executable).await
                        }
                        (Ok(()), SelectorBuild::PerContext) => self.run_alone(index, context).await,
                    };
                    self.report(index, context, result, started)
                }
            })
            .buffer_unordered(parallelism)
            .collect()
            .await
    }

    async fn lint(&self) -> LintReport {
        if !self.options.lint {
            return LintReport::default();
        }
        let dir = self.root.join("lint");
        let submission = self.adapter.submission_file();
        let written = async {
            create_dir(&dir).await?;
            write_file(&dir, &submission, self.submission).await
        };
        if let Err(e) = written.await {
            warn!(error = %e, "Could not prepare lint directory");
            return LintReport::default();
        }
        lint::lint(
            self.adapter,
            &dir,
            &submission,
            &LintBudget::until(self.deadline).interruptible(self.interrupt),
            self.options.limits.memory_limit_kb,
        )
        .await
    }
}

/// Judge one submission against a test plan
///
/// Contexts run concurrently, bounded by `options.parallelism`, each in a
/// directory under a temporary root that is removed when judging ends.
/// Linting runs alongside and shares the run budget.
pub async fn judge(
    adapter: &dyn LanguageAdapter,
    plan: &TestPlan,
    submission: &str,
    options: &RunOptions,
) -> Result<JudgeReport> {
    judge_interruptible(adapter, plan, submission, options, &Interrupt::never()).await
}

/// `judge` that stops early when `interrupt` fires
///
/// Contexts cut short report `TimedOut` with the `interrupted` limit;
/// finished contexts keep their outcome.
#[tracing::instrument(skip_all, fields(language = %adapter.language(), contexts = plan.contexts.len()))]
pub async fn judge_interruptible(
    adapter: &dyn LanguageAdapter,
    plan: &TestPlan,
    submission: &str,
    options: &RunOptions,
    interrupt: &Interrupt,
) -> Result<JudgeReport> {
    let run_id = Uuid::new_v4();
    let started_at = chrono::Utc::now();
    let started = Instant::now();

    let mut builder = tempfile::Builder::new();
    builder.prefix("polyjudge-");
    let root = match &options.workdir {
        Some(dir) => {
            std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
            builder.tempdir_in(dir)
        }
        None => builder.tempdir(),
    }
    .context("Failed to create working directory")?;

    info!(
        run_id = %run_id,
        workdir = %root.path().display(),
        time_limit_ms = options.limits.time_limit.as_millis() as u64,
        memory_limit_kb = options.limits.memory_limit_kb,
        run_budget_ms = options.run_budget.as_millis() as u64,
        parallelism = options.parallelism,
        "Judging started"
    );

    let pipeline = Pipeline {
        adapter,
        options,
        submission,
        root: root.path().to_path_buf(),
        deadline: started + options.run_budget,
        interrupt,
    };
    let (contexts, lint) = tokio::join!(pipeline.run_contexts(plan), pipeline.lint());

    if interrupt.is_set() {
        warn!(run_id = %run_id, "Judging was interrupted; report is partial");
    }
    let report = JudgeReport {
        run_id,
        language: adapter.language().to_string(),
        started_at,
        elapsed_ms: started.elapsed().as_millis() as u64,
        contexts,
        lint,
    };

    info!(
        run_id = %run_id,
        elapsed_ms = report.elapsed_ms,
        correct = report.count(polyjudge_common::report::Verdict::Correct),
        wrong = report.count(polyjudge_common::report::Verdict::Wrong),
        failed = report.count(polyjudge_common::report::Verdict::ContextFailed),
        annotations = report.lint.annotations.len(),
        "Judging finished"
    );

    if let Err(e) = root.close() {
        warn!(error = %e, "Failed to remove working directory");
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AdapterConfig;
    use crate::languages::{adapter_for, Language};
    use polyjudge_common::plan::{Expression, Statement, Testcase};
    use polyjudge_common::report::Verdict;
    use polyjudge_common::types::Value;

    fn testcase(expected: Value) -> Testcase {
        Testcase { statement: Statement::Expression(Expression::Value(expected.clone())), expected: Some(expected), checker: None }
    }

    #[tokio::test]
    async fn test_exhausted_budget_times_out_every_context() {
        let adapter = adapter_for(Language::Python, &AdapterConfig::default()).unwrap();
        let plan = TestPlan {
            contexts: vec![
                Context { testcases: vec![testcase(Value::integer(1))], ..Default::default() },
                Context { name: Some("second".into()), testcases: vec![testcase(Value::integer(2))], ..Default::default() },
            ],
        };
        let options = RunOptions { run_budget: Duration::ZERO, lint: false, ..Default::default() };

        let report = judge(adapter.as_ref(), &plan, "", &options).await.unwrap();

        assert_eq!(report.contexts.len(), 2);
        assert_eq!(report.contexts[0].name, "context_0");
        assert_eq!(report.contexts[1].name, "second");
        for context in &report.contexts {
            assert_eq!(
                context.outcome,
                ContextOutcome::Failed {
                    failure: ContextFailure::TimedOut { stage: Stage::Generation, limit: LimitKind::RunBudget },
                    partial_values: vec![],
                }
            );
            assert!(context.testcases.iter().all(|t| t.verdict == Verdict::ContextFailed));
        }
    }

    #[tokio::test]
    async fn test_unsupported_type_is_rejected_before_generation() {
        let adapter = adapter_for(Language::Bash, &AdapterConfig::default()).unwrap();
        let plan = TestPlan {
            contexts: vec![Context { testcases: vec![testcase(Value::integer(5))], ..Default::default() }],
        };
        let workdir = tempfile::tempdir().unwrap();
        let options = RunOptions { lint: false, workdir: Some(workdir.path().to_path_buf()), ..Default::default() };

        let report = judge(adapter.as_ref(), &plan, "", &options).await.unwrap();

        match &report.contexts[0].outcome {
            ContextOutcome::Failed { failure: ContextFailure::UnsupportedTypeUsage { ty, .. }, .. } => {
                assert_eq!(*ty, polyjudge_common::types::ValueType::Integer)
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        // Working directories are gone once judging ends
        assert_eq!(std::fs::read_dir(workdir.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_selector_language_with_nothing_runnable() {
        let adapter = adapter_for(Language::Haskell, &AdapterConfig::default()).unwrap();
        let set = Value::set(vec![Value::integer(1)]);
        let plan = TestPlan {
            contexts: vec![Context { testcases: vec![testcase(set)], ..Default::default() }],
        };
        let options = RunOptions { lint: false, ..Default::default() };

        let report = judge(adapter.as_ref(), &plan, "", &options).await.unwrap();

        assert!(matches!(
            report.contexts[0].outcome,
            ContextOutcome::Failed { failure: ContextFailure::UnsupportedTypeUsage { .. }, .. }
        ));
        assert_eq!(report.contexts[0].name, "Context0");
    }

    #[tokio::test]
    async fn test_haskell_char_sequence_is_rejected_before_generation() {
        let adapter = adapter_for(Language::Haskell, &AdapterConfig::default()).unwrap();
        let chars = Value::sequence(vec![Value::char('a'), Value::char('b')]);
        let plan = TestPlan {
            contexts: vec![
                Context { testcases: vec![testcase(chars)], ..Default::default() },
                Context { testcases: vec![testcase(Value::set(vec![]))], ..Default::default() },
            ],
        };
        let options = RunOptions { lint: false, ..Default::default() };

        let report = judge(adapter.as_ref(), &plan, "", &options).await.unwrap();

        assert_eq!(
            report.contexts[0].outcome,
            ContextOutcome::Failed {
                failure: ContextFailure::UnsupportedTypeUsage {
                    language: "haskell".into(),
                    ty: polyjudge_common::types::ValueType::Sequence,
                },
                partial_values: vec![],
            }
        );
    }

    #[tokio::test]
    async fn test_interrupted_run_still_reports_every_context() {
        let adapter = adapter_for(Language::Python, &AdapterConfig::default()).unwrap();
        let plan = TestPlan {
            contexts: vec![
                Context { testcases: vec![testcase(Value::integer(1))], ..Default::default() },
                Context { testcases: vec![testcase(Value::integer(2))], ..Default::default() },
            ],
        };
        let options = RunOptions { lint: false, ..Default::default() };
        let (handle, interrupt) = crate::interrupt::channel();
        handle.interrupt();

        let report = judge_interruptible(adapter.as_ref(), &plan, "", &options, &interrupt).await.unwrap();

        assert_eq!(report.contexts.len(), 2);
        for context in &report.contexts {
            assert_eq!(
                context.outcome,
                ContextOutcome::Failed {
                    failure: ContextFailure::TimedOut { stage: Stage::Generation, limit: LimitKind::Interrupted },
                    partial_values: vec![],
                }
            );
        }
    }
}
