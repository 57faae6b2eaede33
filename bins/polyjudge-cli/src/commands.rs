// CLI commands for inspecting the judge core
use anyhow::{Context, Result};
use polyjudge_common::plan::TestPlan;
use polyjudge_common::report::{ContextOutcome, Verdict};
use polyjudge_common::serialization::{decode_prefix, decode_stream};
use polyjudge_common::types::Value;
use polyjudge_worker::config::{AdapterConfig, JudgeConfig};
use polyjudge_worker::executor;
use polyjudge_worker::interrupt;
use polyjudge_worker::languages::{adapter_for, consume_shebang, Language, LanguageAdapter};
use std::fmt::Write as _;
use std::fs;
use std::path::Path;

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn adapter(language: &str, config: &AdapterConfig) -> Result<Box<dyn LanguageAdapter>> {
    let language: Language = language.parse()?;
    adapter_for(language, config)
}

/// Support levels and constructs of one adapter as a table
pub fn support_table(adapter: &dyn LanguageAdapter) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "📋 {} (.{})\n", adapter.language(), adapter.file_extension());
    let _ = writeln!(out, "{:<18} {:<12} {:<10}", "TYPE", "BASIC", "SUPPORT");
    let _ = writeln!(out, "{}", "─".repeat(42));
    for (ty, level) in adapter.type_support().iter() {
        let _ = writeln!(out, "{:<18} {:<12} {:<10}", ty.to_string(), ty.basic().to_string(), level.to_string());
    }
    let constructs: Vec<String> = adapter.supported_constructs().iter().map(|c| c.to_string()).collect();
    let _ = writeln!(out, "\nConstructs: {}", constructs.join(", "));
    let _ = writeln!(out, "Selector:   {}", if adapter.needs_selector() { "yes" } else { "no" });
    out
}

pub fn print_support(language: Option<&str>) -> Result<()> {
    let config = AdapterConfig::default();
    let languages = match language {
        Some(language) => vec![language.parse::<Language>()?],
        None => Language::ALL.to_vec(),
    };
    for language in languages {
        let adapter = adapter_for(language, &config)?;
        println!("{}", support_table(adapter.as_ref()));
    }
    Ok(())
}

/// One line per decoded value; stops with the decode error, if any
pub fn describe_stream(content: &str, expected: Option<usize>) -> Result<String> {
    let mut out = String::new();
    let values: Vec<Value> = match expected {
        Some(expected) => decode_stream(content, expected)?,
        None => match decode_prefix(content) {
            (values, None) => values,
            (values, Some(e)) => {
                for (i, value) in values.iter().enumerate() {
                    let _ = writeln!(out, "{:>4}  {:<18} {}", i + 1, value.ty().to_string(), value);
                }
                return Err(anyhow::Error::new(e).context(out));
            }
        },
    };
    for (i, value) in values.iter().enumerate() {
        let _ = writeln!(out, "{:>4}  {:<18} {}", i + 1, value.ty().to_string(), value);
    }
    let _ = write!(out, "✅ {} value(s)", values.len());
    Ok(out)
}

pub fn decode_file(file: &Path, expected: Option<usize>) -> Result<()> {
    let content = read(file)?;
    println!("{}", describe_stream(&content, expected)?);
    Ok(())
}

pub fn normalize_file(language: &str, file: &Path, natural_language: &str) -> Result<()> {
    let config = AdapterConfig { natural_language: natural_language.to_string(), ..Default::default() };
    let adapter = adapter(language, &config)?;
    print!("{}", adapter.cleanup_stacktrace(&read(file)?));
    Ok(())
}

pub fn render_encoder(language: &str, values: &Path) -> Result<()> {
    let values: Vec<Value> = serde_json::from_str(&read(values)?).context("Failed to parse values")?;
    let adapter = adapter(language, &AdapterConfig::default())?;
    if let Some(ty) = values.iter().find_map(|v| adapter.type_support().first_unsupported(v)) {
        anyhow::bail!("{} does not support type '{}'", adapter.language(), ty);
    }
    print!("{}", adapter.generate_encoder(&values));
    Ok(())
}

/// Source with its shebang removed, and the language to judge it in
///
/// An explicit `--language` wins over the shebang, which wins over the config.
pub fn resolve_submission(flag: Option<&str>, source: &str, config: &JudgeConfig) -> Result<(String, Language)> {
    let (source, declared) = consume_shebang(source);
    let language = config.submission_language(flag.or(declared.as_deref()))?;
    Ok((source, language))
}

pub async fn judge(language: Option<&str>, plan: &Path, submission: &Path, config: Option<&Path>) -> Result<()> {
    let config = match config {
        Some(path) => JudgeConfig::load(path)?,
        None => JudgeConfig::default(),
    };
    let (submission, language) = resolve_submission(language, &read(submission)?, &config)?;
    let adapter = adapter_for(language, &config.adapter_config())?;
    let plan: TestPlan = serde_json::from_str(&read(plan)?).context("Failed to parse test plan")?;

    let options = config.run_options();
    let (handle, interrupt) = interrupt::channel();
    let judging = executor::judge_interruptible(adapter.as_ref(), &plan, &submission, &options, &interrupt);
    tokio::pin!(judging);
    let report = tokio::select! {
        report = &mut judging => report?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("⚠️  Interrupted, remaining contexts are reported as timed out");
            handle.interrupt();
            judging.await?
        }
    };

    for context in &report.contexts {
        let status = match &context.outcome {
            ContextOutcome::Evaluated { .. } => "evaluated".to_string(),
            ContextOutcome::Failed { failure, .. } => failure.to_string(),
        };
        eprintln!("  {:<20} {:>6} ms  {}", context.name, context.elapsed_ms, status);
    }
    eprintln!(
        "\n✅ {} correct, {} wrong, {} not judged",
        report.count(Verdict::Correct),
        report.count(Verdict::Wrong),
        report.count(Verdict::ContextFailed)
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
