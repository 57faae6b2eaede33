use anyhow::Context;
use polyjudge_common::plan::TestPlan;
use polyjudge_common::report::Verdict;
use polyjudge_worker::config::JudgeConfig;
use polyjudge_worker::executor;
use polyjudge_worker::interrupt;
use polyjudge_worker::languages::{adapter_for, consume_shebang};
use tokio::signal;
use tracing::{error, info, warn};

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_line_number(true)
        // stdout carries the report
        .with_writer(std::io::stderr);

    if std::env::var("JUDGE_LOG_FORMAT").map(|f| f == "json").unwrap_or(false) {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn read_input(variable: &str) -> anyhow::Result<String> {
    let path = std::env::var(variable).with_context(|| format!("{} is not set", variable))?;
    std::fs::read_to_string(&path).with_context(|| format!("Failed to read {} ({})", path, variable))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    info!("Polyjudge worker booting...");

    let config = JudgeConfig::from_env().map_err(|e| {
        error!("Failed to load judge configuration: {:#}", e);
        e
    })?;
    let plan: TestPlan = serde_json::from_str(&read_input("JUDGE_PLAN")?).context("Failed to parse test plan")?;
    let (submission, declared) = consume_shebang(&read_input("JUDGE_SUBMISSION")?);
    let language = config.submission_language(declared.as_deref())?;
    let adapter = adapter_for(language, &config.adapter_config())?;
    info!(
        language = %language,
        time_limit_ms = config.time_limit_ms,
        memory_limit_mb = config.memory_limit_mb,
        parallelism = config.parallelism,
        "Judge configured"
    );

    info!(contexts = plan.contexts.len(), submission_bytes = submission.len(), "Loaded test plan");

    let options = config.run_options();
    let (handle, interrupt) = interrupt::channel();
    let judging = executor::judge_interruptible(adapter.as_ref(), &plan, &submission, &options, &interrupt);
    tokio::pin!(judging);
    let report = tokio::select! {
        report = &mut judging => report?,
        _ = signal::ctrl_c() => {
            warn!("Received shutdown signal, finishing with a partial report");
            handle.interrupt();
            judging.await?
        }
    };

    info!(
        run_id = %report.run_id,
        correct = report.count(Verdict::Correct),
        wrong = report.count(Verdict::Wrong),
        context_failed = report.count(Verdict::ContextFailed),
        "Report ready"
    );
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
