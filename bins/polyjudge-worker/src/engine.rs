/// Process Engine - Child Processes Under Limits
///
/// **Core Responsibility:**
/// Run one compile or execute command and report what happened.
///
/// **Critical Architectural Boundary:**
/// - Engine knows HOW to run a command (process group, limits, capture)
/// - Engine does NOT know languages, wire lines or verdicts
/// - Engine returns raw output; the pipeline classifies it
///
/// **Limits:**
/// Every child gets its own process group. A poll loop samples resident
/// memory of the whole group from `/proc` and watches the deadline;
/// exceeding either kills the group with `SIGKILL`. When the child exits
/// normally the group is killed as well so no descendant outlives it.
/// The `/proc` scan runs on the blocking pool.

use crate::interrupt::Interrupt;
use anyhow::{Context, Result};
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tracing::{debug, warn};

/// Output beyond this is dropped; a child that keeps writing blocks and times out
const MAX_OUTPUT_BYTES: u64 = 16 * 1024 * 1024;
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// One command to run
#[derive(Debug, Clone, Copy)]
pub struct Invocation<'a> {
    pub command: &'a [String],
    pub cwd: &'a Path,
    pub stdin: Option<&'a str>,
    pub timeout: Duration,
    pub memory_limit_kb: u64,
    /// Kills the child early when fired
    pub interrupt: Option<&'a Interrupt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited,
    TimedOut,
    MemoryExceeded,
    Interrupted,
}

#[derive(Debug, Clone)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
    pub signal: Option<i32>,
    pub elapsed: Duration,
    pub peak_memory_kb: Option<u64>,
    pub termination: Termination,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.termination == Termination::Exited && self.exit_code == Some(0)
    }

    /// stdout followed by stderr, for tools that report errors on either
    pub fn combined(&self) -> String {
        match (self.stdout.is_empty(), self.stderr.is_empty()) {
            (true, _) => self.stderr.clone(),
            (_, true) => self.stdout.clone(),
            _ => format!("{}\n{}", self.stdout.trim_end(), self.stderr),
        }
    }
}

/// Process group cleanup guard - kills the whole group on drop
/// This covers cancellation of the running future as well as normal exit
struct ProcessGroupGuard {
    pgid: Option<Pid>,
}

impl ProcessGroupGuard {
    fn new(pid: Option<u32>) -> Self {
        Self { pgid: pid.map(|p| Pid::from_raw(p as i32)) }
    }

    fn kill(&self) {
        if let Some(pgid) = self.pgid {
            // ESRCH just means nothing is left
            let _ = killpg(pgid, Signal::SIGKILL);
        }
    }
}

impl Drop for ProcessGroupGuard {
    fn drop(&mut self) {
        self.kill();
    }
}

fn parse_vm_rss(status: &str) -> Option<u64> {
    status
        .lines()
        .find(|line| line.starts_with("VmRSS:"))
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|kb| kb.parse().ok())
}

/// Process group id from the contents of `/proc/<pid>/stat`
fn parse_pgrp(stat: &str) -> Option<u32> {
    // The command name may contain spaces and parentheses; fields resume after the last ')'
    let rest = &stat[stat.rfind(')')? + 1..];
    rest.split_whitespace().nth(2)?.parse().ok()
}

/// Resident memory of every process in a group, in kB
fn group_memory_kb(pgid: u32) -> Option<u64> {
    let entries = std::fs::read_dir("/proc").ok()?;
    let mut total = 0u64;
    let mut seen = false;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let Some(pid) = name.to_str().and_then(|n| n.parse::<u32>().ok()) else {
            continue;
        };
        let in_group = pid == pgid
            || std::fs::read_to_string(format!("/proc/{}/stat", pid))
                .ok()
                .and_then(|stat| parse_pgrp(&stat))
                == Some(pgid);
        if !in_group {
            continue;
        }
        if let Some(kb) = std::fs::read_to_string(format!("/proc/{}/status", pid))
            .ok()
            .and_then(|status| parse_vm_rss(&status))
        {
            total += kb;
            seen = true;
        }
    }
    seen.then_some(total)
}

async fn sample_memory_kb(pgid: Option<u32>) -> Option<u64> {
    let pgid = pgid?;
    tokio::task::spawn_blocking(move || group_memory_kb(pgid)).await.ok().flatten()
}

async fn interrupted(interrupt: Option<&Interrupt>) {
    match interrupt {
        Some(interrupt) => interrupt.fired().await,
        None => std::future::pending().await,
    }
}

async fn read_capped<R: AsyncRead + Unpin>(reader: Option<R>) -> String {
    let mut buffer = Vec::new();
    if let Some(reader) = reader {
        if let Err(e) = reader.take(MAX_OUTPUT_BYTES).read_to_end(&mut buffer).await {
            warn!(error = %e, "Failed to read child output");
        }
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Run a command to completion or until a limit is hit
///
/// Errors are infrastructure failures only (empty command, spawn failure);
/// everything the child does is described by `ProcessOutput`.
#[tracing::instrument(skip(invocation), fields(program = ?invocation.command.first(), timeout_ms = invocation.timeout.as_millis() as u64))]
pub async fn run(invocation: Invocation<'_>) -> Result<ProcessOutput> {
    let (program, args) = invocation.command.split_first().context("Empty command")?;

    let mut command = Command::new(program);
    command
        .args(args)
        .current_dir(invocation.cwd)
        .stdin(if invocation.stdin.is_some() { Stdio::piped() } else { Stdio::null() })
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .process_group(0)
        .kill_on_drop(true);

    let start = Instant::now();
    let mut child = command
        .spawn()
        .with_context(|| format!("Failed to spawn {}", program))?;
    let pid = child.id();
    let guard = ProcessGroupGuard::new(pid);
    debug!(pid = ?pid, "Spawned child");

    if let (Some(input), Some(mut stdin)) = (invocation.stdin, child.stdin.take()) {
        let input = input.to_string();
        tokio::spawn(async move {
            // The child may exit without reading; a broken pipe is fine
            let _ = stdin.write_all(input.as_bytes()).await;
        });
    }
    let stdout_task = tokio::spawn(read_capped(child.stdout.take()));
    let stderr_task = tokio::spawn(read_capped(child.stderr.take()));

    let mut peak_memory_kb: Option<u64> = None;
    let mut termination = Termination::Exited;
    let status = loop {
        let remaining = invocation.timeout.saturating_sub(start.elapsed());
        tokio::select! {
            status = child.wait() => break Some(status.context("Failed to wait for child")?),
            _ = interrupted(invocation.interrupt) => {
                warn!("Interrupted - killing process group");
                termination = Termination::Interrupted;
                break None;
            }
            _ = tokio::time::sleep(remaining.min(POLL_INTERVAL)) => {
                if let Some(kb) = sample_memory_kb(pid).await {
                    peak_memory_kb = Some(peak_memory_kb.map_or(kb, |p| p.max(kb)));
                    if kb > invocation.memory_limit_kb {
                        warn!(memory_kb = kb, limit_kb = invocation.memory_limit_kb, "Memory limit exceeded - killing process group");
                        termination = Termination::MemoryExceeded;
                        break None;
                    }
                }
                if start.elapsed() >= invocation.timeout {
                    warn!(timeout_ms = invocation.timeout.as_millis() as u64, "Timed out - killing process group");
                    termination = Termination::TimedOut;
                    break None;
                }
            }
        }
    };

    guard.kill();
    let status = match status {
        Some(status) => Some(status),
        None => child.wait().await.ok(),
    };
    let elapsed = start.elapsed();

    let stdout = stdout_task.await.unwrap_or_default();
    let stderr = stderr_task.await.unwrap_or_default();

    let (exit_code, signal) = match (termination, status) {
        (Termination::Exited, Some(status)) => (status.code(), status.signal()),
        _ => (None, Some(Signal::SIGKILL as i32)),
    };

    debug!(
        exit_code = ?exit_code,
        signal = ?signal,
        elapsed_ms = elapsed.as_millis() as u64,
        peak_memory_kb = ?peak_memory_kb,
        stdout_bytes = stdout.len(),
        stderr_bytes = stderr.len(),
        "Child finished"
    );

    Ok(ProcessOutput { stdout, stderr, exit_code, signal, elapsed, peak_memory_kb, termination })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_vm_rss() {
        let status = "Name:\tpython3\nVmPeak:\t   20000 kB\nVmRSS:\t    9876 kB\nThreads:\t1\n";
        assert_eq!(parse_vm_rss(status), Some(9876));
        assert_eq!(parse_vm_rss("Name:\tkthreadd\n"), None);
    }

    #[test]
    fn test_parse_pgrp_with_odd_command_names() {
        assert_eq!(parse_pgrp("1234 (python3) S 1 1234 1234 0 -1"), Some(1234));
        assert_eq!(parse_pgrp("99 (a) b) R 5 77 77 0"), Some(77));
        assert_eq!(parse_pgrp("garbage"), None);
    }

    #[test]
    fn test_combined_output() {
        let output = ProcessOutput {
            stdout: "out\n".into(),
            stderr: "err\n".into(),
            exit_code: Some(1),
            signal: None,
            elapsed: Duration::ZERO,
            peak_memory_kb: None,
            termination: Termination::Exited,
        };
        assert_eq!(output.combined(), "out\nerr\n");
        assert!(!output.success());
    }
}
