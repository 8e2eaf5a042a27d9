//! Timing scopes, per-scope totals and an optional event log.
//!
//! Every finished [`Scope`] adds to a running total for its name, which
//! [`summary`] reports. With [`set_enabled`] each scope is also echoed
//! to stderr. Once [`set_debug_log_path`] opens a log file, scopes and
//! [`log_event`] calls are appended to it, stamped relative to when the
//! log was opened.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{LazyLock, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Environment variable naming a debug log file.
pub const DEBUG_LOG_ENV: &str = "EDITSYNC_DEBUG_LOG";

static ECHO: AtomicBool = AtomicBool::new(false);
static RECORDER: LazyLock<Mutex<Recorder>> = LazyLock::new(|| Mutex::new(Recorder::new()));

#[derive(Debug)]
struct Recorder {
    opened: Instant,
    log: Option<BufWriter<File>>,
    totals: BTreeMap<&'static str, ScopeTotal>,
}

impl Recorder {
    fn new() -> Self {
        Self {
            opened: Instant::now(),
            log: None,
            totals: BTreeMap::new(),
        }
    }

    fn append(&mut self, name: &str, detail: &str) {
        let stamp = self.opened.elapsed().as_secs_f64() * 1000.0;
        if let Some(log) = self.log.as_mut() {
            // Logging must never disturb a cycle
            let _ = writeln!(log, "[{stamp:>10.3} ms] {name}: {detail}");
            let _ = log.flush();
        }
    }
}

fn recorder() -> MutexGuard<'static, Recorder> {
    RECORDER
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Accumulated time for one scope name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeTotal {
    pub calls: u64,
    pub total: Duration,
    pub max: Duration,
}

impl ScopeTotal {
    pub fn mean(&self) -> Duration {
        u32::try_from(self.calls)
            .ok()
            .filter(|&calls| calls > 0)
            .map_or(Duration::ZERO, |calls| self.total / calls)
    }
}

/// Guard returned by [`scope`]; records its lifetime when dropped.
#[derive(Debug)]
pub struct Scope {
    name: &'static str,
    started: Instant,
}

impl Drop for Scope {
    fn drop(&mut self) {
        let took = self.started.elapsed();
        let ms = took.as_secs_f64() * 1000.0;
        if is_enabled() {
            eprintln!("[perf] {}: {ms:.3} ms", self.name);
        }
        let mut recorder = recorder();
        let entry = recorder.totals.entry(self.name).or_default();
        entry.calls += 1;
        entry.total += took;
        entry.max = entry.max.max(took);
        recorder.append(self.name, &format!("took {ms:.3} ms"));
    }
}

pub fn set_enabled(enabled: bool) {
    ECHO.store(enabled, Ordering::Relaxed);
}

pub fn is_enabled() -> bool {
    ECHO.load(Ordering::Relaxed)
}

pub fn scope(name: &'static str) -> Scope {
    Scope {
        name,
        started: Instant::now(),
    }
}

/// Totals for every scope name seen so far, sorted by name.
pub fn summary() -> Vec<(&'static str, ScopeTotal)> {
    recorder()
        .totals
        .iter()
        .map(|(&name, &total)| (name, total))
        .collect()
}

/// Open (or with `None`, close) the debug log.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn set_debug_log_path(path: Option<&Path>) -> std::io::Result<()> {
    let mut recorder = recorder();
    let Some(path) = path else {
        recorder.log = None;
        return Ok(());
    };
    let mut log = BufWriter::new(File::create(path)?);
    writeln!(log, "editsync debug log opened")?;
    log.flush()?;
    recorder.opened = Instant::now();
    recorder.log = Some(log);
    Ok(())
}

pub fn is_debug_log_enabled() -> bool {
    recorder().log.is_some()
}

/// Append one line to the debug log, if open.
pub fn log_event(name: &str, detail: impl AsRef<str>) {
    recorder().append(name, detail.as_ref());
}
