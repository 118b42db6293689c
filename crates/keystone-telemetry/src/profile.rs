//! Per-request span timing used by the HTTP profiler middleware.
//!
//! # Design
//! - A task-local collector marks the future being profiled; spans entered
//!   while that future is polled are attributed to it.
//! - `SpanTimingLayer` records one call per span (on first entry) and sums
//!   busy time across every enter/exit pair. Nested spans therefore report
//!   cumulative time, inner time included.
//! - Outside a profiled task the layer does nothing beyond a task-local probe.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::fs;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use serde::Serialize;
use tracing::span::Id;
use tracing::{Metadata, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;
use tracing_subscriber::registry::LookupSpan;

use crate::error::{Result, TelemetryError};

tokio::task_local! {
    static ACTIVE_PROFILE: Arc<Mutex<Collector>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SpanKey {
    target: &'static str,
    name: &'static str,
    file: Option<&'static str>,
    line: Option<u32>,
}

impl SpanKey {
    fn from_metadata(metadata: &'static Metadata<'static>) -> Self {
        Self {
            target: metadata.target(),
            name: metadata.name(),
            file: metadata.file(),
            line: metadata.line(),
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct SpanStat {
    calls: u64,
    total: Duration,
}

#[derive(Debug, Default)]
struct Collector {
    stats: HashMap<SpanKey, SpanStat>,
}

/// Marker stored on spans that have been counted for the active profile.
struct Counted;

/// Instant at which the span was most recently entered.
struct EnteredAt(Instant);

fn with_collector(record: impl FnOnce(&mut Collector)) {
    let _ = ACTIVE_PROFILE.try_with(|collector| {
        if let Ok(mut guard) = collector.lock() {
            record(&mut guard);
        }
    });
}

fn profiling_active() -> bool {
    ACTIVE_PROFILE.try_with(|_| ()).is_ok()
}

/// Tracing layer that attributes span timings to the active request profile.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpanTimingLayer {
    _private: (),
}

impl SpanTimingLayer {
    /// Construct the layer.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl<S> Layer<S> for SpanTimingLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_enter(&self, id: &Id, ctx: Context<'_, S>) {
        if !profiling_active() {
            return;
        }
        let Some(span) = ctx.span(id) else {
            return;
        };
        let mut extensions = span.extensions_mut();
        if extensions.get_mut::<Counted>().is_none() {
            extensions.insert(Counted);
            let key = SpanKey::from_metadata(span.metadata());
            with_collector(|collector| {
                collector.stats.entry(key).or_default().calls += 1;
            });
        }
        extensions.replace(EnteredAt(Instant::now()));
    }

    fn on_exit(&self, id: &Id, ctx: Context<'_, S>) {
        let Some(span) = ctx.span(id) else {
            return;
        };
        let Some(EnteredAt(started)) = span.extensions_mut().remove::<EnteredAt>() else {
            return;
        };
        let elapsed = started.elapsed();
        let key = SpanKey::from_metadata(span.metadata());
        with_collector(|collector| {
            collector.stats.entry(key).or_default().total += elapsed;
        });
    }
}

/// Run `fut` with a fresh profile collector and return its output with the profile.
pub async fn with_request_profile<Fut, T>(fut: Fut) -> (T, RequestProfile)
where
    Fut: Future<Output = T>,
{
    let collector = Arc::new(Mutex::new(Collector::default()));
    let started = Instant::now();
    let output = ACTIVE_PROFILE.scope(Arc::clone(&collector), fut).await;
    let elapsed = started.elapsed();

    let stats = collector
        .lock()
        .map(|mut guard| std::mem::take(&mut guard.stats))
        .unwrap_or_default();
    let entries = stats
        .into_iter()
        .map(|(key, stat)| ProfileEntry {
            target: key.target.to_string(),
            name: key.name.to_string(),
            location: key.file.map(|file| match key.line {
                Some(line) => format!("{file}:{line}"),
                None => file.to_string(),
            }),
            calls: stat.calls,
            total_us: u64::try_from(stat.total.as_micros()).unwrap_or(u64::MAX),
        })
        .collect();

    let mut profile = RequestProfile {
        elapsed_us: u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX),
        entries,
    };
    profile.sort();
    (output, profile)
}

/// Timing collected for one span definition during a profiled request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileEntry {
    /// Span target (usually the module path).
    pub target: String,
    /// Span name.
    pub name: String,
    /// Source location of the span definition, when known.
    pub location: Option<String>,
    /// Number of span instances entered.
    pub calls: u64,
    /// Busy time summed across all instances, in microseconds.
    pub total_us: u64,
}

impl ProfileEntry {
    fn label(&self) -> String {
        let mut label = format!("{}::{}", self.target, self.name);
        if let Some(location) = &self.location {
            let _ = write!(label, " ({location})");
        }
        label
    }
}

/// Profile of one request: wall-clock time plus per-span statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RequestProfile {
    /// Wall-clock time spent in the profiled future, in microseconds.
    pub elapsed_us: u64,
    /// Per-span statistics ordered by cost.
    pub entries: Vec<ProfileEntry>,
}

impl RequestProfile {
    /// Order entries by total time, then call count, both descending.
    pub fn sort(&mut self) {
        self.entries.sort_by(|left, right| {
            right
                .total_us
                .cmp(&left.total_us)
                .then(right.calls.cmp(&left.calls))
                .then_with(|| left.label().cmp(&right.label()))
        });
    }

    /// Render a text table restricted to the `length` most expensive entries.
    #[must_use]
    pub fn render(&self, length: usize) -> String {
        let total_calls: u64 = self.entries.iter().map(|entry| entry.calls).sum();
        let mut out = String::new();
        let _ = writeln!(
            out,
            "         {total_calls} span calls in {:.3} seconds",
            micros_to_secs(self.elapsed_us)
        );
        out.push('\n');
        if length < self.entries.len() {
            let _ = writeln!(
                out,
                "   List reduced from {} to {length} due to restriction <{length}>",
                self.entries.len()
            );
            out.push('\n');
        }
        let _ = writeln!(out, "   ncalls  tottime  percall  span");
        for entry in self.entries.iter().take(length) {
            let total = micros_to_secs(entry.total_us);
            #[allow(clippy::cast_precision_loss)]
            let per_call = if entry.calls == 0 {
                0.0
            } else {
                total / entry.calls as f64
            };
            let _ = writeln!(
                out,
                "{:>9}  {total:>7.3}  {per_call:>7.3}  {}",
                entry.calls,
                entry.label()
            );
        }
        out
    }

    /// Persist the profile as JSON under `dir`, returning the written path.
    ///
    /// The file name follows `{METHOD}.{path}.{elapsed}ms.{unix_ts}.json`, where
    /// slashes in the path become dots and the bare root path becomes `root`.
    ///
    /// # Errors
    ///
    /// Returns an error when the directory cannot be created, serialisation
    /// fails, or the file cannot be written.
    pub fn persist(
        &self,
        dir: &Path,
        method: &str,
        path: &str,
        now: SystemTime,
    ) -> Result<PathBuf> {
        fs::create_dir_all(dir).map_err(|source| TelemetryError::ProfileCreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let file = dir.join(profile_file_name(method, path, self.elapsed_us, now));
        let body = serde_json::to_vec_pretty(self)
            .map_err(|source| TelemetryError::ProfileSerialize { source })?;
        fs::write(&file, body).map_err(|source| TelemetryError::ProfileWrite {
            path: file.clone(),
            source,
        })?;
        Ok(file)
    }
}

fn profile_file_name(method: &str, path: &str, elapsed_us: u64, now: SystemTime) -> String {
    let trimmed = path.trim_matches('/').replace('/', ".");
    let path_part = if trimmed.is_empty() {
        "root".to_string()
    } else {
        trimmed
    };
    let elapsed_ms = (elapsed_us + 500) / 1000;
    let timestamp = now
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0);
    format!("{method}.{path_part}.{elapsed_ms}ms.{timestamp}.json")
}

#[allow(clippy::cast_precision_loss)]
fn micros_to_secs(micros: u64) -> f64 {
    micros as f64 / 1_000_000.0
}
