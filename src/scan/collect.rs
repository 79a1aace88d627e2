//! Probe scheduling.
//!
//! One probe task per entry runs on a dedicated rayon pool sized to the
//! worker limit, so the pool itself is the admission gate. Tasks are
//! dispatched FIFO in scan-list order. Each task writes its slot once, then
//! sends the slot index over a channel; the calling thread drains that
//! channel and runs the completion callback serially, one result at a time.
//!
//! ```text
//! caller thread                     worker thread (rayon pool, N threads)
//! ─────────────                     ─────────────────────────────────────
//! run_all ── spawn ───────────────▶ scope_fifo: spawn_fifo × entries
//!   │                                 probe(entry) → slots.fill(idx)
//!   │ ◀──────────── idx ───────────── tx.send(idx)
//!   on_complete(idx, &slots)
//!   …until every sender is dropped
//! ```

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use crossbeam_channel as chan;

use super::{Entry, RepoStatus, ResultSlots};
use crate::shell_exec::trace_instant;

/// How often the drain loop wakes to check for an interrupt.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How the drain loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainOutcome {
    /// Every task finished and its completion was processed.
    Complete,
    /// `should_stop` returned true before all tasks finished. Workers are
    /// left running; the caller is expected to exit.
    Interrupted,
}

/// Probe every entry with at most `max_workers` probes in flight.
///
/// `on_complete` runs on the calling thread after each slot is filled, never
/// concurrently with itself. `should_stop` is checked between completions
/// only, so a callback is never cut short by an interrupt.
pub fn run_all<P, F, S>(
    entries: Arc<[Entry]>,
    max_workers: usize,
    slots: Arc<ResultSlots>,
    probe: P,
    mut on_complete: F,
    mut should_stop: S,
) -> anyhow::Result<DrainOutcome>
where
    P: Fn(&Entry) -> RepoStatus + Send + Sync + 'static,
    F: FnMut(usize, &ResultSlots) -> anyhow::Result<()>,
    S: FnMut() -> bool,
{
    debug_assert_eq!(entries.len(), slots.len());
    let total = entries.len();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(max_workers.max(1))
        .thread_name(|i| format!("repo-check-probe-{i}"))
        .build()
        .context("failed to start probe workers")?;

    let (tx, rx) = chan::unbounded::<usize>();
    let worker_slots = Arc::clone(&slots);

    trace_instant("Spawning probe workers");
    std::thread::spawn(move || {
        let probe = &probe;
        let entries = &entries;
        let slots = &worker_slots;
        let tx = &tx;
        pool.scope_fifo(|s| {
            for idx in 0..entries.len() {
                s.spawn_fifo(move |_| {
                    let status = probe_contained(probe, &entries[idx]);
                    slots.fill(idx, status);
                    // The receiver is gone only after an interrupt
                    let _ = tx.send(idx);
                });
            }
        });
    });

    let mut received = 0;
    loop {
        if should_stop() {
            log::debug!("Drain interrupted after {received}/{total} results");
            return Ok(DrainOutcome::Interrupted);
        }

        let idx = match rx.recv_timeout(POLL_INTERVAL) {
            Ok(idx) => idx,
            Err(chan::RecvTimeoutError::Timeout) => continue,
            Err(chan::RecvTimeoutError::Disconnected) => break,
        };

        if received == 0 {
            trace_instant("First result received");
        }
        received += 1;
        on_complete(idx, &slots)?;
    }

    trace_instant("All results drained");
    if received < total {
        log::warn!("Only {received} of {total} probes reported back");
    }
    Ok(DrainOutcome::Complete)
}

/// Run one probe, turning a panic into a failed result so the rest of the
/// batch still completes.
fn probe_contained<P>(probe: &P, entry: &Entry) -> RepoStatus
where
    P: Fn(&Entry) -> RepoStatus,
{
    catch_unwind(AssertUnwindSafe(|| probe(entry))).unwrap_or_else(|_| {
        log::warn!("Probe panicked for {}", entry.path.display());
        RepoStatus::ProbeFailed {
            message: "probe panicked".to_string(),
        }
    })
}
