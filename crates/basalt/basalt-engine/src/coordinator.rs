//! Worker fan-out and partial-matrix reduction.
//!
//! The coordinator partitions the input, spawns one scoped thread per extra
//! worker, and computes slice 0 on its own thread while they run. Partials
//! come back over the selected transport and are summed cell-wise into the
//! coordinator's own matrix; the merge is commutative, so completion order
//! is irrelevant and the result is identical across transports.
//!
//! A worker that fails (scan error, panic, or a payload that does not pass
//! validation) is not retried. Its byte range is simply re-aggregated on
//! the coordinator thread and summed in; only a failure of that in-process
//! retry aborts the parse.

use crate::error::EngineError;
use basalt_index::{DateIndex, PathRegistry};
use basalt_ipc::{
    SharedSegment, Transport, consume_payload, fast_payload_dir, payload_path, write_payload,
};
use basalt_scan::{ScanError, aggregate_range, split};
use std::path::{Path, PathBuf};
use std::thread;
use tracing::{debug, warn};

/// Test-only fault injection: the worker with this index panics before it
/// scans, so the recovery path can be driven deterministically. `usize::MAX`
/// means no injection.
#[cfg(test)]
static INJECT_PANIC_WORKER: std::sync::atomic::AtomicUsize =
    std::sync::atomic::AtomicUsize::new(usize::MAX);

#[cfg(test)]
fn maybe_inject_panic(idx: usize) {
    if INJECT_PANIC_WORKER.load(std::sync::atomic::Ordering::Relaxed) == idx {
        panic!("injected failure in worker {idx}");
    }
}

#[cfg(not(test))]
#[inline(always)]
fn maybe_inject_panic(_idx: usize) {}

/// Aggregates the whole file with `workers` ranges over `transport` and
/// returns the merged matrix.
pub fn run(
    input: &Path,
    file_size: u64,
    registry: &PathRegistry,
    dates: &DateIndex,
    workers: usize,
    transport: Transport,
    chunk_bytes: usize,
) -> Result<Vec<u32>, EngineError> {
    let bounds = split(input, file_size, workers).map_err(|source| EngineError::Input {
        path: input.to_owned(),
        source,
    })?;
    debug!(?bounds, %transport, "input partitioned");

    if workers == 1 {
        return Ok(aggregate_range(
            input,
            bounds[0],
            bounds[1],
            registry,
            dates,
            chunk_bytes,
        )?);
    }

    match transport {
        Transport::ByValue => by_value(input, &bounds, registry, dates, chunk_bytes),
        Transport::SharedSegment => shared_segment(input, &bounds, registry, dates, chunk_bytes),
        Transport::TempFile => temp_file(input, &bounds, registry, dates, chunk_bytes),
    }
}

/// `acc[i] += partial[i]` over the whole matrix.
fn merge_into(acc: &mut [u32], partial: &[u32]) {
    debug_assert_eq!(acc.len(), partial.len());
    for (a, &p) in acc.iter_mut().zip(partial) {
        *a += p;
    }
}

/// In-process fallback for a worker whose partial never arrived.
fn recover(
    input: &Path,
    start: u64,
    end: u64,
    registry: &PathRegistry,
    dates: &DateIndex,
    chunk_bytes: usize,
    acc: &mut [u32],
) -> Result<(), EngineError> {
    let partial = aggregate_range(input, start, end, registry, dates, chunk_bytes)?;
    merge_into(acc, &partial);
    Ok(())
}

/// Primary transport: each thread hands its matrix back through the join.
fn by_value(
    input: &Path,
    bounds: &[u64],
    registry: &PathRegistry,
    dates: &DateIndex,
    chunk_bytes: usize,
) -> Result<Vec<u32>, EngineError> {
    let workers = bounds.len() - 1;

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers - 1);
        for idx in 1..workers {
            let (start, end) = (bounds[idx], bounds[idx + 1]);
            handles.push(scope.spawn(move || {
                maybe_inject_panic(idx);
                aggregate_range(input, start, end, registry, dates, chunk_bytes)
            }));
        }

        let mut acc = aggregate_range(input, bounds[0], bounds[1], registry, dates, chunk_bytes)?;

        for (idx, handle) in (1..workers).zip(handles) {
            match handle.join() {
                Ok(Ok(partial)) => merge_into(&mut acc, &partial),
                Ok(Err(err)) => {
                    warn!(worker = idx, error = %err, "worker failed; re-aggregating its range in-process");
                    recover(input, bounds[idx], bounds[idx + 1], registry, dates, chunk_bytes, &mut acc)?;
                }
                Err(_) => {
                    warn!(worker = idx, "worker panicked; re-aggregating its range in-process");
                    recover(input, bounds[idx], bounds[idx + 1], registry, dates, chunk_bytes, &mut acc)?;
                }
            }
        }
        Ok(acc)
    })
}

/// Shared-segment transport. Segments are created up front, sized to
/// exactly the matrix byte length; a setup failure falls through to the
/// temp-file transport with the same output.
fn shared_segment(
    input: &Path,
    bounds: &[u64],
    registry: &PathRegistry,
    dates: &DateIndex,
    chunk_bytes: usize,
) -> Result<Vec<u32>, EngineError> {
    let workers = bounds.len() - 1;
    let cells = registry.matrix_len();
    let dir = fast_payload_dir();

    let mut segments = Vec::with_capacity(workers - 1);
    let mut seg_paths = Vec::with_capacity(workers - 1);
    for idx in 1..workers {
        let path = dir.join(format!("basalt_segment_{}_{idx}", std::process::id()));
        match SharedSegment::create(&path, cells) {
            Ok(seg) => {
                segments.push(seg);
                seg_paths.push(path);
            }
            Err(err) => {
                warn!(error = %err, "shared-segment setup failed; falling through to temp-file transport");
                drop(segments);
                for p in &seg_paths {
                    let _ = std::fs::remove_file(p);
                }
                return temp_file(input, bounds, registry, dates, chunk_bytes);
            }
        }
    }

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers - 1);
        for (idx, mut seg) in (1..workers).zip(segments) {
            let (start, end) = (bounds[idx], bounds[idx + 1]);
            handles.push(scope.spawn(move || -> Result<SharedSegment, ScanError> {
                maybe_inject_panic(idx);
                let partial = aggregate_range(input, start, end, registry, dates, chunk_bytes)?;
                seg.store(&partial);
                Ok(seg)
            }));
        }

        let mut acc = aggregate_range(input, bounds[0], bounds[1], registry, dates, chunk_bytes)?;

        for ((idx, handle), seg_path) in (1..workers).zip(handles).zip(&seg_paths) {
            match handle.join() {
                Ok(Ok(seg)) => {
                    seg.sum_into(&mut acc);
                    if let Err(err) = seg.destroy() {
                        warn!(error = %err, "failed to remove shared segment");
                    }
                }
                Ok(Err(err)) => {
                    warn!(worker = idx, error = %err, "worker failed; re-aggregating its range in-process");
                    let _ = std::fs::remove_file(seg_path);
                    recover(input, bounds[idx], bounds[idx + 1], registry, dates, chunk_bytes, &mut acc)?;
                }
                Err(_) => {
                    warn!(worker = idx, "worker panicked; re-aggregating its range in-process");
                    let _ = std::fs::remove_file(seg_path);
                    recover(input, bounds[idx], bounds[idx + 1], registry, dates, chunk_bytes, &mut acc)?;
                }
            }
        }
        Ok(acc)
    })
}

#[derive(Debug, thiserror::Error)]
enum WorkerFailure {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error("failed to publish payload")]
    Publish(#[source] std::io::Error),
}

/// Temp-file transport: the same byte layout as a segment, moved through
/// ordinary file I/O. Payloads are validated before they touch the
/// accumulator and unlinked as they are consumed.
fn temp_file(
    input: &Path,
    bounds: &[u64],
    registry: &PathRegistry,
    dates: &DateIndex,
    chunk_bytes: usize,
) -> Result<Vec<u32>, EngineError> {
    let workers = bounds.len() - 1;
    let dir = fast_payload_dir();
    let paths: Vec<PathBuf> = (1..workers).map(|idx| payload_path(&dir, idx)).collect();

    thread::scope(|scope| {
        let mut handles = Vec::with_capacity(workers - 1);
        for (idx, path) in (1..workers).zip(&paths) {
            let (start, end) = (bounds[idx], bounds[idx + 1]);
            handles.push(scope.spawn(move || -> Result<(), WorkerFailure> {
                maybe_inject_panic(idx);
                let partial = aggregate_range(input, start, end, registry, dates, chunk_bytes)?;
                write_payload(path, &partial).map_err(WorkerFailure::Publish)?;
                Ok(())
            }));
        }

        let mut acc = aggregate_range(input, bounds[0], bounds[1], registry, dates, chunk_bytes)?;

        for ((idx, handle), path) in (1..workers).zip(handles).zip(&paths) {
            match handle.join() {
                Ok(Ok(())) => {
                    if let Err(err) = consume_payload(path, &mut acc) {
                        warn!(worker = idx, error = %err, "payload rejected; re-aggregating its range in-process");
                        let _ = std::fs::remove_file(path);
                        recover(input, bounds[idx], bounds[idx + 1], registry, dates, chunk_bytes, &mut acc)?;
                    }
                }
                Ok(Err(err)) => {
                    warn!(worker = idx, error = %err, "worker failed; re-aggregating its range in-process");
                    let _ = std::fs::remove_file(path);
                    recover(input, bounds[idx], bounds[idx + 1], registry, dates, chunk_bytes, &mut acc)?;
                }
                Err(_) => {
                    warn!(worker = idx, "worker panicked; re-aggregating its range in-process");
                    let _ = std::fs::remove_file(path);
                    recover(input, bounds[idx], bounds[idx + 1], registry, dates, chunk_bytes, &mut acc)?;
                }
            }
        }
        Ok(acc)
    })
}
