//! Top-level parse orchestration: build the read-only registries, fan the
//! input out over newline-aligned ranges, merge the partial matrices, emit
//! the document.

pub mod coordinator;
pub mod error;

pub use error::EngineError;

use basalt_index::{DateIndex, PathRegistry};
use basalt_ipc::Transport;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;
use tracing::info;

/// Knobs for one invocation. `Default` matches the shipped config defaults.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Exact worker count; `None` derives it from the CPU count.
    pub workers: Option<usize>,
    /// Upper bound on the derived worker count.
    pub max_workers: usize,
    /// Read-chunk size per worker.
    pub chunk_bytes: usize,
    /// Registry pre-scan window.
    pub prescan_bytes: usize,
    /// Forced transport; `None` probes.
    pub transport: Option<Transport>,
    /// Previously seen URIs, registered before the pre-scan so recurring
    /// slugs keep their low ids across runs.
    pub seed_uris: Vec<Vec<u8>>,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            workers: None,
            max_workers: 16,
            chunk_bytes: basalt_scan::DEFAULT_CHUNK_BYTES,
            prescan_bytes: 16 << 20,
            transport: None,
            seed_uris: Vec::new(),
        }
    }
}

/// What one completed parse did, for logging and assertions.
#[derive(Debug, Clone, Copy)]
pub struct ParseSummary {
    /// Accepted input rows (= the sum over the merged matrix).
    pub rows: u64,
    /// Distinct registered paths `P`.
    pub paths: u32,
    /// Calendar days `D`.
    pub days: u32,
    pub workers: usize,
    pub transport: Transport,
}

/// Aggregates `input` into `output`. The whole pipeline of one invocation:
/// registries, partitioning, workers, merge, emission.
pub fn parse(input: &Path, output: &Path, opts: &ParseOptions) -> Result<ParseSummary, EngineError> {
    let started = Instant::now();

    let file_size = std::fs::metadata(input)
        .map_err(|source| EngineError::Input {
            path: input.to_owned(),
            source,
        })?
        .len();

    let dates = DateIndex::build();
    let mut registry = PathRegistry::new(dates.count());
    registry.seed(opts.seed_uris.iter().map(|uri| uri.as_slice()));
    let seeded = registry.count();
    registry
        .pre_scan(input, file_size, opts.prescan_bytes)
        .map_err(|source| EngineError::Input {
            path: input.to_owned(),
            source,
        })?;
    info!(
        seeded,
        discovered = registry.count() - seeded,
        file_size,
        "registry ready"
    );

    let workers = worker_count(opts, file_size);
    let transport = basalt_ipc::select(opts.transport);

    let counts = if file_size == 0 || registry.count() == 0 {
        vec![0u32; registry.matrix_len()]
    } else {
        coordinator::run(
            input,
            file_size,
            &registry,
            &dates,
            workers,
            transport,
            opts.chunk_bytes,
        )?
    };

    let out_file = File::create(output).map_err(|source| EngineError::Output {
        path: output.to_owned(),
        source,
    })?;
    let mut out = BufWriter::new(out_file);
    basalt_emit::emit(&counts, &registry, &dates, &mut out).map_err(|source| {
        EngineError::Output {
            path: output.to_owned(),
            source,
        }
    })?;
    out.flush().map_err(|source| EngineError::Output {
        path: output.to_owned(),
        source,
    })?;

    let rows: u64 = counts.iter().map(|&c| c as u64).sum();
    let summary = ParseSummary {
        rows,
        paths: registry.count(),
        days: dates.count(),
        workers,
        transport,
    };
    info!(
        rows,
        paths = summary.paths,
        workers,
        %transport,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "parse complete"
    );
    Ok(summary)
}

/// `min(logical cpus, max_workers)`, floor 1. Inputs smaller than the
/// pre-scan window already fit one worker's first chunk, so they skip the
/// fan-out entirely.
fn worker_count(opts: &ParseOptions, file_size: u64) -> usize {
    if let Some(w) = opts.workers {
        return w.max(1);
    }
    if file_size < opts.prescan_bytes as u64 {
        return 1;
    }
    num_cpus::get().min(opts.max_workers).max(1)
}
