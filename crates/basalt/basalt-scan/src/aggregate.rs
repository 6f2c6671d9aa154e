//! The hot loop: one byte range in, one partial counter matrix out.
//!
//! Every accepted line has the fixed shape
//!
//! ```text
//! https://stitcher.io/blog/<slug>,YYYY-MM-DDTHH:MM:SS+00:00\n
//! ^-- 25-byte prefix               ^-- 26-byte tail before \n
//! ```
//!
//! which turns parsing into pure offset arithmetic: with `nl` the position
//! of a line's `\n`, the comma sits at `nl - 26`, the `YY-MM-DD` date key at
//! `comma + 3 .. comma + 11`, and the next line's slug begins at `nl + 26`.
//! The loop never materialises a line or a field; slug and date key are
//! borrowed slices into the read buffer, looked up in the read-only
//! registries, and the only write is a single counter increment at
//! `offset + date_id` (the registry pre-multiplies path ids by the day
//! count, so one add locates the cell).
//!
//! Reads happen in large chunks. Each chunk is cut at its last `\n` and the
//! file cursor seeks back over the unconsumed tail so the next read starts
//! at a line boundary again. Chunk size is a throughput knob, not a
//! correctness one: any chunk comfortably longer than the longest line
//! yields identical counts.

use basalt_index::{DateIndex, LINE_TAIL_LEN, PathRegistry, URL_PREFIX_LEN};
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Default read-chunk size: 32 MiB.
pub const DEFAULT_CHUNK_BYTES: usize = 32 << 20;

/// Smallest accepted chunk. Must exceed the longest input line or a full
/// chunk could contain no `\n` and the range would be abandoned early.
pub const MIN_CHUNK_BYTES: usize = 64 << 10;

/// Worker-fatal scan failures. The coordinator treats any of these as "this
/// range was not counted" and re-aggregates the range itself.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("failed to open '{}'", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to seek in '{}'", path.display())]
    Seek {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read from '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Aggregates `[start, end)` of the input into a fresh partial matrix of
/// length `P * D`. `start` and `end` must be range boundaries (0, file size,
/// or one past a `\n`).
///
/// Lines whose slug or date is not registered are skipped without a
/// diagnostic; that is the documented fixed-shape contract. I/O errors are
/// fatal to the range.
pub fn aggregate_range(
    path: &Path,
    start: u64,
    end: u64,
    registry: &PathRegistry,
    dates: &DateIndex,
    chunk_bytes: usize,
) -> Result<Vec<u32>, ScanError> {
    assert!(
        chunk_bytes >= MIN_CHUNK_BYTES,
        "chunk of {chunk_bytes} bytes cannot be guaranteed to hold a full line"
    );

    let mut counts = vec![0u32; registry.matrix_len()];
    if start >= end || counts.is_empty() {
        return Ok(counts);
    }

    let mut file = File::open(path).map_err(|source| ScanError::Open {
        path: path.to_owned(),
        source,
    })?;
    file.seek(SeekFrom::Start(start))
        .map_err(|source| ScanError::Seek {
            path: path.to_owned(),
            source,
        })?;

    let mut buf = vec![0u8; chunk_bytes];
    let mut remaining = end - start;

    while remaining > 0 {
        let want = remaining.min(chunk_bytes as u64) as usize;
        let filled = read_fill(&mut file, &mut buf[..want]).map_err(|source| ScanError::Read {
            path: path.to_owned(),
            source,
        })?;
        if filled == 0 {
            break;
        }

        let Some(last_nl) = buf[..filled].iter().rposition(|&b| b == b'\n') else {
            // A whole chunk without a newline: undo the read and give up on
            // the slice instead of spinning on it.
            file.seek(SeekFrom::Current(-(filled as i64)))
                .map_err(|source| ScanError::Seek {
                    path: path.to_owned(),
                    source,
                })?;
            break;
        };

        // Hand the unconsumed tail back to the file so the next read starts
        // exactly at the following line start.
        let tail = filled - last_nl - 1;
        if tail > 0 {
            file.seek(SeekFrom::Current(-(tail as i64)))
                .map_err(|source| ScanError::Seek {
                    path: path.to_owned(),
                    source,
                })?;
        }
        remaining -= last_nl as u64 + 1;

        walk_lines(&buf[..=last_nl], registry, dates, &mut counts);
    }

    Ok(counts)
}

/// Walks a buffer that ends exactly at a `\n`, bumping one counter per
/// accepted line.
#[inline(always)]
fn walk_lines(buf: &[u8], registry: &PathRegistry, dates: &DateIndex, counts: &mut [u32]) {
    debug_assert_eq!(buf[buf.len() - 1], b'\n');
    debug_assert_eq!(counts.len(), registry.matrix_len());

    let last_nl = buf.len() - 1;
    let mut pos = URL_PREFIX_LEN;

    while pos < last_nl {
        // Guaranteed to hit: the buffer ends with a newline.
        let Some(nl) = find_nl(buf, pos) else { break };
        if nl < pos + LINE_TAIL_LEN {
            // Line too short to carry the fixed tail. Not expected under the
            // format contract; drop the rest of the buffer.
            break;
        }

        let comma = nl - LINE_TAIL_LEN;
        // SAFETY: pos <= comma < comma + 11 <= nl < buf.len(), checked above.
        let slug = unsafe { buf.get_unchecked(pos..comma) };
        let date_key = unsafe { buf.get_unchecked(comma + 3..comma + 11) };

        if let (Some(offset), Some(date_id)) =
            (registry.offset_of(slug), dates.lookup(date_key))
        {
            // SAFETY: offset = path_id * D with path_id < P, date_id < D,
            // and counts.len() == P * D.
            unsafe {
                *counts.get_unchecked_mut((offset + date_id) as usize) += 1;
            }
        }

        // The next slug starts URL_PREFIX_LEN + 1 bytes past this newline.
        pos = nl + URL_PREFIX_LEN + 1;
    }
}

/// `memchr(3)` for the next `\n`, the same way the fixed-point parser finds
/// its decimal dot.
#[inline(always)]
fn find_nl(buf: &[u8], from: usize) -> Option<usize> {
    let hay = &buf[from..];
    let found = unsafe {
        libc::memchr(
            hay.as_ptr() as *const libc::c_void,
            b'\n' as i32,
            hay.len(),
        )
    };
    if found.is_null() {
        None
    } else {
        // SAFETY: memchr returned a pointer inside `hay`.
        Some(from + unsafe { (found as *const u8).offset_from(hay.as_ptr()) } as usize)
    }
}

/// Reads until the buffer is full or EOF.
fn read_fill(file: &mut File, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = file.read(&mut buf[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
