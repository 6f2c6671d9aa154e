//! Newline-aligned byte-range partitioning of the input file.
//!
//! `split` returns `w + 1` non-decreasing boundaries covering
//! `[0, file_size)` exactly. Every interior boundary sits one byte past a
//! `\n`, so each worker's half-open range `[bounds[i], bounds[i+1])` begins
//! at a line start and ends after a line terminator. Two coincident
//! boundaries denote an empty slice; the worker for it returns a zero
//! partial.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;

/// Splits `[0, file_size)` into `w` newline-aligned ranges.
///
/// Boundary `i` is the first line start at or after
/// `floor(file_size * i / w)`; when no newline remains past the naive split
/// point, the boundary collapses to `file_size`.
pub fn split(path: &Path, file_size: u64, w: usize) -> io::Result<Vec<u64>> {
    assert!(w >= 1, "at least one range");

    let mut bounds = Vec::with_capacity(w + 1);
    bounds.push(0);

    if w > 1 && file_size > 0 {
        let mut file = File::open(path)?;
        let mut probe = [0u8; 8192];
        for i in 1..w as u64 {
            let target = file_size * i / w as u64;
            bounds.push(next_line_start(&mut file, target, file_size, &mut probe)?);
        }
    } else {
        bounds.resize(w, 0);
    }

    bounds.push(file_size);
    Ok(bounds)
}

/// Position one past the first `\n` at or after `target`, or `file_size`
/// when the remainder of the file has no newline.
fn next_line_start(
    file: &mut File,
    target: u64,
    file_size: u64,
    probe: &mut [u8],
) -> io::Result<u64> {
    file.seek(SeekFrom::Start(target))?;
    let mut pos = target;
    loop {
        let n = file.read(probe)?;
        if n == 0 {
            return Ok(file_size);
        }
        if let Some(i) = probe[..n].iter().position(|&b| b == b'\n') {
            return Ok(pos + i as u64 + 1);
        }
        pos += n as u64;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn fixture(lines: usize) -> (NamedTempFile, Vec<u8>) {
        let mut file = NamedTempFile::new().unwrap();
        let mut bytes = Vec::new();
        for i in 0..lines {
            bytes.extend_from_slice(
                format!("https://stitcher.io/blog/post-{i},2024-01-15T10:00:00+00:00\n").as_bytes(),
            );
        }
        file.write_all(&bytes).unwrap();
        (file, bytes)
    }

    #[test]
    fn ranges_cover_the_file_exactly() {
        let (file, bytes) = fixture(100);
        let size = bytes.len() as u64;

        for w in [1usize, 2, 3, 4, 7, 16] {
            let bounds = split(file.path(), size, w).unwrap();
            assert_eq!(bounds.len(), w + 1);
            assert_eq!(bounds[0], 0);
            assert_eq!(bounds[w], size);
            for pair in bounds.windows(2) {
                assert!(pair[0] <= pair[1], "boundaries must be non-decreasing");
            }
        }
    }

    #[test]
    fn interior_boundaries_follow_a_newline() {
        let (file, bytes) = fixture(64);
        let size = bytes.len() as u64;

        let bounds = split(file.path(), size, 5).unwrap();
        for &b in &bounds[1..5] {
            if b != 0 && b != size {
                assert_eq!(bytes[b as usize - 1], b'\n', "boundary {b} not line-aligned");
            }
        }
    }

    #[test]
    fn more_workers_than_lines_yields_empty_slices() {
        let (file, bytes) = fixture(2);
        let size = bytes.len() as u64;

        let bounds = split(file.path(), size, 8).unwrap();
        assert_eq!(bounds[0], 0);
        assert_eq!(bounds[8], size);
        // The union still covers the file; most slices are empty.
        for pair in bounds.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        assert!(bounds.windows(2).any(|p| p[0] == p[1]));
    }

    #[test]
    fn empty_file_splits_into_empty_ranges() {
        let file = NamedTempFile::new().unwrap();
        let bounds = split(file.path(), 0, 4).unwrap();
        assert_eq!(bounds, vec![0, 0, 0, 0, 0]);
    }

    #[test]
    fn trailing_bytes_without_newline_collapse_to_eof() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"https://stitcher.io/blog/a,2024-01-15T10:00:00+00:00\nno-newline-tail")
            .unwrap();
        let size = file.as_file().metadata().unwrap().len();

        // Every split point past the only newline lands on EOF.
        let bounds = split(file.path(), size, 4).unwrap();
        assert_eq!(bounds[0], 0);
        assert_eq!(bounds[4], size);
        for &b in &bounds[1..4] {
            assert!(b == 53 || b == size);
        }
    }
}
