//! Partial matrices as plain payload files.
//!
//! Last rung of the transport ladder: the worker writes its matrix as
//! little-endian u32s to a file in the probed fast directory, the
//! coordinator reads it back, validates the length, sums, and unlinks.
//! Everything is transient within one invocation.

use crate::codec::{store_le, sum_le};
use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("payload I/O on '{}'", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The file exists but is not `cells * 4` bytes; the producing worker
    /// died mid-write or the file was tampered with. The coordinator treats
    /// this like a failed worker.
    #[error("payload '{}' is {actual} bytes, expected {expected}", path.display())]
    WrongLength {
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
}

/// File name for worker `idx`'s payload, pid-suffixed so concurrent
/// invocations sharing a temp directory cannot collide.
pub fn payload_path(dir: &Path, idx: usize) -> PathBuf {
    dir.join(format!("basalt_partial_{}_{idx}", std::process::id()))
}

/// Writes a finished partial to `path` in one shot.
pub fn write_payload(path: &Path, counts: &[u32]) -> io::Result<()> {
    let mut bytes = vec![0u8; counts.len() * 4];
    store_le(counts, &mut bytes);

    let mut file = File::create(path)?;
    file.write_all(&bytes)?;
    Ok(())
}

/// Reads the payload at `path`, validates its size against `acc`, sums it
/// into `acc`, and removes the file.
pub fn consume_payload(path: &Path, acc: &mut [u32]) -> Result<(), PayloadError> {
    let expected = acc.len() as u64 * 4;
    let io_err = |source| PayloadError::Io {
        path: path.to_owned(),
        source,
    };

    let mut file = File::open(path).map_err(io_err)?;
    let actual = file.metadata().map_err(io_err)?.len();
    if actual != expected {
        return Err(PayloadError::WrongLength {
            path: path.to_owned(),
            expected,
            actual,
        });
    }

    let mut bytes = Vec::with_capacity(expected as usize);
    file.read_to_end(&mut bytes).map_err(io_err)?;
    if bytes.len() as u64 != expected {
        return Err(PayloadError::WrongLength {
            path: path.to_owned(),
            expected,
            actual: bytes.len() as u64,
        });
    }

    sum_le(&bytes, acc);
    std::fs::remove_file(path).map_err(io_err)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("basalt_payload_test_{name}_{}", std::process::id()))
    }

    #[test]
    fn payload_round_trips_and_unlinks() {
        let path = scratch("roundtrip");
        write_payload(&path, &[1, 2, 3]).unwrap();

        let mut acc = vec![10u32, 20, 30];
        consume_payload(&path, &mut acc).unwrap();
        assert_eq!(acc, vec![11, 22, 33]);
        assert!(!path.exists(), "payload must be removed after consumption");
    }

    #[test]
    fn short_payload_is_rejected_and_kept_out_of_the_sum() {
        let path = scratch("short");
        std::fs::write(&path, [0u8; 7]).unwrap();

        let mut acc = vec![4u32, 4];
        let err = consume_payload(&path, &mut acc).unwrap_err();
        assert!(matches!(err, PayloadError::WrongLength { expected: 8, actual: 7, .. }));
        assert_eq!(acc, vec![4, 4], "accumulator must be untouched");

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn missing_payload_reports_io() {
        let mut acc = vec![0u32; 2];
        let err = consume_payload(Path::new("/nonexistent/basalt-payload"), &mut acc).unwrap_err();
        assert!(matches!(err, PayloadError::Io { .. }));
    }

    #[test]
    fn payload_paths_are_distinct_per_worker() {
        let dir = std::env::temp_dir();
        assert_ne!(payload_path(&dir, 1), payload_path(&dir, 2));
    }
}
