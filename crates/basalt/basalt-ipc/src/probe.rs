//! Transport capability probing.
//!
//! Selection happens once per invocation and changes nothing but the way
//! partials travel: the merged accumulator, and therefore the output bytes,
//! are identical across transports.

use std::fmt;
use std::path::{Path, PathBuf};

/// How a worker's partial matrix reaches the coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// Thread return slot; no serialisation.
    ByValue,
    /// Memory-mapped segment of exactly `P * D * 4` bytes.
    SharedSegment,
    /// Little-endian payload file in the fast directory.
    TempFile,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Transport::ByValue => "by-value",
            Transport::SharedSegment => "shared-segment",
            Transport::TempFile => "temp-file",
        })
    }
}

/// Picks the transport for this invocation.
///
/// The preference ladder is by-value -> shared segment -> temp file. With no
/// caller override the probe takes the first rung whose capability checks
/// out; an explicit preference is honoured as-is (its own setup failures
/// fall through at run time).
pub fn select(preference: Option<Transport>) -> Transport {
    if let Some(t) = preference {
        return t;
    }
    if can_spawn_thread() {
        return Transport::ByValue;
    }
    if dir_is_writable(&fast_payload_dir()) {
        return Transport::SharedSegment;
    }
    Transport::TempFile
}

/// Directory for segment and payload files: tmpfs-backed `/dev/shm` when it
/// is present and writable, else the system temp directory.
pub fn fast_payload_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        let shm = Path::new("/dev/shm");
        if dir_is_writable(shm) {
            return shm.to_path_buf();
        }
    }
    std::env::temp_dir()
}

fn can_spawn_thread() -> bool {
    std::thread::Builder::new()
        .name("basalt-probe".into())
        .spawn(|| {})
        .map(|h| h.join().is_ok())
        .unwrap_or(false)
}

fn dir_is_writable(dir: &Path) -> bool {
    if !dir.is_dir() {
        return false;
    }
    let probe = dir.join(format!("basalt_probe_{}", std::process::id()));
    match std::fs::File::create(&probe) {
        Ok(_) => {
            let _ = std::fs::remove_file(&probe);
            true
        }
        Err(_) => false,
    }
}
