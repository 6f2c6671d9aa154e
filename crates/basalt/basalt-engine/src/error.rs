use basalt_scan::ScanError;
use std::io;
use std::path::PathBuf;

/// Fatal parse failures. Worker-level trouble never surfaces here; the
/// coordinator recovers it by re-aggregating the affected range, and only a
/// failure of that in-process retry becomes fatal (as `Scan`).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("input unavailable: '{}'", path.display())]
    Input {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("output unwritable: '{}'", path.display())]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Scan(#[from] ScanError),
}
