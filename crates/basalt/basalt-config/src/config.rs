use serde::Deserialize;
use std::path::Path;

/// Performance knobs for one parse invocation. Every field has a default,
/// so an absent or empty config file is valid.
#[derive(Deserialize, Debug, Clone)]
pub struct BasaltConfig {
    /// Hard cap on worker count regardless of CPU topology.
    #[serde(default = "defaults::max_workers")]
    pub max_workers: usize,
    /// Exact worker count override; `None` means one per logical CPU,
    /// capped by `max_workers`.
    #[serde(default)]
    pub workers: Option<usize>,
    /// Read-chunk size per worker, in bytes.
    #[serde(default = "defaults::chunk_bytes")]
    pub chunk_bytes: usize,
    /// Registry pre-scan window, in bytes.
    #[serde(default = "defaults::prescan_bytes")]
    pub prescan_bytes: usize,
    /// Partial-matrix transport: "auto", "by-value", "shared-segment" or
    /// "temp-file".
    #[serde(default = "defaults::transport")]
    pub transport: String,
    /// Optional newline-delimited file of previously seen URIs used to seed
    /// the path registry.
    #[serde(default)]
    pub seed_path: Option<String>,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),
}

mod defaults {
    pub fn max_workers() -> usize {
        16
    }

    pub fn chunk_bytes() -> usize {
        32 << 20 // 32 MiB
    }

    pub fn prescan_bytes() -> usize {
        16 << 20 // 16 MiB
    }

    pub fn transport() -> String {
        "auto".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

impl Default for BasaltConfig {
    fn default() -> Self {
        Self {
            max_workers: defaults::max_workers(),
            workers: None,
            chunk_bytes: defaults::chunk_bytes(),
            prescan_bytes: defaults::prescan_bytes(),
            transport: defaults::transport(),
            seed_path: None,
            log_level: defaults::log_level(),
        }
    }
}

impl BasaltConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: BasaltConfig = toml::from_str(&raw)?;
        Ok(config)
    }
}
