pub mod aggregate;
pub mod partition;

pub use aggregate::{DEFAULT_CHUNK_BYTES, MIN_CHUNK_BYTES, ScanError, aggregate_range};
pub use partition::split;
