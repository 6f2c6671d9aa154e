pub mod date_index;
pub mod path_registry;

pub use date_index::DateIndex;
pub use path_registry::{LINE_TAIL_LEN, PathRegistry, URL_PREFIX, URL_PREFIX_LEN};
