//! Transports for publishing partial counter matrices to the coordinator.
//!
//! A worker produces a `Vec<u32>` of length `P * D`. Three mechanisms move
//! it across the join, all yielding the same merged accumulator:
//!
//! 1. by value: the thread's return slot, no serialisation at all;
//! 2. [`SharedSegment`]: a memory-mapped file of exactly `P * D * 4`
//!    bytes, preferably on tmpfs, holding the matrix as little-endian u32s;
//! 3. payload files: the same byte layout written through ordinary file
//!    I/O into the probed fast directory.
//!
//! The byte layout is identical for (2) and (3), so the consume side is one
//! shared validate-and-sum routine.

mod codec;
pub mod payload;
pub mod probe;
pub mod segment;

pub use payload::{PayloadError, consume_payload, payload_path, write_payload};
pub use probe::{Transport, fast_payload_dir, select};
pub use segment::SharedSegment;
