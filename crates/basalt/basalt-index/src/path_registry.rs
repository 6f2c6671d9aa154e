//! Slug discovery and dense path ids.
//!
//! Every distinct URL slug gets a dense id in discovery order. The value the
//! registry actually stores is `id * D` (D = calendar-day count): the hot
//! loop then locates a counter cell with a single add, `offset + date_id`,
//! instead of a multiply per line.
//!
//! Discovery runs in two phases before any worker starts:
//! 1. an optional seed list of previously seen URIs, so recurring slugs get
//!    the lowest ids and their counter rows cluster at the cold end of the
//!    matrix where they stay cache-resident;
//! 2. a bounded pre-scan of the head of the input file.
//!
//! The registry is append-only and read-only once aggregation begins. A slug
//! that first appears past the pre-scan window is simply not counted; that
//! is the documented trade-off for keeping the hot loop free of writes to
//! shared state.

use rustc_hash::FxHashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// Fixed URL prefix shared by every accepted line.
pub const URL_PREFIX: &[u8] = b"https://stitcher.io/blog/";

/// Length of [`URL_PREFIX`] in bytes.
pub const URL_PREFIX_LEN: usize = URL_PREFIX.len();

/// Bytes between the end of the slug and the line's `\n`:
/// `,YYYY-MM-DDTHH:MM:SS+00:00` is always exactly 26 bytes.
pub const LINE_TAIL_LEN: usize = 26;

pub struct PathRegistry {
    /// slug -> pre-multiplied matrix offset (`id * stride`). FxHash: the
    /// keys are short trusted slugs, SipHash buys nothing here but latency
    /// on every line of input.
    offsets: FxHashMap<Box<[u8]>, u32>,
    /// id -> slug, in discovery order. Drives emission order.
    slugs: Vec<Box<[u8]>>,
    /// Calendar-day count `D`; the row stride of the counter matrix.
    stride: u32,
}

impl PathRegistry {
    pub fn new(stride: u32) -> Self {
        Self {
            // Sized well past the expected few thousand slugs so the table
            // stays sparse and probe sequences stay short.
            offsets: FxHashMap::with_capacity_and_hasher(4096, Default::default()),
            slugs: Vec::new(),
            stride,
        }
    }

    /// Registers a slug if it is new. Ids are handed out in call order.
    pub fn insert(&mut self, slug: &[u8]) {
        if self.offsets.contains_key(slug) {
            return;
        }
        let offset = self.slugs.len() as u32 * self.stride;
        self.offsets.insert(Box::from(slug), offset);
        self.slugs.push(Box::from(slug));
    }

    /// Seed phase: URIs seen in previous runs, registered before the
    /// pre-scan so they claim the lowest ids. Entries without the fixed
    /// prefix are ignored.
    pub fn seed<'a>(&mut self, uris: impl IntoIterator<Item = &'a [u8]>) {
        for uri in uris {
            if let Some(slug) = uri.strip_prefix(URL_PREFIX) {
                self.insert(slug);
            }
        }
    }

    /// Pre-scan phase: read the first `min(file_size, window_bytes)` bytes,
    /// cut at the last `\n`, and register the slug of every complete
    /// fixed-shape line in the window.
    ///
    /// A window without a single `\n` contributes nothing; with no seed
    /// either, the registry stays empty and aggregation produces the empty
    /// document.
    pub fn pre_scan(
        &mut self,
        path: &Path,
        file_size: u64,
        window_bytes: usize,
    ) -> io::Result<()> {
        let want = file_size.min(window_bytes as u64) as usize;
        if want == 0 {
            return Ok(());
        }

        let mut file = File::open(path)?;
        let mut buf = vec![0u8; want];
        let mut filled = 0;
        while filled < want {
            let n = file.read(&mut buf[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }

        let Some(last_nl) = buf[..filled].iter().rposition(|&b| b == b'\n') else {
            return Ok(());
        };

        let mut pos = 0;
        while pos < last_nl {
            // Always hits: buf[last_nl] is a newline at or past pos.
            let nl = match buf[pos..=last_nl].iter().position(|&b| b == b'\n') {
                Some(i) => pos + i,
                None => break,
            };
            if nl >= pos + URL_PREFIX_LEN + LINE_TAIL_LEN
                && buf[pos..pos + URL_PREFIX_LEN] == *URL_PREFIX
            {
                self.insert(&buf[pos + URL_PREFIX_LEN..nl - LINE_TAIL_LEN]);
            }
            pos = nl + 1;
        }
        Ok(())
    }

    /// Pre-multiplied matrix offset for a slug, or `None` when the slug was
    /// never discovered. Called once per input line with a slice borrowed
    /// straight from the read buffer; no copy, no allocation.
    #[inline(always)]
    pub fn offset_of(&self, slug: &[u8]) -> Option<u32> {
        self.offsets.get(slug).copied()
    }

    /// Number of registered paths (`P`).
    #[inline(always)]
    pub fn count(&self) -> u32 {
        self.slugs.len() as u32
    }

    /// Slug for a dense path id.
    #[inline(always)]
    pub fn slug(&self, id: u32) -> &[u8] {
        &self.slugs[id as usize]
    }

    /// Row stride of the counter matrix (`D`).
    #[inline(always)]
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Total counter-matrix length, `P * D`.
    #[inline(always)]
    pub fn matrix_len(&self) -> usize {
        self.slugs.len() * self.stride as usize
    }
}
