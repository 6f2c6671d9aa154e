//! Memory-mapped shared segment holding one partial matrix.
//!
//! The coordinator creates every segment before workers start, sized to
//! exactly `cells * 4` bytes and never more. A worker stores its finished
//! partial once; after the join the coordinator sums the segment into the
//! accumulator and destroys it. Single writer, then single reader: the
//! join is the synchronisation point, so the map needs no header or locks.

use crate::codec::{store_le, sum_le};
use memmap2::MmapMut;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

pub struct SharedSegment {
    path: PathBuf,
    /// File handle kept alive to maintain the memory map validity.
    _file: File,
    mmap: MmapMut,
    /// Matrix length in u32 cells (`P * D`).
    cells: usize,
}

impl SharedSegment {
    /// Creates the backing file at `path`, sized to `cells * 4` bytes, and
    /// maps it read-write.
    pub fn create<P: AsRef<Path>>(path: P, cells: usize) -> io::Result<Self> {
        let path = path.as_ref().to_owned();
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(true)
            .open(&path)?;
        file.set_len(cells as u64 * 4)?;

        // SAFETY: the file was just created with the mapped length and the
        // handle is held for the lifetime of the map.
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(Self {
            path,
            _file: file,
            mmap,
            cells,
        })
    }

    /// Matrix length in u32 cells.
    #[inline]
    pub fn cells(&self) -> usize {
        self.cells
    }

    /// Publishes a finished partial into the segment.
    pub fn store(&mut self, counts: &[u32]) {
        store_le(counts, &mut self.mmap[..]);
    }

    /// Adds the stored partial into `acc`.
    pub fn sum_into(&self, acc: &mut [u32]) {
        sum_le(&self.mmap[..], acc);
    }

    /// Unmaps and removes the backing file.
    pub fn destroy(self) -> io::Result<()> {
        let path = self.path.clone();
        drop(self);
        std::fs::remove_file(path)
    }
}
