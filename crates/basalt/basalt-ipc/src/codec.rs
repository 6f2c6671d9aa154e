//! Little-endian u32 matrix <-> raw bytes. Shared by the segment and
//! payload transports so both sides agree on one layout.

/// Stores `counts` into `dst` as little-endian u32s.
/// `dst.len()` must equal `counts.len() * 4`.
#[inline]
pub(crate) fn store_le(counts: &[u32], dst: &mut [u8]) {
    assert_eq!(dst.len(), counts.len() * 4, "payload layout mismatch");
    #[cfg(target_endian = "little")]
    // SAFETY: u32 has no padding; lengths match; the regions do not overlap.
    unsafe {
        std::ptr::copy_nonoverlapping(counts.as_ptr() as *const u8, dst.as_mut_ptr(), dst.len());
    }
    #[cfg(not(target_endian = "little"))]
    for (chunk, &c) in dst.chunks_exact_mut(4).zip(counts) {
        chunk.copy_from_slice(&c.to_le_bytes());
    }
}

/// Adds the little-endian u32s in `src` into `acc` cell by cell.
/// `src.len()` must equal `acc.len() * 4`.
#[inline]
pub(crate) fn sum_le(src: &[u8], acc: &mut [u32]) {
    assert_eq!(src.len(), acc.len() * 4, "payload layout mismatch");
    for (chunk, a) in src.chunks_exact(4).zip(acc.iter_mut()) {
        *a += u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
}
