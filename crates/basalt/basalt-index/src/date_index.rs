//! Dense ids for every calendar day in the fixed 2020–2026 window.
//!
//! The input format carries dates as `YYYY-MM-DD` inside a timestamp, but the
//! century prefix is always `20` within the supported window, so the index
//! keys on the 8-byte tail `YY-MM-DD`. Ids are assigned in chronological
//! order, which makes `0..count` iteration emit sorted days for free.
//!
//! Lookup does not hash. The key bytes decode into `(yy, mm, dd)` with six
//! digit subtractions, and a small table indexed by
//! `((yy - 20) * 12 + (mm - 1)) * 31 + (dd - 1)` maps straight to the dense
//! id. Impossible combinations (Feb 30, Nov 31, Feb 29 off-leap) hold a
//! sentinel, so validity falls out of the same load that resolves the id.

/// First year of the window, as its two-digit tail.
pub const FIRST_YY: u32 = 20;

/// Last year of the window, as its two-digit tail.
pub const LAST_YY: u32 = 26;

const YEARS: usize = (LAST_YY - FIRST_YY + 1) as usize;

/// One slot per (year, month, day-of-month) combination, valid or not.
const TABLE_LEN: usize = YEARS * 12 * 31;

/// Table sentinel for day slots that do not exist in the calendar.
const INVALID: u32 = u32::MAX;

/// Dense calendar-day index over the fixed window.
pub struct DateIndex {
    /// `YY-MM-DD` key per id, in chronological (= id) order.
    keys: Vec<[u8; 8]>,
    /// `(yy, mm, dd)` slot -> dense id, `INVALID` where no such day exists.
    table: Box<[u32; TABLE_LEN]>,
}

/// Days in a month. February length uses `(2000 + y) % 4 == 0`, which is
/// exact for 2020–2099 (no century boundary inside the window).
#[inline]
fn days_in_month(yy: u32, mm: u32) -> u32 {
    match mm {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if (2000 + yy) % 4 == 0 {
                29
            } else {
                28
            }
        }
        _ => unreachable!("month out of range"),
    }
}

#[inline(always)]
fn slot(yy: u32, mm: u32, dd: u32) -> usize {
    (((yy - FIRST_YY) * 12 + (mm - 1)) * 31 + (dd - 1)) as usize
}

impl DateIndex {
    /// Enumerates the whole window and assigns ids in encounter order.
    pub fn build() -> Self {
        let mut keys = Vec::with_capacity(2_600);
        let mut table = Box::new([INVALID; TABLE_LEN]);

        for yy in FIRST_YY..=LAST_YY {
            for mm in 1..=12u32 {
                for dd in 1..=days_in_month(yy, mm) {
                    let id = keys.len() as u32;
                    keys.push([
                        b'0' + (yy / 10) as u8,
                        b'0' + (yy % 10) as u8,
                        b'-',
                        b'0' + (mm / 10) as u8,
                        b'0' + (mm % 10) as u8,
                        b'-',
                        b'0' + (dd / 10) as u8,
                        b'0' + (dd % 10) as u8,
                    ]);
                    table[slot(yy, mm, dd)] = id;
                }
            }
        }

        Self { keys, table }
    }

    /// Number of days in the window (`D`).
    #[inline(always)]
    pub fn count(&self) -> u32 {
        self.keys.len() as u32
    }

    /// The `YY-MM-DD` key assigned to `id`.
    #[inline(always)]
    pub fn key(&self, id: u32) -> &[u8; 8] {
        &self.keys[id as usize]
    }

    /// Resolves an 8-byte `YY-MM-DD` key to its dense id.
    ///
    /// Returns `None` for anything that is not a real day of the window:
    /// wrong length, non-digit bytes, misplaced separators, out-of-window
    /// years, or calendar holes such as `23-02-29`. This is the per-line
    /// accept/reject decision of the hot loop, so it stays branch-light and
    /// allocation-free.
    #[inline(always)]
    pub fn lookup(&self, key: &[u8]) -> Option<u32> {
        if key.len() != 8 || key[2] != b'-' || key[5] != b'-' {
            return None;
        }

        let d0 = key[0].wrapping_sub(b'0');
        let d1 = key[1].wrapping_sub(b'0');
        let d3 = key[3].wrapping_sub(b'0');
        let d4 = key[4].wrapping_sub(b'0');
        let d6 = key[6].wrapping_sub(b'0');
        let d7 = key[7].wrapping_sub(b'0');
        if d0 > 9 || d1 > 9 || d3 > 9 || d4 > 9 || d6 > 9 || d7 > 9 {
            return None;
        }

        let yy = d0 as u32 * 10 + d1 as u32;
        let mm = d3 as u32 * 10 + d4 as u32;
        let dd = d6 as u32 * 10 + d7 as u32;
        if yy < FIRST_YY || yy > LAST_YY || mm < 1 || mm > 12 || dd < 1 || dd > 31 {
            return None;
        }

        // SAFETY: the range checks above bound slot() below TABLE_LEN.
        let id = unsafe { *self.table.get_unchecked(slot(yy, mm, dd)) };
        if id == INVALID { None } else { Some(id) }
    }
}
