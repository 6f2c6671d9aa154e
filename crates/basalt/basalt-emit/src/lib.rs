//! Deterministic pretty-printed JSON emission of the merged counter matrix.
//!
//! The document shape is fixed down to the byte:
//!
//! ```text
//! {
//!     "\/blog\/<slug>": {
//!         "2024-01-15": 3,
//!         "2024-01-16": 1
//!     },
//!     "\/blog\/<next-slug>": {
//! ...
//! }
//! ```
//!
//! Paths appear in registry id order, days in chronological id order, and
//! zero cells vanish: a day with no visits is omitted, a path whose whole
//! row is zero is omitted. `/` is escaped as `\/` in every key. Day keys
//! restore the `20` century prefix the date index strips. The all-zero
//! matrix emits exactly `{}\n`; every other document closes with `\n}` and
//! no trailing newline.
//!
//! Emission cost is dominated by formatting, so the per-day entry prefixes
//! (`        "20YY-MM-DD": `) are precomputed once into a flat stride
//! buffer, and each path body is assembled in a reused local buffer and
//! written in one call.

use basalt_index::{DateIndex, PathRegistry};
use std::io::{self, Write};

/// `        "20YY-MM-DD": ` is 8 spaces, quoted 10-char day, colon, space.
const DAY_PREFIX_LEN: usize = 22;

/// Writes the whole document for `counts` (length `P * D`) to `out`.
pub fn emit<W: Write>(
    counts: &[u32],
    registry: &PathRegistry,
    dates: &DateIndex,
    out: &mut W,
) -> io::Result<()> {
    debug_assert_eq!(counts.len(), registry.matrix_len());

    out.write_all(b"{")?;

    let d = dates.count() as usize;
    let day_prefixes = build_day_prefixes(dates);

    let mut header = Vec::with_capacity(128);
    let mut body = Vec::with_capacity(64 << 10);
    let mut wrote_any = false;

    for p in 0..registry.count() {
        let row = &counts[p as usize * d..(p as usize + 1) * d];

        body.clear();
        let mut first_day = true;
        for (day, &count) in row.iter().enumerate() {
            if count == 0 {
                continue;
            }
            if !first_day {
                body.extend_from_slice(b",\n");
            }
            first_day = false;
            let at = day * DAY_PREFIX_LEN;
            body.extend_from_slice(&day_prefixes[at..at + DAY_PREFIX_LEN]);
            push_u32(&mut body, count);
        }
        if first_day {
            continue;
        }

        if wrote_any {
            out.write_all(b",")?;
        }
        wrote_any = true;

        header.clear();
        push_path_header(&mut header, registry.slug(p));
        out.write_all(&header)?;
        out.write_all(&body)?;
        out.write_all(b"\n    }")?;
    }

    if wrote_any {
        out.write_all(b"\n}")
    } else {
        out.write_all(b"}\n")
    }
}

/// One flat buffer of `D` day-entry prefixes at a fixed 22-byte stride,
/// so the inner loop copies a slice instead of formatting.
fn build_day_prefixes(dates: &DateIndex) -> Vec<u8> {
    let d = dates.count();
    let mut buf = Vec::with_capacity(d as usize * DAY_PREFIX_LEN);
    for id in 0..d {
        buf.extend_from_slice(b"        \"20");
        buf.extend_from_slice(dates.key(id));
        buf.extend_from_slice(b"\": ");
    }
    debug_assert_eq!(buf.len(), d as usize * DAY_PREFIX_LEN);
    buf
}

/// `\n    "\/blog\/<slug>": {\n` with every `/` of the slug escaped.
fn push_path_header(buf: &mut Vec<u8>, slug: &[u8]) {
    buf.extend_from_slice(b"\n    \"\\/blog\\/");
    for &b in slug {
        if b == b'/' {
            buf.extend_from_slice(b"\\/");
        } else {
            buf.push(b);
        }
    }
    buf.extend_from_slice(b"\": {\n");
}

/// Decimal formatting without going through `fmt`.
fn push_u32(buf: &mut Vec<u8>, mut v: u32) {
    let mut digits = [0u8; 10];
    let mut i = digits.len();
    loop {
        i -= 1;
        digits[i] = b'0' + (v % 10) as u8;
        v /= 10;
        if v == 0 {
            break;
        }
    }
    buf.extend_from_slice(&digits[i..]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use basalt_index::DateIndex;

    struct Fixture {
        dates: DateIndex,
        registry: PathRegistry,
        counts: Vec<u32>,
    }

    impl Fixture {
        fn new(slugs: &[&[u8]]) -> Self {
            let dates = DateIndex::build();
            let mut registry = PathRegistry::new(dates.count());
            for slug in slugs {
                registry.insert(slug);
            }
            let counts = vec![0u32; registry.matrix_len()];
            Self {
                dates,
                registry,
                counts,
            }
        }

        fn bump(&mut self, slug: &[u8], key: &[u8], by: u32) {
            let offset = self.registry.offset_of(slug).unwrap();
            let id = self.dates.lookup(key).unwrap();
            self.counts[(offset + id) as usize] += by;
        }

        fn render(&self) -> Vec<u8> {
            let mut out = Vec::new();
            emit(&self.counts, &self.registry, &self.dates, &mut out).unwrap();
            out
        }
    }

    #[test]
    fn empty_matrix_emits_braces_and_newline() {
        let fx = Fixture::new(&[]);
        assert_eq!(fx.render(), b"{}\n");
    }

    #[test]
    fn zero_total_paths_emit_braces_and_newline() {
        // Registered but never visited: same document as no paths at all.
        let fx = Fixture::new(&[b"silent"]);
        assert_eq!(fx.render(), b"{}\n");
    }

    #[test]
    fn single_line_document_is_byte_exact() {
        let mut fx = Fixture::new(&[b"hello"]);
        fx.bump(b"hello", b"24-01-15", 1);
        assert_eq!(
            String::from_utf8(fx.render()).unwrap(),
            "{\n    \"\\/blog\\/hello\": {\n        \"2024-01-15\": 1\n    }\n}"
        );
    }

    #[test]
    fn paths_in_registry_order_days_in_date_order() {
        let mut fx = Fixture::new(&[b"a", b"b"]);
        fx.bump(b"a", b"24-01-15", 2);
        fx.bump(b"a", b"24-01-16", 1);
        fx.bump(b"b", b"24-01-15", 1);

        assert_eq!(
            String::from_utf8(fx.render()).unwrap(),
            concat!(
                "{\n",
                "    \"\\/blog\\/a\": {\n",
                "        \"2024-01-15\": 2,\n",
                "        \"2024-01-16\": 1\n",
                "    },\n",
                "    \"\\/blog\\/b\": {\n",
                "        \"2024-01-15\": 1\n",
                "    }\n",
                "}"
            )
        );
    }

    #[test]
    fn slug_slashes_are_escaped() {
        let mut fx = Fixture::new(&[b"sub/post"]);
        fx.bump(b"sub/post", b"24-02-29", 1);
        assert_eq!(
            String::from_utf8(fx.render()).unwrap(),
            "{\n    \"\\/blog\\/sub\\/post\": {\n        \"2024-02-29\": 1\n    }\n}"
        );
    }

    #[test]
    fn zero_days_are_omitted_within_a_path() {
        let mut fx = Fixture::new(&[b"gap"]);
        fx.bump(b"gap", b"20-01-01", 7);
        fx.bump(b"gap", b"26-12-31", 9);

        let doc = String::from_utf8(fx.render()).unwrap();
        assert!(doc.contains("\"2020-01-01\": 7,\n        \"2026-12-31\": 9"));
        assert!(!doc.contains("2020-01-02"));
    }

    #[test]
    fn document_reparses_to_the_matrix_projection() {
        let mut fx = Fixture::new(&[b"a", b"sub/post"]);
        fx.bump(b"a", b"24-01-15", 3);
        fx.bump(b"a", b"24-03-01", 1);
        fx.bump(b"sub/post", b"25-07-04", 12345);

        let doc: serde_json::Value = serde_json::from_slice(&fx.render()).unwrap();
        assert_eq!(doc["/blog/a"]["2024-01-15"], 3);
        assert_eq!(doc["/blog/a"]["2024-03-01"], 1);
        assert_eq!(doc["/blog/sub/post"]["2025-07-04"], 12345);
        assert_eq!(doc["/blog/a"].as_object().unwrap().len(), 2);
        assert_eq!(doc.as_object().unwrap().len(), 2);
    }

    #[test]
    fn count_formatting_covers_digit_widths() {
        let mut buf = Vec::new();
        push_u32(&mut buf, 0);
        buf.push(b' ');
        push_u32(&mut buf, 9);
        buf.push(b' ');
        push_u32(&mut buf, 10);
        buf.push(b' ');
        push_u32(&mut buf, 4_294_967_295);
        assert_eq!(buf, b"0 9 10 4294967295");
    }
}
