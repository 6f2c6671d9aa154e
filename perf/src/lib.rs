//! Shared fixtures for the benches: deterministic synthetic visit logs and
//! the registries to aggregate them against.

use basalt_index::{DateIndex, PathRegistry};

/// Xorshift64. The benches must see the same bytes on every run so numbers
/// stay comparable across commits.
pub struct Rng(u64);

impl Rng {
    pub fn new(seed: u64) -> Self {
        assert_ne!(seed, 0, "xorshift state must be non-zero");
        Rng(seed)
    }

    #[inline]
    pub fn next(&mut self) -> u64 {
        self.0 ^= self.0 << 13;
        self.0 ^= self.0 >> 7;
        self.0 ^= self.0 << 17;
        self.0
    }
}

/// `count` distinct slugs, a few of them nested.
pub fn slug_pool(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            if i % 13 == 0 {
                format!("series/post-{i}")
            } else {
                format!("post-about-something-{i}")
            }
        })
        .collect()
}

/// `rows` fixed-shape lines over `slug_count` slugs and the whole date
/// window, deterministically shuffled.
pub fn fixture(rows: usize, slug_count: usize) -> Vec<u8> {
    let dates = DateIndex::build();
    let slugs = slug_pool(slug_count);
    let mut rng = Rng::new(0xB45A_1700_0001);

    let mut out = Vec::with_capacity(rows * 72);
    for _ in 0..rows {
        let slug = &slugs[(rng.next() % slugs.len() as u64) as usize];
        let day = dates.key((rng.next() % dates.count() as u64) as u32);
        let hh = rng.next() % 24;

        out.extend_from_slice(b"https://stitcher.io/blog/");
        out.extend_from_slice(slug.as_bytes());
        out.extend_from_slice(b",20");
        out.extend_from_slice(day);
        out.extend_from_slice(format!("T{hh:02}:30:00+00:00\n").as_bytes());
    }
    out
}

/// Registry holding exactly the fixture's slug pool, in pool order.
pub fn fixture_registry(dates: &DateIndex, slug_count: usize) -> PathRegistry {
    let mut registry = PathRegistry::new(dates.count());
    for slug in slug_pool(slug_count) {
        registry.insert(slug.as_bytes());
    }
    registry
}
