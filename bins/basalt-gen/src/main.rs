//! Synthetic visit-log generator for benchmarks and equivalence checks.
//!
//! Same seed, same flags -> byte-identical file, so a dataset referenced in
//! a benchmark log can always be regenerated.

use anyhow::Result;
use basalt_index::DateIndex;
use clap::Parser;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Generate a synthetic page-visit log")]
struct Args {
    /// Output CSV path
    output: PathBuf,
    /// Rows to generate
    #[arg(long, default_value_t = 1_000_000)]
    rows: u64,
    /// Distinct slug count
    #[arg(long, default_value_t = 200)]
    slugs: usize,
    /// RNG seed
    #[arg(long, default_value_t = 0xBA5A17)]
    seed: u64,
}

const TOPICS: [&str; 12] = [
    "generics-in-depth",
    "attributes",
    "fibers-with-a-grain-of-salt",
    "new-in-initializers",
    "readonly-properties",
    "enums",
    "named-arguments",
    "match-or-switch",
    "constructor-promotion",
    "the-case-for-transpiling",
    "short-closures",
    "typed-properties",
];

/// `slugs` distinct entries; every 17th lives under a sub-directory so the
/// escaped-slash output path stays exercised.
fn slug_pool(slugs: usize) -> Vec<String> {
    (0..slugs)
        .map(|i| {
            let topic = TOPICS[i % TOPICS.len()];
            if i % 17 == 0 {
                format!("series/{topic}-{i}")
            } else {
                format!("{topic}-{i}")
            }
        })
        .collect()
}

fn main() -> Result<()> {
    let args = Args::parse();
    let slugs = slug_pool(args.slugs);
    let dates = DateIndex::build();
    let mut rng = StdRng::seed_from_u64(args.seed);

    let file = File::create(&args.output)?;
    let mut out = BufWriter::with_capacity(1 << 20, file);

    for _ in 0..args.rows {
        let slug = &slugs[rng.gen_range(0..slugs.len())];
        let day = dates.key(rng.gen_range(0..dates.count()));
        let hh = rng.gen_range(0..24u32);
        let mm = rng.gen_range(0..60u32);
        let ss = rng.gen_range(0..60u32);

        out.write_all(b"https://stitcher.io/blog/")?;
        out.write_all(slug.as_bytes())?;
        out.write_all(b",20")?;
        out.write_all(day)?;
        writeln!(out, "T{hh:02}:{mm:02}:{ss:02}+00:00")?;
    }
    out.flush()?;

    eprintln!(
        "BASALT-GEN: wrote {} rows over {} slugs to {}",
        args.rows,
        slugs.len(),
        args.output.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slug_pool_is_distinct() {
        let pool = slug_pool(500);
        let mut seen = pool.clone();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), pool.len());
    }

    #[test]
    fn slug_pool_contains_nested_paths() {
        assert!(slug_pool(100).iter().any(|s| s.contains('/')));
    }
}
