use anyhow::Context;
use basalt_config::BasaltConfig;
use basalt_engine::ParseOptions;
use basalt_ipc::Transport;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(version, about = "Aggregate a page-visit log into per-day JSON counts")]
struct Args {
    /// Input CSV log
    input: PathBuf,
    /// Output JSON file
    output: PathBuf,
    /// Optional TOML config with the performance knobs
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = match &args.config {
        Some(path) => BasaltConfig::load(path)?,
        None => BasaltConfig::default(),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    info!(
        input = %args.input.display(),
        output = %args.output.display(),
        "BASALT: aggregating visit log"
    );

    let opts = parse_options(&config)?;
    let summary = basalt_engine::parse(&args.input, &args.output, &opts)?;

    info!(
        rows = summary.rows,
        paths = summary.paths,
        workers = summary.workers,
        transport = %summary.transport,
        "done"
    );
    Ok(())
}

fn parse_options(config: &BasaltConfig) -> anyhow::Result<ParseOptions> {
    let transport = match config.transport.as_str() {
        "auto" => None,
        "by-value" => Some(Transport::ByValue),
        "shared-segment" => Some(Transport::SharedSegment),
        "temp-file" => Some(Transport::TempFile),
        other => anyhow::bail!("unknown transport '{other}' in config"),
    };

    let seed_uris = match &config.seed_path {
        Some(path) => {
            let raw = std::fs::read(path)
                .with_context(|| format!("failed to read seed list '{path}'"))?;
            raw.split(|&b| b == b'\n')
                .map(|line| line.strip_suffix(b"\r").unwrap_or(line))
                .filter(|line| !line.is_empty())
                .map(<[u8]>::to_vec)
                .collect()
        }
        None => Vec::new(),
    };

    Ok(ParseOptions {
        workers: config.workers,
        max_workers: config.max_workers,
        chunk_bytes: config.chunk_bytes,
        prescan_bytes: config.prescan_bytes,
        transport,
        seed_uris,
    })
}
