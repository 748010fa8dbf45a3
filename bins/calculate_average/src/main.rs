use anyhow::Result;
use clap::Parser;
use onebrc::constants::DEFAULT_INPUT_PATH;
use onebrc::{render_into, MalformedPolicy, RunConfig, RuntimePipeline};
use std::io::Write;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
struct Args {
    /// Measurements file, one `key;value` record per line
    #[arg(default_value = DEFAULT_INPUT_PATH)]
    input: String,
    /// Target bytes per range (derived from the file size when omitted)
    #[arg(long)]
    chunk_bytes: Option<usize>,
    /// Worker threads (logical CPUs when omitted)
    #[arg(long)]
    threads: Option<usize>,
    /// Count and skip malformed lines instead of failing
    #[arg(long)]
    skip_malformed: bool,
    /// Write run statistics as JSON to this path
    #[arg(long)]
    stats: Option<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    // command-line flags win over environment settings
    let mut config = RunConfig::from_env();
    if let Some(n) = args.chunk_bytes { config = config.with_chunk_bytes(n); }
    if let Some(n) = args.threads { config = config.with_threads(n); }
    if args.skip_malformed { config = config.with_malformed(MalformedPolicy::Skip); }

    let mut pipeline = RuntimePipeline::with_config(config);
    pipeline.add_input(&args.input);
    let outcome = pipeline.run().inspect_err(|e| tracing::error!("calculate_average failed: {:#}", e))?;

    let stdout = std::io::stdout();
    let mut out = std::io::BufWriter::new(stdout.lock());
    render_into(&outcome.result, &mut out)?;
    out.write_all(b"\n")?;
    out.flush()?;

    if let Some(path) = &args.stats { outcome.stats.write_json(path)?; }
    tracing::info!(total_ms = outcome.stats.total_ms, keys = outcome.result.len(), records = outcome.stats.total_records(), "done");
    Ok(())
}
