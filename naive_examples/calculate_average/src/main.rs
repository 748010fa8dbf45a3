use anyhow::{Context, Result};
use clap::Parser;
use naive_calculate_average::aggregate_reader;
use onebrc::constants::DEFAULT_INPUT_PATH;
use onebrc::render_into;
use std::fs::File;
use std::io::{BufReader, Write};
use std::time::Instant;

#[derive(Parser, Debug)]
struct Args {
    #[arg(default_value = DEFAULT_INPUT_PATH)]
    input: String,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").with_writer(std::io::stderr).init();
    let args = Args::parse();
    let t0 = Instant::now();

    let file = File::open(&args.input).with_context(|| format!("open {}", &args.input))?;
    let result = aggregate_reader(BufReader::with_capacity(4 * 1024 * 1024, file))?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    render_into(&result, &mut out)?;
    out.write_all(b"\n")?;
    tracing::info!(keys = result.len(), records = result.records(), total_ms = t0.elapsed().as_millis() as u64, "naive run complete");
    Ok(())
}
