use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use blktouch::tags::{LineReport, TagStore};
use blktouch::trace::replay;

/// Replay a cache access trace and report per-line byte touch statistics.
#[derive(Parser, Debug)]
#[command(name = "blktouch", version)]
struct Cli {
    /// Trace file; reads stdin when absent or "-"
    trace: Option<PathBuf>,

    /// Number of cache lines in the store
    #[arg(long, default_value_t = 16)]
    lines: usize,

    /// Block size in bytes
    #[arg(long, default_value_t = 64)]
    block_size: u32,

    /// Print the final report as JSON
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if cli.block_size == 0 {
        bail!("--block-size must be greater than 0");
    }

    let input: Box<dyn BufRead> = match &cli.trace {
        Some(path) if path.as_os_str() != "-" => {
            let f = File::open(path).with_context(|| format!("could not open trace {:?}", path))?;
            Box::new(BufReader::new(f))
        },
        _ => Box::new(BufReader::new(io::stdin())),
    };

    let mut store = TagStore::new(cli.lines, cli.block_size);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    replay(&mut store, input, &mut out).context("trace replay failed")?;

    let report = store.report();
    if cli.json {
        let serialized = serde_json::to_string_pretty(&report)?;
        writeln!(out, "{}", serialized)?;
    } else {
        for line in report.iter().filter(|l| l.touch.bytes_read_total + l.touch.bytes_written_total > 0) {
            writeln!(out, "{}", summary(line))?;
        }
    }
    Ok(())
}

fn summary(line: &LineReport) -> String {
    let t = &line.touch;
    format!(
        "{:>3}: {} ({}) tag {:#x}  read {}/{}  written {}/{}  touched {}/{}",
        line.line,
        line.flags,
        line.state,
        line.tag,
        t.unique_bytes_read,
        t.bytes_read_total,
        t.unique_bytes_written,
        t.bytes_written_total,
        t.touched_bytes,
        t.capacity,
    )
}
