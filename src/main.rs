//! Command-line tool for working with LWW dictionary snapshots.
//!
//! Snapshots are JSON files with `String` keys, arbitrary JSON values and
//! `u64` timestamps. The tool never talks to the network; moving snapshot
//! files between replicas is up to the caller.
//!
//! Logging goes to stderr and is controlled with `RUST_LOG` (default `info`).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::Value;
use tracing::info;
use tracing_subscriber::EnvFilter;

use lww_dict::{Bias, DictConfig, LwwDict, merge_all};

type Document = LwwDict<String, Value, u64>;

#[derive(Parser)]
#[command(name = "lww-dict", version, about = "Inspect and merge LWW dictionary snapshots")]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Clone, Copy, ValueEnum)]
enum BiasArg {
    AddWins,
    RemoveWins,
}

impl From<BiasArg> for Bias {
    fn from(arg: BiasArg) -> Self {
        match arg {
            BiasArg::AddWins => Bias::AddWins,
            BiasArg::RemoveWins => Bias::RemoveWins,
        }
    }
}

#[derive(Subcommand)]
enum Cmd {
    /// Write an empty snapshot
    New {
        /// Tie-break bias between an add and a remove with equal timestamps
        #[arg(long, value_enum, default_value = "add-wins")]
        bias: BiasArg,
        /// Explicit replica identity (random if omitted)
        #[arg(long)]
        replica_id: Option<String>,
        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Print the visible entries of a snapshot
    Inspect {
        /// Snapshot file
        snapshot: PathBuf,
    },

    /// Merge snapshots left to right and write the result
    Merge {
        /// Snapshot files; the first one decides bias and identity
        #[arg(required = true)]
        snapshots: Vec<PathBuf>,
        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::New {
            bias,
            replica_id,
            output,
        } => cmd_new(bias.into(), replica_id, output),
        Cmd::Inspect { snapshot } => cmd_inspect(&snapshot),
        Cmd::Merge { snapshots, output } => cmd_merge(&snapshots, output),
    }
}

fn cmd_new(bias: Bias, replica_id: Option<String>, output: Option<PathBuf>) -> Result<()> {
    let mut config = DictConfig::default().with_bias(bias);
    if let Some(id) = replica_id {
        config = config.with_replica_id(id);
    }

    let doc = Document::with_config(config);
    info!(replica = %doc.replica_id(), bias = ?doc.bias(), "created empty snapshot");
    write_output(&doc, output.as_deref())
}

fn cmd_inspect(path: &Path) -> Result<()> {
    let doc = read_snapshot(path)?;

    println!("replica: {}", doc.replica_id());
    println!("bias:    {:?}", doc.bias());
    println!(
        "entries: {} visible, {} adds, {} tombstones",
        doc.len(),
        doc.add_history().len(),
        doc.remove_history().len()
    );
    for (key, value) in &doc {
        println!("  {key} = {value}");
    }
    Ok(())
}

fn cmd_merge(paths: &[PathBuf], output: Option<PathBuf>) -> Result<()> {
    let docs = paths
        .iter()
        .map(|path| read_snapshot(path))
        .collect::<Result<Vec<_>>>()?;

    let Some(merged) = merge_all(&docs) else {
        bail!("no snapshots to merge");
    };

    info!(
        inputs = docs.len(),
        visible = merged.len(),
        "merged snapshots"
    );
    write_output(&merged, output.as_deref())
}

fn read_snapshot(path: &Path) -> Result<Document> {
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    Document::decode(&bytes).with_context(|| format!("decoding {}", path.display()))
}

fn write_output(doc: &Document, output: Option<&Path>) -> Result<()> {
    let text = doc.encode_pretty()?;
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
            info!(path = %path.display(), "wrote snapshot");
        }
        None => println!("{text}"),
    }
    Ok(())
}
