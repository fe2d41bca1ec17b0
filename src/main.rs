//! # doc-canvas CLI (`canvas`)
//!
//! The `canvas` binary ingests a document into a Document Pack and derives
//! citation-backed artifacts from it.
//!
//! ## Usage
//!
//! ```bash
//! canvas --config ./config/canvas.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `canvas ingest <file>` | Build a pack from a PDF, EPUB, or text file |
//! | `canvas outline <pack>` | Outline as a bullet list |
//! | `canvas summarize <pack>` | First-sentence summaries |
//! | `canvas runbook <pack>` | Numbered runbook steps |
//! | `canvas flow <pack>` | Mermaid flowchart source |
//! | `canvas table <pack>` | Overview table as Markdown |
//! | `canvas ask <pack> "<question>"` | Answer from the top-ranked chunks |
//! | `canvas validate <pack>` | Citation completeness report (JSON) |
//! | `canvas diff <old> <new>` | Changed sections, chunks, and impacted artifacts |
//! | `canvas view <pack>` | Serve the pack in the local viewer |
//!
//! Every command that produces output prints it to stdout, or writes it to
//! `--out` when given.
//!
//! ## Examples
//!
//! ```bash
//! canvas ingest runbook.pdf --out pack.json
//! canvas validate pack.json --fail-on error
//! canvas ask pack.json "How do I restore a backup?"
//! canvas diff old.json new.json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use doc_canvas::ask::ask;
use doc_canvas::completion::{create_backend, CompletionOptions};
use doc_canvas::config;
use doc_canvas::diff::diff;
use doc_canvas::generate::{
    generate_flowchart, generate_outline, generate_runbook, generate_summaries, generate_tables,
};
use doc_canvas::ingest::ingest_file;
use doc_canvas::models::DocumentPack;
use doc_canvas::pack::{load_pack, save_pack};
use doc_canvas::render;
use doc_canvas::server;
use doc_canvas::validate::{validate, FailPolicy};

/// doc-canvas: citation-anchored artifacts from a single document.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. When the file does not exist, built-in defaults are used.
#[derive(Parser)]
#[command(
    name = "canvas",
    about = "doc-canvas: ingest a document and derive citation-backed artifacts",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/canvas.toml")]
    config: PathBuf,

    /// Log at debug level (overridden by `RUST_LOG`).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a Document Pack from a PDF, EPUB, or text file.
    Ingest {
        file: PathBuf,
        /// Where to write the pack JSON.
        #[arg(long, default_value = "pack.json")]
        out: PathBuf,
    },
    /// Print first-sentence summaries.
    Summarize {
        pack: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the outline.
    Outline {
        pack: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the runbook.
    Runbook {
        pack: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the Mermaid flowchart source.
    Flow {
        pack: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the overview table.
    Table {
        pack: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Answer a question from the pack's chunks.
    ///
    /// Uses the completion backend from `[completion]` when enabled,
    /// otherwise answers with an extract of the best-matching chunks.
    Ask {
        pack: PathBuf,
        question: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Report uncited claims as JSON.
    ///
    /// Exits with status 1 when the `--fail-on` policy triggers: `error`
    /// fails on any finding, a verdict name fails on findings with that verdict.
    Validate {
        pack: PathBuf,
        #[arg(long, default_value = "missing_citations")]
        fail_on: FailPolicy,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Compare two packs of the same document.
    Diff {
        old: PathBuf,
        new: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Serve the pack in the local viewer.
    View {
        pack: PathBuf,
        /// Port to listen on (defaults to `[viewer].port`).
        #[arg(long)]
        port: Option<u16>,
    },
}

fn init_logging(verbose: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(if verbose { "debug" } else { "warn" })
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

fn open_pack(path: &Path) -> Result<DocumentPack> {
    load_pack(path).with_context(|| format!("Failed to load pack: {}", path.display()))
}

/// Print `text`, or write it to `out` and report where it went.
fn emit(text: &str, out: Option<&Path>, what: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Saved {} to {}", what, path.display());
        }
        None => println!("{}", text),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cfg = config::load_config_or_default(&cli.config)?;

    match cli.command {
        Commands::Ingest { file, out } => {
            let pack = ingest_file(&file, &cfg.chunk_options()?).await?;
            save_pack(&pack, &out)?;
            println!(
                "Saved pack to {} ({} chunks, {} uncited claims)",
                out.display(),
                pack.chunks.len(),
                pack.validation.claims.len()
            );
        }
        Commands::Summarize { pack, out } => {
            let pack = open_pack(&pack)?;
            let text = render::render_summaries(&generate_summaries(&pack));
            emit(&text, out.as_deref(), "summaries")?;
        }
        Commands::Outline { pack, out } => {
            let pack = open_pack(&pack)?;
            let text = render::render_outline(&generate_outline(&pack));
            emit(&text, out.as_deref(), "outline")?;
        }
        Commands::Runbook { pack, out } => {
            let pack = open_pack(&pack)?;
            let text = render::render_runbook(&generate_runbook(&pack));
            emit(&text, out.as_deref(), "runbook")?;
        }
        Commands::Flow { pack, out } => {
            let pack = open_pack(&pack)?;
            emit(&generate_flowchart(&pack).mermaid, out.as_deref(), "flowchart")?;
        }
        Commands::Table { pack, out } => {
            let pack = open_pack(&pack)?;
            let text = render::render_tables(&generate_tables(&pack));
            emit(&text, out.as_deref(), "tables")?;
        }
        Commands::Ask {
            pack,
            question,
            out,
        } => {
            let pack = open_pack(&pack)?;
            let backend = create_backend(&cfg.completion)?;
            let opts = CompletionOptions::from(&cfg.completion);
            let answer = ask(
                &pack,
                &question,
                backend.as_deref(),
                &opts,
                cfg.retrieval.top_k,
            )
            .await?;
            emit(&render::render_answer(&answer), out.as_deref(), "answer")?;
        }
        Commands::Validate { pack, fail_on, out } => {
            let pack = open_pack(&pack)?;
            let report = validate(&pack);
            emit(
                &serde_json::to_string_pretty(&report)?,
                out.as_deref(),
                "validation report",
            )?;
            if fail_on.should_fail(&report) {
                eprintln!(
                    "Validation failed: {} finding(s) match --fail-on {}",
                    report.summary.total, fail_on
                );
                std::process::exit(1);
            }
        }
        Commands::Diff { old, new, out } => {
            let old = open_pack(&old)?;
            let new = open_pack(&new)?;
            let text = render::render_diff(&diff(&old, &new));
            emit(&text, out.as_deref(), "diff")?;
        }
        Commands::View { pack, port } => {
            let pack = open_pack(&pack)?;
            server::run_viewer(pack, &cfg.viewer.bind, port.unwrap_or(cfg.viewer.port)).await?;
        }
    }

    Ok(())
}
