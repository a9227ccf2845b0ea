//! Timeline Editor (vatl-ed) - command line entry point
//!
//! Runs one edit or export against a project database and prints the
//! resulting edit report as JSON.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vatl_common::config::{self, TomlConfig, DATABASE_ENV, ROOT_FOLDER_ENV};
use vatl_common::human_time::format_seconds;
use vatl_common::{AssetId, ChapterId, FilterMode, LineId, ProjectId};

use vatl_ed::audio::NativeCodec;
use vatl_ed::store::{ProjectStore, SqliteStore};
use vatl_ed::{EditReport, TimelineEditor};

/// Command-line arguments for vatl-ed
#[derive(Parser, Debug)]
#[command(name = "vatl-ed")]
#[command(about = "Per-line audio timeline editor for voiced scripts")]
#[command(version)]
struct Args {
    /// Root folder holding the project database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Project database (defaults to <root_folder>/vatl.db)
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the database (and optionally a project)
    Init {
        /// Name of a project to create
        #[arg(long)]
        project: Option<String>,
    },
    /// Print a chapter with its lines
    Show { chapter: ChapterId },
    /// Assign an audio file to a line
    Assign {
        chapter: ChapterId,
        line: LineId,
        file: PathBuf,
    },
    /// Remove a line's audio
    Clear { chapter: ChapterId, line: LineId },
    /// Split a line's audio and ripple the tail forward
    Split {
        chapter: ChapterId,
        line: LineId,
        seconds: f64,
        #[arg(long, default_value = "chapter")]
        mode: FilterMode,
    },
    /// Push audio one line later from a line on
    ShiftDown {
        chapter: ChapterId,
        line: LineId,
        #[arg(long, default_value = "chapter")]
        mode: FilterMode,
    },
    /// Pull audio one line earlier from a line on
    ShiftUp {
        chapter: ChapterId,
        line: LineId,
        #[arg(long, default_value = "chapter")]
        mode: FilterMode,
    },
    /// Merge a line with the next line of the same role, then shift up
    Merge {
        chapter: ChapterId,
        line: LineId,
        #[arg(long, default_value = "chapter")]
        mode: FilterMode,
    },
    /// Merge a line with the line right after it
    MergeAdjacent { chapter: ChapterId, line: LineId },
    /// Export a chapter as a WAV with a marker per line
    Export { chapter: ChapterId, output: PathBuf },
    /// Print the duration of a stored asset
    Duration { asset: AssetId },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml = TomlConfig::load_or_default();

    // Initialize tracing
    let default_filter = format!("vatl_ed={0},vatl_common={0}", toml.logging.level);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let root_folder =
        config::resolve_root_folder(args.root_folder.as_deref(), ROOT_FOLDER_ENV, &toml);
    let db_path =
        config::resolve_database_path(args.db.as_deref(), DATABASE_ENV, &toml, &root_folder);
    info!("Database: {}", db_path.display());

    let pool = vatl_common::db::init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;
    let store = Arc::new(SqliteStore::new(pool));
    let editor = TimelineEditor::new(Arc::clone(&store), Arc::new(NativeCodec));

    match args.command {
        Command::Init { project } => {
            if let Some(name) = project {
                let project_id = ProjectId::new();
                store
                    .ensure_project(project_id, &name)
                    .await
                    .context("Failed to create project")?;
                println!("{}", project_id);
            }
        }
        Command::Show { chapter } => {
            let chapter = store
                .load_chapter(chapter)
                .await?
                .ok_or_else(|| anyhow!("Chapter {} not found", chapter))?;
            println!("{}", serde_json::to_string_pretty(&chapter)?);
        }
        Command::Assign {
            chapter,
            line,
            file,
        } => {
            let payload = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let report = editor
                .assign_audio(chapter, line, payload)
                .await
                .context("Assign failed")?;
            print_report(report)?;
        }
        Command::Clear { chapter, line } => {
            let report = editor
                .clear_audio(chapter, line)
                .await
                .context("Clear failed")?;
            print_report(report)?;
        }
        Command::Split {
            chapter,
            line,
            seconds,
            mode,
        } => {
            let report = editor
                .split_at_time(chapter, line, seconds, mode)
                .await
                .context("Split failed")?;
            print_report(report)?;
        }
        Command::ShiftDown {
            chapter,
            line,
            mode,
        } => {
            let report = editor
                .shift_down(chapter, line, mode)
                .await
                .context("Shift down failed")?;
            print_report(report)?;
        }
        Command::ShiftUp {
            chapter,
            line,
            mode,
        } => {
            let report = editor
                .shift_up(chapter, line, mode)
                .await
                .context("Shift up failed")?;
            print_report(report)?;
        }
        Command::Merge {
            chapter,
            line,
            mode,
        } => {
            let report = editor
                .merge_with_next_and_shift(chapter, line, mode)
                .await
                .context("Merge failed")?;
            print_report(report)?;
        }
        Command::MergeAdjacent { chapter, line } => {
            let report = editor
                .merge_adjacent(chapter, line)
                .await
                .context("Merge failed")?;
            print_report(report)?;
        }
        Command::Export { chapter, output } => {
            let wav = editor
                .export_chapter(chapter)
                .await
                .context("Export failed")?;
            tokio::fs::write(&output, &wav)
                .await
                .with_context(|| format!("Failed to write {}", output.display()))?;
            info!("Wrote {} bytes to {}", wav.len(), output.display());
        }
        Command::Duration { asset } => {
            let seconds = editor
                .asset_duration(asset)
                .await
                .context("Failed to read asset")?;
            println!("{}", format_seconds(seconds));
        }
    }

    Ok(())
}

fn print_report(report: EditReport) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
