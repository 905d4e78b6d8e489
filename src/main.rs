//! Simplenote Export - Main Entry Point
//!
//! Command-line front end for the `simplenote_export` library. All options
//! are resolved here once (config file, environment, flags) and passed down.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand};
use log::{info, warn};
use simplenote_export::check::sanity_check;
use simplenote_export::dump::{DEFAULT_DUMP_FILENAME, DumpFormat, dump_notes};
use simplenote_export::import::{
    ENV_EXPORT_FILENAME, collect_notes, default_output_name, write_collection,
};
use simplenote_export::script::{ScriptFlavor, collect_timeline, render_script};
use simplenote_export::{
    CommitOrder, CreationTime, ExportOptions, FailurePolicy, NoteCollection, OptionsLayer,
    SchemaPolicy, export_document, load_document,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Simplenote Export - turn a Simplenote export into files with real timestamps
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write one file per active note, with timestamps, optional git history and an index
    Export(ExportArgs),
    /// Report schema problems, notes without a newline, and duplicate names
    Check {
        /// Export file (.json or .zip)
        input: PathBuf,
        /// Require every note to carry the optional keys of the first note
        #[arg(long)]
        strict_schema: bool,
    },
    /// Dump active notes keyed by id for diffing
    Dump {
        /// Export file (.json or .zip)
        input: PathBuf,
        /// Output file
        #[arg(short, long, default_value = DEFAULT_DUMP_FILENAME)]
        output: PathBuf,
        /// yaml or json
        #[arg(long, default_value = "yaml")]
        format: DumpFormat,
    },
    /// Print a script that commits the files in a directory in time order
    GitScript {
        /// Directory holding the note files
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Only files with this extension
        #[arg(long, default_value = "txt")]
        extension: String,
        /// shell or batch (defaults to the host platform)
        #[arg(long)]
        flavor: Option<ScriptFlavor>,
    },
    /// Build an importable export document from *.md and *.txt files
    ImportFiles {
        /// Directory holding the note files
        #[arg(default_value = ".")]
        dir: PathBuf,
        /// Output JSON file (default: $SIMPLENOTE_EXPORT_FILENAME or a timestamped name)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct ExportArgs {
    /// Export file (.json or .zip)
    input: PathBuf,

    /// Output directory (default: <input>_dir)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML file with export options
    #[arg(long)]
    config: Option<PathBuf>,

    /// Name files after the note's first line instead of its id
    #[arg(long)]
    readable_filenames: bool,

    /// Commit each note into a git repository in the output directory
    #[arg(long)]
    git: bool,

    /// Extension for note files (empty for none)
    #[arg(long)]
    extension: Option<String>,

    /// Do not write the metadata index
    #[arg(long)]
    no_index: bool,

    /// Leave trashed notes out of the index
    #[arg(long)]
    no_trashed: bool,

    /// input or chronological
    #[arg(long)]
    commit_order: Option<CommitOrder>,

    /// abort or isolate
    #[arg(long)]
    failure_policy: Option<FailurePolicy>,

    /// per-note or infer-from-first
    #[arg(long)]
    schema_policy: Option<SchemaPolicy>,
}

impl ExportArgs {
    /// Flags given on the command line, as the top options layer
    fn layer(&self) -> OptionsLayer {
        OptionsLayer {
            use_first_line_as_filename: self.readable_filenames.then_some(true),
            use_version_control: self.git.then_some(true),
            save_index: self.no_index.then_some(false),
            save_index_include_trashed: self.no_trashed.then_some(false),
            file_extension: self.extension.clone(),
            commit_order: self.commit_order,
            failure_policy: self.failure_policy,
            schema_policy: self.schema_policy,
            ..OptionsLayer::default()
        }
    }

    fn options(&self) -> Result<ExportOptions> {
        let mut layers = Vec::new();
        if let Some(path) = &self.config {
            layers.push(
                OptionsLayer::from_toml_file(path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
            );
        }
        layers.push(OptionsLayer::from_process_env());
        layers.push(self.layer());
        Ok(ExportOptions::layered(layers))
    }
}

fn default_output_dir(input: &Path) -> PathBuf {
    let mut dir = OsString::from(input.as_os_str());
    dir.push("_dir");
    PathBuf::from(dir)
}

fn run_export(args: &ExportArgs) -> Result<()> {
    let options = args.options()?;
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_dir(&args.input));

    let document = load_document(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;
    let summary = export_document(document, &output, &options, &CreationTime::detect())
        .with_context(|| format!("Export to {} failed", output.display()))?;

    for failure in &summary.failures {
        warn!("note {} was not exported: {}", failure.note_id, failure.error);
    }
    info!(
        "Done: {} file(s) in {}",
        summary.written.len(),
        output.display()
    );
    if !summary.failures.is_empty() {
        anyhow::bail!("{} note(s) could not be exported", summary.failures.len());
    }
    Ok(())
}

fn run_check(input: &Path, strict_schema: bool) -> Result<()> {
    let policy = if strict_schema {
        SchemaPolicy::InferFromFirst
    } else {
        SchemaPolicy::PerNote
    };
    let report = sanity_check(input, policy)
        .with_context(|| format!("Check of {} failed", input.display()))?;
    info!(
        "Checked {} note(s): {} without newline, {} duplicate name(s), {} archive collision(s)",
        report.validation.notes_checked,
        report.validation.missing_newline.len(),
        report.duplicate_first_lines,
        report.archive_collisions.len()
    );
    Ok(())
}

fn run_dump(input: &Path, output: &Path, format: DumpFormat) -> Result<()> {
    let document = load_document(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let (collection, _) = NoteCollection::from_document(document, SchemaPolicy::PerNote)?;
    dump_notes(&collection, output, format)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    info!("Wrote {}", output.display());
    Ok(())
}

fn run_git_script(dir: &Path, extension: &str, flavor: ScriptFlavor) -> Result<()> {
    let timeline = collect_timeline(dir, extension)
        .with_context(|| format!("Failed to scan {}", dir.display()))?;
    print!("{}", render_script(&timeline, flavor)?);
    Ok(())
}

fn run_import_files(dir: &Path, output: Option<PathBuf>) -> Result<()> {
    let output = output
        .or_else(|| std::env::var_os(ENV_EXPORT_FILENAME).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default_output_name(chrono::Local::now())));
    let collection = collect_notes(dir)
        .with_context(|| format!("Failed to read notes from {}", dir.display()))?;
    info!("to export {}", output.display());
    write_collection(&collection, &output)
        .with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    // No arguments: show help and exit with a usage error
    if std::env::args().len() == 1 {
        let mut cmd = Cli::command();
        cmd.print_help().ok();
        println!();
        std::process::exit(2);
    }

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Command::Export(args) => run_export(&args),
        Command::Check {
            input,
            strict_schema,
        } => run_check(&input, strict_schema),
        Command::Dump {
            input,
            output,
            format,
        } => run_dump(&input, &output, format),
        Command::GitScript {
            dir,
            extension,
            flavor,
        } => run_git_script(&dir, &extension, flavor.unwrap_or_else(ScriptFlavor::native)),
        Command::ImportFiles { dir, output } => run_import_files(&dir, output),
    }
}
