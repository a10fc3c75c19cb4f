use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use railsave_core::core_api::{Collection, Engine, SaveSummary, Session};
use railsave_core::property::ObjectReference;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

const STATION_LIST_FILE: &str = "station list.txt";
const TRAIN_LIST_FILE: &str = "train list.txt";

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print header fields and entity counts.
    Info {
        #[arg(long)]
        json: bool,
        #[arg(value_name = "SAVE")]
        path: PathBuf,
    },
    /// Write the current station and train orders to editable list files.
    Export {
        #[arg(value_name = "SAVE")]
        path: PathBuf,
        #[arg(long, value_name = "DIR", default_value = ".")]
        dir: PathBuf,
    },
    /// Reorder stations and trains to match the edited list files.
    Apply {
        #[arg(value_name = "SAVE")]
        path: PathBuf,
        #[arg(long, value_name = "DIR", default_value = ".")]
        dir: PathBuf,
        /// Defaults to <name>_REORDERED.<ext> next to the input.
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
        #[arg(long = "keep-lists")]
        keep_lists: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Info { json, path } => run_info(&path, json),
        Command::Export { path, dir } => run_export(&path, &dir),
        Command::Apply {
            path,
            dir,
            output,
            keep_lists,
        } => {
            let output = output.unwrap_or_else(|| default_output_path(&path));
            run_apply(&path, &dir, &output, keep_lists);
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn fail(context: impl Display, err: impl Display) -> ! {
    eprintln!("{context}");
    eprintln!("  {err}");
    process::exit(1);
}

fn open_session(path: &Path) -> Session {
    let bytes = fs::read(path)
        .unwrap_or_else(|e| fail(format!("Error reading {}", path.display()), e));
    Engine::new()
        .open_bytes(bytes)
        .unwrap_or_else(|e| fail(format!("Error parsing save file: {}", path.display()), e))
}

fn list_file(dir: &Path, collection: Collection) -> PathBuf {
    dir.join(match collection {
        Collection::Stations => STATION_LIST_FILE,
        Collection::Trains => TRAIN_LIST_FILE,
    })
}

fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "save".to_string());
    let file_name = match input.extension() {
        Some(ext) => format!("{stem}_REORDERED.{}", ext.to_string_lossy()),
        None => format!("{stem}_REORDERED"),
    };
    input.with_file_name(file_name)
}

fn run_info(path: &Path, json: bool) {
    let summary = open_session(path).summary();

    if json {
        let rendered = serde_json::to_string_pretty(&summary)
            .unwrap_or_else(|e| fail("Error rendering JSON output", e));
        println!("{rendered}");
        return;
    }

    for (key, value) in summary_pairs(&summary) {
        println!("{key}={value}");
    }
}

fn summary_pairs(summary: &SaveSummary) -> Vec<(&'static str, String)> {
    let count = |value: Option<usize>| {
        value
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unknown".to_string())
    };

    let mut pairs = vec![("header_version", summary.header_version.to_string())];
    if let Some(header) = &summary.header {
        if let Some(save_name) = &header.save_name {
            pairs.push(("save_name", save_name.clone()));
        }
        pairs.push(("session_name", header.session_name.clone()));
        pairs.push(("map_name", header.map_name.clone()));
        pairs.push(("build_version", header.build_version.to_string()));
        pairs.push((
            "play_duration_seconds",
            header.play_duration_seconds.to_string(),
        ));
    }
    pairs.extend([
        ("chunks", summary.chunk_count.to_string()),
        ("max_chunk_size", summary.max_chunk_size.to_string()),
        ("body_len", summary.body_len.to_string()),
        ("levels", summary.level_count.to_string()),
        ("objects", summary.object_count.to_string()),
        ("decoded_entities", summary.decoded_entities.to_string()),
        ("skipped_entities", summary.skipped_entities.to_string()),
        ("stations", count(summary.station_count)),
        ("trains", count(summary.train_count)),
    ]);
    pairs
}

fn run_export(path: &Path, dir: &Path) {
    let session = open_session(path);

    let mut lists = Vec::with_capacity(Collection::ALL.len());
    for collection in Collection::ALL {
        let entries = session
            .list_ordered_entries(collection)
            .unwrap_or_else(|e| fail(format!("Error listing {}s", collection.label()), e));
        let mut contents = String::new();
        for entry in &entries {
            contents.push_str(&entry.display_name);
            contents.push('\n');
        }
        lists.push((list_file(dir, collection), contents, entries.len()));
    }

    for (list_path, contents, count) in &lists {
        fs::write(list_path, contents)
            .unwrap_or_else(|e| fail(format!("Error writing {}", list_path.display()), e));
        debug!(path = %list_path.display(), entries = count, "list_written");
    }

    println!(
        "Created \"{STATION_LIST_FILE}\" and \"{TRAIN_LIST_FILE}\" in {}",
        dir.display()
    );
    println!("Reorder the lines, one name per line; names cannot be changed.");
    println!(
        "Then run `railsave apply {}` to write {}.",
        path.display(),
        default_output_path(path).display()
    );
}

fn run_apply(path: &Path, dir: &Path, output: &Path, keep_lists: bool) {
    let mut session = open_session(path);

    let mut orders: Vec<(Collection, Vec<ObjectReference>)> = Vec::new();
    for collection in Collection::ALL {
        let list_path = list_file(dir, collection);
        let contents = fs::read_to_string(&list_path)
            .unwrap_or_else(|e| fail(format!("Error reading {}", list_path.display()), e));
        let names: Vec<&str> = contents.lines().collect();
        let order = session.resolve_names(collection, names.as_slice()).unwrap_or_else(|e| {
            fail(
                format!("Error in {}; correct it and try again", list_path.display()),
                e,
            )
        });
        orders.push((collection, order));
    }

    for (collection, order) in &orders {
        session
            .apply_order(*collection, order)
            .unwrap_or_else(|e| fail(format!("Error reordering {}s", collection.label()), e));
    }

    let bytes = session
        .to_bytes()
        .unwrap_or_else(|e| fail("Error creating reordered save bytes", e));
    fs::write(output, bytes)
        .unwrap_or_else(|e| fail(format!("Error writing {}", output.display()), e));
    info!(output = %output.display(), "save_written");

    if !keep_lists {
        for collection in Collection::ALL {
            let list_path = list_file(dir, collection);
            if let Err(e) = fs::remove_file(&list_path) {
                eprintln!("Could not remove {}: {e}", list_path.display());
            }
        }
    }

    println!("Wrote reordered save to {}", output.display());
}
