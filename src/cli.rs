use anyhow::{Context as _, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use datashelf::display;
use datashelf::project::{InitOutcome, ProjectRoot};
use datashelf::shelf::{CollectionOutcome, SaveOutcome, SaveRequest, Shelf};
use datashelf::tabular::{Tabular as _, read_input};
use std::io::{BufRead as _, Write as _};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "datashelf",
    version,
    about = "Local version control for tabular datasets"
)]
pub struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a .datashelf directory with default config and metadata
    Init {
        /// Directory to initialize. Defaults to the current directory.
        #[arg(short, long)]
        path: Option<PathBuf>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Create a new collection
    CreateCollection {
        /// Collection name (lowercased, spaces become underscores)
        name: String,
    },
    /// Save a data file as a new snapshot in a collection
    Save {
        /// Input file (CSV, Parquet or JSON)
        file: PathBuf,

        #[arg(short, long)]
        collection: String,

        /// Snapshot name
        #[arg(short, long)]
        name: String,

        /// Stage tag, e.g. raw or cleaned
        #[arg(short, long)]
        tag: String,

        /// Free-form message stored with the snapshot
        #[arg(short, long, default_value = "")]
        message: String,
    },
    /// Copy a stored snapshot out of the shelf
    Checkout {
        collection: String,

        /// Content hash of the snapshot
        hash: String,

        /// Destination directory. Defaults to the current directory.
        #[arg(short, long)]
        dest: Option<PathBuf>,
    },
    /// Load a stored snapshot and print its first rows
    Load {
        collection: String,

        /// Content hash of the snapshot
        hash: String,

        /// Number of rows to print
        #[arg(short, long, default_value_t = 10)]
        rows: usize,
    },
    /// List metadata as Markdown tables
    Ls {
        view: LsView,

        /// Collection for the coll-* views; prompted for when omitted
        #[arg(short, long)]
        collection: Option<String>,
    },
    /// Show the tag policy or change tag enforcement
    Tags {
        #[command(subcommand)]
        action: Option<TagsAction>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum LsView {
    /// Root index summary
    DsMd,
    /// Collections registered in the root index
    DsColl,
    /// A collection's ledger summary
    CollMd,
    /// Snapshots stored in a collection
    CollFiles,
}

#[derive(Subcommand)]
pub enum TagsAction {
    /// Turn tag enforcement on or off
    Enforce { state: Toggle },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Toggle {
    On,
    Off,
}

/// Run one subcommand against the project enclosing the current directory.
///
/// # Errors
///
/// Any library error, with the failing step attached as context.
pub fn run_command(command: Commands) -> Result<()> {
    let cwd = std::env::current_dir().context("Failed to read current directory")?;
    match command {
        Commands::Init { path, yes } => handle_init(path.unwrap_or(cwd), yes),
        Commands::CreateCollection { name } => handle_create_collection(&cwd, &name),
        Commands::Save {
            file,
            collection,
            name,
            tag,
            message,
        } => handle_save(&cwd, &file, SaveRequest::new(collection, name, tag, message)),
        Commands::Checkout {
            collection,
            hash,
            dest,
        } => {
            let dest = dest.unwrap_or_else(|| cwd.clone());
            handle_checkout(&cwd, &collection, &hash, &dest)
        }
        Commands::Load {
            collection,
            hash,
            rows,
        } => handle_load(&cwd, &collection, &hash, rows),
        Commands::Ls { view, collection } => handle_ls(&cwd, view, collection),
        Commands::Tags { action } => handle_tags(&cwd, action),
    }
}

fn handle_init(dir: PathBuf, yes: bool) -> Result<()> {
    if !yes && !confirm(&format!("Initialize datashelf in {}?", dir.display()))? {
        println!("Aborted.");
        return Ok(());
    }

    let (root, outcome) = ProjectRoot::init(&dir)?;
    match outcome {
        InitOutcome::Initialized => {
            println!("Initialized datashelf in {}", root.shelf_dir().display());
        }
        InitOutcome::AlreadyInitialized => {
            println!("Already initialized: {}", root.shelf_dir().display());
        }
    }
    Ok(())
}

fn handle_create_collection(cwd: &Path, name: &str) -> Result<()> {
    let shelf = Shelf::open(cwd)?;
    match shelf.create_collection(name)? {
        CollectionOutcome::Created => println!("Created collection '{name}'."),
        CollectionOutcome::AlreadyExists => println!("Collection '{name}' already exists."),
    }
    Ok(())
}

fn handle_save(cwd: &Path, file: &Path, request: SaveRequest) -> Result<()> {
    let shelf = Shelf::open(cwd)?;
    let df = read_input(file)?;
    println!(
        "Saving {} ({} rows, {} columns)...",
        file.display(),
        df.row_count(),
        df.width()
    );

    match shelf.save(&df, &request)? {
        SaveOutcome::Saved(snapshot) => {
            println!(
                "Saved version {} as {}\nhash: {}",
                snapshot.version,
                snapshot.path.display(),
                snapshot.hash
            );
        }
        SaveOutcome::Duplicate {
            existing_name,
            hash,
        } => {
            println!("Identical data already saved as '{existing_name}' (hash {hash}). Nothing written.");
        }
    }
    Ok(())
}

fn handle_checkout(cwd: &Path, collection: &str, hash: &str, dest: &Path) -> Result<()> {
    let shelf = Shelf::open(cwd)?;
    let path = shelf.checkout(collection, hash, dest)?;
    println!("Checked out to {}", path.display());
    Ok(())
}

fn handle_load(cwd: &Path, collection: &str, hash: &str, rows: usize) -> Result<()> {
    let shelf = Shelf::open(cwd)?;
    let df = shelf.load(collection, hash)?;
    println!("{}", df.head(Some(rows)));
    Ok(())
}

fn handle_ls(cwd: &Path, view: LsView, collection: Option<String>) -> Result<()> {
    let shelf = Shelf::open(cwd)?;
    let table = match view {
        LsView::DsMd => display::render_index_summary(&shelf.index().read()?),
        LsView::DsColl => display::render_collections(&shelf.index().read()?),
        LsView::CollMd | LsView::CollFiles => {
            let collection = match collection {
                Some(c) => c,
                None => prompt("Collection name: ")?,
            };
            let doc = shelf.ledger(&collection)?.read()?;
            if matches!(view, LsView::CollMd) {
                display::render_ledger_summary(&doc)
            } else {
                display::render_ledger_files(&doc)
            }
        }
    };
    print!("{table}");
    Ok(())
}

fn handle_tags(cwd: &Path, action: Option<TagsAction>) -> Result<()> {
    let shelf = Shelf::open(cwd)?;
    let policy = match action {
        Some(TagsAction::Enforce { state }) => {
            shelf.set_tag_enforcement(matches!(state, Toggle::On))?
        }
        None => shelf.tag_policy()?,
    };

    println!(
        "Tag enforcement: {}",
        if policy.tag_enforcement { "on" } else { "off" }
    );
    println!("Allowed tags: {}", policy.allowed_tags.join(", "));
    Ok(())
}

fn prompt(question: &str) -> Result<String> {
    print!("{question}");
    std::io::stdout().flush()?;

    let mut line = String::new();
    if std::io::stdin().lock().read_line(&mut line)? == 0 {
        bail!("No input provided");
    }
    Ok(line.trim().to_owned())
}

fn confirm(question: &str) -> Result<bool> {
    let answer = prompt(&format!("{question} [y/N] "))?;
    Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
}
