use clap::{Parser, Subcommand};
use htstree::model::{ModelType, TreeSet};
use htstree::search::{NO_LEAF, search_tree};
use htstree::tree_file::parse_legacy_file;
use htstree::TreeFiles;
use std::path::PathBuf;
use std::process::ExitCode;
use strum::IntoEnumIterator;
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(version, about = "Inspect and search HTS decision tree files")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print node and leaf counts of every tree in a file
    Stats {
        file: PathBuf,
        /// Also print the nodes of every tree
        #[arg(long)]
        print: bool,
    },
    /// Search the tree of a state with a unit name
    Search {
        file: PathBuf,
        #[arg(long)]
        state: usize,
        #[arg(long)]
        name: String,
    },
    /// Load every tree file named in a TOML configuration
    Check { config: PathBuf },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("htstree=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let result = match Cli::parse().command {
        Command::Stats { file, print } => stats(file, print),
        Command::Search { file, state, name } => search(file, state, &name),
        Command::Check { config } => check(config),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn stats(file: PathBuf, print: bool) -> Result<(), Box<dyn std::error::Error>> {
    let (trees, questions) = parse_legacy_file(&file)?;
    println!("{}: {} trees, {} questions", file.display(), trees.len(), questions.len());
    for tree in &trees {
        println!(
            "  state {}: {} nodes, {} leaves, depth {}",
            tree.state(),
            tree.num_internal(),
            tree.num_leaves(),
            tree.depth()
        );
        if print {
            print!("{}", tree.to_pretty_string());
        }
    }
    Ok(())
}

fn search(file: PathBuf, state: usize, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let (trees, questions) = parse_legacy_file(&file)?;
    let leaf = trees
        .iter()
        .find(|tree| tree.state() == state)
        .map_or(NO_LEAF, |tree| search_tree(tree, &questions, name));
    println!("{leaf}");
    Ok(())
}

fn check(config: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let files = TreeFiles::from_file(&config)?;
    let mut set = TreeSet::new();
    let mut failed = false;

    for model_type in ModelType::iter() {
        let Some(path) = files.path(model_type) else {
            let status = if model_type.is_required() { "missing" } else { "skipped" };
            failed |= model_type.is_required();
            println!("{model_type}: {status}");
            continue;
        };
        match set.load_model_type_legacy(model_type, path, files.read_strategy) {
            Ok(()) => println!("{model_type}: {} trees", set.num_trees(model_type)),
            Err(err) => {
                failed = true;
                println!("{model_type}: {err}");
            }
        }
    }

    if failed {
        Err(format!("{} has missing or invalid tree files", config.display()).into())
    } else {
        Ok(())
    }
}
