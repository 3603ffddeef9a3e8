//! # Sprig CLI
//!
//! Command-line front end for the sprig version-control engine.
//!
//! ## Usage
//! ```bash
//! # Create a repository in the current directory
//! sprig init
//!
//! # Stage and commit a file
//! sprig add notes.txt
//! sprig commit -m "Add notes"
//!
//! # Inspect the repository
//! sprig status
//! sprig log
//! ```

use clap::{Parser, Subcommand};
use colored::*;
use sprig::{Repository, Result, SprigError};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Sprig - a small local version-control system
#[derive(Parser)]
#[command(name = "sprig")]
#[command(version)]
#[command(about = "Track snapshots of a directory with commits, branches and a staging area")]
#[command(long_about = None)]
struct Cli {
    /// Repository root (defaults to current directory)
    #[arg(short, long, global = true)]
    path: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a repository with an initial commit
    Init,

    /// Stage a file for the next commit
    Add {
        /// File to stage
        file: String,
    },

    /// Unstage a file, or stage a tracked file for removal
    Rm {
        /// File to remove
        file: String,
    },

    /// Show branches, staged files and working-tree changes
    #[command(alias = "st")]
    Status,

    /// Record staged changes
    #[command(alias = "ci")]
    Commit {
        /// Commit message
        #[arg(short, long)]
        message: String,
    },

    /// Show the history of the current branch
    Log,

    /// Create a branch at the current commit
    Branch {
        /// Branch name
        name: String,
    },

    /// Delete a branch pointer
    RmBranch {
        /// Branch name
        name: String,
    },

    /// Check the integrity of every stored commit
    Verify,

    #[command(hide = true)]
    Checkout {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    #[command(hide = true)]
    Reset {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    #[command(hide = true)]
    Merge {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    #[command(hide = true)]
    Find {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Disable colors if needed
    if std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    // Run command
    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e.user_message());
        std::process::exit(1);
    }
}

/// Main command runner
fn run(cli: Cli) -> Result<()> {
    let root = cli.path.unwrap_or_else(|| PathBuf::from("."));

    match cli.command {
        Commands::Init => cmd_init(root),
        Commands::Add { file } => cmd_add(root, &file),
        Commands::Rm { file } => cmd_rm(root, &file),
        Commands::Status => cmd_status(root),
        Commands::Commit { message } => cmd_commit(root, &message),
        Commands::Log => cmd_log(root),
        Commands::Branch { name } => cmd_branch(root, &name),
        Commands::RmBranch { name } => cmd_rm_branch(root, &name),
        Commands::Verify => cmd_verify(root),
        Commands::Checkout { .. } => Err(SprigError::UnsupportedCommand("checkout".to_string())),
        Commands::Reset { .. } => Err(SprigError::UnsupportedCommand("reset".to_string())),
        Commands::Merge { .. } => Err(SprigError::UnsupportedCommand("merge".to_string())),
        Commands::Find { .. } => Err(SprigError::UnsupportedCommand("find".to_string())),
    }
}

/// Initialize a repository
///
/// Creates `.sprig/` with the configuration, the root commit, the default
/// branch and an empty staging area.
fn cmd_init(root: PathBuf) -> Result<()> {
    let repo = Repository::init(root)?;

    println!("{} Initialized sprig repository", "✓".green().bold());
    println!("  Root: {}", repo.root().display().to_string().cyan());
    println!("  Branch: {}", repo.config().default_branch.yellow());
    Ok(())
}

fn cmd_add(root: PathBuf, file: &str) -> Result<()> {
    let repo = Repository::open(root)?;
    let path = repo.add(file)?;
    println!("{} {}", "staged".green(), path);
    Ok(())
}

fn cmd_rm(root: PathBuf, file: &str) -> Result<()> {
    let repo = Repository::open(root)?;
    let outcome = repo.remove(file)?;

    if outcome.marked_for_removal {
        println!("{} {}", "removed".red(), file);
    } else if outcome.unstaged {
        println!("{} {}", "unstaged".yellow(), file);
    }
    Ok(())
}

/// Show repository status
///
/// Sections are always printed in the same order, each followed by a blank
/// line, so the output is stable for scripts.
fn cmd_status(root: PathBuf) -> Result<()> {
    let repo = Repository::open(root)?;
    print!("{}", repo.status()?);
    Ok(())
}

fn cmd_commit(root: PathBuf, message: &str) -> Result<()> {
    let repo = Repository::open(root)?;
    let commit = repo.commit(message)?;

    println!(
        "{} [{}] {}",
        "✓".green().bold(),
        commit.digest().short().yellow(),
        commit.message()
    );
    println!("  Files: {}", commit.snapshots().len());
    Ok(())
}

/// Show the history of the current branch, newest first
fn cmd_log(root: PathBuf) -> Result<()> {
    let repo = Repository::open(root)?;

    for commit in repo.log()? {
        println!("===");
        println!("{} {}", "commit".bold(), commit.digest().to_string().yellow());
        println!("Date: {}", commit.timestamp().format("%a %b %e %H:%M:%S %Y %z"));
        println!("{}", commit.message());
        println!();
    }
    Ok(())
}

fn cmd_branch(root: PathBuf, name: &str) -> Result<()> {
    let repo = Repository::open(root)?;
    let tip = repo.create_branch(name)?;
    println!("{} Created branch {} at {}", "✓".green().bold(), name.cyan(), tip.short().yellow());
    Ok(())
}

fn cmd_rm_branch(root: PathBuf, name: &str) -> Result<()> {
    let repo = Repository::open(root)?;
    repo.remove_branch(name)?;
    println!("{} Removed branch {}", "✓".green().bold(), name.cyan());
    Ok(())
}

/// Verify every commit object and branch pointer
///
/// Exits with an error when problems are found so scripts can rely on the
/// status code.
fn cmd_verify(root: PathBuf) -> Result<()> {
    let repo = Repository::open(root)?;
    println!("{}", "Verifying repository...".blue().bold());
    let report = repo.verify()?;

    println!("\n{}", "Verification Report:".bold());
    println!("  Total commits: {}", report.total_commits);
    println!("  Valid commits: {}", report.valid_commits.to_string().green());
    println!("  Branches checked: {}", report.branches_checked);
    println!("  Verification time: {}ms", report.verification_time_ms);

    if report.is_valid() {
        println!("\n{} {}", "✓".green().bold(), report.summary());
        Ok(())
    } else {
        for error in &report.errors {
            println!("  {} {}", "✗".red(), error);
        }
        Err(SprigError::internal(report.summary()))
    }
}
