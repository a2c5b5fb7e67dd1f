//! skillsnap command-line interface.

mod commands;
mod output;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use output::Output;
use skillsnap_core::{EngineConfig, Workspace};

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Human,
    Json,
}

#[derive(Parser)]
#[command(name = "skillsnap", version, about = "Versioned snapshots of skill directories")]
pub struct Cli {
    /// Output results as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Config file (default: <config dir>/skillsnap/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the skills
    #[arg(long, global = true)]
    pub skills_dir: Option<PathBuf>,

    /// Snapshot repository directory
    #[arg(long, global = true)]
    pub repo: Option<PathBuf>,

    /// Remote repository URL
    #[arg(long, global = true)]
    pub remote: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create or clone the snapshot repository
    Init,
    /// List the skills available for snapshots
    Scan,
    /// Save a snapshot of one skill
    Save {
        /// Skill name
        name: String,
        /// Snapshot message
        #[arg(short, long)]
        message: Option<String>,
        /// Do not pull from the remote first
        #[arg(long)]
        no_sync: bool,
        /// Stage even if the hash cache reports no changes
        #[arg(long)]
        force: bool,
    },
    /// List snapshots of one skill or of all skills
    List {
        /// Skill name
        name: Option<String>,
    },
    /// Restore a skill to a snapshot version
    Restore {
        /// Skill name
        name: String,
        /// Version: N, vN or <name>/vN. Lists versions when omitted.
        version: Option<String>,
    },
    /// Delete a snapshot version
    Delete {
        /// Skill name
        name: String,
        /// Version: N, vN or <name>/vN
        version: String,
    },
    /// Snapshot every skill with changes
    BackupAll {
        /// Snapshot message
        #[arg(short, long)]
        message: Option<String>,
    },
    /// Compare a skill with a snapshot (latest by default)
    Diff {
        /// Skill name
        name: String,
        /// Version: N, vN or <name>/vN
        version: Option<String>,
    },
    /// Recompute the hash cache
    RebuildCache {
        /// Skill name (all skills when omitted)
        name: Option<String>,
    },
    /// Delete the hash cache
    ClearCache {
        /// Skill name (whole cache when omitted)
        name: Option<String>,
    },
    /// Show repository, cache and change status
    Status,
    /// Generate shell completions
    Completions {
        /// Target shell
        shell: Shell,
    },
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_config(cli: &Cli) -> commands::Result<EngineConfig> {
    let mut config = EngineConfig::load(cli.config.as_deref())?;
    if let Some(dir) = &cli.skills_dir {
        config = config.with_skills_dir(dir);
    }
    if let Some(dir) = &cli.repo {
        config = config.with_repo_dir(dir);
    }
    if let Some(url) = &cli.remote {
        config = config.with_remote(url);
    }
    Ok(config)
}

fn try_main(cli: Cli, output: &Output) -> commands::Result<()> {
    if let Command::Completions { shell } = cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "skillsnap", &mut std::io::stdout());
        return Ok(());
    }

    let ws = Workspace::open(load_config(&cli)?);

    match cli.command {
        Command::Init => commands::init::run(output, &ws),
        Command::Scan => commands::scan::run(output, &ws),
        Command::Save {
            name,
            message,
            no_sync,
            force,
        } => commands::save::run(output, &ws, &name, message, !no_sync, force),
        Command::List { name } => commands::list::run(output, &ws, name.as_deref()),
        Command::Restore { name, version } => {
            commands::restore::run(output, &ws, &name, version.as_deref())
        }
        Command::Delete { name, version } => commands::delete::run(output, &ws, &name, &version),
        Command::BackupAll { message } => commands::backup::run(output, &ws, message.as_deref()),
        Command::Diff { name, version } => {
            commands::diff::run(output, &ws, &name, version.as_deref())
        }
        Command::RebuildCache { name } => commands::cache::rebuild(output, &ws, name.as_deref()),
        Command::ClearCache { name } => commands::cache::clear(output, &ws, name.as_deref()),
        Command::Status => commands::status::run(output, &ws),
        Command::Completions { .. } => Ok(()),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Human
    };
    let output = Output::new(format, cli.quiet);

    if let Err(e) = try_main(cli, &output) {
        output.error(e.error_type(), &e.to_string());
        ::std::process::exit(1)
    }
}
