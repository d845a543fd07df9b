//! limefetch CLI entrypoint.
//!
//! This binary lists, searches, and downloads LiME kernel modules from a
//! module repository after authenticating the repository metadata against
//! the user's OpenPGP keyring.

use clap::Parser;
use env_logger::Env;
use std::io::Write;

use limefetch::cli::{Cli, Command, FetchArgs, FindArgs, ListArgs};
use limefetch::config::{FileConfig, RepositoryConfig, resolve_config};
use limefetch::dirs::{BaseDirs, SystemBaseDirs, default_config_path};
use limefetch::error::{RepositoryError, Result};
use limefetch::output::{download_message, find_summary, format_json, format_table, list_summary};
use limefetch::repository::Repository;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &SystemBaseDirs, &mut stdout);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

/// Install `env_logger`; `RUST_LOG` takes precedence over `--verbose`.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run(cli: &Cli, dirs: &dyn BaseDirs, stdout: &mut dyn Write) -> Result<()> {
    if matches!(cli.command, Command::Version) {
        return write_line(stdout, format!("limefetch {}", env!("CARGO_PKG_VERSION")));
    }

    let repository = Repository::new(load_config(cli, dirs)?);
    match &cli.command {
        Command::List(args) => run_list(&repository, args, stdout),
        Command::Find(args) => run_find(&repository, args, stdout),
        Command::Fetch(args) => run_fetch(&repository, args, stdout),
        Command::Version => Ok(()),
    }
}

/// Resolves configuration from the config file and command-line overrides.
fn load_config(cli: &Cli, dirs: &dyn BaseDirs) -> Result<RepositoryConfig> {
    let file = cli.config.as_ref().map_or_else(
        || {
            default_config_path(dirs)
                .map_or_else(|| Ok(FileConfig::default()), |path| FileConfig::load_optional(&path))
        },
        |path| FileConfig::load(path.as_std_path()),
    )?;
    Ok(resolve_config(&file, &cli.overrides(), dirs)?)
}

fn run_list(repository: &Repository, args: &ListArgs, stdout: &mut dyn Write) -> Result<()> {
    let manifest = repository.list()?;
    let modules = manifest.modules();
    if args.json {
        return write_line(stdout, format_json(modules));
    }
    write_text(stdout, format_table(modules))?;
    write_line(
        stdout,
        list_summary(modules.len(), repository.config().base_url()),
    )
}

fn run_find(repository: &Repository, args: &FindArgs, stdout: &mut dyn Write) -> Result<()> {
    let modules = repository.find(&args.query)?;
    if args.json {
        return write_line(stdout, format_json(&modules));
    }
    write_text(stdout, format_table(&modules))?;
    write_line(
        stdout,
        find_summary(
            modules.len(),
            &args.query,
            repository.config().base_url(),
        ),
    )
}

fn run_fetch(repository: &Repository, args: &FetchArgs, stdout: &mut dyn Write) -> Result<()> {
    let path = repository.get(&args.query)?;
    write_line(stdout, download_message(&path))
}

fn write_text(stdout: &mut dyn Write, text: impl std::fmt::Display) -> Result<()> {
    write!(stdout, "{text}").map_err(|source| RepositoryError::WriteFailed { source })
}

fn write_line(stdout: &mut dyn Write, line: impl std::fmt::Display) -> Result<()> {
    writeln!(stdout, "{line}").map_err(|source| RepositoryError::WriteFailed { source })
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, format!("error: {err}"));
            1
        }
    }
}

fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort reporting; ignore write failures.
    }
}
