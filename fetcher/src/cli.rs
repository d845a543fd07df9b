//! CLI argument definitions for limefetch.
//!
//! This module defines the command-line interface using clap. It is kept
//! apart from the entrypoint so parsing can be tested without running any
//! repository operation.

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};

use crate::config::ConfigOverrides;

/// Fetch signature-verified LiME kernel modules.
#[derive(Parser, Debug)]
#[command(name = "limefetch")]
#[command(version, about)]
#[command(long_about = concat!(
    "Fetch signature-verified LiME kernel modules.\n\n",
    "limefetch lists, searches, and downloads prebuilt LiME memory acquisition ",
    "modules from a module repository. Repository metadata must carry a detached ",
    "signature from a key already imported into your GnuPG keyring, and the module ",
    "manifest is checked against the digests the signed metadata declares.",
))]
#[command(after_help = concat!(
    "EXAMPLES:\n",
    "  List every module:\n",
    "    $ limefetch list\n\n",
    "  Find modules for Ubuntu generic kernels:\n",
    "    $ limefetch find '*-generic'\n\n",
    "  Download the module for the running kernel:\n",
    "    $ limefetch fetch \"$(uname -r)\" --output-dir /tmp\n\n",
    "Import the repository signing key first:\n",
    "    $ curl -s https://threatresponse-lime-modules.s3.amazonaws.com/REPO_SIGNING_KEY.asc | gpg --import\n",
    "    $ gpg --export > ~/.gnupg/pubring.gpg",
))]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Log debug detail for every step of the trust chain.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file [default: platform config dir]/config.toml.
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<Utf8PathBuf>,

    /// OpenPGP public keyring [default: ~/.gnupg/pubring.gpg].
    #[arg(long, value_name = "FILE", global = true)]
    pub keyring: Option<Utf8PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// List every module in the repository.
    List(ListArgs),

    /// List modules whose kernel version matches a query.
    Find(FindArgs),

    /// Download the single module matching a kernel version.
    Fetch(FetchArgs),

    /// Print the limefetch version.
    Version,
}

/// Repository selection shared by every repository subcommand.
#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct RepoArgs {
    /// Repository base URL.
    #[arg(long, value_name = "URL")]
    pub repo: Option<String>,

    /// Skip repository metadata signature verification.
    #[arg(long, alias = "gpg-no-verify")]
    pub no_verify: bool,
}

/// Arguments for the list command.
#[derive(Args, Debug, Clone, Default)]
pub struct ListArgs {
    /// Repository selection.
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the find command.
#[derive(Args, Debug, Clone)]
pub struct FindArgs {
    /// Repository selection.
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Output in JSON format for scripting.
    #[arg(long)]
    pub json: bool,

    /// Kernel version to match; `*` and `?` are wildcards.
    #[arg(value_name = "KERNEL_VERSION")]
    pub query: String,
}

/// Arguments for the fetch command.
#[derive(Args, Debug, Clone)]
pub struct FetchArgs {
    /// Repository selection.
    #[command(flatten)]
    pub repo: RepoArgs,

    /// Directory to write the module into [default: current directory].
    #[arg(short, long, value_name = "DIR")]
    pub output_dir: Option<Utf8PathBuf>,

    /// Kernel version to fetch; must match exactly one module.
    #[arg(value_name = "KERNEL_VERSION")]
    pub query: String,
}

impl Cli {
    /// Collect the command-line values that override configuration.
    ///
    /// # Examples
    ///
    /// ```
    /// use clap::Parser;
    /// use limefetch::cli::Cli;
    ///
    /// let cli = Cli::parse_from(["limefetch", "list", "--no-verify"]);
    /// assert!(cli.overrides().no_verify);
    /// ```
    #[must_use]
    pub fn overrides(&self) -> ConfigOverrides {
        let (repo, download_dir) = match &self.command {
            Command::List(args) => (Some(&args.repo), None),
            Command::Find(args) => (Some(&args.repo), None),
            Command::Fetch(args) => (Some(&args.repo), args.output_dir.clone()),
            Command::Version => (None, None),
        };
        ConfigOverrides {
            repository_url: repo.and_then(|r| r.repo.clone()),
            no_verify: repo.is_some_and(|r| r.no_verify),
            keyring: self.keyring.clone().map(Utf8PathBuf::into_std_path_buf),
            download_dir: download_dir.map(Utf8PathBuf::into_std_path_buf),
        }
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
