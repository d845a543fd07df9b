//! Tests for limefetch CLI parsing and override collection.

use super::*;
use rstest::rstest;
use std::path::PathBuf;

#[test]
fn cli_requires_a_subcommand() {
    assert!(Cli::try_parse_from(["limefetch"]).is_err());
}

#[test]
fn cli_parses_list_defaults() {
    let cli = Cli::parse_from(["limefetch", "list"]);
    match cli.command {
        Command::List(args) => {
            assert_eq!(args.repo, RepoArgs::default());
            assert!(!args.json);
        }
        other => panic!("expected List command, got {other:?}"),
    }
    assert!(!cli.verbose);
    assert!(cli.config.is_none());
    assert!(cli.keyring.is_none());
}

#[test]
fn cli_parses_find_with_glob() {
    let cli = Cli::parse_from(["limefetch", "find", "--json", "*-generic"]);
    match cli.command {
        Command::Find(args) => {
            assert_eq!(args.query, "*-generic");
            assert!(args.json);
        }
        other => panic!("expected Find command, got {other:?}"),
    }
}

#[test]
fn find_requires_a_query() {
    assert!(Cli::try_parse_from(["limefetch", "find"]).is_err());
}

#[test]
fn cli_parses_fetch_with_output_dir() {
    let cli = Cli::parse_from([
        "limefetch",
        "fetch",
        "--output-dir",
        "/tmp/modules",
        "4.2.0-17-generic",
    ]);
    match cli.command {
        Command::Fetch(args) => {
            assert_eq!(args.query, "4.2.0-17-generic");
            assert_eq!(args.output_dir, Some(Utf8PathBuf::from("/tmp/modules")));
        }
        other => panic!("expected Fetch command, got {other:?}"),
    }
}

#[test]
fn cli_parses_version_subcommand() {
    let cli = Cli::parse_from(["limefetch", "version"]);
    assert!(matches!(cli.command, Command::Version));
}

#[rstest]
#[case::long("--no-verify")]
#[case::legacy_alias("--gpg-no-verify")]
fn no_verify_accepts_alias(#[case] flag: &str) {
    let cli = Cli::parse_from(["limefetch", "list", flag]);
    assert!(cli.overrides().no_verify);
}

#[test]
fn global_flags_follow_the_subcommand() {
    let cli = Cli::parse_from([
        "limefetch",
        "list",
        "--verbose",
        "--keyring",
        "/keys/pubring.gpg",
        "--config",
        "/etc/limefetch.toml",
    ]);
    assert!(cli.verbose);
    assert_eq!(cli.config, Some(Utf8PathBuf::from("/etc/limefetch.toml")));
    assert_eq!(
        cli.overrides().keyring,
        Some(PathBuf::from("/keys/pubring.gpg"))
    );
}

#[test]
fn overrides_carry_repository_and_output_dir() {
    let cli = Cli::parse_from([
        "limefetch",
        "fetch",
        "--repo",
        "http://mirror.test/lime",
        "-o",
        "/tmp/modules",
        "4.2.0-17-generic",
    ]);
    let overrides = cli.overrides();
    assert_eq!(
        overrides.repository_url.as_deref(),
        Some("http://mirror.test/lime")
    );
    assert_eq!(overrides.download_dir, Some(PathBuf::from("/tmp/modules")));
    assert!(!overrides.no_verify);
}

#[test]
fn version_has_no_overrides() {
    let cli = Cli::parse_from(["limefetch", "version"]);
    assert_eq!(cli.overrides(), ConfigOverrides::default());
}
