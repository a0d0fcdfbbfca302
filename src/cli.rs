//! Command-line interface definitions.
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Top-level CLI entry point for the generation activation engine.
#[derive(Parser, Debug)]
#[command(
    name = "homegen",
    about = "Activate home directory file generations",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Preview changes to the home directory without applying them
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Home directory to manage (defaults to $HOME)
    #[arg(long, global = true, env = "HOMEGEN_HOME")]
    pub home: Option<PathBuf>,

    /// Move unmanaged files to <path>.<ext> instead of refusing (empty disables)
    #[arg(long, global = true, env = "HOMEGEN_BACKUP_EXT")]
    pub backup_ext: Option<String>,

    /// Overwrite an existing backup file
    #[arg(long, global = true)]
    pub backup_overwrite: bool,

    /// Store directory whose links also count as managed
    #[arg(long, global = true, env = "HOMEGEN_STORE_DIR")]
    pub store_dir: Option<PathBuf>,

    /// Disable parallel content comparison (parallel is enabled by default)
    #[arg(long = "no-parallel", global = true, action = clap::ArgAction::SetFalse)]
    pub parallel: bool,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Stage a generation and switch the home directory to it
    Activate(ActivateOpts),
    /// Stage a generation without touching the home directory
    Build(BuildOpts),
    /// Remove every managed link of a generation from the home directory
    Deactivate(DeactivateOpts),
    /// Print version information
    Version,
}

/// Options for the `activate` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ActivateOpts {
    /// Manifest describing the files (TOML, or JSON by extension)
    #[arg(short, long)]
    pub manifest: PathBuf,

    /// Root of the generation to build and activate
    #[arg(long = "new")]
    pub new_root: PathBuf,

    /// Root of the currently active generation
    #[arg(long = "old")]
    pub old_root: Option<PathBuf>,
}

/// Options for the `build` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct BuildOpts {
    /// Manifest describing the files (TOML, or JSON by extension)
    #[arg(short, long)]
    pub manifest: PathBuf,

    /// Root of the generation to build
    #[arg(short, long)]
    pub out: PathBuf,
}

/// Options for the `deactivate` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct DeactivateOpts {
    /// Root of the generation to remove
    #[arg(long = "old")]
    pub old_root: PathBuf,
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parse_activate() {
        let cli = Cli::parse_from([
            "homegen", "activate", "--manifest", "files.toml", "--new", "/gens/2", "--old",
            "/gens/1",
        ]);
        assert!(
            matches!(&cli.command, Command::Activate(_)),
            "Expected Activate command"
        );
        if let Command::Activate(opts) = cli.command {
            assert_eq!(opts.manifest, PathBuf::from("files.toml"));
            assert_eq!(opts.new_root, PathBuf::from("/gens/2"));
            assert_eq!(opts.old_root, Some(PathBuf::from("/gens/1")));
        }
    }

    #[test]
    fn parse_activate_without_old() {
        let cli = Cli::parse_from(["homegen", "activate", "-m", "f.toml", "--new", "/gens/1"]);
        if let Command::Activate(opts) = cli.command {
            assert!(opts.old_root.is_none());
        }
    }

    #[test]
    fn activate_requires_new_root() {
        let result = Cli::try_parse_from(["homegen", "activate", "--manifest", "f.toml"]);
        assert!(result.is_err());
    }

    #[test]
    fn parse_build() {
        let cli = Cli::parse_from(["homegen", "build", "-m", "f.json", "-o", "/gens/3"]);
        assert!(
            matches!(&cli.command, Command::Build(_)),
            "Expected Build command"
        );
        if let Command::Build(opts) = cli.command {
            assert_eq!(opts.out, PathBuf::from("/gens/3"));
        }
    }

    #[test]
    fn parse_deactivate() {
        let cli = Cli::parse_from(["homegen", "deactivate", "--old", "/gens/1"]);
        assert!(matches!(cli.command, Command::Deactivate(_)));
    }

    #[test]
    fn parse_version() {
        let cli = Cli::parse_from(["homegen", "version"]);
        assert!(matches!(cli.command, Command::Version));
    }

    #[test]
    fn parse_dry_run_short() {
        let cli = Cli::parse_from(["homegen", "-d", "deactivate", "--old", "/g"]);
        assert!(cli.global.dry_run);
    }

    #[test]
    fn parse_verbose() {
        let cli = Cli::parse_from(["homegen", "-v", "version"]);
        assert!(cli.verbose);
    }

    #[test]
    fn parse_backup_options() {
        let cli = Cli::parse_from([
            "homegen",
            "--backup-ext",
            "bak",
            "--backup-overwrite",
            "version",
        ]);
        assert_eq!(cli.global.backup_ext.as_deref(), Some("bak"));
        assert!(cli.global.backup_overwrite);
    }

    #[test]
    fn parse_home_override() {
        let cli = Cli::parse_from(["homegen", "--home", "/tmp/home", "version"]);
        assert_eq!(cli.global.home, Some(PathBuf::from("/tmp/home")));
    }

    #[test]
    fn parallel_is_enabled_by_default() {
        let cli = Cli::parse_from(["homegen", "version"]);
        assert!(cli.global.parallel, "parallel should be true by default");
    }

    #[test]
    fn no_parallel_disables_parallel() {
        let cli = Cli::parse_from(["homegen", "--no-parallel", "version"]);
        assert!(
            !cli.global.parallel,
            "--no-parallel should set parallel to false"
        );
    }
}
