use std::path::PathBuf;

use crate::prelude::StrictPath;

fn parse_strict_path(path: &str) -> Result<StrictPath, std::convert::Infallible> {
    Ok(StrictPath::new(path.to_owned()))
}

fn parse_existing_strict_path(path: &str) -> Result<StrictPath, std::io::Error> {
    let sp = StrictPath::new(path.to_owned());
    std::fs::canonicalize(sp.interpret())?;
    Ok(sp)
}

#[derive(clap::Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum CompletionShell {
    #[clap(about = "Completions for Bash")]
    Bash,
    #[clap(about = "Completions for Fish")]
    Fish,
    #[clap(about = "Completions for Zsh")]
    Zsh,
    #[clap(name = "powershell", about = "Completions for PowerShell")]
    PowerShell,
    #[clap(about = "Completions for Elvish")]
    Elvish,
}

#[derive(clap::Subcommand, Clone, Debug, PartialEq, Eq)]
pub enum Subcommand {
    /// List the games described by the launcher's manifests.
    Scan {
        /// Manifest directory to use instead of the detected one.
        #[clap(long, value_parser = parse_strict_path)]
        path: Option<StrictPath>,

        /// Print information to stdout in machine-readable JSON.
        #[clap(long)]
        api: bool,
    },
    /// Point manifests at game folders that were moved under a new location.
    Relocate {
        /// Directory that now contains the moved game folders.
        #[clap(value_parser = parse_existing_strict_path)]
        new_base: StrictPath,

        /// Manifest directory to use instead of the detected one.
        #[clap(long, value_parser = parse_strict_path)]
        path: Option<StrictPath>,

        /// Show what would change, but don't write anything.
        #[clap(long)]
        preview: bool,

        /// Don't back up manifests before rewriting them.
        /// When not specified, this defers to the config file.
        #[clap(long)]
        no_backup: bool,

        /// Print information to stdout in machine-readable JSON.
        #[clap(long)]
        api: bool,
    },
    /// Add fields the launcher expects but a manifest lacks.
    Repair {
        /// Only repair this game (display name or app name).
        /// When not specified, every valid manifest is repaired.
        #[clap(long)]
        game: Option<String>,

        /// Manifest directory to use instead of the detected one.
        #[clap(long, value_parser = parse_strict_path)]
        path: Option<StrictPath>,

        /// Print information to stdout in machine-readable JSON.
        #[clap(long)]
        api: bool,
    },
    /// Back up manifests.
    /// By default, each manifest is copied into the backup directory.
    Backup {
        /// Copy the whole manifest directory next to itself instead.
        #[clap(long, conflicts_with("game"))]
        all: bool,

        /// Only back up this game's manifest.
        #[clap(long)]
        game: Option<String>,

        /// Manifest directory to use instead of the detected one.
        #[clap(long, value_parser = parse_strict_path)]
        path: Option<StrictPath>,

        /// Print information to stdout in machine-readable JSON.
        #[clap(long)]
        api: bool,
    },
    /// Check manifests for problems without changing them.
    Validate {
        /// Only check this game's manifest.
        #[clap(long)]
        game: Option<String>,

        /// Manifest directory to use instead of the detected one.
        #[clap(long, value_parser = parse_strict_path)]
        path: Option<StrictPath>,

        /// Print information to stdout in machine-readable JSON.
        #[clap(long)]
        api: bool,
    },
    /// Back up and delete a game's manifest so the launcher forgets it.
    Remove {
        /// Game to remove (display name or app name).
        #[clap(long)]
        game: String,

        /// Manifest directory to use instead of the detected one.
        #[clap(long, value_parser = parse_strict_path)]
        path: Option<StrictPath>,

        /// Don't ask for confirmation.
        #[clap(long)]
        force: bool,

        /// Print information to stdout in machine-readable JSON.
        #[clap(long)]
        api: bool,
    },
    /// List folders that look like Epic game installations.
    Find {
        /// Directory to search.
        #[clap(value_parser = parse_existing_strict_path)]
        dir: StrictPath,

        /// Print information to stdout in machine-readable JSON.
        #[clap(long)]
        api: bool,
    },
    /// Close the Epic Games Launcher and its helper processes.
    CloseLauncher {
        /// Print information to stdout in machine-readable JSON.
        #[clap(long)]
        api: bool,
    },
    /// Delete the launcher's web cache and log folders.
    /// Close the launcher first.
    CleanCache {
        /// Print information to stdout in machine-readable JSON.
        #[clap(long)]
        api: bool,
    },
    /// Generate shell completion scripts
    Complete {
        #[clap(subcommand)]
        shell: CompletionShell,
    },
}

impl Subcommand {
    pub fn api(&self) -> bool {
        match self {
            Self::Scan { api, .. } => *api,
            Self::Relocate { api, .. } => *api,
            Self::Repair { api, .. } => *api,
            Self::Backup { api, .. } => *api,
            Self::Validate { api, .. } => *api,
            Self::Remove { api, .. } => *api,
            Self::Find { api, .. } => *api,
            Self::CloseLauncher { api } => *api,
            Self::CleanCache { api } => *api,
            Self::Complete { .. } => false,
        }
    }
}

#[derive(clap::Parser, Clone, Debug, PartialEq, Eq)]
#[clap(
    name = "egsmend",
    version,
    about = "Repair Epic Games Launcher manifests after moving installed games"
)]
pub struct Cli {
    /// Use configuration found in DIRECTORY
    #[clap(long, value_name = "DIRECTORY")]
    pub config: Option<PathBuf>,

    #[clap(subcommand)]
    pub sub: Subcommand,
}

pub fn parse() -> Cli {
    use clap::Parser;
    Cli::parse()
}

#[cfg(test)]
mod tests {
    use clap::Parser;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::testing::{repo, s};

    fn check_args(args: &[&str], expected: Cli) {
        assert_eq!(expected, Cli::try_parse_from(args).unwrap());
    }

    fn check_args_err(args: &[&str], error: clap::error::ErrorKind) {
        let result = Cli::try_parse_from(args);
        assert!(result.is_err());
        assert_eq!(error, result.unwrap_err().kind());
    }

    #[test]
    fn rejects_cli_without_subcommand() {
        assert!(Cli::try_parse_from(["egsmend"]).is_err());
    }

    #[test]
    fn accepts_cli_with_config_dir() {
        check_args(
            &["egsmend", "--config", "tests/config", "scan"],
            Cli {
                config: Some(PathBuf::from("tests/config")),
                sub: Subcommand::Scan { path: None, api: false },
            },
        );
    }

    #[test]
    fn accepts_cli_scan_with_all_arguments() {
        check_args(
            &["egsmend", "scan", "--path", "tests/manifests", "--api"],
            Cli {
                config: None,
                sub: Subcommand::Scan {
                    path: Some(StrictPath::new(s("tests/manifests"))),
                    api: true,
                },
            },
        );
    }

    #[test]
    fn accepts_cli_relocate_with_minimal_arguments() {
        let base = repo();
        check_args(
            &["egsmend", "relocate", &base],
            Cli {
                config: None,
                sub: Subcommand::Relocate {
                    new_base: StrictPath::new(base.clone()),
                    path: None,
                    preview: false,
                    no_backup: false,
                    api: false,
                },
            },
        );
    }

    #[test]
    fn accepts_cli_relocate_with_all_arguments() {
        let base = repo();
        check_args(
            &[
                "egsmend",
                "relocate",
                &base,
                "--path",
                "tests/manifests",
                "--preview",
                "--no-backup",
                "--api",
            ],
            Cli {
                config: None,
                sub: Subcommand::Relocate {
                    new_base: StrictPath::new(base.clone()),
                    path: Some(StrictPath::new(s("tests/manifests"))),
                    preview: true,
                    no_backup: true,
                    api: true,
                },
            },
        );
    }

    #[test]
    fn rejects_cli_relocate_to_nonexistent_base() {
        check_args_err(
            &["egsmend", "relocate", "/definitely/not/a/real/base"],
            clap::error::ErrorKind::ValueValidation,
        );
    }

    #[test]
    fn accepts_cli_repair_for_one_game() {
        check_args(
            &["egsmend", "repair", "--game", "Foo Game"],
            Cli {
                config: None,
                sub: Subcommand::Repair {
                    game: Some(s("Foo Game")),
                    path: None,
                    api: false,
                },
            },
        );
    }

    #[test]
    fn accepts_cli_backup_of_whole_directory() {
        check_args(
            &["egsmend", "backup", "--all"],
            Cli {
                config: None,
                sub: Subcommand::Backup {
                    all: true,
                    game: None,
                    path: None,
                    api: false,
                },
            },
        );
    }

    #[test]
    fn rejects_cli_backup_with_all_and_game() {
        check_args_err(
            &["egsmend", "backup", "--all", "--game", "Foo"],
            clap::error::ErrorKind::ArgumentConflict,
        );
    }

    #[test]
    fn accepts_cli_validate_with_minimal_arguments() {
        check_args(
            &["egsmend", "validate"],
            Cli {
                config: None,
                sub: Subcommand::Validate {
                    game: None,
                    path: None,
                    api: false,
                },
            },
        );
    }

    #[test]
    fn accepts_cli_remove_with_all_arguments() {
        check_args(
            &["egsmend", "remove", "--game", "Foo", "--path", "tests/manifests", "--force", "--api"],
            Cli {
                config: None,
                sub: Subcommand::Remove {
                    game: s("Foo"),
                    path: Some(StrictPath::new(s("tests/manifests"))),
                    force: true,
                    api: true,
                },
            },
        );
    }

    #[test]
    fn rejects_cli_remove_without_game() {
        check_args_err(
            &["egsmend", "remove"],
            clap::error::ErrorKind::MissingRequiredArgument,
        );
    }

    #[test]
    fn accepts_cli_find() {
        let dir = repo();
        check_args(
            &["egsmend", "find", &dir, "--api"],
            Cli {
                config: None,
                sub: Subcommand::Find {
                    dir: StrictPath::new(dir.clone()),
                    api: true,
                },
            },
        );
    }

    #[test]
    fn accepts_cli_close_launcher() {
        check_args(
            &["egsmend", "close-launcher"],
            Cli {
                config: None,
                sub: Subcommand::CloseLauncher { api: false },
            },
        );
    }

    #[test]
    fn accepts_cli_clean_cache() {
        check_args(
            &["egsmend", "clean-cache", "--api"],
            Cli {
                config: None,
                sub: Subcommand::CleanCache { api: true },
            },
        );
    }

    #[test]
    fn accepts_cli_complete_for_bash() {
        check_args(
            &["egsmend", "complete", "bash"],
            Cli {
                config: None,
                sub: Subcommand::Complete {
                    shell: CompletionShell::Bash,
                },
            },
        );
    }

    #[test]
    fn accepts_cli_complete_for_powershell() {
        check_args(
            &["egsmend", "complete", "powershell"],
            Cli {
                config: None,
                sub: Subcommand::Complete {
                    shell: CompletionShell::PowerShell,
                },
            },
        );
    }
}
