mod parse;
mod ui;

use clap::CommandFactory;

use crate::{
    lang::TRANSLATOR,
    prelude::{Error, StrictPath},
    process::{close_processes, SystemProcesses},
    report::Reporter,
    resource::{config::Config, SaveableResourceFile},
    scan::{
        back_up_directory, back_up_manifest, cache, clean_cache, find_game_folders, find_manifest_dir, locator,
        relocate, remove_manifest, repair_game, scan_manifests, validate_manifest, GameRecord, RelocateOptions,
        ScanOutcome,
    },
};

pub use self::parse::{parse, Cli, CompletionShell, Subcommand};

/// Resolve the manifest directory from `--path`, then the config, then the built-in candidates.
fn manifest_dir(path: Option<StrictPath>, config: &Config) -> Result<StrictPath, Error> {
    if let Some(path) = path {
        if path.is_dir() {
            return Ok(path);
        }
        log::error!("Requested manifest directory does not exist: {:?}", path.raw());
        return Err(Error::ManifestDirNotFound);
    }

    find_manifest_dir(config.manifests.path.as_ref(), locator::candidates::host()).ok_or(Error::ManifestDirNotFound)
}

fn select_game<'a>(scan: &'a ScanOutcome, name: &str) -> Result<&'a GameRecord, Error> {
    scan.find(name).ok_or_else(|| Error::CliUnrecognizedGame { name: name.to_string() })
}

/// The games a command should touch: one by name, or all of them.
fn select_games<'a>(scan: &'a ScanOutcome, game: Option<&str>) -> Result<Vec<&'a GameRecord>, Error> {
    match game {
        Some(name) => Ok(vec![select_game(scan, name)?]),
        None => Ok(scan.games.iter().collect()),
    }
}

pub fn run(sub: Subcommand) -> Result<(), Error> {
    let config = Config::load()?;
    config.save();

    let mut reporter = Reporter::new(sub.api());
    log::info!("Executing CLI command: {:?}", &sub);

    match execute(sub, &config, &mut reporter) {
        Ok(false) => Ok(()),
        Ok(true) => {
            reporter.print();
            if reporter.some_entries_failed() {
                return Err(Error::SomeEntriesFailed);
            }
            Ok(())
        }
        Err(e) => {
            if let Error::CliUnrecognizedGame { name } = &e {
                reporter.trip_unknown_games(vec![name.clone()]);
            }
            reporter.print_failure();
            Err(e)
        }
    }
}

/// Run one subcommand, filling in `reporter`. Returns whether there is a report to print.
fn execute(sub: Subcommand, config: &Config, reporter: &mut Reporter) -> Result<bool, Error> {
    let now = chrono::Local::now();

    match sub {
        Subcommand::Scan { path, .. } => {
            let dir = manifest_dir(path, config)?;
            let scan = scan_manifests(&dir);
            reporter.add_scan(&dir, &scan);
        }
        Subcommand::Relocate {
            new_base,
            path,
            preview,
            no_backup,
            ..
        } => {
            let dir = manifest_dir(path, config)?;
            let mut scan = scan_manifests(&dir);
            let mut backup = config.backup.policy();
            if no_backup {
                backup.enabled = false;
            }
            let options = RelocateOptions {
                preview,
                backup,
                game_folder: config.game_folder.clone(),
            };
            let report = relocate(&mut scan, &new_base, &options, &now)?;
            reporter.add_relocation(&new_base, &report);
        }
        Subcommand::Repair { game, path, .. } => {
            let dir = manifest_dir(path, config)?;
            let scan = scan_manifests(&dir);
            let policy = config.backup.policy();

            for record in select_games(&scan, game.as_deref())? {
                let outcome = repair_game(record, &policy, &now);
                reporter.add_repair(&outcome);
            }
        }
        Subcommand::Backup { all, game, path, .. } => {
            let dir = manifest_dir(path, config)?;

            if all {
                let snapshot = back_up_directory(&dir, &now)?;
                reporter.add_snapshot(&dir, &snapshot);
            } else {
                let scan = scan_manifests(&dir);
                let backup_dir = config.backup.dir();
                for record in select_games(&scan, game.as_deref())? {
                    let backup = back_up_manifest(&record.manifest_file, &backup_dir, &record.app_name, &now)
                        .map_err(|e| TRANSLATOR.handle_error(&e));
                    reporter.add_backup(&record.display_name, &record.manifest_file, backup);
                }
            }
        }
        Subcommand::Validate { game, path, .. } => {
            let dir = manifest_dir(path, config)?;
            let scan = scan_manifests(&dir);

            match game {
                Some(name) => {
                    let record = select_game(&scan, &name)?;
                    reporter.add_validation(&record.display_name, &validate_manifest(&record.manifest_file));
                }
                None => {
                    for record in &scan.games {
                        reporter.add_validation(&record.display_name, &validate_manifest(&record.manifest_file));
                    }
                    for skipped in &scan.skipped {
                        reporter.add_validation(&skipped.file.render(), &validate_manifest(&skipped.file));
                    }
                }
            }
        }
        Subcommand::Remove { game, path, force, .. } => {
            let dir = manifest_dir(path, config)?;
            let scan = scan_manifests(&dir);
            let record = select_game(&scan, &game)?;

            if !ui::confirm(
                force,
                &TRANSLATOR.cli_confirm_removal(&record.display_name, &record.manifest_file),
            )? {
                return Ok(false);
            }

            let safeguard = remove_manifest(record, &config.backup.policy(), &now)?;
            reporter.add_removal(&record.display_name, &record.manifest_file, &safeguard);
        }
        Subcommand::Find { dir, .. } => {
            let folders = find_game_folders(&dir, &config.game_folder);
            reporter.add_found_folders(&folders);
        }
        Subcommand::CloseLauncher { .. } => {
            let outcome = close_processes(&mut SystemProcesses::new(), &config.launcher.processes);
            reporter.add_closed_processes(&outcome);
        }
        Subcommand::CleanCache { .. } => {
            let paths: Vec<_> = cache::candidates::host()
                .iter()
                .map(|raw| StrictPath::new(raw.to_string()))
                .collect();
            let outcome = clean_cache(&paths);
            reporter.add_cache_cleanup(&outcome);
        }
        Subcommand::Complete { shell } => {
            let clap_shell = match shell {
                CompletionShell::Bash => clap_complete::Shell::Bash,
                CompletionShell::Fish => clap_complete::Shell::Fish,
                CompletionShell::Zsh => clap_complete::Shell::Zsh,
                CompletionShell::PowerShell => clap_complete::Shell::PowerShell,
                CompletionShell::Elvish => clap_complete::Shell::Elvish,
            };
            clap_complete::generate(
                clap_shell,
                &mut Cli::command(),
                env!("CARGO_PKG_NAME"),
                &mut std::io::stdout(),
            );
            return Ok(false);
        }
    }

    Ok(true)
}
