use std::collections::BTreeMap;

use crate::{
    lang::TRANSLATOR,
    prelude::StrictPath,
    process::CloseOutcome,
    scan::{
        backup::Safeguard, CleanOutcome, FoundFolder, GameRecord, RelocationReport, RelocationStatus, RepairOutcome,
        ScanOutcome, Validation,
    },
};

#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiErrors {
    /// Whether any manifest failed to process.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub some_entries_failed: Option<bool>,
    /// Names that did not match any manifest, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unknown_games: Option<Vec<String>>,
}

impl ApiErrors {
    /// This is used by the standard reporter.
    pub fn messages(&self) -> Vec<String> {
        let mut out = vec![];

        if let Some(games) = &self.unknown_games {
            for game in games {
                out.push(TRANSLATOR.cli_unrecognized_game(game));
            }
        }

        out
    }
}

/// Totals for a batch over the manifest directory.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOverall {
    pub total: usize,
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes: Option<u64>,
    pub location: StrictPath,
    #[serde(skip_serializing_if = "crate::serialization::is_false")]
    pub preview: bool,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiBackedUp {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<StrictPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRemoved {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backup: Option<StrictPath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Debug, serde::Serialize)]
#[serde(untagged)]
pub enum ApiGame {
    /// Used by the `scan` command.
    Scanned(GameRecord),
    /// Used by the `relocate` command.
    Relocated(crate::scan::relocate::RelocationEntry),
    /// Used by the `repair` command.
    Repaired(RepairOutcome),
    /// Used by the `backup` command.
    BackedUp(ApiBackedUp),
    /// Used by the `validate` command.
    Validated(Validation),
    /// Used by the `remove` command.
    Removed(ApiRemoved),
}

/// General output used by commands in `--api` mode
#[derive(Debug, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOutput {
    /// Any errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<ApiErrors>,
    /// Overall stats, populated by the `scan` and `relocate` commands.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall: Option<ApiOverall>,
    /// Each key is the manifest file of a game, since display names can repeat.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub games: BTreeMap<String, ApiGame>,
    /// Manifests that could not be used, keyed by file path.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub skipped: BTreeMap<String, String>,
    /// Populated by the `find` command.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub folders: Vec<FoundFolder>,
    /// Populated by the `backup --all` command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<StrictPath>,
    /// Populated by the `close-launcher` command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processes: Option<CloseOutcome>,
    /// Populated by the `clean-cache` command.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<CleanOutcome>,
}

#[derive(Debug)]
pub enum Reporter {
    Standard { parts: Vec<String>, errors: ApiErrors },
    Json { output: ApiOutput },
}

impl Reporter {
    pub fn standard() -> Self {
        Self::Standard {
            parts: vec![],
            errors: Default::default(),
        }
    }

    pub fn json() -> Self {
        Self::Json {
            output: Default::default(),
        }
    }

    pub fn new(api: bool) -> Self {
        if api {
            Self::json()
        } else {
            Self::standard()
        }
    }

    fn set_errors(&mut self, f: impl FnOnce(&mut ApiErrors)) {
        match self {
            Reporter::Standard { errors, .. } => f(errors),
            Reporter::Json { output } => {
                if let Some(errors) = &mut output.errors.as_mut() {
                    f(errors)
                } else {
                    let mut errors = ApiErrors::default();
                    f(&mut errors);
                    output.errors = Some(errors);
                }
            }
        }
    }

    fn trip_some_entries_failed(&mut self) {
        self.set_errors(|e| {
            e.some_entries_failed = Some(true);
        });
    }

    pub fn trip_unknown_games(&mut self, games: Vec<String>) {
        self.set_errors(|e| {
            e.unknown_games = Some(games);
        });
    }

    pub fn some_entries_failed(&self) -> bool {
        match self {
            Self::Standard { errors, .. } => errors.some_entries_failed.unwrap_or(false),
            Self::Json { output } => output
                .errors
                .as_ref()
                .and_then(|x| x.some_entries_failed)
                .unwrap_or(false),
        }
    }

    pub fn add_scan(&mut self, dir: &StrictPath, scan: &ScanOutcome) {
        match self {
            Self::Standard { parts, .. } => {
                for game in &scan.games {
                    parts.push(TRANSLATOR.cli_game_header(&game.display_name, game.size, game.installed));
                    parts.push(TRANSLATOR.cli_game_line_item(&format!("AppName: {}", &game.app_name), true));
                    parts.push(TRANSLATOR.cli_game_line_item(&format!("Install: {}", &game.install_path), true));
                    parts.push(TRANSLATOR.cli_game_line_item(&format!("Manifest: {}", game.manifest_file.render()), true));
                    // Blank line between games.
                    parts.push("".to_string());
                }
                if !scan.skipped.is_empty() {
                    parts.push("Skipped:".to_string());
                    for skipped in &scan.skipped {
                        parts.push(TRANSLATOR.cli_game_line_item(
                            &format!("{}: {}", skipped.file.render(), &skipped.error),
                            skipped.error.is_incomplete(),
                        ));
                    }
                    parts.push("".to_string());
                }
                let bytes = scan.installed().map(|x| x.size).sum();
                parts.push(TRANSLATOR.cli_scan_summary(dir, scan.games.len(), scan.skipped.len(), bytes));
            }
            Self::Json { output } => {
                for game in &scan.games {
                    output
                        .games
                        .insert(game.manifest_file.render(), ApiGame::Scanned(game.clone()));
                }
                for skipped in &scan.skipped {
                    output.skipped.insert(skipped.file.render(), skipped.error.to_string());
                }
                output.overall = Some(ApiOverall {
                    total: scan.total(),
                    processed: scan.games.len(),
                    skipped: scan.skipped.len(),
                    failed: 0,
                    bytes: Some(scan.installed().map(|x| x.size).sum()),
                    location: dir.clone(),
                    preview: false,
                });
            }
        }
    }

    pub fn add_relocation(&mut self, new_base: &StrictPath, report: &RelocationReport) {
        match self {
            Self::Standard { parts, .. } => {
                for entry in &report.entries {
                    let name = entry.name.clone().unwrap_or_else(|| entry.file.render());
                    parts.push(format!("{}:", name));

                    let mut item = TRANSLATOR.relocation_status(entry.status);
                    if let (Some(from), Some(to)) = (&entry.from, &entry.to) {
                        item += &format!(": {} -> {}", from, &to.install);
                    } else if let Some(error) = &entry.error {
                        item += &format!(": {}", error);
                    }
                    parts.push(TRANSLATOR.cli_game_line_item(&item, entry.status != RelocationStatus::Failed));

                    if let Some(backup) = &entry.backup {
                        parts.push(TRANSLATOR.cli_game_line_item(&format!("backup: {}", backup.render()), true));
                    }
                    for warning in &entry.warnings {
                        parts.push(TRANSLATOR.cli_game_line_item(&format!("warning: {}", warning), true));
                    }
                    // Blank line between games.
                    parts.push("".to_string());
                }
                parts.push(TRANSLATOR.cli_relocation_summary(
                    report.preview,
                    new_base,
                    report.updated(),
                    report.skipped(),
                    report.failed(),
                ));
            }
            Self::Json { output } => {
                for entry in &report.entries {
                    output
                        .games
                        .insert(entry.file.render(), ApiGame::Relocated(entry.clone()));
                }
                output.overall = Some(ApiOverall {
                    total: report.total(),
                    processed: report.updated(),
                    skipped: report.skipped(),
                    failed: report.failed(),
                    bytes: None,
                    location: new_base.clone(),
                    preview: report.preview,
                });
            }
        }

        if report.failed() > 0 {
            self.trip_some_entries_failed();
        }
    }

    pub fn add_repair(&mut self, outcome: &RepairOutcome) -> bool {
        let successful = !outcome.failed();

        match self {
            Self::Standard { parts, .. } => {
                parts.push(format!("{}:", &outcome.name));
                if let Some(error) = &outcome.error {
                    parts.push(TRANSLATOR.cli_game_line_item(error, false));
                } else if outcome.added.is_empty() {
                    parts.push(TRANSLATOR.cli_game_line_item("nothing to repair", true));
                } else {
                    for key in &outcome.added {
                        parts.push(TRANSLATOR.cli_game_line_item(&format!("added: {}", key), true));
                    }
                }
                if let Some(backup) = &outcome.backup {
                    parts.push(TRANSLATOR.cli_game_line_item(&format!("backup: {}", backup.render()), true));
                }
                for warning in &outcome.warnings {
                    parts.push(TRANSLATOR.cli_game_line_item(&format!("warning: {}", warning), true));
                }
                parts.push("".to_string());
            }
            Self::Json { output } => {
                output
                    .games
                    .insert(outcome.file.render(), ApiGame::Repaired(outcome.clone()));
            }
        }

        if !successful {
            self.trip_some_entries_failed();
        }
        successful
    }

    pub fn add_backup(&mut self, name: &str, file: &StrictPath, backup: Result<StrictPath, String>) -> bool {
        let successful = backup.is_ok();

        match self {
            Self::Standard { parts, .. } => {
                parts.push(format!("{}:", name));
                match &backup {
                    Ok(target) => parts.push(TRANSLATOR.cli_game_line_item(
                        &format!("{} -> {}", file.render(), target.render()),
                        true,
                    )),
                    Err(e) => parts.push(TRANSLATOR.cli_game_line_item(&format!("{}: {}", file.render(), e), false)),
                }
            }
            Self::Json { output } => {
                let (backup, error) = match backup {
                    Ok(x) => (Some(x), None),
                    Err(e) => (None, Some(e)),
                };
                output.games.insert(
                    file.render(),
                    ApiGame::BackedUp(ApiBackedUp {
                        name: name.to_string(),
                        backup,
                        error,
                    }),
                );
            }
        }

        if !successful {
            self.trip_some_entries_failed();
        }
        successful
    }

    pub fn add_snapshot(&mut self, dir: &StrictPath, snapshot: &StrictPath) {
        match self {
            Self::Standard { parts, .. } => {
                parts.push(format!("{} -> {}", dir.render(), snapshot.render()));
            }
            Self::Json { output } => {
                output.snapshot = Some(snapshot.clone());
            }
        }
    }

    pub fn add_validation(&mut self, name: &str, validation: &Validation) -> bool {
        let successful = validation.valid();

        match self {
            Self::Standard { parts, .. } => {
                parts.push(format!("{}:", name));
                for error in &validation.errors {
                    parts.push(TRANSLATOR.cli_game_line_item(error, false));
                }
                for warning in &validation.warnings {
                    parts.push(TRANSLATOR.cli_game_line_item(&format!("warning: {}", warning), true));
                }
                if validation.errors.is_empty() && validation.warnings.is_empty() {
                    parts.push(TRANSLATOR.cli_game_line_item("valid", true));
                }
                parts.push("".to_string());
            }
            Self::Json { output } => {
                output
                    .games
                    .insert(validation.file.render(), ApiGame::Validated(validation.clone()));
            }
        }

        if !successful {
            self.trip_some_entries_failed();
        }
        successful
    }

    pub fn add_removal(&mut self, name: &str, file: &StrictPath, safeguard: &Safeguard) {
        match self {
            Self::Standard { parts, .. } => {
                parts.push(format!("{}:", name));
                parts.push(TRANSLATOR.cli_game_line_item(&format!("removed: {}", file.render()), true));
                if let Some(backup) = &safeguard.backup {
                    parts.push(TRANSLATOR.cli_game_line_item(&format!("backup: {}", backup.render()), true));
                }
                if let Some(warning) = &safeguard.warning {
                    parts.push(TRANSLATOR.cli_game_line_item(&format!("warning: {}", warning), true));
                }
            }
            Self::Json { output } => {
                output.games.insert(
                    file.render(),
                    ApiGame::Removed(ApiRemoved {
                        name: name.to_string(),
                        backup: safeguard.backup.clone(),
                        warning: safeguard.warning.clone(),
                    }),
                );
            }
        }
    }

    pub fn add_found_folders(&mut self, folders: &[FoundFolder]) {
        match self {
            Self::Standard { parts, .. } => {
                for folder in folders {
                    parts.push(format!(
                        "{} [{}]: {}",
                        &folder.name,
                        TRANSLATOR.adjusted_size(folder.size),
                        folder.path.render()
                    ));
                }
            }
            Self::Json { output } => {
                output.folders = folders.to_vec();
            }
        }
    }

    pub fn add_closed_processes(&mut self, outcome: &CloseOutcome) {
        match self {
            Self::Standard { parts, .. } => {
                for process in &outcome.closed {
                    parts.push(TRANSLATOR.cli_game_line_item(&format!("{} ({})", &process.name, process.pid), true));
                }
                for process in &outcome.failed {
                    parts.push(TRANSLATOR.cli_game_line_item(&format!("{} ({})", &process.name, process.pid), false));
                }
                parts.push(format!("Closed processes: {}", outcome.count()));
            }
            Self::Json { output } => {
                output.processes = Some(outcome.clone());
            }
        }

        if !outcome.failed.is_empty() {
            self.trip_some_entries_failed();
        }
    }

    pub fn add_cache_cleanup(&mut self, outcome: &CleanOutcome) {
        match self {
            Self::Standard { parts, .. } => {
                for path in &outcome.cleaned {
                    parts.push(TRANSLATOR.cli_game_line_item(&path.render(), true));
                }
                for failure in &outcome.failed {
                    parts.push(TRANSLATOR.cli_game_line_item(
                        &format!("{}: {}", failure.path.render(), &failure.error),
                        false,
                    ));
                }
                parts.push(TRANSLATOR.cli_cache_summary(outcome.cleaned.len()));
            }
            Self::Json { output } => {
                output.cache = Some(outcome.clone());
            }
        }

        if !outcome.failed.is_empty() {
            self.trip_some_entries_failed();
        }
    }

    fn render(&self) -> String {
        match self {
            Self::Standard { parts, errors } => {
                let mut out = parts.join("\n");
                for message in errors.messages() {
                    out += &format!("\n\n{message}");
                }
                out
            }
            Self::Json { output } => serde_json::to_string_pretty(&output).unwrap_or_else(|e| {
                log::error!("Unable to serialize output: {e:?}");
                "{}".to_string()
            }),
        }
    }

    #[allow(unused)]
    pub fn json_output(self) -> Option<ApiOutput> {
        match self {
            Self::Standard { .. } => None,
            Self::Json { output } => Some(output),
        }
    }

    pub fn print_failure(&self) {
        // The standard reporter doesn't need to print on failure because
        // that's handled generically in main.
        if let Self::Json { .. } = self {
            self.print();
        }
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }
}
