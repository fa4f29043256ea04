pub mod backup;
pub mod cache;
pub mod library;
pub mod locator;
pub mod manifest;
pub mod relocate;
pub mod repair;

pub use self::{
    backup::{back_up_directory, back_up_manifest},
    cache::{clean_cache, CleanOutcome},
    library::{find_game_folders, scan_manifests, FoundFolder, GameRecord, ScanOutcome},
    locator::find_manifest_dir,
    relocate::{relocate, RelocateOptions, RelocationReport, RelocationStatus},
    repair::{remove_manifest, repair_game, validate_manifest, RepairOutcome, Validation},
};
