//! Repair Epic Games Launcher manifests after installed games are moved.
//!
//! The launcher keeps one JSON `.item` manifest per installed game.
//! [`scan`] reads them, relocates them to a new base directory,
//! fills in missing fields, and backs them up before any change.

pub mod lang;
pub mod path;
pub mod prelude;
pub mod process;
pub mod report;
pub mod resource;
pub mod scan;
pub mod serialization;

#[cfg(test)]
mod testing;
