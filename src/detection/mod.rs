//! Installation detection submodule.
//!
//! This module inspects a target directory for an earlier installation and
//! orders installer versions. It provides:
//!
//! - `detect_installed_version`: version recorded in the on-disk markers
//! - `find_existing_installation`: marker directory plus config snapshot
//! - `compare_versions`: total order over version strings with `latest`

mod compare;
mod marker;

pub use compare::compare_versions;
pub use marker::{
    config_file, detect_installed_version, find_existing_installation, manifest_file, marker_dir,
    ConfigSnapshot, ExistingInstallation, MARKER_DIR,
};
