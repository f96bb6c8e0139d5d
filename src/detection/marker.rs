//! On-disk markers left behind by a previous installation.

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Root directory the installer creates inside a project.
pub const MARKER_DIR: &str = "_bmad";

/// `<target>/_bmad`
pub fn marker_dir(target: &Path) -> PathBuf {
    target.join(MARKER_DIR)
}

/// `<target>/_bmad/bmm/config.yaml`, the primary version and config source.
pub fn config_file(target: &Path) -> PathBuf {
    marker_dir(target).join("bmm").join("config.yaml")
}

/// `<target>/_bmad/package.json`, the version source for older releases.
pub fn manifest_file(target: &Path) -> PathBuf {
    marker_dir(target).join("package.json")
}

/// Detect the installer version recorded in a project.
///
/// Checks `config.yaml` for a `bmad_version` key (anywhere) or a top-level
/// `version` key, then falls back to the `version` field of `package.json`.
///
/// Unreadable or unparseable files are treated as absent, so this never
/// fails; it returns `None` when no version can be found.
///
/// # Example
///
/// ```rust,no_run
/// use bmad_headless::detect_installed_version;
/// use std::path::Path;
///
/// match detect_installed_version(Path::new("/srv/project")) {
///     Some(version) => println!("BMAD {} is installed", version),
///     None => println!("No BMAD installation found"),
/// }
/// ```
pub fn detect_installed_version(target: &Path) -> Option<String> {
    if let Some(version) = fs::read_to_string(config_file(target))
        .ok()
        .and_then(|content| version_from_config(&content))
    {
        return Some(version);
    }

    fs::read_to_string(manifest_file(target))
        .ok()
        .and_then(|content| version_from_manifest(&content))
}

fn version_from_config(content: &str) -> Option<String> {
    let patterns = [r"bmad_version:[ \t]*(\S+)", r"(?m)^version:[ \t]*(\S+)"];

    patterns.iter().find_map(|pattern| {
        let re = Regex::new(pattern).expect("Invalid version key regex");
        re.captures(content)
            .and_then(|caps| caps.get(1))
            .map(|m| unquote(m.as_str()).to_string())
            .filter(|v| !v.is_empty())
    })
}

fn version_from_manifest(content: &str) -> Option<String> {
    let manifest: serde_json::Value = serde_json::from_str(content).ok()?;
    manifest
        .get("version")
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn unquote(value: &str) -> &str {
    value.trim_matches(|c| c == '"' || c == '\'')
}

/// Best-effort key/value view of an existing `config.yaml`.
///
/// Nested mappings are flattened into dotted keys and sequences into comma
/// separated values. The snapshot is carried into the result for the caller
/// to inspect; nothing else reads it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ConfigSnapshot(BTreeMap<String, String>);

impl ConfigSnapshot {
    /// Parse a YAML document, returning `None` if it is not a mapping.
    pub fn parse(content: &str) -> Option<Self> {
        let doc: serde_yaml::Value = serde_yaml::from_str(content).ok()?;
        let mapping = doc.as_mapping()?;

        let mut entries = BTreeMap::new();
        flatten_into(&mut entries, None, mapping);
        Some(Self(entries))
    }

    /// Look up a (dotted) key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Number of flattened keys.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the document had no scalar values.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn flatten_into(
    entries: &mut BTreeMap<String, String>,
    prefix: Option<&str>,
    mapping: &serde_yaml::Mapping,
) {
    for (key, value) in mapping {
        let Some(key) = scalar_to_string(key) else {
            continue;
        };
        let key = match prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key,
        };

        match value {
            serde_yaml::Value::Mapping(nested) => flatten_into(entries, Some(&key), nested),
            serde_yaml::Value::Sequence(items) => {
                let joined = items
                    .iter()
                    .filter_map(scalar_to_string)
                    .collect::<Vec<_>>()
                    .join(",");
                entries.insert(key, joined);
            }
            other => {
                if let Some(value) = scalar_to_string(other) {
                    entries.insert(key, value);
                }
            }
        }
    }
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::Null => Some(String::new()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::String(s) => Some(s.clone()),
        _ => None,
    }
}

/// A previous installation found in a target directory.
#[derive(Debug, Clone)]
pub struct ExistingInstallation {
    /// The marker directory (`<target>/_bmad`).
    pub root: PathBuf,
    /// Version recorded on disk, if any.
    pub version: Option<String>,
    /// Parsed `config.yaml`, if present and readable.
    pub config: Option<ConfigSnapshot>,
}

/// Look for a previous installation in `target`.
///
/// The marker directory alone decides whether one exists; the version and
/// config snapshot are filled in when they can be read.
pub fn find_existing_installation(target: &Path) -> Option<ExistingInstallation> {
    let root = marker_dir(target);
    if !root.is_dir() {
        return None;
    }

    let config = fs::read_to_string(config_file(target))
        .ok()
        .and_then(|content| ConfigSnapshot::parse(&content));

    Some(ExistingInstallation {
        version: detect_installed_version(target),
        root,
        config,
    })
}
