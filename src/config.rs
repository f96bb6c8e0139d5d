//! Installer configuration.
//!
//! This module provides the [`InstallerConfig`] value object describing how a
//! single headless installation should answer the installer's prompts, and the
//! [`InstallOptions`] struct controlling orchestrator behaviour.

use serde::{Deserialize, Serialize};
use std::num::NonZeroU64;
use std::time::Duration;

/// Sentinel version meaning "whatever the registry currently serves".
pub const LATEST: &str = "latest";

const DEFAULT_TIMEOUT_SECS: NonZeroU64 = match NonZeroU64::new(120) {
    Some(secs) => secs,
    None => unreachable!(),
};

/// Configuration for one headless installation.
///
/// The config is built once per invocation and only read afterwards. Every
/// field has a default, so a partial document deserializes cleanly and
/// unknown keys are ignored.
///
/// # Example
///
/// ```rust
/// use bmad_headless::InstallerConfig;
///
/// // Defaults: latest version, "Developer", English, 120 second timeout
/// let config = InstallerConfig::default();
/// assert!(config.is_latest());
///
/// // Pin a version and override the user name
/// let config = InstallerConfig {
///     version: "6.0.0-Beta.5".to_string(),
///     user_name: "Roy".to_string(),
///     ..Default::default()
/// };
/// assert!(!config.is_latest());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InstallerConfig {
    /// Installer version to run, or [`LATEST`].
    pub version: String,

    /// Display name answered to the user-name prompt.
    pub user_name: String,

    /// Communication language answered to the language prompt.
    pub language: String,

    /// Output directory answered to the output-folder prompt.
    pub output_dir: String,

    /// Wall-clock budget for the whole interactive session, in seconds.
    ///
    /// Zero is rejected at construction time by the type.
    #[serde(rename = "timeout")]
    pub timeout_secs: NonZeroU64,

    /// Mirror the child's raw output through progress events.
    pub debug: bool,

    /// Module subset answered to the module selection prompt.
    ///
    /// `None` accepts the installer's defaults.
    pub modules: Option<Vec<String>>,

    /// Decline the optional agent installation step.
    pub skip_agents: bool,
}

impl Default for InstallerConfig {
    fn default() -> Self {
        Self {
            version: LATEST.to_string(),
            user_name: "Developer".to_string(),
            language: "English".to_string(),
            output_dir: "_bmad-output".to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            debug: false,
            modules: None,
            skip_agents: false,
        }
    }
}

impl InstallerConfig {
    /// The session timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.get())
    }

    /// Whether this config targets the unpinned `latest` installer.
    pub fn is_latest(&self) -> bool {
        is_latest(&self.version)
    }
}

/// Check a version string against the [`LATEST`] sentinel (case-insensitive).
pub fn is_latest(version: &str) -> bool {
    version.trim().eq_ignore_ascii_case(LATEST)
}

/// Options for controlling orchestrator behaviour.
///
/// Use [`Default::default()`] for the standard behaviour, which keeps a
/// snapshot of any existing installer configuration in the result.
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Carry the existing on-disk configuration into the result on reinstall.
    ///
    /// Default: `true`
    pub preserve_existing: bool,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            preserve_existing: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = InstallerConfig::default();
        assert_eq!(config.version, "latest");
        assert_eq!(config.user_name, "Developer");
        assert_eq!(config.language, "English");
        assert_eq!(config.output_dir, "_bmad-output");
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert!(!config.debug);
        assert!(config.modules.is_none());
        assert!(!config.skip_agents);
    }

    #[test]
    fn test_config_from_partial_document() {
        let config: InstallerConfig = serde_json::from_str(
            r#"{"version": "6.0.0-Beta.5", "user_name": "Roy", "output_dir": "_custom-output", "unknown": 1}"#,
        )
        .unwrap();
        assert_eq!(config.version, "6.0.0-Beta.5");
        assert_eq!(config.user_name, "Roy");
        assert_eq!(config.output_dir, "_custom-output");
        assert_eq!(config.language, "English");
    }

    #[test]
    fn test_config_rejects_zero_timeout() {
        let result = serde_json::from_str::<InstallerConfig>(r#"{"timeout": 0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_to_document() {
        let config = InstallerConfig {
            user_name: "Roy".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["user_name"], "Roy");
        assert_eq!(value["timeout"], 120);
        assert!(value.get("version").is_some());
    }

    #[test]
    fn test_is_latest_ignores_case() {
        assert!(is_latest("latest"));
        assert!(is_latest("LATEST"));
        assert!(is_latest(" Latest "));
        assert!(!is_latest("6.0.0"));
    }

    #[test]
    fn test_install_options_default() {
        let opts = InstallOptions::default();
        assert!(opts.preserve_existing);
    }
}
