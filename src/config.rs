//! # Configuration
//!
//! Where definitions and calibration data live. The value is handed to the
//! [`LabwareLoader`](crate::LabwareLoader) explicitly; nothing here is global.

use std::env;
use std::path::PathBuf;

const DEFINITIONS_DIR_ENV: &str = "LABWARE_DEFINITIONS_PATH";
const USER_DEFINITIONS_DIR_ENV: &str = "LABWARE_USER_DEFINITIONS_DIR";
const CALIBRATION_DIR_ENV: &str = "LABWARE_CALIBRATION_DIR";

#[derive(Clone, Debug, PartialEq)]
pub struct LabwareConfig {
    /// Directories searched for `<namespace>/<load_name>/<version>.json`.
    pub definition_dirs: Vec<PathBuf>,

    /// Searched before `definition_dirs`; holds user-made definitions.
    pub user_definition_dir: Option<PathBuf>,

    /// Where per-labware calibration offsets are stored.
    pub calibration_dir: Option<PathBuf>,

    /// Namespaces tried in order when a load names none.
    pub default_namespaces: Vec<String>,
}

impl Default for LabwareConfig {
    fn default() -> Self {
        Self {
            definition_dirs: Vec::new(),
            user_definition_dir: None,
            calibration_dir: None,
            default_namespaces: vec!["opentrons".to_string(), "custom_beta".to_string()],
        }
    }
}

impl LabwareConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by any of the `LABWARE_*` environment variables.
    ///
    /// `LABWARE_DEFINITIONS_PATH` may list several directories, separated the
    /// way the platform separates `PATH` entries.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(paths) = env::var_os(DEFINITIONS_DIR_ENV) {
            config.definition_dirs = env::split_paths(&paths).collect();
        }
        if let Some(dir) = env::var_os(USER_DEFINITIONS_DIR_ENV) {
            config.user_definition_dir = Some(dir.into());
        }
        if let Some(dir) = env::var_os(CALIBRATION_DIR_ENV) {
            config.calibration_dir = Some(dir.into());
        }
        config
    }

    pub fn with_definition_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.definition_dirs.push(dir.into());
        self
    }

    pub fn with_user_definition_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.user_definition_dir = Some(dir.into());
        self
    }

    pub fn with_calibration_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.calibration_dir = Some(dir.into());
        self
    }

    pub fn with_default_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    /// User directory first, then the configured directories in order.
    pub fn search_dirs(&self) -> impl Iterator<Item = &PathBuf> {
        self.user_definition_dir.iter().chain(self.definition_dirs.iter())
    }
}
