//! Configuration file handling for spend-report.
//!
//! The configuration file is optional. It is looked up at `--config` (or `$SPEND_REPORT_CONFIG`)
//! and otherwise at `$CONFIG_DIR/spend-report/config.json`. It holds the default selection
//! controls, the header checking rules used when loading a spend sheet, and the sizes of the
//! report's chart series.

use crate::load::LoadOptions;
use crate::model::Column;
use crate::report::ReportOptions;
use crate::selection::{DEFAULT_AREA_TOP_N, DEFAULT_CATEGORY_TOP_N, TOP_N_MAX, TOP_N_MIN};
use crate::{utils, Result};
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const APP_NAME: &str = "spend-report";
const CONFIG_VERSION: u8 = 1;
const CONFIG_JSON: &str = "config.json";
const SUPPLIER_CHART_LEN: usize = 15;
const PIE_SLICES: usize = 10;
const TOP_K_SHARE: usize = 5;

/// The `Config` object represents the configuration of the app. It is either loaded from a
/// `config.json` file or built from defaults when no file exists at the default location.
#[derive(Debug, Clone, Default)]
pub struct Config {
    config_path: Option<PathBuf>,
    config_file: ConfigFile,
}

impl Config {
    /// This will
    /// - load `path` if given, failing if it does not exist
    /// - otherwise load the file at [`Config::default_path`] if it exists
    /// - otherwise return the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(p) => {
                ensure!(p.is_file(), "The config file is missing '{}'", p.display());
                Some(p.to_path_buf())
            }
            None => Self::default_path().filter(|p| p.is_file()),
        };

        let config_file = match &config_path {
            Some(p) => ConfigFile::load(p)?,
            None => {
                debug!("No config file found, using defaults");
                ConfigFile::default()
            }
        };

        Ok(Self {
            config_path,
            config_file,
        })
    }

    /// Writes a config file populated with the default settings to `path`.
    pub fn create(path: &Path) -> Result<Self> {
        ensure!(
            !path.exists(),
            "'{}' already exists, remove it first or edit it manually",
            path.display()
        );
        let config_file = ConfigFile::default();
        config_file.save(path)?;
        Ok(Self {
            config_path: Some(path.to_path_buf()),
            config_file,
        })
    }

    /// `$CONFIG_DIR/spend-report/config.json`, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(APP_NAME).join(CONFIG_JSON))
    }

    /// The file this configuration was loaded from, `None` when running on defaults.
    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    pub fn category_top_n(&self) -> usize {
        self.config_file.category_top_n
    }

    pub fn area_top_n(&self) -> usize {
        self.config_file.area_top_n
    }

    pub fn strict_headers(&self) -> bool {
        self.config_file.strict_headers
    }

    pub fn header_aliases(&self) -> &BTreeMap<String, Vec<String>> {
        &self.config_file.header_aliases
    }

    pub fn load_options(&self) -> LoadOptions {
        LoadOptions::new(self.strict_headers(), self.header_aliases().clone())
    }

    pub fn report_options(&self) -> ReportOptions {
        ReportOptions::new(
            self.config_file.supplier_chart_len,
            self.config_file.pie_slices,
            self.config_file.top_k_share,
        )
    }
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "spend-report",
///   "config_version": 1,
///   "category_top_n": 10,
///   "area_top_n": 8,
///   "strict_headers": true,
///   "header_aliases": { "value": ["Amount", "Net Amount"] },
///   "supplier_chart_len": 15,
///   "pie_slices": 10,
///   "top_k_share": 5
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "spend-report"
    app_name: String,

    /// Configuration file version
    #[serde(default = "default_config_version")]
    config_version: u8,

    /// Default number of categories picked by the top-N selection mode
    #[serde(default = "default_category_top_n")]
    category_top_n: usize,

    /// Default number of areas picked by the top-N selection mode
    #[serde(default = "default_area_top_n")]
    area_top_n: usize,

    /// Require the source headers to name the expected columns
    #[serde(default)]
    strict_headers: bool,

    /// Extra accepted header names, keyed by column (`category`, `area`, `supplier`, `value`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    header_aliases: BTreeMap<String, Vec<String>>,

    /// Number of suppliers in the supplier bar chart
    #[serde(default = "default_supplier_chart_len")]
    supplier_chart_len: usize,

    /// Number of named slices in the supplier pie chart, the rest are grouped as "Others"
    #[serde(default = "default_pie_slices")]
    pie_slices: usize,

    /// Number of largest suppliers whose combined share is reported
    #[serde(default = "default_top_k_share")]
    top_k_share: usize,
}

fn default_config_version() -> u8 {
    CONFIG_VERSION
}

fn default_category_top_n() -> usize {
    DEFAULT_CATEGORY_TOP_N
}

fn default_area_top_n() -> usize {
    DEFAULT_AREA_TOP_N
}

fn default_supplier_chart_len() -> usize {
    SUPPLIER_CHART_LEN
}

fn default_pie_slices() -> usize {
    PIE_SLICES
}

fn default_top_k_share() -> usize {
    TOP_K_SHARE
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            category_top_n: DEFAULT_CATEGORY_TOP_N,
            area_top_n: DEFAULT_AREA_TOP_N,
            strict_headers: false,
            header_aliases: BTreeMap::new(),
            supplier_chart_len: SUPPLIER_CHART_LEN,
            pie_slices: PIE_SLICES,
            top_k_share: TOP_K_SHARE,
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or holds out-of-range settings
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config: ConfigFile = utils::deserialize(path)?;

        ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        config
            .validate()
            .with_context(|| format!("Invalid config file at {}", path.display()))?;

        debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data).context("Unable to write config file")
    }

    fn validate(&self) -> Result<()> {
        for (name, n) in [
            ("category_top_n", self.category_top_n),
            ("area_top_n", self.area_top_n),
        ] {
            ensure!(
                (TOP_N_MIN..=TOP_N_MAX).contains(&n),
                "{name} must be between {TOP_N_MIN} and {TOP_N_MAX}, got {n}"
            );
        }
        ensure!(self.supplier_chart_len > 0, "supplier_chart_len must be positive");
        ensure!(self.top_k_share > 0, "top_k_share must be positive");
        for key in self.header_aliases.keys() {
            ensure!(
                key.parse::<Column>().is_ok(),
                "header_aliases key '{key}' is not a column, expected one of: {}",
                Column::ALL.map(|c| c.to_string()).join(", ")
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_file_default() {
        let config = ConfigFile::default();
        assert_eq!(config.category_top_n, 10);
        assert_eq!(config.area_top_n, 8);
        assert!(!config.strict_headers);
        config.validate().unwrap();
    }

    #[test]
    fn test_config_file_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.json");

        let mut original = ConfigFile::default();
        original.area_top_n = 12;
        original
            .header_aliases
            .insert("value".into(), vec!["Amount".into()]);

        original.save(&config_path).unwrap();
        let loaded = ConfigFile::load(&config_path).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_config_file_load_with_minimal_config() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        std::fs::write(&config_path, r#"{ "app_name": "spend-report", "pie_slices": 4 }"#).unwrap();

        let config = Config::load(Some(config_path.as_path())).unwrap();
        assert_eq!(config.config_path(), Some(config_path.as_path()));
        assert_eq!(config.category_top_n(), 10);
        assert_eq!(config.report_options().pie_slices(), 4);
    }

    #[test]
    fn test_config_file_load_invalid_app_name() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        std::fs::write(&config_path, r#"{ "app_name": "budget-sync" }"#).unwrap();

        let result = ConfigFile::load(&config_path);
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[test]
    fn test_config_file_load_unknown_alias_key() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        for key in ["Value", "amount"] {
            let json = format!(
                r#"{{ "app_name": "spend-report", "header_aliases": {{ "{key}": ["Net"] }} }}"#
            );
            std::fs::write(&config_path, json).unwrap();
            let err = ConfigFile::load(&config_path).unwrap_err();
            let expected = format!("header_aliases key '{key}' is not a column");
            assert!(format!("{err:#}").contains(&expected));
        }

        std::fs::write(
            &config_path,
            r#"{ "app_name": "spend-report", "header_aliases": { "value": ["Net"] } }"#,
        )
        .unwrap();
        ConfigFile::load(&config_path).unwrap();
    }

    #[test]
    fn test_config_file_load_out_of_range_top_n() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        std::fs::write(
            &config_path,
            r#"{ "app_name": "spend-report", "category_top_n": 30 }"#,
        )
        .unwrap();

        let err = ConfigFile::load(&config_path).unwrap_err();
        assert!(format!("{err:#}").contains("category_top_n must be between 5 and 15"));
    }

    #[test]
    fn test_explicit_missing_config_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope.json");
        assert!(Config::load(Some(missing.as_path())).is_err());
    }

    #[test]
    fn test_create_refuses_to_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.json");
        let created = Config::create(&path).unwrap();
        assert_eq!(created.area_top_n(), 8);
        assert!(Config::create(&path).is_err());
        Config::load(Some(path.as_path())).unwrap();
    }

    #[test]
    fn test_serialization_omits_empty_aliases() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("header_aliases"));
    }
}
