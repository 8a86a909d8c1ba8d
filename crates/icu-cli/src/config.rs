//! Pipeline configuration.
//!
//! Settings resolve in three layers: built-in defaults, then an optional
//! TOML file, then command-line flags. A later layer replaces a value from an
//! earlier one; the signal dictionary is replaced as a whole, never merged.
//!
//! ```toml
//! [pipeline]
//! input_dir = "data/raw"
//! output_file = "data/processed/icu_features.parquet"
//! window_hours = 24
//!
//! [signals]
//! 220045 = "HeartRate"
//! 220277 = "SpO2"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use icu_model::{
    DEFAULT_WINDOW_HOURS, LabelSpec, SignalDictionary, WindowLength, default_label_specs,
    parse_item_code,
};

pub const DEFAULT_INPUT_DIR: &str = "data/raw";
pub const DEFAULT_OUTPUT_FILE: &str = "data/processed/icu_features.parquet";

/// On-disk configuration file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    pub pipeline: PipelineSection,
    /// Instrument code (as text) to signal name.
    pub signals: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineSection {
    pub input_dir: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub window_hours: Option<f64>,
}

impl ConfigFile {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("parse config {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub input_dir: Option<PathBuf>,
    pub output_file: Option<PathBuf>,
    pub window_hours: Option<f64>,
    pub signals: Vec<(i64, String)>,
    pub dry_run: bool,
}

/// Fully resolved pipeline settings.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub input_dir: PathBuf,
    pub output_file: PathBuf,
    pub window: WindowLength,
    pub dictionary: SignalDictionary,
    pub labels: Vec<LabelSpec>,
    /// Run every stage except the final write.
    pub dry_run: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from(DEFAULT_INPUT_DIR),
            output_file: PathBuf::from(DEFAULT_OUTPUT_FILE),
            window: WindowLength::default(),
            dictionary: SignalDictionary::default(),
            labels: default_label_specs(),
            dry_run: false,
        }
    }
}

impl PipelineConfig {
    /// Layer an optional config file and the command-line overrides over the
    /// defaults.
    pub fn resolve(file: Option<&ConfigFile>, overrides: Overrides) -> Result<Self> {
        let mut config = Self::default();
        let mut window_hours = DEFAULT_WINDOW_HOURS;

        if let Some(file) = file {
            if let Some(dir) = &file.pipeline.input_dir {
                config.input_dir.clone_from(dir);
            }
            if let Some(output) = &file.pipeline.output_file {
                config.output_file.clone_from(output);
            }
            if let Some(hours) = file.pipeline.window_hours {
                window_hours = hours;
            }
            if !file.signals.is_empty() {
                config.dictionary = SignalDictionary::from_text_entries(
                    file.signals
                        .iter()
                        .map(|(code, name)| (code.as_str(), name.as_str())),
                )
                .context("invalid [signals] table")?;
            }
        }

        if let Some(dir) = overrides.input_dir {
            config.input_dir = dir;
        }
        if let Some(output) = overrides.output_file {
            config.output_file = output;
        }
        if let Some(hours) = overrides.window_hours {
            window_hours = hours;
        }
        if !overrides.signals.is_empty() {
            config.dictionary =
                SignalDictionary::new(overrides.signals).context("invalid --signal entries")?;
        }
        config.window = WindowLength::from_hours(window_hours).context("invalid window length")?;
        config.dry_run = overrides.dry_run;
        Ok(config)
    }
}

/// Parse a `CODE=NAME` signal argument.
pub fn parse_signal_arg(value: &str) -> std::result::Result<(i64, String), String> {
    let (code, name) = value
        .split_once('=')
        .ok_or_else(|| format!("expected CODE=NAME, got '{value}'"))?;
    let code = parse_item_code(code).map_err(|err| err.to_string())?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("signal {code} has an empty name"));
    }
    Ok((code, name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const FILE: &str = r#"
[pipeline]
input_dir = "/srv/mimic/raw"
window_hours = 6

[signals]
220045 = "HeartRate"
220210 = "RespRate"
"#;

    #[test]
    fn defaults_apply_without_file_or_flags() {
        let config = PipelineConfig::resolve(None, Overrides::default()).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("data/raw"));
        assert_eq!(
            config.output_file,
            PathBuf::from("data/processed/icu_features.parquet")
        );
        assert_eq!(config.window.hours(), 24.0);
        assert_eq!(config.dictionary.len(), 5);
        assert_eq!(config.labels.len(), 3);
    }

    #[test]
    fn file_values_override_defaults() {
        let file = ConfigFile::parse(FILE).unwrap();
        let config = PipelineConfig::resolve(Some(&file), Overrides::default()).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("/srv/mimic/raw"));
        assert_eq!(config.window.hours(), 6.0);
        assert_eq!(config.dictionary.name(220210), Some("RespRate"));
        assert!(!config.dictionary.contains(220277));
    }

    #[test]
    fn flags_override_file_values() {
        let file = ConfigFile::parse(FILE).unwrap();
        let overrides = Overrides {
            input_dir: Some(PathBuf::from("fixtures")),
            window_hours: Some(12.0),
            signals: vec![(220277, "SpO2".to_string())],
            dry_run: true,
            ..Overrides::default()
        };
        let config = PipelineConfig::resolve(Some(&file), overrides).unwrap();
        assert_eq!(config.input_dir, PathBuf::from("fixtures"));
        assert_eq!(config.window.hours(), 12.0);
        assert_eq!(config.dictionary.len(), 1);
        assert!(config.dry_run);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let overrides = Overrides {
            window_hours: Some(0.0),
            ..Overrides::default()
        };
        assert!(PipelineConfig::resolve(None, overrides).is_err());
        assert!(ConfigFile::parse("[pipeline]\nunknown = 1\n").is_err());

        let duplicate = ConfigFile::parse("[signals]\n1 = \"HR\"\n2 = \"HR\"\n").unwrap();
        assert!(PipelineConfig::resolve(Some(&duplicate), Overrides::default()).is_err());

        let bad_code = ConfigFile::parse("[signals]\nhr = \"HeartRate\"\n").unwrap();
        let err = PipelineConfig::resolve(Some(&bad_code), Overrides::default()).unwrap_err();
        assert!(format!("{err:#}").starts_with("invalid [signals] table"));
    }

    #[test]
    fn signal_arguments() {
        assert_eq!(
            parse_signal_arg("220045=HeartRate").unwrap(),
            (220045, "HeartRate".to_string())
        );
        assert!(parse_signal_arg("220045").is_err());
        assert!(parse_signal_arg("hr=HeartRate").is_err());
        assert!(parse_signal_arg("220045= ").is_err());
    }
}
