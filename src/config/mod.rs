use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::containment::DEFAULT_MITRE_LIMIT;
use crate::domain::HazardPolygon;

/// Tolerance of the containment figure, in coordinate units
pub const DEFAULT_EPSILON: f64 = 0.2;

fn default_epsilon() -> f64 {
    DEFAULT_EPSILON
}
fn default_mitre_limit() -> f64 {
    DEFAULT_MITRE_LIMIT
}
fn default_retries() -> u32 {
    0
}
fn default_verbose() -> bool {
    false
}

/// Settings read from `drc-contain.toml`.
///
/// ```toml
/// epsilon = 0.2
/// mitre_limit = 2.0
/// retries = 3
///
/// [hazard]
/// outer = [[0, 0], [7, 0], [7, 7], [0, 7]]
/// holes = [[[2, 2], [2, 4], [4, 4], [4, 2]]]
/// ```
#[derive(Debug, Deserialize, PartialEq)]
pub struct FileConfig {
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default = "default_mitre_limit")]
    pub mitre_limit: f64,
    /// How often a degenerate result may be retried with half the epsilon
    #[serde(default = "default_retries")]
    pub retries: u32,
    #[serde(default = "default_verbose")]
    pub verbose: bool,
    /// Hazard polygon to simplify instead of the demo polygon
    #[serde(default)]
    pub hazard: Option<HazardPolygon>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
            mitre_limit: default_mitre_limit(),
            retries: default_retries(),
            verbose: default_verbose(),
            hazard: None,
        }
    }
}

impl FileConfig {
    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }

    pub fn from_path(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {:?}", path))
    }

    /// First config file found in the usual places, if any parses
    pub fn load() -> Option<Self> {
        for path in get_config_paths() {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match Self::parse(&contents) {
                    Ok(config) => {
                        tracing::debug!(path = %path.display(), "loaded config");
                        return Some(config);
                    }
                    Err(e) => {
                        tracing::warn!(
                            path = %path.display(),
                            error = %e,
                            "failed to parse config file"
                        );
                    }
                }
            }
        }
        None
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("drc-contain.toml"));
    paths.push(PathBuf::from(".drc-contain.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("drc-contain").join("config.toml"));
        paths.push(config_dir.join("drc-contain.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".drc-contain.toml"));
    }

    paths
}

/// Values given on the command line; `None` falls back to the config file
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub epsilon: Option<f64>,
    pub mitre_limit: Option<f64>,
    pub retries: Option<u32>,
    pub verbose: bool,
}

/// Effective settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub epsilon: f64,
    pub mitre_limit: f64,
    pub retries: u32,
    pub verbose: bool,
    pub hazard: HazardPolygon,
    /// Whether `hazard` is the built-in demo polygon
    pub demo: bool,
}

impl Settings {
    pub fn resolve(overrides: &Overrides, file: Option<FileConfig>) -> Self {
        let file = file.unwrap_or_default();
        let demo = file.hazard.is_none();
        Self {
            epsilon: overrides.epsilon.unwrap_or(file.epsilon),
            mitre_limit: overrides.mitre_limit.unwrap_or(file.mitre_limit),
            retries: overrides.retries.unwrap_or(file.retries),
            verbose: overrides.verbose || file.verbose,
            hazard: file.hazard.unwrap_or_else(HazardPolygon::demo),
            demo,
        }
    }
}
