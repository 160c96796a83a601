//! `branchtale.toml` loading.

use branchtale_check::{
    MarkerError, MarkerValidator, Severity, Thresholds, Vocabulary, check_names,
};
use branchtale_story::GraphOptions;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_PATH: &str = "branchtale.toml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown check `{name}` in [checks]")]
    UnknownCheck { name: String },

    #[error("failed to read colour list {}: {source}", .path.display())]
    Colours {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Vocabulary(#[from] MarkerError),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub story: StorySection,
    pub vocabulary: VocabularySection,
    pub thresholds: ThresholdSection,
    pub checks: BTreeMap<String, Severity>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StorySection {
    pub root: PathBuf,
    pub output: PathBuf,
    pub revisit_default: bool,
}

impl Default for StorySection {
    fn default() -> Self {
        Self {
            root: PathBuf::from("story"),
            output: PathBuf::from("src/story.json"),
            revisit_default: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VocabularySection {
    /// One colour name per line; replaces the built-in CSS colour list.
    pub colours_path: Option<PathBuf>,
    pub colours: Vec<String>,
    /// Replaces the built-in effect list when non-empty.
    pub effects: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ThresholdSection {
    pub excessive: f64,
    pub excessive_colour: f64,
    pub min_excessive_lines: usize,
    pub path_deviation: f64,
}

impl Default for ThresholdSection {
    fn default() -> Self {
        let markers = Thresholds::default();
        Self {
            excessive: markers.excessive,
            excessive_colour: markers.excessive_colour,
            min_excessive_lines: markers.min_lines,
            path_deviation: branchtale_check::paths::DEFAULT_PATH_DEVIATION,
        }
    }
}

impl Config {
    /// Load `path`, or `branchtale.toml` when present, or the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let default = PathBuf::from(DEFAULT_CONFIG_PATH);
                if !default.exists() {
                    tracing::debug!("no {DEFAULT_CONFIG_PATH}; using defaults");
                    return Ok(Self::default());
                }
                default
            }
        };
        let text = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        Self::parse(&text, &path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let known = check_names();
        match self.checks.keys().find(|name| !known.contains(&name.as_str())) {
            Some(name) => Err(ConfigError::UnknownCheck { name: name.clone() }),
            None => Ok(()),
        }
    }

    pub fn graph_options(&self) -> GraphOptions {
        GraphOptions {
            revisit_default: self.story.revisit_default,
        }
    }

    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            excessive: self.thresholds.excessive,
            excessive_colour: self.thresholds.excessive_colour,
            min_lines: self.thresholds.min_excessive_lines,
        }
    }

    pub fn vocabulary(&self) -> Result<Vocabulary, ConfigError> {
        let mut vocabulary = Vocabulary::default();
        let section = &self.vocabulary;

        if let Some(path) = &section.colours_path {
            let text = fs::read_to_string(path).map_err(|source| ConfigError::Colours {
                path: path.clone(),
                source,
            })?;
            vocabulary.colours = text
                .lines()
                .map(|line| line.trim().to_lowercase())
                .filter(|line| !line.is_empty())
                .collect();
        }
        vocabulary
            .colours
            .extend(section.colours.iter().map(|colour| colour.trim().to_lowercase()));
        if !section.effects.is_empty() {
            vocabulary.effects = section.effects.clone();
        }
        Ok(vocabulary)
    }

    /// Compile the marker rules from the resolved vocabulary and thresholds.
    pub fn marker_validator(&self) -> Result<MarkerValidator, ConfigError> {
        let vocabulary = self.vocabulary()?;
        Ok(MarkerValidator::new(&vocabulary, self.thresholds())?)
    }
}
