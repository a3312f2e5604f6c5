//! Configuration loading for mizan.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use directories::{BaseDirs, ProjectDirs};
use serde::Deserialize;

use crate::search::CacheSettings;
use crate::search::dispatch::{Category, DEFAULT_QUIET_WINDOW, default_categories};
use crate::search::fuzzy::MatchOptions;
use crate::search::normalize::DEFAULT_NORMALIZE_CAPACITY;
use crate::search::rank::{DEFAULT_LIMIT, DEFAULT_MIN_SCORE, RankOptions, default_search_fields};

/// Top-level configuration loaded from config.toml.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default = "default_category_configs")]
    pub categories: Vec<CategoryConfig>,
}

/// Where collection files live.
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub dir: String,
}

/// Matching, ranking and caching parameters shared by all categories.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub threshold: f64,
    pub exact_match_bonus: f64,
    pub prefix_match_bonus: f64,
    pub max_distance: usize,
    pub min_score: f64,
    pub debounce_ms: u64,
    pub cache_capacity: usize,
    pub cache_ttl_secs: u64,
}

/// One searchable category and the file its collection is read from.
#[derive(Debug, Clone, Deserialize)]
pub struct CategoryConfig {
    pub name: String,
    #[serde(default = "default_search_fields")]
    pub search_fields: Vec<String>,
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Collection file, relative to the data directory. Defaults to
    /// `<name>.json`.
    #[serde(default)]
    pub file: Option<String>,
}

fn default_data_dir() -> String {
    ProjectDirs::from("", "", "mizan").map_or_else(
        || "./data".to_string(),
        |dirs| dirs.data_dir().display().to_string(),
    )
}

fn default_limit() -> usize {
    DEFAULT_LIMIT
}

fn default_category_configs() -> Vec<CategoryConfig> {
    default_categories()
        .into_iter()
        .map(|category| CategoryConfig {
            name: category.name,
            search_fields: category.options.search_fields,
            limit: category.options.limit,
            file: None,
        })
        .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            search: SearchConfig::default(),
            categories: default_category_configs(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        let matching = MatchOptions::default();
        let cache = CacheSettings::default();
        Self {
            threshold: matching.threshold,
            exact_match_bonus: matching.exact_match_bonus,
            prefix_match_bonus: matching.prefix_match_bonus,
            max_distance: matching.max_distance,
            min_score: DEFAULT_MIN_SCORE,
            debounce_ms: u64::try_from(DEFAULT_QUIET_WINDOW.as_millis()).unwrap_or(150),
            cache_capacity: cache.result_capacity,
            cache_ttl_secs: cache.result_ttl.as_secs(),
        }
    }
}

impl Config {
    /// Load config from ~/.config/mizan/config.toml, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load() -> anyhow::Result<Self> {
        if let Some(path) = Self::config_path()
            && path.exists()
        {
            return Self::load_from(&path);
        }

        Ok(Config::default())
    }

    /// Load config from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        Ok(config)
    }

    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "mizan").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// The data directory with `~` expanded.
    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.data.dir)
    }

    /// Path of the collection file for `category`.
    #[must_use]
    pub fn collection_path(&self, category: &CategoryConfig) -> PathBuf {
        let file = category
            .file
            .clone()
            .unwrap_or_else(|| format!("{}.json", category.name));
        self.data_dir().join(file)
    }

    #[must_use]
    pub fn match_options(&self) -> MatchOptions {
        MatchOptions {
            threshold: self.search.threshold,
            exact_match_bonus: self.search.exact_match_bonus,
            prefix_match_bonus: self.search.prefix_match_bonus,
            max_distance: self.search.max_distance,
        }
    }

    /// Categories with their ranking options resolved.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.categories
            .iter()
            .map(|category| Category {
                name: category.name.clone(),
                options: RankOptions {
                    search_fields: category.search_fields.clone(),
                    limit: category.limit,
                    offset: 0,
                    min_score: self.search.min_score,
                    matching: self.match_options(),
                },
            })
            .collect()
    }

    #[must_use]
    pub fn cache_settings(&self) -> CacheSettings {
        CacheSettings {
            result_capacity: self.search.cache_capacity,
            result_ttl: Duration::from_secs(self.search.cache_ttl_secs),
            normalize_capacity: DEFAULT_NORMALIZE_CAPACITY,
        }
    }

    #[must_use]
    pub fn quiet_window(&self) -> Duration {
        Duration::from_millis(self.search.debounce_ms)
    }
}

/// Expand ~ to the user's home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(base_dirs) = BaseDirs::new()
    {
        return base_dirs.home_dir().join(rest);
    }
    PathBuf::from(path)
}
