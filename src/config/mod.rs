mod file_config;

pub use file_config::{FileConfig, FilesConfig};

use crate::pipeline::RowErrorPolicy;
use anyhow::{bail, Result};
use clap::ValueEnum;
use std::path::PathBuf;

pub const DEFAULT_CHUNK_SIZE: usize = 5000;

/// CLI arguments that take part in config resolution. Mirrors the fields a
/// TOML config file can override.
#[derive(Debug, Clone, Default)]
pub struct CliConfig {
    pub data_dir: Option<PathBuf>,
    pub warehouse_db: Option<PathBuf>,
    pub chunk_size: usize,
    pub on_row_error: RowErrorPolicy,
}

/// Per-dataset source file names, resolved against the data directory.
#[derive(Debug, Clone)]
pub struct DatasetFiles {
    pub title_basics: String,
    pub name_basics: String,
    pub title_principals: String,
    pub title_crew: String,
    pub title_episode: String,
    pub title_ratings: String,
    pub awards: String,
}

impl Default for DatasetFiles {
    fn default() -> Self {
        Self {
            title_basics: "title.basics.tsv".to_string(),
            name_basics: "name.basics.tsv".to_string(),
            title_principals: "title.principals.tsv".to_string(),
            title_crew: "title.crew.tsv".to_string(),
            title_episode: "title.episode.tsv".to_string(),
            title_ratings: "title.ratings.tsv".to_string(),
            // Tab-delimited despite the extension
            awards: "full_data.csv".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub warehouse_db: PathBuf,
    pub chunk_size: usize,
    pub on_row_error: RowErrorPolicy,
    pub files: DatasetFiles,
}

impl AppConfig {
    /// Resolve configuration from CLI arguments and optional TOML file
    /// config. TOML values override CLI values where present.
    pub fn resolve(cli: &CliConfig, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .or_else(|| cli.data_dir.clone())
            .ok_or_else(|| {
                anyhow::anyhow!("data_dir must be specified via --data-dir or in config file")
            })?;
        if !data_dir.exists() {
            bail!("Data directory does not exist: {:?}", data_dir);
        }
        if !data_dir.is_dir() {
            bail!("data_dir is not a directory: {:?}", data_dir);
        }

        let warehouse_db = file
            .warehouse_db
            .map(PathBuf::from)
            .or_else(|| cli.warehouse_db.clone())
            .unwrap_or_else(|| data_dir.join("warehouse.db"));

        let chunk_size = file.chunk_size.unwrap_or(cli.chunk_size);
        if chunk_size == 0 {
            bail!("chunk_size must be at least 1");
        }

        let on_row_error = match file.on_row_error.as_deref() {
            Some(s) => RowErrorPolicy::from_str(s, true)
                .map_err(|_| anyhow::anyhow!("invalid on_row_error value: {}", s))?,
            None => cli.on_row_error,
        };

        let defaults = DatasetFiles::default();
        let overrides = file.files.unwrap_or_default();
        let files = DatasetFiles {
            title_basics: overrides.title_basics.unwrap_or(defaults.title_basics),
            name_basics: overrides.name_basics.unwrap_or(defaults.name_basics),
            title_principals: overrides
                .title_principals
                .unwrap_or(defaults.title_principals),
            title_crew: overrides.title_crew.unwrap_or(defaults.title_crew),
            title_episode: overrides.title_episode.unwrap_or(defaults.title_episode),
            title_ratings: overrides.title_ratings.unwrap_or(defaults.title_ratings),
            awards: overrides.awards.unwrap_or(defaults.awards),
        };

        Ok(Self {
            data_dir,
            warehouse_db,
            chunk_size,
            on_row_error,
            files,
        })
    }

    pub fn dataset_path(&self, file_name: &str) -> PathBuf {
        self.data_dir.join(file_name)
    }
}
