//! TOML file configuration.
//!
//! Every field is optional; values present in the file override the
//! matching CLI arguments during resolution.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub data_dir: Option<String>,
    pub warehouse_db: Option<String>,
    pub chunk_size: Option<usize>,
    /// "skip" or "abort".
    pub on_row_error: Option<String>,
    pub files: Option<FilesConfig>,
}

/// Per-dataset file names, relative to `data_dir`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FilesConfig {
    pub title_basics: Option<String>,
    pub name_basics: Option<String>,
    pub title_principals: Option<String>,
    pub title_crew: Option<String>,
    pub title_episode: Option<String>,
    pub title_ratings: Option<String>,
    pub awards: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_full_config() {
        let toml_str = r#"
            data_dir = "/data/imdb"
            warehouse_db = "/data/warehouse.db"
            chunk_size = 5000
            on_row_error = "abort"

            [files]
            title_basics = "titles.tsv"
            awards = "oscars.tsv"
        "#;
        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.data_dir.as_deref(), Some("/data/imdb"));
        assert_eq!(config.chunk_size, Some(5000));
        assert_eq!(config.on_row_error.as_deref(), Some("abort"));
        let files = config.files.unwrap();
        assert_eq!(files.title_basics.as_deref(), Some("titles.tsv"));
        assert_eq!(files.awards.as_deref(), Some("oscars.tsv"));
        assert_eq!(files.name_basics, None);
    }

    #[test]
    fn empty_config_is_valid() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert!(config.data_dir.is_none());
        assert!(config.files.is_none());
    }

    #[test]
    fn unknown_field_is_rejected() {
        let result: Result<FileConfig, _> = toml::from_str("chunk_sizee = 3");
        assert!(result.is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chunk_size = 42").unwrap();
        let config = FileConfig::load(file.path()).unwrap();
        assert_eq!(config.chunk_size, Some(42));
    }
}
