//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),
}

/// Main configuration struct matching the butterfly.yml schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub site: SiteConfig,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default = "default_extension")]
    pub content_extension: String,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub render: RenderConfig,

    // Internal: path to config file (for relative path resolution)
    #[serde(skip)]
    config_path: Option<PathBuf>,
}

fn default_extension() -> String {
    String::from("md")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default = "default_site_title")]
    pub title: String,

    #[serde(default)]
    pub description: String,
}

fn default_site_title() -> String {
    String::from("Project Butterfly")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_content_dir")]
    pub content: PathBuf,

    /// Image root; defaults to `<content>/img`
    #[serde(default)]
    pub images: Option<PathBuf>,
}

fn default_content_dir() -> PathBuf {
    PathBuf::from("content")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    String::from("127.0.0.1")
}

fn default_port() -> u16 {
    8000
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Number of rendered bodies kept in memory; 0 disables the cache
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    #[serde(default = "default_highlight_theme")]
    pub highlight_theme: String,
}

fn default_cache_capacity() -> usize {
    128
}

fn default_highlight_theme() -> String {
    String::from("base16-ocean.dark")
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = serde_yaml::from_str(&contents)?;

        // Store config file path for relative path resolution
        config.config_path = Some(path.to_path_buf());

        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults rooted at
    /// the file's directory.
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            return Self::from_file(path);
        }

        tracing::info!("No config at {:?}, using defaults", path);
        Ok(Config {
            config_path: Some(path.to_path_buf()),
            ..Config::default()
        })
    }

    /// Get the content directory, resolved relative to config file
    pub fn content_dir(&self) -> PathBuf {
        self.resolve_path(&self.paths.content)
    }

    /// Get the image root, resolved relative to config file
    pub fn images_dir(&self) -> PathBuf {
        match &self.paths.images {
            Some(images) => self.resolve_path(images),
            None => self.content_dir().join("img"),
        }
    }

    /// Resolve a path relative to the config file location
    fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }

        match self.config_path.as_deref().and_then(Path::parent) {
            Some(parent) => parent.join(path),
            None => path.to_path_buf(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            paths: PathsConfig::default(),
            content_extension: default_extension(),
            server: ServerConfig::default(),
            render: RenderConfig::default(),
            config_path: None,
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            title: default_site_title(),
            description: String::new(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            content: default_content_dir(),
            images: None,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            highlight_theme: default_highlight_theme(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_default_values() {
        let config = Config::default();

        assert_eq!(config.server.port, 8000);
        assert_eq!(config.content_extension, "md");
        assert_eq!(config.paths.content, PathBuf::from("content"));
        assert_eq!(config.render.cache_capacity, 128);
    }

    #[test]
    fn test_empty_yaml_fills_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.content_extension, "md");
        assert_eq!(config.site.title, "Project Butterfly");
        assert_eq!(config.render.highlight_theme, "base16-ocean.dark");
    }

    #[test]
    fn test_paths_resolve_relative_to_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("butterfly.yml");
        fs::write(
            &path,
            "paths:\n  content: posts\nserver:\n  port: 9000\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(config.content_dir(), dir.path().join("posts"));
        assert_eq!(config.images_dir(), dir.path().join("posts").join("img"));
        assert_eq!(config.server.port, 9000);
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::from_file_or_default(dir.path().join("absent.yml")).unwrap();
        assert_eq!(config.content_dir(), dir.path().join("content"));
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("butterfly.yml");
        fs::write(&path, "server: [unclosed").unwrap();
        assert!(matches!(
            Config::from_file(&path),
            Err(ConfigError::ParseError(_))
        ));
    }
}
