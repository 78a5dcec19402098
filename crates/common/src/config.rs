//! Application configuration.

use serde::Deserialize;
use std::path::Path;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Blog presentation settings.
    #[serde(default)]
    pub blog: BlogConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to bind to.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Public URL of this instance.
    pub url: String,
}

/// Database connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// `PostgreSQL` connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

/// Listing and presentation settings.
#[derive(Debug, Clone, Deserialize)]
pub struct BlogConfig {
    /// Posts per page on list views.
    #[serde(default = "default_page_size")]
    pub page_size: u64,
    /// Number of featured posts shown.
    #[serde(default = "default_featured_posts")]
    pub featured_posts: u64,
    /// Number of related posts on a detail view.
    #[serde(default = "default_related_posts")]
    pub related_posts: u64,
    /// Reading speed used for reading-time estimates.
    #[serde(default = "default_words_per_minute")]
    pub words_per_minute: u32,
    /// Number of entries in the analytics "top posts" list.
    #[serde(default = "default_top_posts")]
    pub top_posts: u64,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            featured_posts: default_featured_posts(),
            related_posts: default_related_posts(),
            words_per_minute: default_words_per_minute(),
            top_posts: default_top_posts(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

const fn default_port() -> u16 {
    3000
}

const fn default_max_connections() -> u32 {
    20
}

const fn default_min_connections() -> u32 {
    2
}

const fn default_page_size() -> u64 {
    10
}

const fn default_featured_posts() -> u64 {
    3
}

const fn default_related_posts() -> u64 {
    3
}

const fn default_words_per_minute() -> u32 {
    200
}

const fn default_top_posts() -> u64 {
    5
}

impl Config {
    /// Load configuration from files and environment variables.
    ///
    /// Configuration is loaded in the following order:
    /// 1. `config/default.toml`
    /// 2. `config/{environment}.toml` (based on `QUILL_ENV`)
    /// 3. Environment variables with `QUILL__` prefix
    pub fn load() -> Result<Self, config::ConfigError> {
        let env = std::env::var("QUILL_ENV").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("QUILL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Load configuration from a specific file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(
                config::Environment::with_prefix("QUILL")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blog_defaults() {
        let blog = BlogConfig::default();
        assert_eq!(blog.page_size, 10);
        assert_eq!(blog.featured_posts, 3);
        assert_eq!(blog.related_posts, 3);
        assert_eq!(blog.words_per_minute, 200);
    }

    #[test]
    fn test_deserialize_minimal_config() {
        let config: Config = config::Config::builder()
            .set_override("server.url", "https://blog.example.com")
            .and_then(|b| b.set_override("database.url", "postgres://localhost/quill"))
            .and_then(|b| b.build())
            .and_then(|c| c.try_deserialize())
            .unwrap_or_else(|e| panic!("config should deserialize: {e}"));

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.database.max_connections, 20);
        assert_eq!(config.blog.page_size, 10);
    }
}
