use anyhow::Context;

const DEFAULT_API_KEY: &str = "devkey";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub database_path: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; unset keys fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        Ok(Self {
            api_key: lookup("API_KEY").unwrap_or_else(|| DEFAULT_API_KEY.to_string()),
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "catalog.db".to_string()),
            host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
        })
    }

    pub fn uses_default_api_key(&self) -> bool {
        self.api_key == DEFAULT_API_KEY
    }
}
