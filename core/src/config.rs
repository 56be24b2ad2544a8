use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// Origins the public front-ends are served from.
const DEFAULT_ORIGINS: &[&str] = &[
    "http://localhost:5173",
    "https://fundrecoverpro.vercel.app",
    "https://www.coinmarketrecovery.net",
    "https://coinmarketrecovery.net",
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeskConfig {
    pub host: String,
    pub port: u16,
    /// SQLite path, or `:memory:`.
    pub database_path: String,
    pub allowed_origins: Vec<String>,
    pub body_limit_bytes: usize,
    pub default_page_size: u64,
}

impl Default for DeskConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            database_path: "recovery-desk.db".to_string(),
            allowed_origins: DEFAULT_ORIGINS.iter().map(|s| s.to_string()).collect(),
            body_limit_bytes: DEFAULT_BODY_LIMIT,
            default_page_size: 10,
        }
    }
}

impl DeskConfig {
    /// Load from an optional JSON file; missing keys keep their defaults.
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: DeskConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `PORT`, `DESK_DB` and `CLIENT_URL` from `lookup`.
    /// `CLIENT_URL` is appended to the allowed origins, not substituted.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(port) = lookup("PORT") {
            self.port = port
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("PORT={port:?} is not a port number: {e}"))?;
        }
        if let Some(db) = lookup("DESK_DB").filter(|s| !s.trim().is_empty()) {
            self.database_path = db;
        }
        if let Some(origin) = lookup("CLIENT_URL").filter(|s| !s.trim().is_empty()) {
            if !self.allowed_origins.contains(&origin) {
                self.allowed_origins.push(origin);
            }
        }
        self.validate()
    }

    /// Load the file (if any) and then layer the process environment on top.
    pub fn from_env(path: Option<&str>) -> anyhow::Result<Self> {
        let mut config = Self::load(path)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.default_page_size == 0 {
            anyhow::bail!("default_page_size must be at least 1");
        }
        if self.body_limit_bytes == 0 {
            anyhow::bail!("body_limit_bytes must be at least 1");
        }
        if self.database_path.trim().is_empty() {
            anyhow::bail!("database_path must not be empty");
        }
        Ok(())
    }

    /// Config for tests: in-memory store, no origin restrictions.
    pub fn default_test() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database_path: ":memory:".to_string(),
            allowed_origins: Vec::new(),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_port_db_and_appends_origin() {
        let env: HashMap<&str, &str> = [
            ("PORT", "8080"),
            ("DESK_DB", "/tmp/desk.db"),
            ("CLIENT_URL", "https://admin.example.org"),
        ]
        .into_iter()
        .collect();

        let mut config = DeskConfig::default();
        config
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.port, 8080);
        assert_eq!(config.database_path, "/tmp/desk.db");
        assert_eq!(
            config.allowed_origins.last().map(String::as_str),
            Some("https://admin.example.org")
        );
        assert_eq!(config.allowed_origins.len(), DEFAULT_ORIGINS.len() + 1);
    }

    #[test]
    fn bad_port_is_rejected() {
        let mut config = DeskConfig::default();
        let err = config
            .apply_env(|k| (k == "PORT").then(|| "eighty".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let config: DeskConfig = serde_json::from_str(r#"{ "port": 7000 }"#).unwrap();
        assert_eq!(config.port, 7000);
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.body_limit_bytes, DEFAULT_BODY_LIMIT);
    }
}
