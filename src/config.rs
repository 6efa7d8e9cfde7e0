use std::env;

use crate::db::hosted::HostedConfig;

/// Which persistence backend to talk to.
#[derive(Clone)]
pub enum BackendConfig {
    Hosted(HostedConfig),
    Mongo { uri: String, database: String },
    Memory,
    /// No backend settings found. Redirects fail open, data calls answer 503.
    Unconfigured,
}

#[derive(Clone)]
pub struct Config {
    pub bind_address: String,
    pub port: u16,
    /// Public origin used to build `/r/` and `/i/` links.
    pub host: String,
    pub jwt_secret: Option<String>,
    pub cors_origins: Vec<String>,
    pub bcrypt_cost: u32,
    pub backend: BackendConfig,
}

// MongoDB URIs and the JWT secret carry credentials
impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendConfig::Hosted(hosted) => f.debug_tuple("Hosted").field(hosted).finish(),
            BackendConfig::Mongo { database, .. } => f
                .debug_struct("Mongo")
                .field("uri", &"[REDACTED]")
                .field("database", database)
                .finish(),
            BackendConfig::Memory => f.write_str("Memory"),
            BackendConfig::Unconfigured => f.write_str("Unconfigured"),
        }
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("bind_address", &self.bind_address)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("cors_origins", &self.cors_origins)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("backend", &self.backend)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup, so tests don't touch the process env.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match get("PORT") {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("invalid PORT {:?}: {}", port, e))?,
            None => 8080,
        };
        let bcrypt_cost = match get("BCRYPT_COST") {
            Some(cost) => cost
                .parse::<u32>()
                .map_err(|e| anyhow::anyhow!("invalid BCRYPT_COST {:?}: {}", cost, e))?,
            None => bcrypt::DEFAULT_COST,
        };

        let backend = match (get("BACKEND_URL"), get("BACKEND_API_KEY")) {
            (Some(url), Some(api_key)) => BackendConfig::Hosted(HostedConfig {
                url,
                api_key,
                bucket: get("STORAGE_BUCKET").unwrap_or_else(|| "uploads".to_string()),
            }),
            _ => match get("MONGODB_URI") {
                Some(uri) => BackendConfig::Mongo {
                    uri,
                    database: get("MONGODB_DATABASE").unwrap_or_else(|| "qrforge".to_string()),
                },
                None if get("BACKEND").as_deref() == Some("memory") => BackendConfig::Memory,
                None => BackendConfig::Unconfigured,
            },
        };

        Ok(Self {
            bind_address: get("BIND_ADDRESS").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            host: get("HOST")
                .unwrap_or_else(|| format!("http://localhost:{}", port))
                .trim_end_matches('/')
                .to_string(),
            jwt_secret: get("JWT_SECRET"),
            cors_origins: get("CORS_ORIGINS")
                .map(|origins| {
                    origins
                        .split(',')
                        .map(|o| o.trim().to_string())
                        .filter(|o| !o.is_empty())
                        .collect()
                })
                .unwrap_or_default(),
            bcrypt_cost,
            backend,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned()).unwrap()
    }

    #[test]
    fn debug_output_hides_credentials() {
        let config = config(&[
            ("JWT_SECRET", "super-secret-value"),
            ("MONGODB_URI", "mongodb://admin:hunter2@db:27017"),
        ]);
        let printed = format!("{:?}", config);
        assert!(!printed.contains("super-secret-value"));
        assert!(!printed.contains("hunter2"));
        assert!(printed.contains("[REDACTED]"));
        assert!(printed.contains("qrforge"));
    }

    #[test]
    fn defaults_without_backend() {
        let config = config(&[]);
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "http://localhost:8080");
        assert!(config.jwt_secret.is_none());
        assert!(matches!(config.backend, BackendConfig::Unconfigured));
    }

    #[test]
    fn hosted_needs_url_and_key() {
        let only_url = config(&[("BACKEND_URL", "https://x.example.co")]);
        assert!(matches!(only_url.backend, BackendConfig::Unconfigured));

        let hosted = config(&[
            ("BACKEND_URL", "https://x.example.co"),
            ("BACKEND_API_KEY", "anon"),
        ]);
        match hosted.backend {
            BackendConfig::Hosted(h) => assert_eq!(h.bucket, "uploads"),
            other => panic!("unexpected backend {:?}", other),
        }
    }

    #[test]
    fn blank_values_count_as_missing() {
        let config = config(&[("BACKEND_URL", " "), ("BACKEND_API_KEY", "anon"), ("JWT_SECRET", "")]);
        assert!(matches!(config.backend, BackendConfig::Unconfigured));
        assert!(config.jwt_secret.is_none());
    }

    #[test]
    fn mongo_and_memory() {
        let mongo = config(&[("MONGODB_URI", "mongodb://localhost:27017")]);
        assert!(matches!(mongo.backend, BackendConfig::Mongo { ref database, .. } if database == "qrforge"));
        let memory = config(&[("BACKEND", "memory"), ("HOST", "https://qr.example.com/")]);
        assert!(matches!(memory.backend, BackendConfig::Memory));
        assert_eq!(memory.host, "https://qr.example.com");
    }

    #[test]
    fn rejects_bad_port() {
        let result = Config::from_lookup(|key| (key == "PORT").then(|| "eighty".to_string()));
        assert!(result.is_err());
    }
}
