pub mod hosted;
pub mod memory;
pub mod mongodb;
pub mod store;

use anyhow::Context;
use log::{info, warn};

use crate::config::{BackendConfig, Config};
use hosted::HostedStore;
use memory::MemoryStore;
use store::Backend;

/// Build the configured backend. `None` when nothing is configured.
pub async fn connect(config: &Config) -> anyhow::Result<Option<Backend>> {
    let backend = match &config.backend {
        BackendConfig::Hosted(hosted) => {
            info!("Using hosted backend at {}", hosted.url);
            Backend::new(
                "hosted",
                HostedStore::new(hosted.clone()).context("Failed to build hosted backend client")?,
            )
        }
        BackendConfig::Mongo { uri, database } => {
            let db = self::mongodb::get_database(uri, database)
                .await
                .context("Failed to connect to MongoDB")?;
            info!("Using MongoDB database {}", database);
            Backend::new("mongodb", self::mongodb::MongoStore::new(db, config.host.clone()))
        }
        BackendConfig::Memory => {
            warn!("Using in-memory backend, data is lost on restart");
            Backend::new("memory", MemoryStore::new(config.host.clone()))
        }
        BackendConfig::Unconfigured => {
            warn!("No backend configured; redirects fall back to the home page");
            return Ok(None);
        }
    };
    Ok(Some(backend))
}
