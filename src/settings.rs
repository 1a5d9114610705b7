use std::path::PathBuf;

use anyhow::Result;
use tokio::sync::RwLock;

use crate::models::{CollectorConfig, PersistedCollectorConfig};

pub struct SettingsManager {
    path: PathBuf,
    data: RwLock<PersistedCollectorConfig>,
}

impl SettingsManager {
    pub async fn new(path: PathBuf) -> Result<Self> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let initial = match tokio::fs::read(&path).await {
            Ok(bytes) if !bytes.is_empty() => {
                serde_json::from_slice::<PersistedCollectorConfig>(&bytes).unwrap_or_default()
            }
            _ => {
                let default = PersistedCollectorConfig::default();
                let json = serde_json::to_string_pretty(&default)?;
                tokio::fs::write(&path, json).await?;
                default
            }
        };

        Ok(Self {
            path,
            data: RwLock::new(initial),
        })
    }

    pub async fn get(&self) -> PersistedCollectorConfig {
        self.data.read().await.clone()
    }

    pub async fn update(&self, update: CollectorConfig) -> Result<PersistedCollectorConfig> {
        let mut config = self.data.write().await;

        if let Some(client_id) = update.client_id {
            config.client_id = client_id;
        }
        if let Some(url) = update.frame_api_url {
            config.frame_api_url = url;
        }
        if let Some(auto_start) = update.auto_start {
            config.auto_start = auto_start;
        }
        if let Some(capture) = update.capture_settings {
            config.capture_settings = capture;
        }

        self.save(&config).await?;
        Ok(config.clone())
    }

    async fn save(&self, config: &PersistedCollectorConfig) -> Result<()> {
        let json = serde_json::to_string_pretty(config)?;
        tokio::fs::write(&self.path, json).await?;
        Ok(())
    }
}
