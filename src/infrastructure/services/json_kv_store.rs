use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::sync::{Mutex, RwLock};

use crate::application::ports::storage_ports::KeyValueStore;
use crate::common::errors::{ErrorContext, Result};

/// Contenido persistido del almacén
#[derive(Serialize, Deserialize, Debug, Default)]
struct KvSnapshot {
    entries: BTreeMap<String, String>,
    version: u32, // Versión para detectar cambios
}

/// Almacén clave→cadena respaldado por un único fichero JSON.
///
/// The whole map lives in memory; every write persists it with a temp file plus rename, so a
/// crash mid-write leaves the previous version intact.
pub struct JsonFileKvStore {
    store_path: PathBuf,
    snapshot: RwLock<KvSnapshot>,
    save_mutex: Mutex<()>, // Para evitar múltiples guardados concurrentes
}

impl JsonFileKvStore {
    /// Abre (o crea) el almacén en `store_path`
    pub async fn open(store_path: PathBuf) -> Result<Self> {
        let snapshot = Self::load_snapshot(&store_path).await?;
        Ok(Self {
            store_path,
            snapshot: RwLock::new(snapshot),
            save_mutex: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.store_path
    }

    /// Carga el contenido desde disco; un fichero corrupto se respalda y se empieza de cero
    async fn load_snapshot(store_path: &Path) -> Result<KvSnapshot> {
        if !fs::try_exists(store_path).await.unwrap_or(false) {
            tracing::info!("No existing store found at {}, starting empty", store_path.display());
            if let Some(parent) = store_path.parent() {
                fs::create_dir_all(parent)
                    .await
                    .context("Storage", || format!("Failed to create storage directory {}", parent.display()))?;
            }
            return Ok(KvSnapshot {
                entries: BTreeMap::new(),
                version: 1,
            });
        }

        let content = fs::read_to_string(store_path)
            .await
            .context("Storage", || format!("Failed to read store from {}", store_path.display()))?;

        if content.trim().is_empty() {
            return Ok(KvSnapshot::default());
        }

        match serde_json::from_str::<KvSnapshot>(&content) {
            Ok(snapshot) => {
                tracing::info!(
                    "Loaded store with {} keys (version: {})",
                    snapshot.entries.len(),
                    snapshot.version
                );
                Ok(snapshot)
            }
            Err(e) => {
                tracing::error!("Error parsing store {}: {}", store_path.display(), e);
                let backup_path = store_path.with_extension("json.bak");
                if let Err(copy_err) = fs::copy(store_path, &backup_path).await {
                    tracing::error!("Failed to backup corrupted store file: {}", copy_err);
                } else {
                    tracing::warn!("Backed up corrupted store to {}", backup_path.display());
                }
                Ok(KvSnapshot {
                    entries: BTreeMap::new(),
                    version: 1,
                })
            }
        }
    }

    /// Guarda el contenido en disco de manera segura
    async fn persist(&self) -> Result<()> {
        let _lock = self.save_mutex.lock().await;

        let json = {
            let mut snapshot = self.snapshot.write().await;
            snapshot.version += 1;
            serde_json::to_string_pretty(&*snapshot)?
        };

        // Escribir a un archivo temporal primero para evitar corrupción
        let temp_path = self.store_path.with_extension("json.tmp");
        fs::write(&temp_path, &json)
            .await
            .context("Storage", || format!("Failed to write temporary store to {}", temp_path.display()))?;

        fs::rename(&temp_path, &self.store_path)
            .await
            .context("Storage", || format!("Failed to rename temporary store to {}", self.store_path.display()))?;

        tracing::debug!("Saved store to {}", self.store_path.display());
        Ok(())
    }

    /// Persiste; si falla, devuelve `key` a su valor anterior en memoria
    async fn persist_or_restore(&self, key: &str, previous: Option<String>) -> Result<()> {
        let result = self.persist().await;
        if let Err(e) = &result {
            tracing::error!("Could not persist {}, reverting it in memory: {}", key, e);
            let mut snapshot = self.snapshot.write().await;
            match previous {
                Some(value) => snapshot.entries.insert(key.to_string(), value),
                None => snapshot.entries.remove(key),
            };
        }
        result
    }
}

#[async_trait]
impl KeyValueStore for JsonFileKvStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.snapshot.read().await.entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let previous = {
            let mut snapshot = self.snapshot.write().await;
            if snapshot.entries.get(key) == Some(&value) {
                return Ok(());
            }
            snapshot.entries.insert(key.to_string(), value)
        };
        self.persist_or_restore(key, previous).await
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let previous = self.snapshot.write().await.entries.remove(key);
        if previous.is_none() {
            return Ok(());
        }
        self.persist_or_restore(key, previous).await
    }
}
