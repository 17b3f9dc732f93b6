//! Claves y decodificación tolerante de las colecciones guardadas en el almacén clave→cadena.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::application::ports::storage_ports::KeyValueStore;
use crate::common::errors::Result;
use crate::domain::entities::item::OwnerId;

pub fn wardrobe_key(owner: &OwnerId) -> String {
    format!("wardrobe_{}", owner)
}

pub fn trash_key(owner: &OwnerId) -> String {
    format!("trashedItems_{}", owner)
}

pub fn purge_pending_key(owner: &OwnerId) -> String {
    format!("purgePending_{}", owner)
}

pub fn outfits_key(owner: &OwnerId) -> String {
    format!("savedOutfits_{}", owner)
}

/// Decodifica una lista JSON entrada a entrada, descartando las que no se pueden leer
pub fn decode_entries<T: DeserializeOwned>(values: Vec<Value>, what: &str) -> Vec<T> {
    let total = values.len();
    let decoded: Vec<T> = values
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<T>(value) {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!("Skipping unreadable {} entry: {}", what, e);
                None
            }
        })
        .collect();

    if decoded.len() != total {
        tracing::warn!("Kept {} of {} {} entries", decoded.len(), total, what);
    }
    decoded
}

/// Lee el valor bruto de `key` como JSON.
///
/// A value that is not valid JSON is copied to `<key>_corrupt` and treated as absent.
pub async fn read_json(kv: &dyn KeyValueStore, key: &str) -> Result<Option<Value>> {
    let raw = match kv.get(key).await? {
        Some(raw) if !raw.trim().is_empty() => raw,
        _ => return Ok(None),
    };

    match serde_json::from_str::<Value>(&raw) {
        Ok(value) => Ok(Some(value)),
        Err(e) => {
            tracing::error!("Corrupted value under {}: {}", key, e);
            let backup_key = format!("{}_corrupt", key);
            match kv.set(&backup_key, raw).await {
                Ok(()) => tracing::warn!("Backed up corrupted {} to {}, starting empty", key, backup_key),
                Err(backup_err) => tracing::error!("Failed to back up corrupted {}: {}", key, backup_err),
            }
            Ok(None)
        }
    }
}

/// Lee una lista guardada bajo `key`; cualquier otra forma se trata como vacía
pub async fn read_list<T: DeserializeOwned>(kv: &dyn KeyValueStore, key: &str, what: &str) -> Result<Vec<T>> {
    match read_json(kv, key).await? {
        Some(Value::Array(values)) => Ok(decode_entries(values, what)),
        Some(other) => {
            tracing::warn!("Expected a list under {}, found {}", key, json_kind(&other));
            Ok(Vec::new())
        }
        None => Ok(Vec::new()),
    }
}

pub fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
