use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Configuración del servidor HTTP local
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8086,
        }
    }
}

/// Configuración del almacenamiento duradero clave→valor
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directorio raíz del almacenamiento local
    pub storage_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("./storage"),
        }
    }
}

impl StorageConfig {
    /// Fichero JSON que respalda el almacén clave→valor
    pub fn store_file(&self) -> PathBuf {
        self.storage_path.join("wardrobe_store.json")
    }
}

/// Configuración de la API remota de prendas
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// URL base, sin barra final (ej: http://localhost:5001/api)
    pub api_base_url: String,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5001/api".to_string(),
        }
    }
}

/// Configuración del servicio externo de transformación de estilo
#[derive(Debug, Clone)]
pub struct TransformConfig {
    pub service_url: String,
    /// Endpoint de salud del servicio (GET, 2xx = disponible)
    pub health_url: String,
    pub enabled: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            service_url: "http://localhost:5001/api/cartoonize".to_string(),
            health_url: "http://localhost:5001/api/health".to_string(),
            enabled: true,
        }
    }
}

/// Configuración de timeouts para diferentes operaciones
#[derive(Debug, Clone)]
pub struct TimeoutConfig {
    /// Timeout para llamadas a la API remota (ms)
    pub network_operation_ms: u64,
    /// Timeout para la transformación de estilo (ms)
    pub transform_operation_ms: u64,
    /// Timeout para descargar una imagen remota (ms)
    pub image_fetch_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            network_operation_ms: 15_000, // 15 segundos
            transform_operation_ms: 30_000, // 30 segundos
            image_fetch_ms: 10_000,       // 10 segundos
        }
    }
}

impl TimeoutConfig {
    /// Obtiene un Duration para operaciones de red
    pub fn network_timeout(&self) -> Duration {
        Duration::from_millis(self.network_operation_ms)
    }

    /// Obtiene un Duration para la transformación de estilo
    pub fn transform_timeout(&self) -> Duration {
        Duration::from_millis(self.transform_operation_ms)
    }

    /// Obtiene un Duration para descargas de imágenes
    pub fn image_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.image_fetch_ms)
    }
}

/// Sesión con la que arranca el proceso, si se configuró una
#[derive(Debug, Clone, Default)]
pub struct InitialSessionConfig {
    pub owner_id: Option<String>,
    pub token: Option<String>,
}

/// Configuración global de la aplicación
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub transform: TransformConfig,
    pub timeouts: TimeoutConfig,
    pub session: InitialSessionConfig,
}

impl AppConfig {
    /// Carga la configuración desde variables de entorno, con valores por defecto
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("OXIWARDROBE_HOST") {
            config.server.host = host;
        }
        if let Some(port) = parse_var::<u16>("OXIWARDROBE_PORT") {
            config.server.port = port;
        }
        if let Ok(path) = env::var("OXIWARDROBE_STORAGE_PATH") {
            config.storage.storage_path = PathBuf::from(path);
        }
        if let Ok(url) = env::var("OXIWARDROBE_API_URL") {
            config.remote.api_base_url = url.trim_end_matches('/').to_string();
        }
        if let Ok(url) = env::var("OXIWARDROBE_TRANSFORM_URL") {
            config.transform.service_url = url;
        }
        if let Ok(url) = env::var("OXIWARDROBE_TRANSFORM_HEALTH_URL") {
            config.transform.health_url = url;
        }
        if let Some(enabled) = parse_var::<bool>("OXIWARDROBE_TRANSFORM_ENABLED") {
            config.transform.enabled = enabled;
        }
        if let Some(ms) = parse_var::<u64>("OXIWARDROBE_NETWORK_TIMEOUT_MS") {
            config.timeouts.network_operation_ms = ms;
        }
        if let Some(ms) = parse_var::<u64>("OXIWARDROBE_TRANSFORM_TIMEOUT_MS") {
            config.timeouts.transform_operation_ms = ms;
        }
        if let Some(ms) = parse_var::<u64>("OXIWARDROBE_IMAGE_FETCH_TIMEOUT_MS") {
            config.timeouts.image_fetch_ms = ms;
        }

        config.session.owner_id = env::var("OXIWARDROBE_OWNER_ID").ok().filter(|v| !v.is_empty());
        config.session.token = env::var("OXIWARDROBE_TOKEN").ok().filter(|v| !v.is_empty());

        config
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    match env::var(name) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid value for {}: {}", name, raw);
                None
            }
        },
        Err(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8086);
        assert_eq!(config.timeouts.transform_timeout(), Duration::from_secs(30));
        assert!(config.storage.store_file().ends_with("wardrobe_store.json"));
        assert!(config.transform.enabled);
    }
}
