use std::sync::Arc;

use reqwest::Client;
use tracing::{info, warn};

use crate::application::ports::inbound::WardrobeUseCase;
use crate::application::ports::session_ports::CredentialValidator;
use crate::application::ports::storage_ports::{ItemStoreFactory, KeyValueStore};
use crate::application::ports::transform_ports::{ImageFetchPort, StyleTransformPort};
use crate::application::ports::trash_ports::TrashUseCase;
use crate::application::services::lifecycle_service::LifecycleManager;
use crate::application::services::style_selector::StyleSelector;
use crate::application::services::upload_pipeline::UploadPipeline;
use crate::common::config::AppConfig;
use crate::common::errors::{ErrorContext, Result};
use crate::domain::entities::item::OwnerId;
use crate::domain::entities::session::Session;
use crate::domain::repositories::outfit_repository::OutfitRepository;
use crate::domain::repositories::trash_repository::TrashRepository;
use crate::infrastructure::repositories::{OutfitKvRepository, TrashKvRepository, WardrobeStoreFactory};
use crate::infrastructure::services::credential_validator::JwtCredentialValidator;
use crate::infrastructure::services::image_fetcher::HttpImageFetcher;
use crate::infrastructure::services::json_kv_store::JsonFileKvStore;
use crate::infrastructure::services::memory_kv_store::InMemoryKvStore;
use crate::infrastructure::services::style_transform_client::HttpStyleTransformClient;

/// Fábrica para los diferentes componentes de la aplicación
pub struct AppServiceFactory {
    config: AppConfig,
}

impl AppServiceFactory {
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Inicializa los servicios base: almacén duradero y clientes HTTP
    pub async fn create_core_services(&self) -> Result<CoreServices> {
        let store_file = self.config.storage.store_file();
        let kv: Arc<dyn KeyValueStore> = Arc::new(JsonFileKvStore::open(store_file.clone()).await?);
        info!("Durable store at {}", store_file.display());

        Ok(CoreServices {
            kv,
            api_client: self.http_client(self.config.timeouts.network_timeout())?,
            config: self.config.clone(),
        })
    }

    /// Servicios base sin disco, para ejecuciones efímeras y tests
    pub fn create_ephemeral_core_services(&self) -> Result<CoreServices> {
        Ok(CoreServices {
            kv: Arc::new(InMemoryKvStore::new()),
            api_client: self.http_client(self.config.timeouts.network_timeout())?,
            config: self.config.clone(),
        })
    }

    fn http_client(&self, timeout: std::time::Duration) -> Result<Client> {
        Client::builder()
            .timeout(timeout)
            .build()
            .context("HttpClient", || "Could not build HTTP client")
    }

    /// Inicializa los servicios de repositorio
    pub fn create_repository_services(&self, core: &CoreServices) -> RepositoryServices {
        RepositoryServices {
            item_stores: Arc::new(WardrobeStoreFactory::new(
                core.kv.clone(),
                core.api_client.clone(),
                self.config.remote.api_base_url.clone(),
            )),
            trash_repository: Arc::new(TrashKvRepository::new(core.kv.clone())),
            outfit_repository: Arc::new(OutfitKvRepository::new(core.kv.clone())),
        }
    }

    /// Inicializa los servicios de aplicación
    pub fn create_application_services(&self, repos: &RepositoryServices) -> Result<ApplicationServices> {
        let timeouts = &self.config.timeouts;

        let transformer: Option<Arc<dyn StyleTransformPort>> = if self.config.transform.enabled {
            Some(Arc::new(
                HttpStyleTransformClient::new(
                    self.http_client(timeouts.transform_timeout())?,
                    self.config.transform.service_url.clone(),
                    self.config.transform.health_url.clone(),
                )
                .with_health_timeout(timeouts.network_timeout()),
            ))
        } else {
            info!("Style transform service disabled, uploads keep their original image");
            None
        };

        let fetcher: Arc<dyn ImageFetchPort> =
            Arc::new(HttpImageFetcher::new(self.http_client(timeouts.image_fetch_timeout())?));
        let selector = Arc::new(StyleSelector::new());
        let pipeline = UploadPipeline::new(
            selector.clone(),
            transformer.clone(),
            fetcher,
            timeouts.transform_timeout(),
        );

        let validator: Arc<dyn CredentialValidator> = Arc::new(JwtCredentialValidator::default());
        let manager = Arc::new(LifecycleManager::new(
            repos.item_stores.clone(),
            repos.trash_repository.clone(),
            repos.outfit_repository.clone(),
            validator,
            pipeline,
        ));

        Ok(ApplicationServices {
            wardrobe_service: manager.clone(),
            trash_service: manager,
            style_selector: selector,
            transformer,
        })
    }

    /// Sesión inicial configurada por entorno, si está completa
    pub fn initial_session(&self) -> Option<Session> {
        let session = &self.config.session;
        match (&session.owner_id, &session.token) {
            (Some(owner_id), Some(token)) => Some(Session::new(OwnerId::new(owner_id.as_str()), token.clone())),
            (Some(owner_id), None) => {
                warn!("OXIWARDROBE_OWNER_ID={} set without a token, starting anonymous", owner_id);
                None
            }
            _ => None,
        }
    }
}

/// Contenedor para servicios base
#[derive(Clone)]
pub struct CoreServices {
    pub kv: Arc<dyn KeyValueStore>,
    pub api_client: Client,
    pub config: AppConfig,
}

/// Contenedor para servicios de repositorio
#[derive(Clone)]
pub struct RepositoryServices {
    pub item_stores: Arc<dyn ItemStoreFactory>,
    pub trash_repository: Arc<dyn TrashRepository>,
    pub outfit_repository: Arc<dyn OutfitRepository>,
}

/// Contenedor para servicios de aplicación
#[derive(Clone)]
pub struct ApplicationServices {
    pub wardrobe_service: Arc<dyn WardrobeUseCase>,
    pub trash_service: Arc<dyn TrashUseCase>,
    pub style_selector: Arc<StyleSelector>,
    pub transformer: Option<Arc<dyn StyleTransformPort>>,
}

/// Estado global de la aplicación para dependency injection
#[derive(Clone)]
pub struct AppState {
    pub core: CoreServices,
    pub repositories: RepositoryServices,
    pub applications: ApplicationServices,
}

impl AppState {
    pub fn new(core: CoreServices, repositories: RepositoryServices, applications: ApplicationServices) -> Self {
        Self {
            core,
            repositories,
            applications,
        }
    }

    /// Construye todo el grafo de servicios a partir de la configuración
    pub async fn from_config(config: AppConfig) -> Result<Self> {
        let factory = AppServiceFactory::new(config);
        let core = factory.create_core_services().await?;
        Self::assemble(&factory, core).await
    }

    /// Igual que `from_config` pero con almacén en memoria
    pub async fn ephemeral(config: AppConfig) -> Result<Self> {
        let factory = AppServiceFactory::new(config);
        let core = factory.create_ephemeral_core_services()?;
        Self::assemble(&factory, core).await
    }

    async fn assemble(factory: &AppServiceFactory, core: CoreServices) -> Result<Self> {
        let repositories = factory.create_repository_services(&core);
        let applications = factory.create_application_services(&repositories)?;

        let wardrobe = &applications.wardrobe_service;
        let outcome = wardrobe.switch_session(factory.initial_session()).await?;
        for notice in &outcome.notices {
            warn!("{}", notice.message);
        }
        info!(
            "Wardrobe ready for {} ({:?} store)",
            outcome.data.owner_id, outcome.data.mode
        );

        Ok(Self::new(core, repositories, applications))
    }
}
