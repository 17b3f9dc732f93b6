// Exportar los módulos principales del proyecto
pub mod common;
pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod interfaces;

// Re-exportaciones públicas comunes
pub use application::services::lifecycle_service::LifecycleManager;
pub use application::services::style_selector::StyleSelector;
pub use application::services::upload_pipeline::UploadPipeline;
pub use common::config::AppConfig;
pub use common::di::AppState;
pub use infrastructure::repositories::{LocalItemStore, RemoteItemStore, WardrobeStoreFactory};
pub use infrastructure::services::json_kv_store::JsonFileKvStore;
pub use interfaces::create_api_routes;
