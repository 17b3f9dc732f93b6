pub mod lifecycle_service;
pub mod style_selector;
pub mod upload_pipeline;


// Re-exportar para facilitar acceso
pub use lifecycle_service::LifecycleManager;
pub use style_selector::StyleSelector;
pub use upload_pipeline::UploadPipeline;
