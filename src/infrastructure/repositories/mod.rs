pub mod kv_support;
pub mod local_item_repository;
pub mod outfit_kv_repository;
pub mod remote_item_repository;
pub mod store_factory;
pub mod trash_kv_repository;

// Re-exportar para facilitar acceso
pub use local_item_repository::LocalItemStore;
pub use outfit_kv_repository::OutfitKvRepository;
pub use remote_item_repository::RemoteItemStore;
pub use store_factory::WardrobeStoreFactory;
pub use trash_kv_repository::TrashKvRepository;
