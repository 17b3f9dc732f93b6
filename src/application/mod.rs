pub mod dtos;
pub mod ports;
pub mod services;

// Re-exportaciones para facilitar el acceso a los principales puertos
pub use ports::inbound::WardrobeUseCase;
pub use ports::storage_ports::{ItemStoreFactory, KeyValueStore};
pub use ports::trash_ports::TrashUseCase;
