pub mod credential_validator;
pub mod image_fetcher;
pub mod json_kv_store;
pub mod memory_kv_store;
pub mod style_transform_client;
