pub mod item_repository;
pub mod outfit_repository;
pub mod trash_repository;
