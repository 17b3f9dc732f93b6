pub mod item;
pub mod outfit;
pub mod session;
pub mod trash_record;
pub mod upload;
