pub mod item_dto;
pub mod notice_dto;
pub mod outfit_dto;
pub mod session_dto;
pub mod trash_dto;
pub mod upload_dto;
