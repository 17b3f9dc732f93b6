pub mod image_codec;
pub mod item_query;
