pub mod text_utils;
pub mod time_utils;
pub mod serde_utils;
pub mod markdown;
