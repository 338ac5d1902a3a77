pub mod config;
pub mod logger;
pub mod server;
pub mod content;
pub mod content_cache;
pub mod listing;
pub mod paginator;
pub mod text_utils;
pub mod rich_text;
pub mod sitemap;
pub mod forms;
pub mod query_string;
pub mod view;
mod test_data;
