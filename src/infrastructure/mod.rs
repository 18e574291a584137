pub mod api_client;
pub mod config;
pub mod error;
pub mod logging;
pub mod task_cache;
