pub mod audio;
pub mod backends;
pub mod config;
pub mod executor;
pub mod http;
pub mod repositories;
