pub mod config;
pub mod scene;
