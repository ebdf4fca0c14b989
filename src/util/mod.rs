pub mod config;
pub mod images;
