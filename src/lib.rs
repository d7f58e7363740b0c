pub mod annotation;
pub mod app;
pub mod client;
pub mod config;
pub mod editor;
pub mod render;
pub mod session;
