pub mod config;
pub mod handlers;
pub mod libraries;
pub mod logging;
pub mod models;
pub mod services;
