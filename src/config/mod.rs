// src/config/mod.rs
//! Configuration: the static column catalog (TOML) and env-driven runtime settings.

pub mod catalog;
pub mod settings;

pub use catalog::Catalog;
pub use settings::Settings;
