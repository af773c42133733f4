//! Service configuration.

pub mod app;

pub use app::{AppConfig, DataConfig, ViewConfig};
