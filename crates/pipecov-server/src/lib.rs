pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;

pub use config::{AppConfig, ConfigError};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{PipecovServer, ServerBuilder, build_app};
