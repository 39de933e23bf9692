pub mod config;
pub mod deploy;
pub mod design_tool;
pub mod error;
pub mod generator;
pub mod health;
pub mod logging;
pub mod model;
pub mod pipeline;
pub mod registry;
pub mod server;
pub mod state;
pub mod tokens;
pub mod validate;
pub mod webhook;

pub use config::{CliArgs, Command, SyncConfig};
pub use error::{SyncError, SyncResult};
pub use logging::{LoggingConfig, init_logging};
pub use server::{build_router, run_server};
