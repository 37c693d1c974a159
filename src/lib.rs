pub mod config;
pub mod core;
pub mod domain;
pub mod services;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::cli::{CliConfig, Command};

pub use config::client_config::{ClientConfig, NotFoundRetry};
pub use core::{ApiClient, ApiRequest, ApiResponse, HealthStatus};
pub use domain::ports::{Sleeper, StaticToken, TokenProvider, TokioSleeper, UnauthorizedHandler};
pub use services::AdminApi;
pub use utils::error::{ApiError, ClientError, ErrorKind, Result};
