pub mod backoff;
pub mod classify;
pub mod client;
pub mod health;
pub mod request;

pub use crate::utils::error::{ApiError, Result};
pub use client::{ApiClient, ApiClientBuilder};
pub use health::{HealthChecker, HealthStatus};
pub use request::{ApiRequest, ApiResponse};
