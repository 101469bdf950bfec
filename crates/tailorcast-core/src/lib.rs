pub mod calendar;
pub mod config;
pub mod error;
pub mod insights;
pub mod types;

#[cfg(feature = "forecast")]
pub mod forecast;

#[cfg(feature = "forecast")]
pub mod report;

#[cfg(feature = "dashboard")]
pub mod dashboard;

pub use error::AnalyticsError;
pub use types::*;

/// Standard result type for every analytics entry point
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;
