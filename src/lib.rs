pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod metrics;
pub mod pipeline;

// Domain data shapes shared across layers
pub mod domain;

pub use config::Config;
pub use error::{QualityError, Result};
pub use pipeline::report::QualityReport;
pub use pipeline::QualityPipeline;
