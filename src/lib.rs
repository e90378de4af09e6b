//! care-trends - deterministic analytics for daily care-observation records
//!
//! Turns one resident's chronological care log into a health trend report
//! through a fixed pipeline: schema validation → period windowing → trend
//! aggregation → correlation and anomaly detection → seizure risk →
//! recommendations.
//!
//! ## Modules
//!
//! - **Record boundary** (`schema`): Parse and validate upstream records
//! - **Analysis** (`filter`, `trend`, `correlation`, `anomaly`, `seizure`,
//!   `recommendation`): Pure computations over validated records
//! - **Orchestration** (`pipeline`): [`HealthTrendAnalyzer`] and its report API
//! - **State** (`history`, `repository`): Rolling per-resident history and the
//!   record source abstraction

pub mod anomaly;
pub mod config;
pub mod correlation;
pub mod error;
pub mod filter;
pub mod history;
pub mod pipeline;
pub mod recommendation;
pub mod repository;
pub mod schema;
pub mod seizure;
pub mod stats;
pub mod trend;
pub mod types;

pub use config::AnalysisConfig;
pub use error::{AnalysisError, RecordError, Result};
pub use history::ResidentHistoryCache;
pub use pipeline::HealthTrendAnalyzer;
pub use repository::{InMemoryLogRepository, LogRepository};
pub use types::{HealthTrendReport, LogRecord, Period, SeizureRiskAssessment};

// Schema exports
pub use schema::{RawLogRecord, RecordAdapter, RecordIssue, ValidatedBatch};

/// Engine version embedded in every report
pub const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");
