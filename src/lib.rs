pub mod aggregation;
pub mod analytics;
pub mod config;
pub mod enrich;
pub mod error;
pub mod filter;
pub mod frame;
pub mod model;
pub mod report;
pub mod schema;

#[cfg(feature = "python")]
mod python;

pub use aggregation::{
    aggregate, aggregate_frame, aggregate_non_empty, pivot_mean, pivot_mean_frame,
    summarize_frame, AggregateRow, GroupQuery, PivotTable, ReduceOp, Reduction, SortSpec,
};
pub use analytics::{Analyzer, PerformanceMetrics, View};
pub use config::{Config, OutputFormat};
pub use enrich::enrich;
pub use error::{AnalyticsError, Result};
pub use filter::FilterSpec;
pub use model::{EnrichedRow, Field, RiskLevel, Row};
pub use report::DashboardReport;
