//! Command-line interface argument parsing.

use std::path::PathBuf;

use clap::Parser;
use supply_chain_analytics::{Config, OutputFormat, RiskLevel, View};

/// supply-dash - supply-chain KPI and summary report
///
/// Loads a supply-chain CSV, derives per-product metrics and prints the
/// KPI figures plus grouped summaries.
///
/// Examples:
///   supply-dash --data supply_chain_data.csv
///   supply-dash --location Mumbai --risk high --risk critical --format json
///   supply-dash --view supplier_risk --view risk_distribution
///   supply-dash --export enriched.csv
///   supply-dash --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to the supply-chain CSV
    ///
    /// Overrides `data.path` from the configuration file.
    #[arg(short, long, value_name = "FILE", env = "SUPPLY_DASH_DATA")]
    pub data: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for supply-dash.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keep only rows of this product type
    #[arg(long, value_name = "TYPE")]
    pub product_type: Option<String>,

    /// Keep only rows from this location
    #[arg(long, value_name = "LOCATION")]
    pub location: Option<String>,

    /// Lower revenue bound (inclusive)
    #[arg(long, value_name = "AMOUNT")]
    pub min_revenue: Option<f64>,

    /// Upper revenue bound (inclusive)
    #[arg(long, value_name = "AMOUNT")]
    pub max_revenue: Option<f64>,

    /// Upper lead-time bound in days (inclusive)
    #[arg(long, value_name = "DAYS")]
    pub max_lead_time: Option<f64>,

    /// Accepted risk level, repeatable (low, medium, high, critical)
    #[arg(long = "risk", value_name = "LEVEL")]
    pub risk_levels: Vec<RiskLevel>,

    /// View to include, repeatable
    ///
    /// Replaces the configured view list. Example: --view supplier_risk
    #[arg(long = "view", value_name = "NAME")]
    pub views: Vec<View>,

    /// Output format
    #[arg(long, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Also write the filtered, enriched rows to this CSV file
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default supply-dash.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

impl Args {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }
        if let (Some(min), Some(max)) = (self.min_revenue, self.max_revenue) {
            if min > max {
                return Err(format!(
                    "--min-revenue ({min}) must not exceed --max-revenue ({max})"
                ));
            }
        }
        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Overlay flags onto a loaded configuration. Flags win.
    pub fn merge_into(&self, config: &mut Config) {
        if let Some(data) = &self.data {
            config.data.path = data.display().to_string();
        }

        let filters = &mut config.filters;
        if let Some(p) = &self.product_type {
            filters.product_type = Some(p.clone());
        }
        if let Some(l) = &self.location {
            filters.location = Some(l.clone());
        }
        if self.min_revenue.is_some() || self.max_revenue.is_some() {
            let (cur_min, cur_max) = filters
                .revenue_range
                .unwrap_or((f64::NEG_INFINITY, f64::INFINITY));
            filters.revenue_range = Some((
                self.min_revenue.unwrap_or(cur_min),
                self.max_revenue.unwrap_or(cur_max),
            ));
        }
        if let Some(max) = self.max_lead_time {
            filters.max_lead_time = Some(max);
        }
        if !self.risk_levels.is_empty() {
            filters.risk_levels = self.risk_levels.clone();
        }

        if !self.views.is_empty() {
            config.report.views = self.views.clone();
        }
        if let Some(format) = self.format {
            config.report.format = format;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_args() -> Args {
        Args {
            data: None,
            config: None,
            product_type: None,
            location: None,
            min_revenue: None,
            max_revenue: None,
            max_lead_time: None,
            risk_levels: Vec::new(),
            views: Vec::new(),
            format: None,
            export: None,
            verbose: false,
            quiet: false,
            init_config: false,
        }
    }

    #[test]
    fn test_parse_repeated_flags() {
        let args = Args::try_parse_from([
            "supply-dash",
            "--risk",
            "high",
            "--risk",
            "Critical",
            "--view",
            "supplier_risk",
            "--format",
            "json",
        ])
        .unwrap();
        assert_eq!(args.risk_levels, [RiskLevel::High, RiskLevel::Critical]);
        assert_eq!(args.views, [View::SupplierRisk]);
        assert_eq!(args.format, Some(OutputFormat::Json));
    }

    #[test]
    fn test_unknown_view_rejected() {
        assert!(Args::try_parse_from(["supply-dash", "--view", "nope"]).is_err());
    }

    #[test]
    fn test_validation_conflicting_options() {
        let mut args = make_args();
        args.verbose = true;
        args.quiet = true;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validation_revenue_bounds() {
        let mut args = make_args();
        args.min_revenue = Some(500.0);
        args.max_revenue = Some(100.0);
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_log_level() {
        let mut args = make_args();
        assert_eq!(args.log_level(), tracing::Level::INFO);

        args.verbose = true;
        assert_eq!(args.log_level(), tracing::Level::DEBUG);

        args.verbose = false;
        args.quiet = true;
        assert_eq!(args.log_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_merge_flags_over_config() {
        let mut config = Config::default();
        config.filters.location = Some("Delhi".into());
        config.filters.revenue_range = Some((100.0, 9000.0));

        let mut args = make_args();
        args.data = Some(PathBuf::from("other.csv"));
        args.min_revenue = Some(1000.0);
        args.views = vec![View::RiskDistribution];
        args.merge_into(&mut config);

        assert_eq!(config.data.path, "other.csv");
        assert_eq!(config.filters.location.as_deref(), Some("Delhi"));
        assert_eq!(config.filters.revenue_range, Some((1000.0, 9000.0)));
        assert_eq!(config.report.views, [View::RiskDistribution]);
        assert_eq!(config.report.format, OutputFormat::Table);
    }
}
