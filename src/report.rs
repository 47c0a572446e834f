//! Dashboard report: KPI figures plus the configured views, as JSON or text.

use std::fmt::Write as FmtWrite;

use chrono::Utc;
use serde::Serialize;

use crate::aggregation::AggregateRow;
use crate::analytics::{Analyzer, PerformanceMetrics, View};
use crate::error::Result;
use crate::filter::FilterSpec;

#[derive(Debug, Clone, Serialize)]
pub struct ReportMetadata {
    pub generated_at: String,
    pub source: String,
    pub rows_loaded: usize,
    pub rows_selected: usize,
    pub filters: FilterSpec,
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewReport {
    pub name: String,
    pub group_by: String,
    pub columns: Vec<String>,
    pub rows: Vec<AggregateRow>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardReport {
    pub metadata: ReportMetadata,
    pub metrics: PerformanceMetrics,
    pub views: Vec<ViewReport>,
}

impl DashboardReport {
    pub fn build(
        source: &str,
        rows_loaded: usize,
        filters: &FilterSpec,
        analyzer: &Analyzer,
        views: &[View],
    ) -> Result<Self> {
        let views = views
            .iter()
            .map(|view| -> Result<ViewReport> {
                let query = view.query();
                Ok(ViewReport {
                    name: view.name().to_string(),
                    columns: query.output_names(),
                    rows: analyzer.aggregate(&query)?,
                    group_by: query.group_by,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            metadata: ReportMetadata {
                generated_at: Utc::now().to_rfc3339(),
                source: source.to_string(),
                rows_loaded,
                rows_selected: analyzer.len(),
                filters: filters.clone(),
            },
            metrics: analyzer.metrics(),
            views,
        })
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn to_table(&self) -> String {
        let mut out = String::new();
        let m = &self.metrics;
        let _ = writeln!(
            out,
            "Supply chain report: {} ({} of {} rows)",
            self.metadata.source, self.metadata.rows_selected, self.metadata.rows_loaded
        );
        let _ = writeln!(out);
        for (label, value) in [
            ("Total revenue", format_currency(m.total_revenue)),
            ("Total orders", format_number(m.total_orders)),
            ("Avg lead time", format!("{:.1} days", m.avg_lead_time)),
            ("Total availability", format_number(m.total_availability)),
            ("Avg profit margin", format_currency(m.avg_profit_margin)),
            ("Efficiency score", format!("{:.2}", m.efficiency_score)),
            ("Performance score", format!("{:.1}%", m.performance_score)),
        ] {
            let _ = writeln!(out, "  {label:<20} {value}");
        }

        for view in &self.views {
            let _ = writeln!(out);
            let _ = writeln!(out, "== {} ==", view.name);
            let key_width = view
                .rows
                .iter()
                .map(|r| r.key.len())
                .chain(std::iter::once(view.group_by.len()))
                .max()
                .unwrap_or_default();
            let _ = write!(out, "{:<key_width$}", view.group_by);
            for c in &view.columns {
                let _ = write!(out, "  {c:>16}");
            }
            let _ = writeln!(out);
            for row in &view.rows {
                let _ = write!(out, "{:<key_width$}", row.key);
                for (_, v) in &row.values {
                    let _ = write!(out, "  {v:>16.2}");
                }
                let _ = writeln!(out);
            }
        }
        out
    }
}

pub fn format_currency(value: f64) -> String {
    if value.abs() >= 1e6 {
        format!("${:.1}M", value / 1e6)
    } else if value.abs() >= 1e3 {
        format!("${:.1}K", value / 1e3)
    } else {
        format!("${value:.2}")
    }
}

pub fn format_number(value: f64) -> String {
    if value.abs() >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if value.abs() >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{value:.0}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample_row;

    fn report() -> DashboardReport {
        let rows = vec![sample_row("haircare", 1500.0), sample_row("skincare", 500.0)];
        let filters = FilterSpec::default();
        let analyzer = Analyzer::new(&rows, &filters).unwrap();
        DashboardReport::build(
            "fixture.csv",
            rows.len(),
            &filters,
            &analyzer,
            &[View::RevenueByProductType, View::InspectionBreakdown],
        )
        .unwrap()
    }

    #[test]
    fn json_contains_metrics_and_views() {
        let json: serde_json::Value = serde_json::from_str(&report().to_json()).unwrap();
        assert_eq!(json["metadata"]["rows_selected"], 2);
        assert_eq!(json["metrics"]["total_revenue"], 2000.0);
        assert_eq!(json["views"][0]["name"], "revenue_by_product_type");
        assert_eq!(json["views"][0]["rows"][0]["key"], "haircare");
        assert_eq!(json["views"][0]["rows"][0]["total_revenue"], 1500.0);
        assert_eq!(json["views"][1]["rows"][0]["count"], 2.0);
    }

    #[test]
    fn table_lists_each_view() {
        let text = report().to_table();
        assert!(text.contains("Total revenue        $2.0K"));
        assert!(text.contains("== revenue_by_product_type =="));
        assert!(text.contains("== inspection_breakdown =="));
        assert!(text.contains("haircare"));
    }

    #[test]
    fn number_formatting() {
        assert_eq!(format_currency(2_500_000.0), "$2.5M");
        assert_eq!(format_currency(12.5), "$12.50");
        assert_eq!(format_number(1234.0), "1.2K");
        assert_eq!(format_number(42.0), "42");
    }
}
