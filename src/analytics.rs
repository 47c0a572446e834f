//! KPI summary and the dashboard's predefined grouped views.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use polars::prelude::DataFrame;

use crate::aggregation::{pivot_mean_frame, AggregateRow, GroupQuery, PivotTable, Reduction, SortSpec};
use crate::enrich::enrich;
use crate::error::{AnalyticsError, Result};
use crate::filter::FilterSpec;
use crate::frame::enriched_to_frame;
use crate::model::{EnrichedRow, Row};
use crate::schema::{aggregate as agg, derived, field};

/// Headline figures for the KPI cards.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PerformanceMetrics {
    pub total_revenue: f64,
    pub total_orders: f64,
    pub avg_lead_time: f64,
    pub total_availability: f64,
    pub avg_profit_margin: f64,
    /// Mean efficiency ratio.
    pub efficiency_score: f64,
    /// Mean performance score.
    pub performance_score: f64,
}

impl PerformanceMetrics {
    /// All zero for an empty batch.
    pub fn from_rows(rows: &[EnrichedRow]) -> Self {
        if rows.is_empty() {
            return Self::default();
        }
        let n = rows.len() as f64;
        let sum = |f: fn(&EnrichedRow) -> f64| rows.iter().map(f).sum::<f64>();
        Self {
            total_revenue: sum(|r| r.row.revenue),
            total_orders: sum(|r| r.row.order_quantity),
            avg_lead_time: sum(|r| r.row.lead_time) / n,
            total_availability: sum(|r| r.row.availability),
            avg_profit_margin: sum(|r| r.profit_margin) / n,
            efficiency_score: sum(|r| r.efficiency_ratio) / n,
            performance_score: sum(|r| r.performance_score) / n,
        }
    }
}

/// Predefined grouped views behind the dashboard charts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    ProductPerformance,
    LocationEfficiency,
    SupplierRisk,
    TransportationAnalysis,
    RevenueByProductType,
    LocationPerformance,
    SupplierAnalysis,
    InspectionBreakdown,
    RiskDistribution,
}

impl View {
    pub const ALL: [View; 9] = [
        View::ProductPerformance,
        View::LocationEfficiency,
        View::SupplierRisk,
        View::TransportationAnalysis,
        View::RevenueByProductType,
        View::LocationPerformance,
        View::SupplierAnalysis,
        View::InspectionBreakdown,
        View::RiskDistribution,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            View::ProductPerformance => "product_performance",
            View::LocationEfficiency => "location_efficiency",
            View::SupplierRisk => "supplier_risk",
            View::TransportationAnalysis => "transportation_analysis",
            View::RevenueByProductType => "revenue_by_product_type",
            View::LocationPerformance => "location_performance",
            View::SupplierAnalysis => "supplier_analysis",
            View::InspectionBreakdown => "inspection_breakdown",
            View::RiskDistribution => "risk_distribution",
        }
    }

    pub fn query(&self) -> GroupQuery {
        match self {
            View::ProductPerformance => GroupQuery::new(field::PRODUCT_TYPE)
                .reduce(Reduction::sum(field::REVENUE).alias(agg::TOTAL_REVENUE))
                .reduce(Reduction::avg(derived::PERFORMANCE_SCORE).alias(agg::AVG_PERFORMANCE))
                .reduce(Reduction::count().alias(agg::PRODUCT_COUNT))
                .reduce(Reduction::avg(field::DEFECT_RATE).alias(agg::AVG_DEFECT_RATE)),
            View::LocationEfficiency => GroupQuery::new(field::LOCATION)
                .reduce(Reduction::sum(field::REVENUE).alias(agg::TOTAL_REVENUE))
                .reduce(Reduction::avg(field::LEAD_TIME).alias(agg::AVG_LEAD_TIME))
                .reduce(Reduction::avg(derived::EFFICIENCY_RATIO).alias(agg::AVG_EFFICIENCY))
                .reduce(Reduction::sum(field::MANUFACTURING_COST).alias(agg::TOTAL_COSTS))
                .sort(SortSpec::desc(agg::AVG_EFFICIENCY)),
            View::SupplierRisk => GroupQuery::new(field::SUPPLIER_NAME)
                .reduce(Reduction::avg(field::DEFECT_RATE).alias(agg::AVG_DEFECT_RATE))
                .reduce(Reduction::sum(field::MANUFACTURING_COST).alias(agg::TOTAL_COSTS))
                .reduce(Reduction::count().alias(agg::PRODUCT_COUNT))
                .reduce(Reduction::avg(field::LEAD_TIME).alias(agg::AVG_LEAD_TIME)),
            View::TransportationAnalysis => GroupQuery::new(field::TRANSPORTATION_MODE)
                .reduce(Reduction::avg(field::SHIPPING_COST).alias(agg::AVG_SHIPPING_COST))
                .reduce(Reduction::avg(field::LEAD_TIME).alias(agg::AVG_LEAD_TIME))
                .reduce(Reduction::sum(field::ORDER_QUANTITY).alias(agg::TOTAL_ORDERS))
                .reduce(Reduction::count().alias(agg::USAGE_COUNT))
                .sort(SortSpec::asc(agg::AVG_SHIPPING_COST)),
            View::RevenueByProductType => GroupQuery::new(field::PRODUCT_TYPE)
                .reduce(Reduction::sum(field::REVENUE).alias(agg::TOTAL_REVENUE))
                .reduce(Reduction::count().alias(agg::PRODUCT_COUNT)),
            View::LocationPerformance => GroupQuery::new(field::LOCATION)
                .reduce(Reduction::sum(field::REVENUE).alias(agg::TOTAL_REVENUE))
                .reduce(Reduction::sum(field::MANUFACTURING_COST).alias(agg::TOTAL_COSTS))
                .reduce(Reduction::avg(field::LEAD_TIME).alias(agg::AVG_LEAD_TIME))
                .reduce(Reduction::sum(field::ORDER_QUANTITY).alias(agg::TOTAL_ORDERS)),
            View::SupplierAnalysis => GroupQuery::new(field::SUPPLIER_NAME)
                .reduce(Reduction::sum(field::MANUFACTURING_COST).alias(agg::TOTAL_COSTS))
                .reduce(Reduction::avg(field::DEFECT_RATE).alias(agg::AVG_DEFECT_RATE))
                .reduce(Reduction::count().alias(agg::PRODUCT_COUNT)),
            View::InspectionBreakdown => {
                GroupQuery::new(field::INSPECTION_RESULT).reduce(Reduction::count())
            }
            View::RiskDistribution => GroupQuery::new(derived::RISK_LEVEL)
                .reduce(Reduction::count())
                .reduce(Reduction::avg(field::DEFECT_RATE).alias(agg::AVG_DEFECT_RATE)),
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for View {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        View::ALL
            .into_iter()
            .find(|v| v.name() == s.trim())
            .ok_or_else(|| AnalyticsError::UnknownField(format!("view '{s}'")))
    }
}

/// An enriched, filtered batch ready for summary queries.
///
/// Filters are applied to raw rows first, so performance scores are
/// relative to the filtered batch.
#[derive(Debug, Clone, Default)]
pub struct Analyzer {
    rows: Vec<EnrichedRow>,
    frame: DataFrame,
}

impl Analyzer {
    pub fn new(rows: &[Row], filters: &FilterSpec) -> Result<Self> {
        filters.validate()?;
        let selected = filters.apply(rows);
        info!(
            loaded = rows.len(),
            selected = selected.len(),
            "applied filters"
        );
        Self::from_enriched(enrich(&selected))
    }

    pub fn from_enriched(rows: Vec<EnrichedRow>) -> Result<Self> {
        let frame = enriched_to_frame(&rows)?;
        Ok(Self { rows, frame })
    }

    pub fn rows(&self) -> &[EnrichedRow] {
        &self.rows
    }

    /// The enriched batch as a frame, one column per field.
    pub fn frame(&self) -> &DataFrame {
        &self.frame
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn metrics(&self) -> PerformanceMetrics {
        PerformanceMetrics::from_rows(&self.rows)
    }

    pub fn aggregate(&self, query: &GroupQuery) -> Result<Vec<AggregateRow>> {
        query.run_frame(&self.frame)
    }

    /// Grouped result as a frame: key column, then one column per reduction.
    pub fn summarize(&self, query: &GroupQuery) -> Result<DataFrame> {
        query.summarize(&self.frame)
    }

    pub fn view(&self, view: View) -> Result<Vec<AggregateRow>> {
        self.aggregate(&view.query())
    }

    /// Mean of `value` per `(index, columns)` cell.
    pub fn heatmap(&self, index: &str, columns: &str, value: &str) -> Result<PivotTable> {
        pivot_mean_frame(&self.frame, index, columns, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample_row;
    use crate::model::RiskLevel;

    fn rows() -> Vec<Row> {
        let mut a = sample_row("haircare", 100.0);
        a.transportation_mode = "Air".to_string();
        a.shipping_cost = 9.0;
        a.order_quantity = 10.0;
        a.lead_time = 4.0;
        let mut b = sample_row("skincare", 350.0);
        b.transportation_mode = "Sea".to_string();
        b.shipping_cost = 3.0;
        b.order_quantity = 20.0;
        b.lead_time = 8.0;
        b.defect_rate = 2.0;
        let mut c = sample_row("haircare", 200.0);
        c.transportation_mode = "Air".to_string();
        c.shipping_cost = 7.0;
        c.order_quantity = 30.0;
        c.lead_time = 6.0;
        c.defect_rate = 4.0;
        vec![a, b, c]
    }

    #[test]
    fn metrics_match_hand_sums() {
        let analyzer = Analyzer::new(&rows(), &FilterSpec::default()).unwrap();
        let m = analyzer.metrics();
        assert_eq!(m.total_revenue, 650.0);
        assert_eq!(m.total_orders, 60.0);
        assert_eq!(m.avg_lead_time, 6.0);
        assert_eq!(m.total_availability, 150.0);
        assert!((m.avg_profit_margin - 530.0 / 3.0).abs() < 1e-9);
        assert!(m.performance_score > 0.0 && m.performance_score <= 100.0);
    }

    #[test]
    fn metrics_of_empty_batch_are_zero() {
        let analyzer = Analyzer::new(&rows(), &FilterSpec::default().with_location("Nowhere"))
            .unwrap();
        assert!(analyzer.is_empty());
        assert_eq!(analyzer.metrics(), PerformanceMetrics::default());
        assert!(analyzer.view(View::ProductPerformance).unwrap().is_empty());
    }

    #[test]
    fn every_view_runs() {
        let analyzer = Analyzer::new(&rows(), &FilterSpec::default()).unwrap();
        for view in View::ALL {
            let out = analyzer.view(view).unwrap();
            assert!(!out.is_empty(), "{view}");
            assert_eq!(view.name().parse::<View>().unwrap(), view);
        }
    }

    #[test]
    fn product_performance_orders_by_revenue() {
        let analyzer = Analyzer::new(&rows(), &FilterSpec::default()).unwrap();
        let out = analyzer.view(View::ProductPerformance).unwrap();
        assert_eq!(out[0].key, "skincare");
        assert_eq!(out[0].get(agg::TOTAL_REVENUE), Some(350.0));
        assert_eq!(out[1].key, "haircare");
        assert_eq!(out[1].get(agg::TOTAL_REVENUE), Some(300.0));
        assert_eq!(out[1].get(agg::PRODUCT_COUNT), Some(2.0));
    }

    #[test]
    fn transportation_orders_by_cheapest_shipping() {
        let analyzer = Analyzer::new(&rows(), &FilterSpec::default()).unwrap();
        let out = analyzer.view(View::TransportationAnalysis).unwrap();
        assert_eq!(out[0].key, "Sea");
        assert_eq!(out[0].get(agg::AVG_SHIPPING_COST), Some(3.0));
        assert_eq!(out[1].key, "Air");
        assert_eq!(out[1].get(agg::AVG_SHIPPING_COST), Some(8.0));
        assert_eq!(out[1].get(agg::TOTAL_ORDERS), Some(40.0));
        assert_eq!(out[1].get(agg::USAGE_COUNT), Some(2.0));
    }

    #[test]
    fn filters_apply_before_enrichment() {
        let all = Analyzer::new(&rows(), &FilterSpec::default()).unwrap();
        let haircare =
            Analyzer::new(&rows(), &FilterSpec::default().with_product_type("haircare")).unwrap();
        assert_eq!(haircare.len(), 2);

        let score_in = |a: &Analyzer, revenue: f64| {
            a.rows()
                .iter()
                .find(|r| r.row.revenue == revenue)
                .map(|r| r.performance_score)
                .unwrap()
        };
        assert!(score_in(&haircare, 200.0) > score_in(&all, 200.0));
    }

    #[test]
    fn risk_filter_drops_levels() {
        let filters = FilterSpec::default().with_risk_levels([RiskLevel::Low]);
        let analyzer = Analyzer::new(&rows(), &filters).unwrap();
        assert_eq!(analyzer.len(), 1);
        assert_eq!(analyzer.rows()[0].risk_level, RiskLevel::Low);
    }

    #[test]
    fn invalid_filters_fail_fast() {
        let filters = FilterSpec::default().with_revenue_range(5.0, 1.0);
        assert!(matches!(
            Analyzer::new(&rows(), &filters),
            Err(AnalyticsError::Validation(_))
        ));
    }

    #[test]
    fn heatmap_of_performance() {
        let analyzer = Analyzer::new(&rows(), &FilterSpec::default()).unwrap();
        let table = analyzer
            .heatmap(field::LOCATION, field::PRODUCT_TYPE, derived::PERFORMANCE_SCORE)
            .unwrap();
        assert_eq!(table.index, ["Mumbai"]);
        assert_eq!(table.columns, ["haircare", "skincare"]);
        assert!(table.cells[0].iter().all(Option::is_some));
    }

    #[test]
    fn summarize_matches_aggregate() {
        let analyzer = Analyzer::new(&rows(), &FilterSpec::default()).unwrap();
        let query = View::TransportationAnalysis.query();
        let df = analyzer.summarize(&query).unwrap();
        assert_eq!(df.width(), 1 + query.reductions.len());
        assert_eq!(df.height(), 2);
        let keys = df.column(field::TRANSPORTATION_MODE).unwrap().str().unwrap();
        assert_eq!(keys.get(0), Some("Sea"));
        let orders = df.column(agg::TOTAL_ORDERS).unwrap().f64().unwrap();
        assert_eq!(orders.get(1), Some(40.0));
    }
}
