use std::path::PathBuf;

use pyo3::prelude::*;
use pyo3_polars::PyDataFrame;

use crate::aggregation::{GroupQuery, ReduceOp, Reduction, SortSpec};
use crate::analytics::{Analyzer, View};
use crate::error::AnalyticsError;
use crate::filter::FilterSpec;
use crate::frame;
use crate::model::{RiskLevel, Row};
use crate::schema;

/// Sidebar selection passed into every request.
#[pyclass(name = "FilterSpec")]
#[derive(Debug, Clone, Default)]
pub struct PyFilterSpec {
    inner: FilterSpec,
}

#[pymethods]
impl PyFilterSpec {
    #[new]
    #[pyo3(signature = (
        product_type = None,
        location = None,
        min_revenue = None,
        max_revenue = None,
        max_lead_time = None,
        risk_levels = None,
    ))]
    fn new(
        product_type: Option<String>,
        location: Option<String>,
        min_revenue: Option<f64>,
        max_revenue: Option<f64>,
        max_lead_time: Option<f64>,
        risk_levels: Option<Vec<String>>,
    ) -> PyResult<Self> {
        let revenue_range = match (min_revenue, max_revenue) {
            (None, None) => None,
            (min, max) => Some((min.unwrap_or(f64::NEG_INFINITY), max.unwrap_or(f64::INFINITY))),
        };
        let risk_levels = risk_levels
            .unwrap_or_default()
            .iter()
            .map(|s| s.parse::<RiskLevel>())
            .collect::<Result<Vec<_>, _>>()?;
        // "All" in the sidebar means no restriction.
        let all = |v: Option<String>| v.filter(|s| s != "All");
        let inner = FilterSpec {
            product_type: all(product_type),
            location: all(location),
            revenue_range,
            max_lead_time,
            risk_levels,
        };
        inner.validate()?;
        Ok(Self { inner })
    }

    fn __repr__(&self) -> String {
        format!("{:?}", self.inner)
    }
}

#[pyclass]
pub struct SupplyChainModel {
    base_path: PathBuf,
    data: Option<Vec<Row>>,
}

#[pymethods]
impl SupplyChainModel {
    #[new]
    fn new(base_path: String) -> Self {
        Self {
            base_path: PathBuf::from(base_path),
            data: None,
        }
    }

    // ── Data loading ────────────────────────────────────────────────────────

    /// Load and clean the supply-chain CSV. Returns the cleaned frame.
    #[pyo3(signature = (filename=None))]
    fn load_csv(&mut self, filename: Option<&str>) -> PyResult<PyDataFrame> {
        let path = self
            .base_path
            .join(filename.unwrap_or("supply_chain_data.csv"));
        let df = frame::read_supply_csv(&path)?;
        self.data = Some(frame::rows_from_frame(&df)?);
        Ok(PyDataFrame(df))
    }

    #[getter]
    fn row_count(&self) -> usize {
        self.data.as_ref().map_or(0, Vec::len)
    }

    // ── Derived data ────────────────────────────────────────────────────────

    /// Filtered batch with derived metric columns.
    #[pyo3(signature = (filters=None))]
    fn enriched(&self, filters: Option<PyRef<PyFilterSpec>>) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.analyzer(filters)?.frame().clone()))
    }

    /// KPI figures as a dict of floats.
    #[pyo3(signature = (filters=None))]
    fn metrics(
        &self,
        filters: Option<PyRef<PyFilterSpec>>,
    ) -> PyResult<std::collections::HashMap<String, f64>> {
        let m = self.analyzer(filters)?.metrics();
        Ok([
            ("total_revenue", m.total_revenue),
            ("total_orders", m.total_orders),
            ("avg_lead_time", m.avg_lead_time),
            ("total_availability", m.total_availability),
            ("avg_profit_margin", m.avg_profit_margin),
            ("efficiency_score", m.efficiency_score),
            ("performance_score", m.performance_score),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect())
    }

    /// One of the predefined views, e.g. `"product_performance"`.
    #[pyo3(signature = (name, filters=None))]
    fn view(&self, name: &str, filters: Option<PyRef<PyFilterSpec>>) -> PyResult<PyDataFrame> {
        let query = name.parse::<View>()?.query();
        self.run_query(&query, filters)
    }

    /// Ad-hoc grouping: `reductions` is a list of `(field, op)` tuples.
    #[pyo3(signature = (group_by, reductions, sort_by=None, descending=true, filters=None))]
    fn aggregate(
        &self,
        group_by: String,
        reductions: Vec<(String, String)>,
        sort_by: Option<String>,
        descending: bool,
        filters: Option<PyRef<PyFilterSpec>>,
    ) -> PyResult<PyDataFrame> {
        let reductions = reductions
            .into_iter()
            .map(|(field, op)| Ok(Reduction::new(field, op.parse::<ReduceOp>()?)))
            .collect::<Result<Vec<_>, AnalyticsError>>()?;
        let query = GroupQuery {
            group_by,
            reductions,
            sort: SortSpec {
                by: sort_by,
                descending,
            },
        };
        self.run_query(&query, filters)
    }

    /// Mean of `value` per `(index, columns)` cell, one column per `columns` key.
    #[pyo3(signature = (index, columns, value, filters=None))]
    fn heatmap(
        &self,
        index: &str,
        columns: &str,
        value: &str,
        filters: Option<PyRef<PyFilterSpec>>,
    ) -> PyResult<PyDataFrame> {
        let table = self.analyzer(filters)?.heatmap(index, columns, value)?;
        Ok(PyDataFrame(frame::pivot_to_frame(index, &table)?))
    }
}

// ── Private helpers ─────────────────────────────────────────────────────────

impl SupplyChainModel {
    fn analyzer(&self, filters: Option<PyRef<PyFilterSpec>>) -> Result<Analyzer, AnalyticsError> {
        let rows = self.data.as_ref().ok_or_else(|| {
            AnalyticsError::Validation("Data not loaded: call load_csv() first".into())
        })?;
        let filters = filters.map(|f| f.inner.clone()).unwrap_or_default();
        Analyzer::new(rows, &filters)
    }

    fn run_query(
        &self,
        query: &GroupQuery,
        filters: Option<PyRef<PyFilterSpec>>,
    ) -> PyResult<PyDataFrame> {
        Ok(PyDataFrame(self.analyzer(filters)?.summarize(query)?))
    }
}

/// Export column-name constants as Python submodules
fn add_schema_exports(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Source CSV headers
    let columns = PyModule::new(m.py(), "columns")?;
    for name in schema::csv::NUMERIC.iter().chain(schema::csv::CATEGORICAL.iter()) {
        columns.add(name.to_uppercase().replace(' ', "_"), *name)?;
    }
    m.add_submodule(&columns)?;

    // Derived metrics
    let derived = PyModule::new(m.py(), "derived")?;
    derived.add("PROFIT_MARGIN", schema::derived::PROFIT_MARGIN)?;
    derived.add("TOTAL_SHIPPING_COST", schema::derived::TOTAL_SHIPPING_COST)?;
    derived.add("EFFICIENCY_RATIO", schema::derived::EFFICIENCY_RATIO)?;
    derived.add("INVENTORY_TURNOVER", schema::derived::INVENTORY_TURNOVER)?;
    derived.add("PERFORMANCE_SCORE", schema::derived::PERFORMANCE_SCORE)?;
    derived.add("RISK_LEVEL", schema::derived::RISK_LEVEL)?;
    m.add_submodule(&derived)?;

    // Risk
    let risk = PyModule::new(m.py(), "risk")?;
    risk.add("LOW", schema::risk::LOW)?;
    risk.add("MEDIUM", schema::risk::MEDIUM)?;
    risk.add("HIGH", schema::risk::HIGH)?;
    risk.add("CRITICAL", schema::risk::CRITICAL)?;
    risk.add("ALL", RiskLevel::ALL.map(|l| l.as_str()).to_vec())?;
    m.add_submodule(&risk)?;

    // Views
    let views = PyModule::new(m.py(), "views")?;
    views.add("ALL", View::ALL.map(|v| v.name()).to_vec())?;
    m.add_submodule(&views)?;

    Ok(())
}

#[pymodule]
fn supply_chain_analytics(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<SupplyChainModel>()?;
    m.add_class::<PyFilterSpec>()?;
    add_schema_exports(m)?;
    Ok(())
}
