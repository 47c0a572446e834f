//! Row selection for a dashboard request.
//!
//! A [`FilterSpec`] is an immutable value passed alongside each request;
//! nothing about the active selection lives outside it.

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::model::{RiskLevel, Row};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    /// Exact product type, `None` for all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_type: Option<String>,

    /// Exact location, `None` for all.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    /// Inclusive `(min, max)` revenue bounds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revenue_range: Option<(f64, f64)>,

    /// Inclusive upper bound on lead time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_lead_time: Option<f64>,

    /// Accepted risk levels; empty accepts every level.
    pub risk_levels: Vec<RiskLevel>,
}

impl FilterSpec {
    /// The all-pass selection.
    pub fn reset() -> Self {
        Self::default()
    }

    pub fn with_product_type(mut self, product_type: impl Into<String>) -> Self {
        self.product_type = Some(product_type.into());
        self
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_revenue_range(mut self, min: f64, max: f64) -> Self {
        self.revenue_range = Some((min, max));
        self
    }

    pub fn with_max_lead_time(mut self, max: f64) -> Self {
        self.max_lead_time = Some(max);
        self
    }

    pub fn with_risk_levels(mut self, levels: impl IntoIterator<Item = RiskLevel>) -> Self {
        self.risk_levels = levels.into_iter().collect();
        self
    }

    pub fn is_pass_all(&self) -> bool {
        *self == Self::default()
    }

    pub fn validate(&self) -> Result<()> {
        if let Some((min, max)) = self.revenue_range {
            if min.is_nan() || max.is_nan() || min > max {
                return Err(AnalyticsError::Validation(format!(
                    "Invalid revenue range: {min}..={max}"
                )));
            }
        }
        if let Some(max) = self.max_lead_time {
            if max.is_nan() {
                return Err(AnalyticsError::Validation(
                    "Invalid max lead time: NaN".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn matches(&self, row: &Row) -> bool {
        if let Some(p) = &self.product_type {
            if row.product_type != *p {
                return false;
            }
        }
        if let Some(l) = &self.location {
            if row.location != *l {
                return false;
            }
        }
        if let Some((min, max)) = self.revenue_range {
            if row.revenue < min || row.revenue > max {
                return false;
            }
        }
        if let Some(max) = self.max_lead_time {
            if row.lead_time > max {
                return false;
            }
        }
        self.risk_levels.is_empty()
            || self
                .risk_levels
                .contains(&RiskLevel::from_defect_rate(row.defect_rate))
    }

    /// Rows passing every predicate, in input order.
    pub fn apply(&self, rows: &[Row]) -> Vec<Row> {
        rows.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample_row;

    fn rows() -> Vec<Row> {
        let mut a = sample_row("haircare", 100.0);
        a.lead_time = 3.0;
        a.defect_rate = 0.2;
        let mut b = sample_row("skincare", 250.0);
        b.location = "Delhi".to_string();
        b.lead_time = 12.0;
        b.defect_rate = 3.5;
        let mut c = sample_row("haircare", 400.0);
        c.location = "Delhi".to_string();
        c.lead_time = 20.0;
        c.defect_rate = 1.5;
        vec![a, b, c]
    }

    fn revenues(rows: &[Row]) -> Vec<f64> {
        rows.iter().map(|r| r.revenue).collect()
    }

    #[test]
    fn default_passes_everything() {
        let spec = FilterSpec::reset();
        assert!(spec.is_pass_all());
        assert_eq!(spec.apply(&rows()), rows());
    }

    #[test]
    fn categorical_filters() {
        let spec = FilterSpec::default().with_product_type("haircare");
        assert_eq!(revenues(&spec.apply(&rows())), [100.0, 400.0]);

        let spec = spec.with_location("Delhi");
        assert_eq!(revenues(&spec.apply(&rows())), [400.0]);
        assert!(!spec.is_pass_all());
    }

    #[test]
    fn numeric_bounds_are_inclusive() {
        let spec = FilterSpec::default().with_revenue_range(100.0, 250.0);
        assert_eq!(revenues(&spec.apply(&rows())), [100.0, 250.0]);

        let spec = FilterSpec::default().with_max_lead_time(12.0);
        assert_eq!(revenues(&spec.apply(&rows())), [100.0, 250.0]);
    }

    #[test]
    fn risk_level_filter() {
        let spec =
            FilterSpec::default().with_risk_levels([RiskLevel::Medium, RiskLevel::High]);
        assert_eq!(revenues(&spec.apply(&rows())), [250.0, 400.0]);

        let spec = FilterSpec::default().with_risk_levels([]);
        assert_eq!(spec.apply(&rows()).len(), 3);
    }

    #[test]
    fn validate_rejects_inverted_range() {
        assert!(FilterSpec::default()
            .with_revenue_range(10.0, 1.0)
            .validate()
            .is_err());
        assert!(FilterSpec::default()
            .with_revenue_range(1.0, 1.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn deserializes_from_toml() {
        let spec: FilterSpec = toml::from_str(
            r#"
product_type = "cosmetics"
revenue_range = [1000.0, 5000.0]
risk_levels = ["Low", "Critical"]
"#,
        )
        .unwrap();
        assert_eq!(spec.product_type.as_deref(), Some("cosmetics"));
        assert_eq!(spec.location, None);
        assert_eq!(spec.revenue_range, Some((1000.0, 5000.0)));
        assert_eq!(spec.risk_levels, [RiskLevel::Low, RiskLevel::Critical]);
    }
}
