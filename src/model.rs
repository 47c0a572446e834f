use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, Result};
use crate::schema::{derived, field, risk};

/// One record of raw supply-chain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub revenue: f64,
    pub manufacturing_cost: f64,
    pub units_sold: f64,
    pub stock_level: f64,
    pub lead_time: f64,
    pub defect_rate: f64,
    pub price: f64,
    pub product_type: String,
    pub location: String,
    pub supplier_name: String,
    pub transportation_mode: String,
    pub order_quantity: f64,
    pub shipping_cost: f64,
    pub availability: f64,
    pub inspection_result: String,
}

/// Defect-rate bucket.
///
/// Bins are left-closed: `[0,1)` Low, `[1,3)` Medium, `[3,5)` High,
/// `[5,∞)` Critical.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub const ALL: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Medium,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    pub fn from_defect_rate(rate: f64) -> Self {
        if rate >= 5.0 {
            RiskLevel::Critical
        } else if rate >= 3.0 {
            RiskLevel::High
        } else if rate >= 1.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => risk::LOW,
            RiskLevel::Medium => risk::MEDIUM,
            RiskLevel::High => risk::HIGH,
            RiskLevel::Critical => risk::CRITICAL,
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        RiskLevel::ALL
            .into_iter()
            .find(|level| level.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                AnalyticsError::Validation(format!(
                    "Invalid risk level: '{s}'. Must be one of Low, Medium, High, Critical"
                ))
            })
    }
}

/// A [`Row`] plus the derived analytical fields.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnrichedRow {
    #[serde(flatten)]
    pub row: Row,
    pub profit_margin: f64,
    pub total_shipping_cost: f64,
    pub efficiency_ratio: f64,
    pub inventory_turnover: f64,
    pub performance_score: f64,
    pub risk_level: RiskLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Numeric,
    Categorical,
}

/// Every addressable column of an [`EnrichedRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Revenue,
    ManufacturingCost,
    UnitsSold,
    StockLevel,
    LeadTime,
    DefectRate,
    Price,
    ProductType,
    Location,
    SupplierName,
    TransportationMode,
    OrderQuantity,
    ShippingCost,
    Availability,
    InspectionResult,
    ProfitMargin,
    TotalShippingCost,
    EfficiencyRatio,
    InventoryTurnover,
    PerformanceScore,
    RiskLevel,
}

impl Field {
    pub const ALL: [Field; 21] = [
        Field::Revenue,
        Field::ManufacturingCost,
        Field::UnitsSold,
        Field::StockLevel,
        Field::LeadTime,
        Field::DefectRate,
        Field::Price,
        Field::ProductType,
        Field::Location,
        Field::SupplierName,
        Field::TransportationMode,
        Field::OrderQuantity,
        Field::ShippingCost,
        Field::Availability,
        Field::InspectionResult,
        Field::ProfitMargin,
        Field::TotalShippingCost,
        Field::EfficiencyRatio,
        Field::InventoryTurnover,
        Field::PerformanceScore,
        Field::RiskLevel,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Field::Revenue => field::REVENUE,
            Field::ManufacturingCost => field::MANUFACTURING_COST,
            Field::UnitsSold => field::UNITS_SOLD,
            Field::StockLevel => field::STOCK_LEVEL,
            Field::LeadTime => field::LEAD_TIME,
            Field::DefectRate => field::DEFECT_RATE,
            Field::Price => field::PRICE,
            Field::ProductType => field::PRODUCT_TYPE,
            Field::Location => field::LOCATION,
            Field::SupplierName => field::SUPPLIER_NAME,
            Field::TransportationMode => field::TRANSPORTATION_MODE,
            Field::OrderQuantity => field::ORDER_QUANTITY,
            Field::ShippingCost => field::SHIPPING_COST,
            Field::Availability => field::AVAILABILITY,
            Field::InspectionResult => field::INSPECTION_RESULT,
            Field::ProfitMargin => derived::PROFIT_MARGIN,
            Field::TotalShippingCost => derived::TOTAL_SHIPPING_COST,
            Field::EfficiencyRatio => derived::EFFICIENCY_RATIO,
            Field::InventoryTurnover => derived::INVENTORY_TURNOVER,
            Field::PerformanceScore => derived::PERFORMANCE_SCORE,
            Field::RiskLevel => derived::RISK_LEVEL,
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            Field::ProductType
            | Field::Location
            | Field::SupplierName
            | Field::TransportationMode
            | Field::InspectionResult
            | Field::RiskLevel => FieldKind::Categorical,
            _ => FieldKind::Numeric,
        }
    }

    pub fn is_categorical(&self) -> bool {
        self.kind() == FieldKind::Categorical
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        Field::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| AnalyticsError::UnknownField(s.to_string()))
    }
}

/// A single cell read from an [`EnrichedRow`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Number(f64),
    Category(&'a str),
}

impl EnrichedRow {
    pub fn value(&self, field: Field) -> FieldValue<'_> {
        use FieldValue::{Category, Number};
        let r = &self.row;
        match field {
            Field::Revenue => Number(r.revenue),
            Field::ManufacturingCost => Number(r.manufacturing_cost),
            Field::UnitsSold => Number(r.units_sold),
            Field::StockLevel => Number(r.stock_level),
            Field::LeadTime => Number(r.lead_time),
            Field::DefectRate => Number(r.defect_rate),
            Field::Price => Number(r.price),
            Field::ProductType => Category(&r.product_type),
            Field::Location => Category(&r.location),
            Field::SupplierName => Category(&r.supplier_name),
            Field::TransportationMode => Category(&r.transportation_mode),
            Field::OrderQuantity => Number(r.order_quantity),
            Field::ShippingCost => Number(r.shipping_cost),
            Field::Availability => Number(r.availability),
            Field::InspectionResult => Category(&r.inspection_result),
            Field::ProfitMargin => Number(self.profit_margin),
            Field::TotalShippingCost => Number(self.total_shipping_cost),
            Field::EfficiencyRatio => Number(self.efficiency_ratio),
            Field::InventoryTurnover => Number(self.inventory_turnover),
            Field::PerformanceScore => Number(self.performance_score),
            Field::RiskLevel => Category(self.risk_level.as_str()),
        }
    }

    /// Numeric cell, `None` for categorical fields.
    pub fn number(&self, field: Field) -> Option<f64> {
        match self.value(field) {
            FieldValue::Number(v) => Some(v),
            FieldValue::Category(_) => None,
        }
    }

    /// Categorical cell, `None` for numeric fields.
    pub fn category(&self, field: Field) -> Option<&str> {
        match self.value(field) {
            FieldValue::Category(s) => Some(s),
            FieldValue::Number(_) => None,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_row(product_type: &str, revenue: f64) -> Row {
        Row {
            revenue,
            manufacturing_cost: 40.0,
            units_sold: 10.0,
            stock_level: 20.0,
            lead_time: 5.0,
            defect_rate: 0.5,
            price: 12.5,
            product_type: product_type.to_string(),
            location: "Mumbai".to_string(),
            supplier_name: "Supplier 1".to_string(),
            transportation_mode: "Road".to_string(),
            order_quantity: 30.0,
            shipping_cost: 2.0,
            availability: 50.0,
            inspection_result: "Pass".to_string(),
        }
    }

    #[test]
    fn risk_level_boundaries() {
        let rates = [0.999, 1.0, 2.999, 3.0, 4.999, 5.0, 5.001];
        let expected = [
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::High,
            RiskLevel::Critical,
            RiskLevel::Critical,
        ];
        for (rate, want) in rates.iter().zip(expected) {
            assert_eq!(RiskLevel::from_defect_rate(*rate), want, "rate {rate}");
        }
        assert_eq!(RiskLevel::from_defect_rate(0.0), RiskLevel::Low);
    }

    #[test]
    fn risk_level_parses_labels() {
        assert_eq!("High".parse::<RiskLevel>().unwrap(), RiskLevel::High);
        assert_eq!("critical".parse::<RiskLevel>().unwrap(), RiskLevel::Critical);
        assert!("Severe".parse::<RiskLevel>().is_err());
    }

    #[test]
    fn field_names_round_trip() {
        for f in Field::ALL {
            assert_eq!(f.name().parse::<Field>().unwrap(), f);
        }
        assert!(matches!(
            "Revenue generated".parse::<Field>(),
            Err(AnalyticsError::UnknownField(_))
        ));
    }

    #[test]
    fn value_lookup_respects_kind() {
        let row = EnrichedRow {
            row: sample_row("haircare", 100.0),
            profit_margin: 60.0,
            total_shipping_cost: 20.0,
            efficiency_ratio: 2.5,
            inventory_turnover: 0.5,
            performance_score: 80.0,
            risk_level: RiskLevel::Low,
        };
        assert_eq!(row.number(Field::Revenue), Some(100.0));
        assert_eq!(row.number(Field::ProductType), None);
        assert_eq!(row.category(Field::ProductType), Some("haircare"));
        assert_eq!(row.category(Field::RiskLevel), Some("Low"));
        assert_eq!(row.number(Field::PerformanceScore), Some(80.0));
    }
}
