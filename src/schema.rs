/// Column-name constants for the supply-chain dataset.
/// Single source of truth for CSV headers, field names and view aliases.

// ── Raw CSV columns (after header trimming) ─────────────────────────────────
pub mod csv {
    pub const REVENUE: &str = "Revenue generated";
    pub const MANUFACTURING_COST: &str = "Manufacturing costs";
    pub const UNITS_SOLD: &str = "Number of products sold";
    pub const STOCK_LEVEL: &str = "Stock levels";
    pub const LEAD_TIME: &str = "Lead times";
    pub const DEFECT_RATE: &str = "Defect rates";
    pub const PRICE: &str = "Price";
    pub const PRODUCT_TYPE: &str = "Product type";
    pub const LOCATION: &str = "Location";
    pub const SUPPLIER_NAME: &str = "Supplier name";
    pub const TRANSPORTATION_MODE: &str = "Transportation modes";
    pub const ORDER_QUANTITY: &str = "Order quantities";
    pub const SHIPPING_COST: &str = "Shipping costs";
    pub const AVAILABILITY: &str = "Availability";
    pub const INSPECTION_RESULT: &str = "Inspection results";

    pub const NUMERIC: [&str; 10] = [
        REVENUE,
        MANUFACTURING_COST,
        UNITS_SOLD,
        STOCK_LEVEL,
        LEAD_TIME,
        DEFECT_RATE,
        PRICE,
        ORDER_QUANTITY,
        SHIPPING_COST,
        AVAILABILITY,
    ];

    pub const CATEGORICAL: [&str; 5] = [
        PRODUCT_TYPE,
        LOCATION,
        SUPPLIER_NAME,
        TRANSPORTATION_MODE,
        INSPECTION_RESULT,
    ];
}

// ── Field names (raw) ───────────────────────────────────────────────────────
pub mod field {
    pub const REVENUE: &str = "revenue";
    pub const MANUFACTURING_COST: &str = "manufacturing_cost";
    pub const UNITS_SOLD: &str = "units_sold";
    pub const STOCK_LEVEL: &str = "stock_level";
    pub const LEAD_TIME: &str = "lead_time";
    pub const DEFECT_RATE: &str = "defect_rate";
    pub const PRICE: &str = "price";
    pub const PRODUCT_TYPE: &str = "product_type";
    pub const LOCATION: &str = "location";
    pub const SUPPLIER_NAME: &str = "supplier_name";
    pub const TRANSPORTATION_MODE: &str = "transportation_mode";
    pub const ORDER_QUANTITY: &str = "order_quantity";
    pub const SHIPPING_COST: &str = "shipping_cost";
    pub const AVAILABILITY: &str = "availability";
    pub const INSPECTION_RESULT: &str = "inspection_result";
}

// ── Derived field names ─────────────────────────────────────────────────────
pub mod derived {
    pub const PROFIT_MARGIN: &str = "profit_margin";
    pub const TOTAL_SHIPPING_COST: &str = "total_shipping_cost";
    pub const EFFICIENCY_RATIO: &str = "efficiency_ratio";
    pub const INVENTORY_TURNOVER: &str = "inventory_turnover";
    pub const PERFORMANCE_SCORE: &str = "performance_score";
    pub const RISK_LEVEL: &str = "risk_level";
}

// ── Risk level labels ───────────────────────────────────────────────────────
pub mod risk {
    pub const LOW: &str = "Low";
    pub const MEDIUM: &str = "Medium";
    pub const HIGH: &str = "High";
    pub const CRITICAL: &str = "Critical";
}

// ── Aggregate output columns ────────────────────────────────────────────────
pub mod aggregate {
    pub const COUNT: &str = "count";
    pub const TOTAL_REVENUE: &str = "total_revenue";
    pub const TOTAL_COSTS: &str = "total_costs";
    pub const TOTAL_ORDERS: &str = "total_orders";
    pub const PRODUCT_COUNT: &str = "product_count";
    pub const USAGE_COUNT: &str = "usage_count";
    pub const AVG_PERFORMANCE: &str = "avg_performance";
    pub const AVG_DEFECT_RATE: &str = "avg_defect_rate";
    pub const AVG_LEAD_TIME: &str = "avg_lead_time";
    pub const AVG_EFFICIENCY: &str = "avg_efficiency";
    pub const AVG_SHIPPING_COST: &str = "avg_shipping_cost";
}

/// Placeholder for categorical cells missing in the source file.
pub const UNKNOWN_CATEGORY: &str = "Unknown";
