//! Derived metrics.
//!
//! Every derived column is a per-row expression except the performance
//! score, which is scaled against the maxima of the batch being enriched.

use tracing::debug;

use crate::model::{EnrichedRow, RiskLevel, Row};

const REVENUE_WEIGHT: f64 = 0.4;
const LEAD_TIME_WEIGHT: f64 = 0.3;
const DEFECT_RATE_WEIGHT: f64 = 0.3;

/// Column maxima a performance score is relative to.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchMaxima {
    pub revenue: f64,
    pub lead_time: f64,
    pub defect_rate: f64,
}

impl BatchMaxima {
    pub fn of(rows: &[Row]) -> Self {
        rows.iter().fold(Self::default(), |acc, r| Self {
            revenue: acc.revenue.max(r.revenue),
            lead_time: acc.lead_time.max(r.lead_time),
            defect_rate: acc.defect_rate.max(r.defect_rate),
        })
    }

    /// Weighted score in `[0, 100]` for non-negative inputs.
    ///
    /// A term whose column maximum is zero contributes nothing.
    pub fn performance_score(&self, row: &Row) -> f64 {
        let revenue = if self.revenue > 0.0 {
            REVENUE_WEIGHT * (row.revenue / self.revenue)
        } else {
            0.0
        };
        let lead_time = if self.lead_time > 0.0 {
            LEAD_TIME_WEIGHT * (1.0 - row.lead_time / self.lead_time)
        } else {
            0.0
        };
        let defect_rate = if self.defect_rate > 0.0 {
            DEFECT_RATE_WEIGHT * (1.0 - row.defect_rate / self.defect_rate)
        } else {
            0.0
        };
        (revenue + lead_time + defect_rate) * 100.0
    }
}

/// `numerator / denominator`, or 0 when the denominator is not positive.
fn guarded_ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

pub fn enrich_row(row: &Row, maxima: &BatchMaxima) -> EnrichedRow {
    EnrichedRow {
        profit_margin: row.revenue - row.manufacturing_cost,
        total_shipping_cost: row.units_sold * row.shipping_cost,
        efficiency_ratio: guarded_ratio(row.revenue, row.manufacturing_cost),
        inventory_turnover: guarded_ratio(row.units_sold, row.stock_level),
        performance_score: maxima.performance_score(row),
        risk_level: RiskLevel::from_defect_rate(row.defect_rate),
        row: row.clone(),
    }
}

/// Enrich a batch. Output has the same length and order as `rows`.
pub fn enrich(rows: &[Row]) -> Vec<EnrichedRow> {
    let maxima = BatchMaxima::of(rows);
    debug!(rows = rows.len(), ?maxima, "enriching batch");
    rows.iter().map(|r| enrich_row(r, &maxima)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::sample_row;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn preserves_length_and_order() {
        let rows: Vec<Row> = (0..5)
            .map(|i| sample_row(&format!("p{i}"), 10.0 * i as f64))
            .collect();
        let enriched = enrich(&rows);
        assert_eq!(enriched.len(), rows.len());
        for (e, r) in enriched.iter().zip(&rows) {
            assert_eq!(&e.row, r);
        }
        assert!(enrich(&[]).is_empty());
    }

    #[test]
    fn per_row_formulas() {
        let mut row = sample_row("skincare", 100.0);
        row.manufacturing_cost = 40.0;
        row.units_sold = 10.0;
        row.shipping_cost = 2.5;
        row.stock_level = 4.0;
        row.defect_rate = 3.0;

        let e = &enrich(&[row])[0];
        assert!(close(e.profit_margin, 60.0));
        assert!(close(e.total_shipping_cost, 25.0));
        assert!(close(e.efficiency_ratio, 2.5));
        assert!(close(e.inventory_turnover, 2.5));
        assert_eq!(e.risk_level, RiskLevel::High);
    }

    #[test]
    fn profit_margin_can_be_negative() {
        let mut row = sample_row("cosmetics", 10.0);
        row.manufacturing_cost = 25.0;
        assert!(close(enrich(&[row])[0].profit_margin, -15.0));
    }

    #[test]
    fn zero_denominators_yield_zero() {
        let mut zero_cost = sample_row("a", 100.0);
        zero_cost.manufacturing_cost = 0.0;
        let mut zero_stock = sample_row("b", 100.0);
        zero_stock.stock_level = 0.0;

        let enriched = enrich(&[zero_cost, zero_stock]);
        assert_eq!(enriched[0].efficiency_ratio, 0.0);
        assert!(enriched[0].inventory_turnover > 0.0);
        assert_eq!(enriched[1].inventory_turnover, 0.0);
        assert!(enriched[1].efficiency_ratio > 0.0);
    }

    #[test]
    fn performance_score_uses_batch_maxima() {
        let mut best = sample_row("a", 200.0);
        best.lead_time = 0.0;
        best.defect_rate = 0.0;
        let mut worst = sample_row("b", 0.0);
        worst.lead_time = 10.0;
        worst.defect_rate = 4.0;
        let mut middle = sample_row("c", 100.0);
        middle.lead_time = 5.0;
        middle.defect_rate = 2.0;

        let enriched = enrich(&[best, worst, middle]);
        assert!(close(enriched[0].performance_score, 100.0));
        assert!(close(enriched[1].performance_score, 0.0));
        assert!(close(enriched[2].performance_score, 50.0));
    }

    #[test]
    fn zero_maxima_drop_their_terms() {
        let mut a = sample_row("a", 100.0);
        a.lead_time = 0.0;
        a.defect_rate = 0.0;
        let mut b = sample_row("b", 50.0);
        b.lead_time = 0.0;
        b.defect_rate = 0.0;

        let enriched = enrich(&[a, b]);
        assert!(close(enriched[0].performance_score, 40.0));
        assert!(close(enriched[1].performance_score, 20.0));
        assert!(enriched.iter().all(|e| e.performance_score.is_finite()));

        let mut zero = sample_row("z", 0.0);
        zero.lead_time = 0.0;
        zero.defect_rate = 0.0;
        assert_eq!(enrich(&[zero])[0].performance_score, 0.0);
    }

    #[test]
    fn performance_score_is_scale_invariant() {
        let rows: Vec<Row> = [(120.0, 3.0, 0.4), (80.0, 9.0, 2.2), (45.0, 6.0, 4.9)]
            .into_iter()
            .map(|(rev, lead, defect)| {
                let mut r = sample_row("x", rev);
                r.lead_time = lead;
                r.defect_rate = defect;
                r
            })
            .collect();
        let scaled: Vec<Row> = rows
            .iter()
            .map(|r| {
                let mut r = r.clone();
                r.revenue *= 7.5;
                r.lead_time *= 0.25;
                r.defect_rate *= 3.0;
                r
            })
            .collect();

        let base = enrich(&rows);
        let rescaled = enrich(&scaled);
        for (a, b) in base.iter().zip(&rescaled) {
            assert!((a.performance_score - b.performance_score).abs() < 1e-9);
        }
    }

    #[test]
    fn score_changes_with_batch_membership() {
        let small = sample_row("a", 50.0);
        let large = sample_row("b", 100.0);
        let alone = enrich(std::slice::from_ref(&small))[0].performance_score;
        let together = enrich(&[small, large])[0].performance_score;
        assert!(alone > together);
    }
}
