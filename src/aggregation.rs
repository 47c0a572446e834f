use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use polars::prelude::{
    col, len, Column, DataFrame, DataType, Expr, Float64Chunked, IntoLazy, PolarsResult,
    SortMultipleOptions,
};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use tracing::debug;

use crate::error::{AnalyticsError, Result};
use crate::frame::enriched_to_frame;
use crate::model::{EnrichedRow, Field};
use crate::schema::aggregate::COUNT as COUNT_COLUMN;

/// Field name accepted by [`ReduceOp::Count`] to count rows without naming a column.
pub const ALL_ROWS: &str = "*";

/// Summary statistic computed over a field within a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReduceOp {
    Sum,
    Average,
    Count,
    Max,
    Min,
}

impl ReduceOp {
    fn suffix(&self) -> &'static str {
        match self {
            ReduceOp::Sum => "sum",
            ReduceOp::Average => "avg",
            ReduceOp::Count => "count",
            ReduceOp::Max => "max",
            ReduceOp::Min => "min",
        }
    }
}

impl FromStr for ReduceOp {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(ReduceOp::Sum),
            "avg" | "average" | "mean" => Ok(ReduceOp::Average),
            "count" => Ok(ReduceOp::Count),
            "max" => Ok(ReduceOp::Max),
            "min" => Ok(ReduceOp::Min),
            _ => Err(AnalyticsError::Validation(format!(
                "Invalid reduction: '{s}'. Must be one of sum, avg, count, max, min"
            ))),
        }
    }
}

/// Declarative reduction: `op(field) AS alias`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reduction {
    pub field: String,
    pub op: ReduceOp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

impl Reduction {
    pub fn new(field: impl Into<String>, op: ReduceOp) -> Self {
        Self {
            field: field.into(),
            op,
            alias: None,
        }
    }

    pub fn sum(field: impl Into<String>) -> Self {
        Self::new(field, ReduceOp::Sum)
    }

    pub fn avg(field: impl Into<String>) -> Self {
        Self::new(field, ReduceOp::Average)
    }

    pub fn max(field: impl Into<String>) -> Self {
        Self::new(field, ReduceOp::Max)
    }

    pub fn min(field: impl Into<String>) -> Self {
        Self::new(field, ReduceOp::Min)
    }

    /// `COUNT(*)`.
    pub fn count() -> Self {
        Self::new(ALL_ROWS, ReduceOp::Count)
    }

    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    /// Column name of this reduction in the output.
    ///
    /// Defaults to `{field}_{op}`, and `count` for row counts.
    pub fn output_name(&self) -> String {
        match (&self.alias, self.op) {
            (Some(alias), _) => alias.clone(),
            (None, ReduceOp::Count) => COUNT_COLUMN.to_string(),
            (None, op) => format!("{}_{}", self.field, op.suffix()),
        }
    }
}

impl From<(&str, ReduceOp)> for Reduction {
    fn from((field, op): (&str, ReduceOp)) -> Self {
        Self::new(field, op)
    }
}

/// Output ordering. `by: None` means the first reduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortSpec {
    #[serde(default)]
    pub by: Option<String>,
    #[serde(default = "default_descending")]
    pub descending: bool,
}

fn default_descending() -> bool {
    true
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            by: None,
            descending: true,
        }
    }
}

impl SortSpec {
    pub fn desc(by: impl Into<String>) -> Self {
        Self {
            by: Some(by.into()),
            descending: true,
        }
    }

    pub fn asc(by: impl Into<String>) -> Self {
        Self {
            by: Some(by.into()),
            descending: false,
        }
    }
}

/// One summarized row per distinct group key.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateRow {
    pub key: String,
    /// Number of input rows in the group.
    pub rows: usize,
    pub values: Vec<(String, f64)>,
}

impl AggregateRow {
    pub fn get(&self, name: &str) -> Option<f64> {
        self.values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }
}

impl Serialize for AggregateRow {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.values.len() + 1))?;
        map.serialize_entry("key", &self.key)?;
        for (name, value) in &self.values {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A grouping request: `SELECT group_by, reductions… GROUP BY group_by ORDER BY sort`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupQuery {
    pub group_by: String,
    pub reductions: Vec<Reduction>,
    #[serde(default)]
    pub sort: SortSpec,
}

impl GroupQuery {
    pub fn new(group_by: impl Into<String>) -> Self {
        Self {
            group_by: group_by.into(),
            reductions: Vec::new(),
            sort: SortSpec::default(),
        }
    }

    pub fn reduce(mut self, reduction: Reduction) -> Self {
        self.reductions.push(reduction);
        self
    }

    pub fn sort(mut self, sort: SortSpec) -> Self {
        self.sort = sort;
        self
    }

    pub fn output_names(&self) -> Vec<String> {
        self.reductions.iter().map(Reduction::output_name).collect()
    }

    pub fn run(&self, rows: &[EnrichedRow]) -> Result<Vec<AggregateRow>> {
        aggregate(rows, &self.group_by, &self.reductions, Some(&self.sort))
    }

    /// Run against an enriched frame.
    pub fn run_frame(&self, df: &DataFrame) -> Result<Vec<AggregateRow>> {
        aggregate_frame(df, &self.group_by, &self.reductions, Some(&self.sort))
    }

    /// Run against an enriched frame, keeping the result as a frame.
    pub fn summarize(&self, df: &DataFrame) -> Result<DataFrame> {
        summarize_frame(df, &self.group_by, &self.reductions, Some(&self.sort))
    }
}

impl fmt::Display for GroupQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let selects: Vec<String> = self
            .reductions
            .iter()
            .map(|r| {
                let op = match r.op {
                    ReduceOp::Sum => "SUM",
                    ReduceOp::Average => "AVG",
                    ReduceOp::Count => "COUNT",
                    ReduceOp::Max => "MAX",
                    ReduceOp::Min => "MIN",
                };
                format!("{op}({}) AS {}", r.field, r.output_name())
            })
            .collect();
        write!(f, "SELECT {}", self.group_by)?;
        for s in &selects {
            write!(f, ", {s}")?;
        }
        write!(f, " FROM batch GROUP BY {}", self.group_by)
    }
}

/// A reduction with its field resolved against the row schema.
struct Resolved {
    field: Option<Field>,
    op: ReduceOp,
    name: String,
}

fn resolve(reductions: &[Reduction]) -> Result<Vec<Resolved>> {
    let mut seen = HashSet::new();
    reductions
        .iter()
        .map(|r| {
            let field = if r.op == ReduceOp::Count && r.field == ALL_ROWS {
                None
            } else {
                let field: Field = r.field.parse()?;
                if r.op != ReduceOp::Count && field.is_categorical() {
                    return Err(AnalyticsError::Validation(format!(
                        "Cannot apply {:?} to categorical field '{}'",
                        r.op, r.field
                    )));
                }
                Some(field)
            };
            let name = r.output_name();
            if !seen.insert(name.clone()) {
                return Err(AnalyticsError::Validation(format!(
                    "Duplicate output column: {name}"
                )));
            }
            Ok(Resolved {
                field,
                op: r.op,
                name,
            })
        })
        .collect()
}

fn group_field(name: &str) -> Result<Field> {
    let field: Field = name.parse()?;
    if !field.is_categorical() {
        return Err(AnalyticsError::Validation(format!(
            "Cannot group by numeric field '{name}'"
        )));
    }
    Ok(field)
}

/// Per-group row count carried through the grouped frame.
const ROWS_COLUMN: &str = "__group_rows";

fn check_output_names(group_by: &str, resolved: &[Resolved]) -> Result<()> {
    for r in resolved {
        if r.name == group_by || r.name == ROWS_COLUMN {
            return Err(AnalyticsError::Validation(format!(
                "Output column '{}' clashes with the group key",
                r.name
            )));
        }
    }
    Ok(())
}

fn reduce_expr(r: &Resolved) -> Expr {
    let expr = match (r.op, r.field) {
        (ReduceOp::Count, _) | (_, None) => len().cast(DataType::Float64),
        (ReduceOp::Sum, Some(f)) => col(f.name()).sum(),
        (ReduceOp::Average, Some(f)) => col(f.name()).mean(),
        (ReduceOp::Max, Some(f)) => col(f.name()).max(),
        (ReduceOp::Min, Some(f)) => col(f.name()).min(),
    };
    expr.alias(r.name.as_str())
}

enum SortKey {
    Key,
    Rows,
    Value(usize),
}

/// Column to order by and its direction.
fn sort_key(group_by: &str, reductions: &[Resolved], sort: &SortSpec) -> Result<(SortKey, bool)> {
    match sort.by.as_deref() {
        // Nothing to rank by: plain key order.
        None if reductions.is_empty() => Ok((SortKey::Key, false)),
        None => Ok((SortKey::Value(0), sort.descending)),
        Some(by) => {
            let key = if let Some(i) = reductions.iter().position(|r| r.name == by) {
                SortKey::Value(i)
            } else if by == group_by || by == "key" {
                SortKey::Key
            } else if by == COUNT_COLUMN {
                SortKey::Rows
            } else {
                return Err(AnalyticsError::UnknownField(by.to_string()));
            };
            Ok((key, sort.descending))
        }
    }
}

/// Group, reduce and sort an enriched frame. The result holds the key
/// column, one column per reduction and [`ROWS_COLUMN`].
fn grouped(
    df: &DataFrame,
    group_by: &str,
    reductions: &[Reduction],
    sort: Option<&SortSpec>,
) -> Result<(DataFrame, Vec<Resolved>)> {
    group_field(group_by)?;
    let resolved = resolve(reductions)?;
    check_output_names(group_by, &resolved)?;
    let default_sort = SortSpec::default();
    let (order, descending) = sort_key(group_by, &resolved, sort.unwrap_or(&default_sort))?;

    let mut aggs: Vec<Expr> = resolved.iter().map(reduce_expr).collect();
    aggs.push(len().alias(ROWS_COLUMN));

    let by = match order {
        SortKey::Key => col(group_by),
        SortKey::Rows => col(ROWS_COLUMN),
        SortKey::Value(i) => col(resolved[i].name.as_str()),
    };

    // Ties fall back to the key, ascending.
    let out = df
        .clone()
        .lazy()
        .group_by([col(group_by)])
        .agg(aggs)
        .sort_by_exprs(
            [by, col(group_by)],
            SortMultipleOptions::default().with_order_descending_multi([descending, false]),
        )
        .collect()?;

    debug!(group_by, groups = out.height(), rows = df.height(), "aggregated batch");
    Ok((out, resolved))
}

/// Group an enriched frame (as built by [`enriched_to_frame`]) by the
/// categorical field `group_by` and reduce each group.
///
/// Ordered by `sort` (default: first reduction, descending; key ascending
/// when there are no reductions). Ties are broken by key, ascending. An
/// empty batch yields no groups.
pub fn aggregate_frame(
    df: &DataFrame,
    group_by: &str,
    reductions: &[Reduction],
    sort: Option<&SortSpec>,
) -> Result<Vec<AggregateRow>> {
    let (out, resolved) = grouped(df, group_by, reductions, sort)?;

    let keys = out.column(group_by)?.str()?;
    let counts = out.column(ROWS_COLUMN)?.cast(&DataType::UInt64)?;
    let counts = counts.u64()?;
    let value_cols: Vec<Column> = resolved
        .iter()
        .map(|r| out.column(&r.name)?.cast(&DataType::Float64))
        .collect::<PolarsResult<_>>()?;
    let values: Vec<&Float64Chunked> = value_cols
        .iter()
        .map(|c| c.f64())
        .collect::<PolarsResult<_>>()?;

    Ok((0..out.height())
        .map(|i| AggregateRow {
            key: keys.get(i).unwrap_or_default().to_string(),
            rows: counts.get(i).unwrap_or_default() as usize,
            values: resolved
                .iter()
                .zip(&values)
                .map(|(r, v)| (r.name.clone(), v.get(i).unwrap_or_default()))
                .collect(),
        })
        .collect())
}

/// Like [`aggregate_frame`], but returns the grouped frame itself: the key
/// column followed by one column per reduction.
pub fn summarize_frame(
    df: &DataFrame,
    group_by: &str,
    reductions: &[Reduction],
    sort: Option<&SortSpec>,
) -> Result<DataFrame> {
    let (out, _) = grouped(df, group_by, reductions, sort)?;
    Ok(out.drop(ROWS_COLUMN)?)
}

/// [`aggregate_frame`] over typed rows.
pub fn aggregate(
    rows: &[EnrichedRow],
    group_by: &str,
    reductions: &[Reduction],
    sort: Option<&SortSpec>,
) -> Result<Vec<AggregateRow>> {
    aggregate_frame(&enriched_to_frame(rows)?, group_by, reductions, sort)
}

/// Like [`aggregate`], but an empty batch is an error.
pub fn aggregate_non_empty(
    rows: &[EnrichedRow],
    group_by: &str,
    reductions: &[Reduction],
    sort: Option<&SortSpec>,
) -> Result<Vec<AggregateRow>> {
    if rows.is_empty() {
        return Err(AnalyticsError::EmptyBatch);
    }
    aggregate(rows, group_by, reductions, sort)
}

/// Mean of a numeric field over two categorical keys, as a dense matrix.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PivotTable {
    pub index: Vec<String>,
    pub columns: Vec<String>,
    /// `cells[i][j]` is the mean for `(index[i], columns[j])`, `None` when no row matches.
    pub cells: Vec<Vec<Option<f64>>>,
}

impl PivotTable {
    pub fn get(&self, index: &str, column: &str) -> Option<f64> {
        let i = self.index.iter().position(|k| k == index)?;
        let j = self.columns.iter().position(|k| k == column)?;
        self.cells[i][j]
    }
}

pub fn pivot_mean_frame(
    df: &DataFrame,
    index: &str,
    columns: &str,
    value: &str,
) -> Result<PivotTable> {
    group_field(index)?;
    group_field(columns)?;
    if index == columns {
        return Err(AnalyticsError::Validation(format!(
            "Pivot index and columns are both '{index}'"
        )));
    }
    let value_field: Field = value.parse()?;
    if value_field.is_categorical() {
        return Err(AnalyticsError::Validation(format!(
            "Cannot average categorical field '{value}'"
        )));
    }

    let means = df
        .clone()
        .lazy()
        .group_by([col(index), col(columns)])
        .agg([col(value).mean()])
        .sort_by_exprs([col(index), col(columns)], SortMultipleOptions::default())
        .collect()?;

    let index_col = means.column(index)?.str()?;
    let column_col = means.column(columns)?.str()?;
    let value_col = means.column(value)?.f64()?;

    // Rows arrive sorted by index, so index keys only need consecutive dedup.
    let mut index_keys: Vec<String> = Vec::new();
    let mut column_keys: BTreeSet<String> = BTreeSet::new();
    let mut cells: HashMap<(String, String), f64> = HashMap::new();
    for i in 0..means.height() {
        let (Some(r), Some(c)) = (index_col.get(i), column_col.get(i)) else {
            continue;
        };
        if index_keys.last().map(String::as_str) != Some(r) {
            index_keys.push(r.to_string());
        }
        column_keys.insert(c.to_string());
        if let Some(v) = value_col.get(i) {
            cells.insert((r.to_string(), c.to_string()), v);
        }
    }

    let columns: Vec<String> = column_keys.into_iter().collect();
    let cells = index_keys
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| cells.get(&(r.clone(), c.clone())).copied())
                .collect()
        })
        .collect();

    Ok(PivotTable {
        index: index_keys,
        columns,
        cells,
    })
}

/// [`pivot_mean_frame`] over typed rows.
pub fn pivot_mean(
    rows: &[EnrichedRow],
    index: &str,
    columns: &str,
    value: &str,
) -> Result<PivotTable> {
    pivot_mean_frame(&enriched_to_frame(rows)?, index, columns, value)
}
