//! Polars boundary: CSV ingestion into typed rows and tabular export.

use std::path::Path;

use polars::prelude::*;
use tracing::{debug, info};

use crate::aggregation::PivotTable;
use crate::error::{AnalyticsError, Result};
use crate::model::{EnrichedRow, Field, FieldKind, Row};
use crate::schema::{csv, UNKNOWN_CATEGORY};

const WHITESPACE: &str = " \t\r\n";

// ── Ingestion ───────────────────────────────────────────────────────────────

/// Read a CSV file with all columns as String dtype.
/// Trims whitespace from column names.
pub fn read_csv_as_strings(path: &Path) -> Result<DataFrame> {
    let mut df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0)) // all columns as String
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let trimmed: Vec<String> = df
        .get_column_names_str()
        .iter()
        .map(|c| c.trim().to_string())
        .collect();
    df.set_column_names(trimmed.as_slice())?;

    Ok(df)
}

/// Load the supply-chain CSV and clean it for [`rows_from_frame`].
///
/// Numeric columns are parsed to Float64 with gaps filled by the column
/// median; empty categorical cells become `"Unknown"`. Other columns are
/// kept as strings.
pub fn read_supply_csv(path: &Path) -> Result<DataFrame> {
    let raw = read_csv_as_strings(path)?;
    let df = clean_frame(raw)?;
    info!(path = %path.display(), rows = df.height(), "loaded supply chain data");
    Ok(df)
}

pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<()> {
    for &col_name in required {
        if df.column(col_name).is_err() {
            return Err(AnalyticsError::Schema(col_name.to_string()));
        }
    }
    Ok(())
}

/// Parse numeric columns and fill missing values.
pub fn clean_frame(df: DataFrame) -> Result<DataFrame> {
    require_columns(&df, &csv::NUMERIC)?;
    require_columns(&df, &csv::CATEGORICAL)?;

    let mut parse = Vec::with_capacity(csv::NUMERIC.len());
    for name in csv::NUMERIC {
        let expr = if df.column(name)?.dtype() == &DataType::String {
            col(name).str().strip_chars(lit(WHITESPACE))
        } else {
            col(name)
        };
        parse.push(expr.cast(DataType::Float64));
    }

    let fill_numeric: Vec<Expr> = csv::NUMERIC
        .iter()
        .map(|&name| col(name).fill_null(col(name).median()))
        .collect();
    let fill_categorical: Vec<Expr> = csv::CATEGORICAL
        .iter()
        .map(|&name| {
            col(name)
                .cast(DataType::String)
                .fill_null(lit(UNKNOWN_CATEGORY))
        })
        .collect();

    let parsed = df.clone().lazy().with_columns(parse).collect()?;
    check_numeric_cells(&df, &parsed)?;

    let df = parsed
        .lazy()
        .with_columns(fill_numeric)
        .with_columns(fill_categorical)
        .collect()?;
    Ok(df)
}

/// Blank cells count as missing; any other cell that did not parse is an error.
fn check_numeric_cells(raw: &DataFrame, parsed: &DataFrame) -> Result<()> {
    for name in csv::NUMERIC {
        let raw_col = raw.column(name)?;
        if raw_col.dtype() != &DataType::String {
            continue;
        }
        let text = raw_col.str()?;
        let numbers = parsed.column(name)?.f64()?;
        let bad = text
            .iter()
            .zip(numbers.iter())
            .enumerate()
            .find_map(|(i, (cell, number))| match (cell.map(str::trim), number) {
                (Some(cell), None) if !cell.is_empty() => Some((i, cell)),
                _ => None,
            });
        if let Some((row, cell)) = bad {
            return Err(AnalyticsError::Validation(format!(
                "Non-numeric value '{cell}' in column '{name}' at row {row}"
            )));
        }
    }
    Ok(())
}

/// Convert a frame with the dataset's CSV headers into typed rows.
///
/// Fails with a schema error naming the first missing column, and with a
/// validation error on a null numeric cell.
pub fn rows_from_frame(df: &DataFrame) -> Result<Vec<Row>> {
    require_columns(df, &csv::NUMERIC)?;
    require_columns(df, &csv::CATEGORICAL)?;

    let numeric_cols: Vec<Column> = csv::NUMERIC
        .iter()
        .map(|&name| df.column(name)?.cast(&DataType::Float64))
        .collect::<PolarsResult<_>>()?;
    let numeric: Vec<&Float64Chunked> = numeric_cols
        .iter()
        .map(|c| c.f64())
        .collect::<PolarsResult<_>>()?;

    let text_cols: Vec<Column> = csv::CATEGORICAL
        .iter()
        .map(|&name| df.column(name)?.cast(&DataType::String))
        .collect::<PolarsResult<_>>()?;
    let text: Vec<&StringChunked> = text_cols
        .iter()
        .map(|c| c.str())
        .collect::<PolarsResult<_>>()?;

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let num = |j: usize| -> Result<f64> {
            numeric[j].get(i).ok_or_else(|| {
                AnalyticsError::Validation(format!(
                    "Null value in column '{}' at row {i}",
                    csv::NUMERIC[j]
                ))
            })
        };
        let cat = |j: usize| text[j].get(i).unwrap_or(UNKNOWN_CATEGORY).to_string();

        // Indices follow the order of csv::NUMERIC / csv::CATEGORICAL.
        rows.push(Row {
            revenue: num(0)?,
            manufacturing_cost: num(1)?,
            units_sold: num(2)?,
            stock_level: num(3)?,
            lead_time: num(4)?,
            defect_rate: num(5)?,
            price: num(6)?,
            order_quantity: num(7)?,
            shipping_cost: num(8)?,
            availability: num(9)?,
            product_type: cat(0),
            location: cat(1),
            supplier_name: cat(2),
            transportation_mode: cat(3),
            inspection_result: cat(4),
        });
    }

    debug!(rows = rows.len(), "converted frame to rows");
    Ok(rows)
}

// ── Export ──────────────────────────────────────────────────────────────────

/// One column per field, named by field name.
pub fn enriched_to_frame(rows: &[EnrichedRow]) -> Result<DataFrame> {
    let columns: Vec<Column> = Field::ALL
        .iter()
        .map(|&f| match f.kind() {
            FieldKind::Numeric => Column::new(
                f.name().into(),
                rows.iter()
                    .map(|r| r.number(f).unwrap_or_default())
                    .collect::<Vec<f64>>(),
            ),
            FieldKind::Categorical => Column::new(
                f.name().into(),
                rows.iter()
                    .map(|r| r.category(f).unwrap_or_default())
                    .collect::<Vec<&str>>(),
            ),
        })
        .collect();
    Ok(DataFrame::new(columns)?)
}

/// Index column named `index_name`, then one column per pivot column key.
pub fn pivot_to_frame(index_name: &str, table: &PivotTable) -> Result<DataFrame> {
    let mut columns = vec![Column::new(index_name.into(), &table.index)];
    for (j, name) in table.columns.iter().enumerate() {
        columns.push(Column::new(
            name.as_str().into(),
            table.cells.iter().map(|row| row[j]).collect::<Vec<Option<f64>>>(),
        ));
    }
    Ok(DataFrame::new(columns)?)
}

pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}
