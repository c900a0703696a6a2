//! Wide-to-long reshaping.
//!
//! A wide sheet has two identifier columns followed by one column per
//! period (simple sheets) or one column per metric family per period
//! (composite sheets, e.g. `TotalDevicesJan-22` next to
//! `Per100kPopulationJan-22`). [`reshape`] melts those into one tidy table
//! per metric; [`pivot_wide`] puts them back.

use std::collections::BTreeMap;

use ev_map_tidy_models::schema::{ReshapeMode, ReshapeSchema};
use ev_map_tidy_models::{Cell, MetricRecord, RawTable, TidyTable};

use crate::TidyError;
use crate::coerce::coerce_at;
use crate::normalize::normalize_name;

/// A period column resolved to the metric it feeds and its period label.
struct PeriodColumn<'a> {
    index: usize,
    header: &'a str,
    metric: &'a str,
    label: &'a str,
}

/// A data row's region identity.
struct Region {
    row: usize,
    code: String,
    name: String,
}

/// Unpivots a wide table into one [`TidyTable`] per metric, in the order
/// the schema lists them.
///
/// Records are emitted period-major: every region for the first period
/// column, then every region for the next, so period labels keep their
/// sheet order (most recent first in DfT releases).
///
/// # Errors
///
/// * [`TidyError::SchemaMismatch`] if an identifier column is missing, a
///   period column cannot be decomposed, a metric family has no columns,
///   or a data row has no region code.
/// * [`TidyError::DuplicateKey`] if a region or a period repeats within one
///   table.
/// * [`TidyError::InvalidValue`] if a cell cannot be coerced.
pub fn reshape(raw: &RawTable, schema: &ReshapeSchema) -> Result<Vec<TidyTable>, TidyError> {
    let ids = &schema.identifiers;
    let code_idx = require_column(raw, &ids.code)?;
    let name_idx = require_column(raw, &ids.name)?;

    let columns = decompose_columns(raw, &schema.mode, code_idx, name_idx)?;
    let regions = read_regions(raw, code_idx, name_idx)?;

    let mut tables = Vec::new();
    for metric in schema.mode.metrics() {
        let metric_columns: Vec<&PeriodColumn<'_>> =
            columns.iter().filter(|c| c.metric == metric).collect();
        if metric_columns.is_empty() {
            return Err(TidyError::SchemaMismatch {
                message: format!("no period columns found for metric family {metric:?}"),
            });
        }

        let mut records = Vec::with_capacity(metric_columns.len() * regions.len());
        for column in &metric_columns {
            for region in &regions {
                let cell = raw.cell(region.row, column.index);
                let (metric_value, origin) =
                    coerce_at(cell, &schema.sentinels, region.row, column.header)?;
                records.push(MetricRecord {
                    region_code: region.code.clone(),
                    region_name: region.name.clone(),
                    period_label: column.label.to_string(),
                    metric_value,
                    origin,
                });
            }
        }

        let table = TidyTable::new(metric, records)?;
        log::info!(
            "Reshaped {} regions x {} periods into {metric} ({} records)",
            regions.len(),
            metric_columns.len(),
            table.len()
        );
        tables.push(table);
    }

    Ok(tables)
}

/// Rebuilds the wide table that [`reshape`] would turn into `tables`.
///
/// Regions and periods follow the order of the first table. Composite
/// sheets interleave families per period, as DfT lays them out. Values
/// come back as [`Cell::Number`]; a region/period with no record becomes
/// [`Cell::Empty`].
///
/// # Errors
///
/// Returns [`TidyError::SchemaMismatch`] if a metric named by the schema
/// has no table.
pub fn pivot_wide(tables: &[TidyTable], schema: &ReshapeSchema) -> Result<RawTable, TidyError> {
    let metrics = schema.mode.metrics();
    let mut lookups = Vec::with_capacity(metrics.len());
    for metric in &metrics {
        let table = tables
            .iter()
            .find(|t| t.metric() == *metric)
            .ok_or_else(|| TidyError::SchemaMismatch {
                message: format!("no table for metric {metric:?}"),
            })?;
        let values: BTreeMap<(&str, &str), i64> = table
            .records()
            .iter()
            .map(|r| ((r.region_code.as_str(), r.period_label.as_str()), r.metric_value))
            .collect();
        lookups.push((*metric, values));
    }

    let Some(first) = metrics
        .first()
        .and_then(|m| tables.iter().find(|t| t.metric() == *m))
    else {
        return Ok(RawTable::default());
    };
    let labels = first.period_labels();

    // (header, metric position, label)
    let mut layout: Vec<(String, usize, &str)> = Vec::new();
    match &schema.mode {
        ReshapeMode::Simple { column_prefix, .. } => {
            let prefix = column_prefix.as_deref().unwrap_or("");
            layout.extend(labels.iter().map(|l| (format!("{prefix}{l}"), 0, *l)));
        }
        ReshapeMode::Composite { families, .. } => {
            for label in &labels {
                for (i, family) in families.iter().enumerate() {
                    layout.push((format!("{family}{label}"), i, *label));
                }
            }
        }
    }

    let mut columns = vec![schema.identifiers.code.clone(), schema.identifiers.name.clone()];
    columns.extend(layout.iter().map(|(header, _, _)| header.clone()));

    let mut names: BTreeMap<&str, &str> = BTreeMap::new();
    for record in first.records() {
        names
            .entry(record.region_code.as_str())
            .or_insert(record.region_name.as_str());
    }

    let rows = first
        .region_codes()
        .into_iter()
        .map(|code| {
            let mut row = vec![
                Cell::Text(code.to_string()),
                Cell::Text(names.get(code).copied().unwrap_or_default().to_string()),
            ];
            #[allow(clippy::cast_precision_loss)]
            row.extend(layout.iter().map(|(_, metric_pos, label)| {
                lookups[*metric_pos]
                    .1
                    .get(&(code, *label))
                    .map_or(Cell::Empty, |v| Cell::Number(*v as f64))
            }));
            row
        })
        .collect();

    Ok(RawTable { columns, rows })
}

fn require_column(raw: &RawTable, name: &str) -> Result<usize, TidyError> {
    raw.column_index(name)
        .ok_or_else(|| TidyError::SchemaMismatch {
            message: format!(
                "identifier column {name:?} not found in [{}]",
                raw.columns.join(", ")
            ),
        })
}

fn decompose_columns<'a>(
    raw: &'a RawTable,
    mode: &'a ReshapeMode,
    code_idx: usize,
    name_idx: usize,
) -> Result<Vec<PeriodColumn<'a>>, TidyError> {
    let mut columns = Vec::new();
    for (index, header) in raw.columns.iter().enumerate() {
        if index == code_idx || index == name_idx {
            continue;
        }
        let (metric, label) = decompose(header, mode)?;
        columns.push(PeriodColumn {
            index,
            header,
            metric,
            label,
        });
    }
    Ok(columns)
}

/// Splits a period column header into `(metric, period label)`.
fn decompose<'a>(header: &'a str, mode: &'a ReshapeMode) -> Result<(&'a str, &'a str), TidyError> {
    match mode {
        ReshapeMode::Simple {
            value_name,
            column_prefix,
        } => {
            let label = match column_prefix {
                Some(prefix) => header.strip_prefix(prefix.as_str()).ok_or_else(|| {
                    TidyError::SchemaMismatch {
                        message: format!("column {header:?} does not start with {prefix:?}"),
                    }
                })?,
                None => header,
            };
            if label.trim().is_empty() {
                return Err(TidyError::SchemaMismatch {
                    message: format!("column {header:?} has no period label"),
                });
            }
            Ok((value_name.as_str(), label))
        }
        ReshapeMode::Composite {
            families,
            suffix_len,
        } => {
            let (family, label) =
                split_suffix(header, *suffix_len).ok_or_else(|| TidyError::SchemaMismatch {
                    message: format!(
                        "column {header:?} is too short for a {suffix_len}-character period suffix"
                    ),
                })?;
            let family = families
                .iter()
                .find(|f| f.as_str() == family)
                .ok_or_else(|| TidyError::SchemaMismatch {
                    message: format!(
                        "column {header:?} has unknown metric family {family:?} (expected one of: {})",
                        families.join(", ")
                    ),
                })?;
            Ok((family.as_str(), label))
        }
    }
}

/// Splits off the last `suffix_len` characters.
fn split_suffix(header: &str, suffix_len: usize) -> Option<(&str, &str)> {
    let count = header.chars().count();
    if count <= suffix_len {
        return None;
    }
    let (at, _) = header.char_indices().nth(count - suffix_len)?;
    Some(header.split_at(at))
}

fn read_regions(raw: &RawTable, code_idx: usize, name_idx: usize) -> Result<Vec<Region>, TidyError> {
    let mut regions = Vec::with_capacity(raw.rows.len());
    for (row, cells) in raw.rows.iter().enumerate() {
        if cells.iter().all(|c| matches!(c, Cell::Empty)) {
            log::debug!("Skipping blank row {row}");
            continue;
        }
        let code = raw.cell(row, code_idx).to_text().trim().to_string();
        if code.is_empty() {
            return Err(TidyError::SchemaMismatch {
                message: format!("row {row} has no region code"),
            });
        }
        let name = normalize_name(&raw.cell(row, name_idx).to_text());
        regions.push(Region { row, code, name });
    }
    Ok(regions)
}
