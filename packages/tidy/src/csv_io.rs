//! CSV reading and writing for wide sheet exports and tidy tables.
//!
//! Wide sheets are read positionally: a preamble of `skip_rows` records,
//! one header record, the data, then `skip_footer` records of notes. Blank
//! lines are ignored by the CSV reader and do not count toward either
//! window. Tidy files are read by header name, so column order does not
//! matter.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr as _;

use ev_map_tidy_models::schema::{SentinelPolicy, SheetDefinition};
use ev_map_tidy_models::{
    Cell, DATE_COLUMN, MetricRecord, ORIGIN_COLUMN, REGION_CODE_COLUMN, REGION_NAME_COLUMN,
    RawTable, TidyTable, ValueOrigin,
};

use crate::TidyError;
use crate::coerce::coerce_at;

/// Reads a plain CSV whose first record is the header.
///
/// # Errors
///
/// Returns [`TidyError::Csv`] if the input is not valid CSV.
pub fn read_raw(reader: impl Read) -> Result<RawTable, TidyError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let columns: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();

    let mut rows = Vec::new();
    for result in csv_reader.records() {
        let record = result?;
        rows.push(record.iter().map(Cell::from_text).collect());
    }

    Ok(RawTable { columns, rows })
}

/// Reads a CSV export of a published worksheet using the sheet's reading
/// window.
///
/// When the definition lists its periods, the header record is replaced by
/// names built from them (see [`SheetDefinition::header_override`]).
/// Otherwise the sheet's own header is kept with its first two columns
/// renamed to the identifier columns.
///
/// # Errors
///
/// * [`TidyError::SchemaMismatch`] if the file is shorter than the reading
///   window, or the data is narrower or wider than the column names.
/// * [`TidyError::Csv`] if the input is not valid CSV.
pub fn read_wide(reader: impl Read, sheet: &SheetDefinition) -> Result<RawTable, TidyError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in csv_reader.records() {
        records.push(result?);
    }

    let available = records.len();
    if available <= sheet.skip_rows + sheet.skip_footer {
        return Err(TidyError::SchemaMismatch {
            message: format!(
                "sheet {} has {available} records, fewer than the {} preamble, 1 header and {} footer records expected",
                sheet.id, sheet.skip_rows, sheet.skip_footer
            ),
        });
    }

    let header = &records[sheet.skip_rows];
    let data = &records[sheet.skip_rows + 1..available - sheet.skip_footer];

    let columns: Vec<String> = if let Some(names) = sheet.header_override() {
        names
    } else {
        let ids = &sheet.schema.identifiers;
        header
            .iter()
            .enumerate()
            .map(|(i, h)| match i {
                0 => ids.code.clone(),
                1 => ids.name.clone(),
                _ => h.trim().to_owned(),
            })
            .collect()
    };
    check_width(sheet, data, columns.len())?;

    let rows: Vec<Vec<Cell>> = data
        .iter()
        .map(|record| {
            record
                .iter()
                .take(columns.len())
                .map(Cell::from_text)
                .collect()
        })
        .collect();

    log::info!(
        "Read sheet {} ({}): {} columns, {} data rows",
        sheet.id,
        sheet.sheet_name,
        columns.len(),
        rows.len()
    );

    Ok(RawTable { columns, rows })
}

/// Every column must reach the data, and no data cell may fall outside the
/// columns. Trailing blank cells are ignored.
fn check_width(
    sheet: &SheetDefinition,
    data: &[csv::StringRecord],
    expected: usize,
) -> Result<(), TidyError> {
    let Some(widest) = data.iter().map(csv::StringRecord::len).max() else {
        return Ok(());
    };
    let used = data
        .iter()
        .map(|record| {
            record.len() - record.iter().rev().take_while(|cell| cell.trim().is_empty()).count()
        })
        .max()
        .unwrap_or(0);

    if widest < expected || used > expected {
        return Err(TidyError::SchemaMismatch {
            message: format!(
                "sheet {} has {} data columns but {expected} column names",
                sheet.id,
                if used > expected { used } else { widest }
            ),
        });
    }
    Ok(())
}

/// Opens `path` and reads it with [`read_wide`].
///
/// # Errors
///
/// Returns [`TidyError::Io`] if the file cannot be opened, or any error
/// from [`read_wide`].
pub fn read_wide_path(path: &Path, sheet: &SheetDefinition) -> Result<RawTable, TidyError> {
    read_wide(File::open(path)?, sheet)
}

/// Reads a tidy CSV holding `metric`.
///
/// The file must carry `LA/RegionCode`, `LA/RegionName`, `Date` and a
/// column named after the metric, in any order. An optional `ValueOrigin`
/// column restores value origins; without it every record is
/// [`ValueOrigin::Observed`].
///
/// # Errors
///
/// * [`TidyError::SchemaMismatch`] if a required column is missing.
/// * [`TidyError::InvalidValue`] if a value or origin does not parse.
/// * [`TidyError::DuplicateKey`] / [`TidyError::IncompleteCoverage`] if
///   the records do not form a complete region × period grid.
/// * [`TidyError::Csv`] if the input is not valid CSV.
pub fn read_tidy(reader: impl Read, metric: &str) -> Result<TidyTable, TidyError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_owned())
        .collect();
    let find = |name: &str| headers.iter().position(|h| h == name);
    let require = |name: &str| {
        find(name).ok_or_else(|| TidyError::SchemaMismatch {
            message: format!(
                "tidy file is missing column {name:?} (found: {})",
                headers.join(", ")
            ),
        })
    };

    let code_idx = require(REGION_CODE_COLUMN)?;
    let name_idx = require(REGION_NAME_COLUMN)?;
    let date_idx = require(DATE_COLUMN)?;
    let value_idx = require(metric)?;
    let origin_idx = find(ORIGIN_COLUMN);

    let policy = SentinelPolicy::strict();
    let mut records = Vec::new();
    for (row, result) in csv_reader.records().enumerate() {
        let record = result?;
        let field = |i: usize| record.get(i).unwrap_or("").trim();

        let (metric_value, _) = coerce_at(&Cell::from_text(field(value_idx)), &policy, row, metric)?;
        let origin = match origin_idx.map(field) {
            None | Some("") => ValueOrigin::Observed,
            Some(raw) => ValueOrigin::from_str(raw).map_err(|_| TidyError::InvalidValue {
                row,
                column: ORIGIN_COLUMN.to_string(),
                raw: raw.to_string(),
            })?,
        };

        records.push(MetricRecord {
            region_code: field(code_idx).to_string(),
            region_name: field(name_idx).to_string(),
            period_label: field(date_idx).to_string(),
            metric_value,
            origin,
        });
    }

    let table = TidyTable::new(metric, records)?;
    table.check_coverage()?;

    log::info!(
        "Loaded {metric}: {} records, {} regions, {} periods",
        table.len(),
        table.region_codes().len(),
        table.period_labels().len()
    );

    Ok(table)
}

/// Opens `path` and reads it with [`read_tidy`].
///
/// # Errors
///
/// Returns [`TidyError::Io`] if the file cannot be opened, or any error
/// from [`read_tidy`].
pub fn read_tidy_path(path: &Path, metric: &str) -> Result<TidyTable, TidyError> {
    log::debug!("Reading {metric} from {}", path.display());
    read_tidy(File::open(path)?, metric)
}

/// Writes a table as tidy CSV: `LA/RegionCode, LA/RegionName, Date,
/// <metric>`, plus `ValueOrigin` when `include_origin` is set.
///
/// # Errors
///
/// Returns [`TidyError::Csv`] or [`TidyError::Io`] if writing fails.
pub fn write_tidy(
    writer: impl Write,
    table: &TidyTable,
    include_origin: bool,
) -> Result<(), TidyError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header = vec![
        REGION_CODE_COLUMN,
        REGION_NAME_COLUMN,
        DATE_COLUMN,
        table.metric(),
    ];
    if include_origin {
        header.push(ORIGIN_COLUMN);
    }
    csv_writer.write_record(&header)?;

    for record in table.records() {
        let value = record.metric_value.to_string();
        let mut fields = vec![
            record.region_code.as_str(),
            record.region_name.as_str(),
            record.period_label.as_str(),
            value.as_str(),
        ];
        if include_origin {
            fields.push(record.origin.as_ref());
        }
        csv_writer.write_record(&fields)?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Writes each table the sheet has an output for into `out_dir`, using the
/// configured file names. Tables without a configured output are skipped.
///
/// Returns the paths written.
///
/// # Errors
///
/// Returns [`TidyError::Io`] if the directory or a file cannot be created,
/// or any error from [`write_tidy`].
pub fn write_sheet_outputs(
    tables: &[TidyTable],
    sheet: &SheetDefinition,
    out_dir: &Path,
    include_origin: bool,
) -> Result<Vec<PathBuf>, TidyError> {
    std::fs::create_dir_all(out_dir)?;

    let mut written = Vec::new();
    for table in tables {
        let Some(output) = sheet.output_for(table.metric()) else {
            log::debug!("Sheet {} has no output for {}", sheet.id, table.metric());
            continue;
        };
        let path = out_dir.join(&output.file_name);
        write_tidy(File::create(&path)?, table, include_origin)?;
        log::info!("Wrote {} records to {}", table.len(), path.display());
        written.push(path);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use ev_map_tidy_models::schema::{
        IdentifierColumns, ReshapeMode, ReshapeSchema, SheetOutput,
    };

    use super::*;
    use crate::reshape::reshape;

    fn registrations_sheet() -> SheetDefinition {
        SheetDefinition {
            id: "test_ulev".to_string(),
            name: "ULEV registrations".to_string(),
            release: "veh0132".to_string(),
            sheet_name: "VEH0132a".to_string(),
            skip_rows: 2,
            skip_footer: 1,
            periods: Vec::new(),
            outputs: vec![SheetOutput {
                metric: "ULEVRegistrations".to_string(),
                file_name: "ev_registrations_ulev.csv".to_string(),
            }],
            schema: ReshapeSchema {
                identifiers: IdentifierColumns::default(),
                mode: ReshapeMode::Simple {
                    value_name: "ULEVRegistrations".to_string(),
                    column_prefix: None,
                },
                sentinels: SentinelPolicy::registrations(),
            },
        }
    }

    const REGISTRATIONS_EXPORT: &str = "\
Table VEH0132a,,,
Licensed ultra low emission vehicles,,,
ONS LA Code (Apr-2019),Region/Local Authority (Apr-2019) [note 5],2021 Q3,2021 Q2
K02000001,UNITED KINGDOM,\"457,304\",\"395,420\"
E06000001,Hartlepool,c,45
Source: DVLA,,,
";

    #[test]
    fn reads_registrations_window() {
        let raw = read_wide(REGISTRATIONS_EXPORT.as_bytes(), &registrations_sheet()).unwrap();
        assert_eq!(
            raw.columns,
            vec!["LA/RegionCode", "LA/RegionName", "2021 Q3", "2021 Q2"]
        );
        assert_eq!(raw.rows.len(), 2);
        assert_eq!(raw.cell(1, 2), &Cell::Text("c".to_string()));
    }

    #[test]
    fn window_longer_than_file_is_schema_mismatch() {
        let mut sheet = registrations_sheet();
        sheet.skip_footer = 10;
        let err = read_wide(REGISTRATIONS_EXPORT.as_bytes(), &sheet).unwrap_err();
        assert!(matches!(err, TidyError::SchemaMismatch { .. }), "{err}");
    }

    #[test]
    fn header_override_replaces_sheet_header() {
        let mut sheet = registrations_sheet();
        sheet.periods = vec!["2021 Q3".to_string(), "2021 Q2".to_string()];
        sheet.schema.mode = ReshapeMode::Simple {
            value_name: "ULEVRegistrations".to_string(),
            column_prefix: Some("Q_".to_string()),
        };
        let raw = read_wide(REGISTRATIONS_EXPORT.as_bytes(), &sheet).unwrap();
        assert_eq!(raw.columns[2], "Q_2021 Q3");

        sheet.periods.pop();
        assert!(matches!(
            read_wide(REGISTRATIONS_EXPORT.as_bytes(), &sheet),
            Err(TidyError::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn periods_missing_from_the_file_are_schema_mismatch() {
        let mut sheet = registrations_sheet();
        sheet.periods = vec![
            "2021 Q3".to_string(),
            "2021 Q2".to_string(),
            "2021 Q1".to_string(),
        ];
        let err = read_wide(REGISTRATIONS_EXPORT.as_bytes(), &sheet).unwrap_err();
        assert!(
            matches!(err, TidyError::SchemaMismatch { ref message } if message.contains("4 data columns")),
            "{err}"
        );
    }

    #[test]
    fn cells_past_the_header_are_schema_mismatch() {
        let text = "\
Table VEH0132a,,
Licensed ultra low emission vehicles,,
ONS LA Code (Apr-2019),Region/Local Authority (Apr-2019),2021 Q3
E06000001,Hartlepool,5,99
Source: DVLA,,
";
        let err = read_wide(text.as_bytes(), &registrations_sheet()).unwrap_err();
        assert!(matches!(err, TidyError::SchemaMismatch { .. }), "{err}");

        let padded = text.replace("5,99", "5,");
        let raw = read_wide(padded.as_bytes(), &registrations_sheet()).unwrap();
        assert_eq!(raw.columns.len(), 3);
        assert_eq!(raw.rows, vec![vec![
            Cell::Text("E06000001".to_string()),
            Cell::Text("Hartlepool".to_string()),
            Cell::Text("5".to_string()),
        ]]);
    }

    #[test]
    fn extract_then_write_then_read_back() {
        let sheet = registrations_sheet();
        let raw = read_wide(REGISTRATIONS_EXPORT.as_bytes(), &sheet).unwrap();
        let tables = reshape(&raw, &sheet.schema).unwrap();
        let table = &tables[0];

        let mut out = Vec::new();
        write_tidy(&mut out, table, false).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(
            text.starts_with("LA/RegionCode,LA/RegionName,Date,ULEVRegistrations\n"),
            "{text}"
        );
        assert!(text.contains("K02000001,United Kingdom,2021 Q3,457304\n"), "{text}");
        assert!(text.contains("E06000001,Hartlepool,2021 Q3,0\n"), "{text}");

        let back = read_tidy(text.as_bytes(), "ULEVRegistrations").unwrap();
        assert_eq!(back.len(), table.len());
        assert_eq!(back.period_labels(), vec!["2021 Q3", "2021 Q2"]);
        // Origins are not part of the plain tidy format.
        assert!(back.records().iter().all(|r| r.origin == ValueOrigin::Observed));
    }

    #[test]
    fn origin_column_round_trips() {
        let sheet = registrations_sheet();
        let raw = read_wide(REGISTRATIONS_EXPORT.as_bytes(), &sheet).unwrap();
        let tables = reshape(&raw, &sheet.schema).unwrap();

        let mut out = Vec::new();
        write_tidy(&mut out, &tables[0], true).unwrap();
        let back = read_tidy(out.as_slice(), "ULEVRegistrations").unwrap();
        assert_eq!(back, tables[0]);
    }

    #[test]
    fn tidy_columns_are_found_by_name() {
        let text = "\
Date,TotalDevices,LA/RegionName,LA/RegionCode
Jan-22,12,Hartlepool,E06000001
Oct-21,10,Hartlepool,E06000001
";
        let table = read_tidy(text.as_bytes(), "TotalDevices").unwrap();
        assert_eq!(table.region_codes(), vec!["E06000001"]);
        assert_eq!(table.records()[0].metric_value, 12);
    }

    #[test]
    fn missing_metric_column_is_schema_mismatch() {
        let text = "LA/RegionCode,LA/RegionName,Date,TotalDevices\nE1,A,Jan-22,1\n";
        let err = read_tidy(text.as_bytes(), "RapidDevices").unwrap_err();
        assert!(
            matches!(err, TidyError::SchemaMismatch { ref message } if message.contains("RapidDevices")),
            "{err}"
        );
    }

    #[test]
    fn tidy_values_must_be_numbers() {
        let text = "LA/RegionCode,LA/RegionName,Date,TotalDevices\nE1,A,Jan-22,c\n";
        let err = read_tidy(text.as_bytes(), "TotalDevices").unwrap_err();
        assert!(matches!(err, TidyError::InvalidValue { row: 0, .. }), "{err}");
    }

    #[test]
    fn ragged_tidy_file_is_incomplete_coverage() {
        let text = "\
LA/RegionCode,LA/RegionName,Date,TotalDevices
E1,A,Jan-22,1
E1,A,Oct-21,1
E2,B,Jan-22,1
";
        let err = read_tidy(text.as_bytes(), "TotalDevices").unwrap_err();
        assert!(
            matches!(err, TidyError::IncompleteCoverage { ref region_code, .. } if region_code == "E2"),
            "{err}"
        );
    }

    #[test]
    fn read_raw_keeps_headers() {
        let raw = read_raw("CODE,NAME,V_Jan-22\nE1,A,\n".as_bytes()).unwrap();
        assert_eq!(raw.columns, vec!["CODE", "NAME", "V_Jan-22"]);
        assert_eq!(raw.cell(0, 2), &Cell::Empty);
    }
}
