//! Sheet registry — loads all sheet definitions from embedded TOML configs.
//!
//! Each `.toml` file in `packages/tidy/sheets/` is baked into the binary at
//! compile time via [`include_str!`]. Supporting a new worksheet means
//! adding a TOML file and listing it below; one-off layouts can also be
//! loaded at runtime with [`load_sheet_file`].

use std::path::Path;

use ev_map_tidy_models::schema::SheetDefinition;

use crate::TidyError;

/// TOML configs embedded at compile time.
const SHEET_TOMLS: &[(&str, &str)] = &[
    ("veh0132a_all", include_str!("../sheets/veh0132a_all.toml")),
    ("veh0132b_bev", include_str!("../sheets/veh0132b_bev.toml")),
    ("veh0132c_phev", include_str!("../sheets/veh0132c_phev.toml")),
    ("evcd_01a", include_str!("../sheets/evcd_01a.toml")),
    ("evcd_01b", include_str!("../sheets/evcd_01b.toml")),
];

#[cfg(test)]
const EXPECTED_SHEET_COUNT: usize = 5;

/// Parses a single sheet definition.
///
/// # Errors
///
/// Returns [`TidyError::Config`] if the TOML is malformed or does not
/// describe a sheet.
pub fn parse_sheet_toml(toml_str: &str) -> Result<SheetDefinition, TidyError> {
    toml::de::from_str(toml_str).map_err(|e| TidyError::Config {
        message: e.to_string(),
    })
}

/// Reads and parses a sheet definition from disk.
///
/// # Errors
///
/// Returns [`TidyError::Io`] if the file cannot be read, or
/// [`TidyError::Config`] if it does not parse.
pub fn load_sheet_file(path: &Path) -> Result<SheetDefinition, TidyError> {
    let contents = std::fs::read_to_string(path)?;
    parse_sheet_toml(&contents).map_err(|e| match e {
        TidyError::Config { message } => TidyError::Config {
            message: format!("{}: {message}", path.display()),
        },
        other => other,
    })
}

/// Returns all configured sheet definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn all_sheets() -> Vec<SheetDefinition> {
    SHEET_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_sheet_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Looks up an embedded sheet by id.
#[must_use]
pub fn sheet(id: &str) -> Option<SheetDefinition> {
    all_sheets().into_iter().find(|s| s.id == id)
}

#[cfg(test)]
mod tests {
    use ev_map_tidy_models::schema::ReshapeMode;

    use super::*;

    #[test]
    fn loads_all_sheets() {
        assert_eq!(all_sheets().len(), EXPECTED_SHEET_COUNT);
    }

    #[test]
    fn sheet_ids_are_unique() {
        let sheets = all_sheets();
        let mut ids: Vec<&str> = sheets.iter().map(|s| s.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), EXPECTED_SHEET_COUNT);
    }

    #[test]
    fn embedded_names_match_file_names() {
        for ((name, _), sheet) in SHEET_TOMLS.iter().zip(all_sheets()) {
            assert_eq!(*name, sheet.id);
        }
    }

    #[test]
    fn every_metric_has_an_output_file() {
        for sheet in &all_sheets() {
            assert!(!sheet.name.is_empty(), "{}: name is empty", sheet.id);
            assert!(!sheet.sheet_name.is_empty(), "{}: sheet_name is empty", sheet.id);
            for metric in sheet.schema.mode.metrics() {
                let output = sheet
                    .output_for(metric)
                    .unwrap_or_else(|| panic!("{}: no output for {metric}", sheet.id));
                assert!(
                    output.file_name.ends_with(".csv"),
                    "{}: {} is not a CSV file name",
                    sheet.id,
                    output.file_name
                );
            }
        }
    }

    #[test]
    fn output_file_names_are_unique() {
        let sheets = all_sheets();
        let mut files: Vec<&str> = sheets
            .iter()
            .flat_map(|s| s.outputs.iter().map(|o| o.file_name.as_str()))
            .collect();
        let total = files.len();
        files.sort_unstable();
        files.dedup();
        assert_eq!(files.len(), total);
    }

    #[test]
    fn charge_point_sheets_list_ten_quarters() {
        let sheet = sheet("evcd_01a").unwrap();
        assert_eq!(sheet.periods.len(), 10);
        assert_eq!(sheet.periods.first().map(String::as_str), Some("Jan-22"));
        assert_eq!(sheet.periods.last().map(String::as_str), Some("Oct-19"));
        assert!(matches!(
            sheet.schema.mode,
            ReshapeMode::Composite { suffix_len: 6, .. }
        ));
        // Every period token must fit the configured suffix width.
        assert!(sheet.periods.iter().all(|p| p.chars().count() == 6));
    }

    #[test]
    fn registration_sheets_use_c_for_suppression() {
        let sheet = sheet("veh0132b_bev").unwrap();
        assert_eq!(sheet.skip_rows, 6);
        assert_eq!(sheet.skip_footer, 14);
        assert_eq!(sheet.schema.sentinels.tokens, vec!["c".to_string()]);
        assert!(sheet.header_override().is_none());
    }

    #[test]
    fn malformed_toml_is_config_error() {
        assert!(matches!(
            parse_sheet_toml("id = 1"),
            Err(TidyError::Config { .. })
        ));
    }
}
