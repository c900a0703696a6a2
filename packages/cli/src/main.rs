#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the EV map toolchain.
//!
//! Extracts tidy CSVs from sheet exports, inspects their period index,
//! computes deltas, writes map snapshots as `GeoJSON`, and prints the
//! dashboard's change stamps.

use std::fs::File;
use std::io::{BufWriter, Write as _};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use ev_map_analytics::IndexedTable;
use ev_map_dashboard::{DashboardConfig, DashboardContext, Dataset, views};
use ev_map_geography::boundaries::{
    BoundaryOptions, DEFAULT_CODE_PROPERTY, DEFAULT_NAME_PROPERTY, load_boundaries,
};
use ev_map_geography::export::write_geojson;
use ev_map_geography_models::{Crs, JoinPolicy};
use ev_map_tidy::{csv_io, registry, reshape};
use ev_map_tidy_models::schema::SheetDefinition;

#[derive(Parser)]
#[command(name = "ev_map", about = "EV registrations and charge points toolchain")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the built-in sheet definitions
    Sheets,
    /// Reshape a CSV export of a sheet into tidy CSVs
    Extract {
        /// Built-in sheet id (e.g., "`evcd_01a`") or path to a sheet TOML file
        #[arg(long)]
        sheet: String,
        /// CSV export of the sheet
        #[arg(long)]
        input: PathBuf,
        /// Directory for the tidy CSVs
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
        /// Add a `ValueOrigin` column recording suppressed and missing cells
        #[arg(long)]
        with_origin: bool,
    },
    /// Print the period index of a tidy CSV
    Periods {
        #[arg(long)]
        input: PathBuf,
        /// Metric column name
        #[arg(long)]
        metric: String,
    },
    /// Compare a region's value between two period indices
    Delta {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        metric: String,
        /// Region code or name
        #[arg(long)]
        region: String,
        /// Newer period index (0 = most recent)
        #[arg(long, default_value = "0")]
        from: usize,
        /// Older period index
        #[arg(long)]
        to: usize,
    },
    /// Join one period to boundary polygons and write `GeoJSON`
    Snapshot {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        metric: String,
        /// Period label; defaults to the most recent
        #[arg(long)]
        period: Option<String>,
        /// Boundary `GeoJSON` file
        #[arg(long)]
        boundaries: PathBuf,
        /// What to do with regions that cannot be joined: drop, report or reject
        #[arg(long, default_value = "drop")]
        policy: JoinPolicy,
        /// Source CRS of the boundaries, overriding the file (4326 or 27700)
        #[arg(long)]
        source_epsg: Option<u32>,
        #[arg(long, default_value = DEFAULT_CODE_PROPERTY)]
        code_property: String,
        #[arg(long, default_value = DEFAULT_NAME_PROPERTY)]
        name_property: String,
        /// Output file; standard output if omitted
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print the dashboard's change stamps for a location
    Stamp {
        /// Dashboard config TOML
        #[arg(long)]
        config: PathBuf,
        /// Dataset id (e.g., "ulev", "`total_devices`")
        #[arg(long)]
        dataset: Dataset,
        /// Location name; defaults to the configured default location
        #[arg(long)]
        location: Option<String>,
        /// Index window as "lo,hi"; defaults to the whole timeline
        #[arg(long, value_parser = parse_window)]
        window: Option<(usize, usize)>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sheets => {
            println!("{:<16} {:<16} OUTPUTS", "ID", "SHEET");
            println!("{}", "-".repeat(72));
            for sheet in registry::all_sheets() {
                let outputs = sheet
                    .outputs
                    .iter()
                    .map(|o| o.file_name.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                println!("{:<16} {:<16} {outputs}", sheet.id, sheet.sheet_name);
            }
        }
        Commands::Extract {
            sheet,
            input,
            out_dir,
            with_origin,
        } => {
            let sheet = resolve_sheet(&sheet)?;
            log::info!("Extracting {} ({}) from {}", sheet.id, sheet.name, input.display());
            let raw = csv_io::read_wide_path(&input, &sheet)?;
            let tables = reshape(&raw, &sheet.schema)?;
            for path in csv_io::write_sheet_outputs(&tables, &sheet, &out_dir, with_origin)? {
                println!("{}", path.display());
            }
        }
        Commands::Periods { input, metric } => {
            let table = IndexedTable::from_csv_path(&input, &metric)?;
            println!("{:<6} PERIOD", "INDEX");
            for mark in table.index().marks() {
                println!("{:<6} {}", mark.index, mark.label);
            }
            for violation in table.index().chronology_violations() {
                println!(
                    "warning: {} at index {} is not older than {}",
                    violation.label, violation.index, violation.previous
                );
            }
        }
        Commands::Delta {
            input,
            metric,
            region,
            from,
            to,
        } => {
            let table = IndexedTable::from_csv_path(&input, &metric)?;
            let code = table.resolve_region(&region)?;
            let delta = table.delta(code, from, to)?;
            println!("{} ({})", delta.region_name, delta.region_code);
            println!("{:<8} {}", delta.period_start_label, delta.newer_value);
            println!("{:<8} {}", delta.period_end_label, delta.older_value);
            println!("Change   {}", delta.absolute_delta);
            println!("Change % {}%", delta.percent_delta);
        }
        Commands::Snapshot {
            input,
            metric,
            period,
            boundaries,
            policy,
            source_epsg,
            code_property,
            name_property,
            out,
        } => {
            let table = IndexedTable::from_csv_path(&input, &metric)?;
            let period = match period {
                Some(p) => p,
                None => table
                    .index()
                    .most_recent()
                    .ok_or_else(|| format!("{} has no periods", input.display()))?
                    .to_string(),
            };
            let options = BoundaryOptions {
                code_property,
                name_property,
                source_crs: source_epsg.map(Crs::from_epsg).transpose()?,
            };
            let features = load_boundaries(&boundaries, &options)?;
            let snapshot = ev_map_geography::snapshot_at(table.table(), &period, &features, policy)?;
            for row in &snapshot.excluded {
                eprintln!("excluded {} {}: {}", row.region_code, row.region_name, row.reason);
            }
            write_snapshot(&snapshot, out.as_deref())?;
        }
        Commands::Stamp {
            config,
            dataset,
            location,
            window,
        } => {
            let config = DashboardConfig::load(&config)?;
            let ctx = DashboardContext::load(config)?;
            let locations = location.map_or_else(|| ctx.config().default_locations.clone(), |l| vec![l]);
            let (lo, hi) = match window {
                Some(w) => w,
                None => views::slider(&ctx, dataset.timeline())?.default_window,
            };
            let stamp = views::stamps(&ctx, dataset, &locations, lo, hi)?;
            println!("{}: {}", stamp.total_title, stamp.total);
            println!("{}: {}", stamp.percent_title, stamp.percent);
            println!("{}", stamp.info);
        }
    }

    Ok(())
}

/// Looks up a built-in sheet, or loads one from disk when given a `.toml`
/// path.
fn resolve_sheet(sheet: &str) -> Result<SheetDefinition, Box<dyn std::error::Error>> {
    let path = Path::new(sheet);
    if path.extension().is_some_and(|e| e.eq_ignore_ascii_case("toml")) {
        return Ok(registry::load_sheet_file(path)?);
    }
    registry::sheet(sheet).ok_or_else(|| format!("Unknown sheet: {sheet}").into())
}

fn write_snapshot(
    snapshot: &ev_map_geography_models::JoinedSnapshot,
    out: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    match out {
        Some(path) => {
            let mut writer = BufWriter::new(File::create(path)?);
            write_geojson(&mut writer, snapshot)?;
            writer.flush()?;
            log::info!(
                "Wrote {} features for {} {} to {}",
                snapshot.rows.len(),
                snapshot.metric,
                snapshot.period_label,
                path.display()
            );
        }
        None => {
            let stdout = std::io::stdout();
            let mut lock = stdout.lock();
            write_geojson(&mut lock, snapshot)?;
            writeln!(lock)?;
        }
    }
    Ok(())
}

fn parse_window(s: &str) -> Result<(usize, usize), String> {
    let (lo, hi) = s
        .split_once(',')
        .ok_or_else(|| format!("expected \"lo,hi\", got {s:?}"))?;
    let parse = |v: &str| {
        v.trim()
            .parse::<usize>()
            .map_err(|e| format!("invalid index {v:?}: {e}"))
    };
    Ok((parse(lo)?, parse(hi)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_parsing() {
        assert_eq!(parse_window("0,9").unwrap(), (0, 9));
        assert_eq!(parse_window(" 2 , 3").unwrap(), (2, 3));
        assert!(parse_window("3").is_err());
        assert!(parse_window("a,1").is_err());
    }

    #[test]
    fn sheets_resolve_by_id() {
        assert_eq!(resolve_sheet("evcd_01b").unwrap().id, "evcd_01b");
        assert!(resolve_sheet("veh9999").is_err());
        assert!(resolve_sheet("missing.toml").is_err());
    }

    #[test]
    fn cli_parses_subcommands() {
        let cli = Cli::try_parse_from([
            "ev_map", "stamp", "--config", "d.toml", "--dataset", "total_devices", "--window", "0,9",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Stamp {
                dataset: Dataset::TotalDevices,
                window: Some((0, 9)),
                ..
            }
        ));

        let cli = Cli::try_parse_from([
            "ev_map", "snapshot", "--input", "t.csv", "--metric", "TotalDevices",
            "--boundaries", "b.geojson", "--policy", "report",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Snapshot {
                policy: JoinPolicy::Report,
                ref code_property,
                ..
            } if code_property == "LAD20CD"
        ));
    }

    #[test]
    fn enum_arguments_parse_through_from_str() {
        let cli = Cli::try_parse_from([
            "ev_map", "stamp", "--config", "d.toml", "--dataset", "rapid_per100k",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Commands::Stamp {
                dataset: Dataset::RapidPer100k,
                window: None,
                ..
            }
        ));

        assert!(
            Cli::try_parse_from(["ev_map", "stamp", "--config", "d.toml", "--dataset", "map1"])
                .is_err()
        );
        assert!(
            Cli::try_parse_from([
                "ev_map", "snapshot", "--input", "t.csv", "--metric", "TotalDevices",
                "--boundaries", "b.geojson", "--policy", "ignore",
            ])
            .is_err()
        );
    }
}
