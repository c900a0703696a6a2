//! The datasets the dashboard shows and the titles of every view of them.
//!
//! Each (dataset, view) pair resolves through [`VIEW_SPECS`]; nothing else
//! in the dashboard matches on view names.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator as _;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};

/// A tidy table the dashboard loads.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Dataset {
    /// Ultra low emission vehicle registrations.
    Ulev,
    /// Plug-in hybrid registrations (a subset of ULEV).
    Phev,
    /// Battery electric registrations (a subset of ULEV).
    Bev,
    /// All public charging devices.
    TotalDevices,
    /// Rapid public charging devices.
    RapidDevices,
    /// All public charging devices per 100,000 population.
    TotalPer100k,
    /// Rapid public charging devices per 100,000 population.
    RapidPer100k,
}

/// Which period axis a dataset is plotted on. Datasets sharing a timeline
/// share one range slider.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Timeline {
    /// Quarterly vehicle registrations (`2021 Q3`).
    Registrations,
    /// Quarterly charge point counts, labelled by month (`Jan-22`).
    ChargePoints,
}

impl Timeline {
    /// The dataset whose periods label this timeline's slider and period
    /// dropdown.
    #[must_use]
    pub const fn reference_dataset(self) -> Dataset {
        match self {
            Self::Registrations => Dataset::Ulev,
            Self::ChargePoints => Dataset::TotalDevices,
        }
    }
}

impl Dataset {
    /// Metric column in the dataset's tidy file.
    #[must_use]
    pub const fn metric(self) -> &'static str {
        match self {
            Self::Ulev => "ULEVRegistrations",
            Self::Phev => "PHEVRegistrations",
            Self::Bev => "BEVRegistrations",
            Self::TotalDevices => "TotalDevices",
            Self::RapidDevices => "RapidDevices",
            Self::TotalPer100k | Self::RapidPer100k => "Per100kPopulation",
        }
    }

    /// Tidy file written by the extractor for this dataset.
    #[must_use]
    pub const fn default_file_name(self) -> &'static str {
        match self {
            Self::Ulev => "ev_registrations_ulev.csv",
            Self::Phev => "ev_registrations_phev.csv",
            Self::Bev => "ev_registrations_bev.csv",
            Self::TotalDevices => "charge_points_devices_total.csv",
            Self::RapidDevices => "charge_points_devices_rapid.csv",
            Self::TotalPer100k => "charge_points_per_100k_total.csv",
            Self::RapidPer100k => "charge_points_per_100k_rapid.csv",
        }
    }

    #[must_use]
    pub const fn timeline(self) -> Timeline {
        match self {
            Self::Ulev | Self::Phev | Self::Bev => Timeline::Registrations,
            Self::TotalDevices | Self::RapidDevices | Self::TotalPer100k | Self::RapidPer100k => {
                Timeline::ChargePoints
            }
        }
    }

    /// Every dataset, in menu order.
    pub fn all() -> impl Iterator<Item = Self> {
        Self::iter()
    }
}

/// A way of presenting a dataset.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
    EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ViewKind {
    /// Choropleth map of one period.
    Map,
    /// Line chart over a period window.
    Chart,
    /// Absolute change across a period window.
    StampTotal,
    /// Percentage change across a period window.
    StampPercent,
}

/// Labels for one (dataset, view) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewSpec {
    pub dataset: Dataset,
    pub kind: ViewKind,
    /// Entry in the view's selection dropdown, if it has one.
    pub option_label: Option<&'static str>,
    /// Heading shown above the view.
    pub title: &'static str,
}

const fn spec(
    dataset: Dataset,
    kind: ViewKind,
    option_label: Option<&'static str>,
    title: &'static str,
) -> ViewSpec {
    ViewSpec {
        dataset,
        kind,
        option_label,
        title,
    }
}

/// Every view the dashboard offers, in menu order within each kind.
pub static VIEW_SPECS: &[ViewSpec] = &[
    // Maps
    spec(Dataset::Ulev, ViewKind::Map, Some("Map 1: Total ULEVs"), "Total ULEV Registrations by LAD, Quarter and Year"),
    spec(Dataset::Phev, ViewKind::Map, Some("Map 2: Total PHEVs"), "Total PHEV Registrations by LAD, Quarter and Year"),
    spec(Dataset::Bev, ViewKind::Map, Some("Map 3: Total BEVs"), "Total BEV Registrations by LAD, Quarter and Year"),
    spec(Dataset::TotalDevices, ViewKind::Map, Some("Map 4: Total EVCPs"), "Total EV Charge Points by LAD, Month and Year"),
    spec(Dataset::RapidDevices, ViewKind::Map, Some("Map 5: Rapid EVCPs"), "Rapid EV Charge Points by LAD, Month and Year"),
    spec(Dataset::TotalPer100k, ViewKind::Map, Some("Map 6: Total Per100K EVCPS"), "Total EV Charge Points per 100k Population by LAD, Month and Year"),
    spec(Dataset::RapidPer100k, ViewKind::Map, Some("Map 7: Rapid Per100K EVCPS"), "Rapid EV Charge Points per 100k Population by LAD, Month and Year"),
    // Charts
    spec(Dataset::Ulev, ViewKind::Chart, Some("EV Chart 1: ULEV"), "ULEV Registrations by Location, Quarter and Year"),
    spec(Dataset::Phev, ViewKind::Chart, Some("EV Chart 2: PHEV"), "PHEV Registrations by Location, Quarter and Year"),
    spec(Dataset::Bev, ViewKind::Chart, Some("EV Chart 3: BEV"), "BEV Registrations by Location, Quarter and Year"),
    spec(Dataset::TotalDevices, ViewKind::Chart, Some("EVCP Chart 1: Total Devices"), "Total Electric Vehicle Charge Points by Location, Month and Year"),
    spec(Dataset::RapidDevices, ViewKind::Chart, Some("EVCP Chart 2: Rapid Devices"), "Rapid Electric Vehicle Charge Points by Location, Month and Year"),
    // Stamps
    spec(Dataset::Ulev, ViewKind::StampTotal, None, "ULEV Registrations Change - Total"),
    spec(Dataset::Ulev, ViewKind::StampPercent, None, "ULEV Registrations Change - %"),
    spec(Dataset::Phev, ViewKind::StampTotal, None, "PHEV Registrations Change - Total"),
    spec(Dataset::Phev, ViewKind::StampPercent, None, "PHEV Registrations Change - %"),
    spec(Dataset::Bev, ViewKind::StampTotal, None, "BEV Registrations Change - Total"),
    spec(Dataset::Bev, ViewKind::StampPercent, None, "BEV Registrations Change - %"),
    spec(Dataset::TotalDevices, ViewKind::StampTotal, None, "Total Charge Points Change - Total"),
    spec(Dataset::TotalDevices, ViewKind::StampPercent, None, "Total Charge Points Change - %"),
    spec(Dataset::RapidDevices, ViewKind::StampTotal, None, "Rapid Charge Points Change - Total"),
    spec(Dataset::RapidDevices, ViewKind::StampPercent, None, "Rapid Charge Points Change - %"),
];

/// Looks up the labels of a (dataset, view) pair.
///
/// Returns `None` for pairs the dashboard does not offer, such as charts
/// of per-100k datasets.
#[must_use]
pub fn view_spec(dataset: Dataset, kind: ViewKind) -> Option<&'static ViewSpec> {
    VIEW_SPECS
        .iter()
        .find(|s| s.dataset == dataset && s.kind == kind)
}

/// Views of one kind, in menu order.
pub fn views_of(kind: ViewKind) -> impl Iterator<Item = &'static ViewSpec> {
    VIEW_SPECS.iter().filter(move |s| s.kind == kind)
}
