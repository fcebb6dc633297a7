//! Canonical EV schema and the synonym table used to reach it.
//!
//! The canonical schema is a closed set of [`CanonicalField`]s. Each field has
//! a [`FieldKind`] that tells the cleaner how to fill gaps in it.
//! [`SynonymTable`] maps normalized header spellings (lowercased, spaces and
//! underscores stripped) onto those fields. It is built once and handed to
//! the normalizer by reference.

use std::{collections::BTreeMap, fmt};

use serde::{Serialize, Serializer};

use crate::error::{PipelineError, PipelineResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Identifier,
    Categorical,
    Numeric,
    Derived,
}

impl FieldKind {
    pub fn is_numeric(self) -> bool {
        matches!(self, FieldKind::Numeric | FieldKind::Derived)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Identifier => "identifier",
            FieldKind::Categorical => "categorical",
            FieldKind::Numeric => "numeric",
            FieldKind::Derived => "derived",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CanonicalField {
    VehicleId,
    Manufacturer,
    Model,
    Segment,
    BatteryKwh,
    RangeKm,
    ExShowroomPriceInr,
    OperatingCostInr,
    RevenueInr,
    City,
    UsageType,
    ChargingTimeHours,
    EnergyKwh,
    LocationType,
    ProfitInr,
}

impl CanonicalField {
    pub const ALL: [CanonicalField; 15] = [
        CanonicalField::VehicleId,
        CanonicalField::Manufacturer,
        CanonicalField::Model,
        CanonicalField::Segment,
        CanonicalField::BatteryKwh,
        CanonicalField::RangeKm,
        CanonicalField::ExShowroomPriceInr,
        CanonicalField::OperatingCostInr,
        CanonicalField::RevenueInr,
        CanonicalField::City,
        CanonicalField::UsageType,
        CanonicalField::ChargingTimeHours,
        CanonicalField::EnergyKwh,
        CanonicalField::LocationType,
        CanonicalField::ProfitInr,
    ];

    /// Column label used in cleaned output.
    pub fn name(self) -> &'static str {
        match self {
            CanonicalField::VehicleId => "VehicleID",
            CanonicalField::Manufacturer => "Manufacturer",
            CanonicalField::Model => "Model",
            CanonicalField::Segment => "Segment",
            CanonicalField::BatteryKwh => "BatterykWh",
            CanonicalField::RangeKm => "Rangekm",
            CanonicalField::ExShowroomPriceInr => "ExShowroomPriceINR",
            CanonicalField::OperatingCostInr => "OperatingCostINR",
            CanonicalField::RevenueInr => "RevenueINR",
            CanonicalField::City => "City",
            CanonicalField::UsageType => "UsageType",
            CanonicalField::ChargingTimeHours => "ChargingTimeHours",
            CanonicalField::EnergyKwh => "EnergykWh",
            CanonicalField::LocationType => "LocationType",
            CanonicalField::ProfitInr => "ProfitINR",
        }
    }

    pub fn kind(self) -> FieldKind {
        match self {
            CanonicalField::VehicleId => FieldKind::Identifier,
            CanonicalField::Manufacturer
            | CanonicalField::Model
            | CanonicalField::Segment
            | CanonicalField::City
            | CanonicalField::UsageType
            | CanonicalField::LocationType => FieldKind::Categorical,
            CanonicalField::BatteryKwh
            | CanonicalField::RangeKm
            | CanonicalField::ExShowroomPriceInr
            | CanonicalField::OperatingCostInr
            | CanonicalField::RevenueInr
            | CanonicalField::ChargingTimeHours
            | CanonicalField::EnergyKwh => FieldKind::Numeric,
            CanonicalField::ProfitInr => FieldKind::Derived,
        }
    }

    /// Exact lookup by canonical label.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

impl fmt::Display for CanonicalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for CanonicalField {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Aliases shipped with the tool, written the way they appear in the wild.
const BUILTIN_ALIASES: &[(&str, CanonicalField)] = &[
    ("vehicleid", CanonicalField::VehicleId),
    ("brand", CanonicalField::Manufacturer),
    ("manufacturer", CanonicalField::Manufacturer),
    ("model", CanonicalField::Model),
    ("segment", CanonicalField::Segment),
    ("battery", CanonicalField::BatteryKwh),
    ("battery_size", CanonicalField::BatteryKwh),
    ("range", CanonicalField::RangeKm),
    ("price", CanonicalField::ExShowroomPriceInr),
    ("cost", CanonicalField::OperatingCostInr),
    ("revenue", CanonicalField::RevenueInr),
    ("city", CanonicalField::City),
    ("usage", CanonicalField::UsageType),
    ("avg_charging_time_hours", CanonicalField::ChargingTimeHours),
    ("charging_time", CanonicalField::ChargingTimeHours),
    ("energy_consumed_kwh", CanonicalField::EnergyKwh),
    ("energy", CanonicalField::EnergyKwh),
    ("customer_location_type", CanonicalField::LocationType),
    ("location", CanonicalField::LocationType),
];

/// Lowercases `name` and drops every space and underscore.
pub fn normalize_key(name: &str) -> String {
    name.chars()
        .filter(|c| *c != ' ' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Clone)]
pub struct SynonymTable {
    entries: BTreeMap<String, CanonicalField>,
}

impl SynonymTable {
    /// Builds a table from `aliases`. Every non-derived canonical field is
    /// also registered under its own normalized label. Two aliases that
    /// normalize to the same key but point at different fields are rejected.
    pub fn new<'a, I>(aliases: I) -> PipelineResult<Self>
    where
        I: IntoIterator<Item = (&'a str, CanonicalField)>,
    {
        let mut entries: BTreeMap<String, CanonicalField> = BTreeMap::new();
        let identities = CanonicalField::ALL
            .into_iter()
            .filter(|field| field.kind() != FieldKind::Derived)
            .map(|field| (field.name(), field));
        for (alias, field) in identities.chain(aliases) {
            let key = normalize_key(alias);
            match entries.get(&key) {
                Some(existing) if *existing != field => {
                    return Err(PipelineError::SynonymCollision {
                        alias: alias.to_string(),
                        first: existing.name().to_string(),
                        second: field.name().to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    entries.insert(key, field);
                }
            }
        }
        Ok(Self { entries })
    }

    pub fn builtin() -> PipelineResult<Self> {
        Self::new(BUILTIN_ALIASES.iter().copied())
    }

    pub fn resolve(&self, header: &str) -> Option<CanonicalField> {
        self.entries.get(&normalize_key(header)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Normalized aliases that resolve to `field`, in key order.
    pub fn aliases_for(&self, field: CanonicalField) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|(_, target)| **target == field)
            .map(|(alias, _)| alias.as_str())
            .collect()
    }
}
