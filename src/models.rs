//! Data models for mech records, catalog statistics and detail pages.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// One of the four weight classes a mech can belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WeightClass {
    Light,
    Medium,
    Heavy,
    Assault,
}

impl WeightClass {
    pub const ALL: [WeightClass; 4] = [
        WeightClass::Light,
        WeightClass::Medium,
        WeightClass::Heavy,
        WeightClass::Assault,
    ];

    /// Maps a tonnage onto the fixed breakpoint table.
    pub fn from_tonnage(tonnage: u32) -> Self {
        match tonnage {
            0..=35 => WeightClass::Light,
            36..=55 => WeightClass::Medium,
            56..=75 => WeightClass::Heavy,
            _ => WeightClass::Assault,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeightClass::Light => "Light",
            WeightClass::Medium => "Medium",
            WeightClass::Heavy => "Heavy",
            WeightClass::Assault => "Assault",
        }
    }
}

impl fmt::Display for WeightClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeightClass {
    type Err = String;

    /// Case-insensitive, so game exports using `"ASSAULT"` parse too.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WeightClass::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown weight class: {}", s))
    }
}

/// Where a record came from. Reset only ever touches `Uploaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Catalog,
    Uploaded,
}

/// Weapon hardpoint counts of a mech.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Hardpoints {
    #[serde(default)]
    pub energy: u32,
    #[serde(default)]
    pub ballistic: u32,
    #[serde(default)]
    pub missile: u32,
    #[serde(default)]
    pub support: u32,
}

impl Hardpoints {
    /// Sum of all four counts, saturating at `u32::MAX`.
    pub fn total(&self) -> u32 {
        self.energy
            .saturating_add(self.ballistic)
            .saturating_add(self.missile)
            .saturating_add(self.support)
    }
}

/// Accepts any JSON number, a numeric string, or null, so that `100`,
/// `100.0`, `"100"` and `-5` all load. Anything else reads as absent.
pub fn lenient_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<Value> = Option::deserialize(deserializer)?;
    Ok(value.and_then(|v| match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }))
}

/// Clamps a lenient number into a count; negatives become 0.
pub fn to_count(value: Option<f64>) -> u32 {
    value.map_or(0, |v| v.max(0.0) as u32)
}

fn lenient_u32<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?.map(|v| v.max(0.0) as u32))
}

fn lenient_u32_or_zero<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(to_count(lenient_number(deserializer)?))
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_number(deserializer)?.map(|v| v.max(0.0) as u64))
}

/// Canonical catalog record.
///
/// `total` is private and only ever computed from `hardpoints`, both when a
/// record is built and when one is deserialized, so a stale or forged total
/// from a JSON document can never reach the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredMech")]
pub struct Mech {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    pub chassis_id: String,
    pub weight_class: WeightClass,
    pub tonnage: u32,
    pub cost: u64,
    hardpoints: Hardpoints,
    total: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub source: Source,
}

/// Wire form of [`Mech`] as read back from an export or the upload cache.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredMech {
    name: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    chassis_id: String,
    weight_class: WeightClass,
    tonnage: u32,
    #[serde(default)]
    cost: u64,
    #[serde(default)]
    hardpoints: Hardpoints,
    #[serde(default)]
    details: Option<String>,
    source: Source,
}

impl From<StoredMech> for Mech {
    fn from(stored: StoredMech) -> Self {
        let mut mech = Mech::new(
            stored.name,
            stored.chassis_id,
            stored.weight_class,
            stored.tonnage,
            stored.hardpoints,
            stored.source,
        );
        mech.model = stored.model;
        mech.cost = stored.cost;
        mech.details = stored.details;
        mech
    }
}

impl Mech {
    pub fn new(
        name: String,
        chassis_id: String,
        weight_class: WeightClass,
        tonnage: u32,
        hardpoints: Hardpoints,
        source: Source,
    ) -> Self {
        Self {
            name,
            model: None,
            chassis_id,
            weight_class,
            tonnage,
            cost: 0,
            total: hardpoints.total(),
            hardpoints,
            details: None,
            source,
        }
    }

    pub fn hardpoints(&self) -> Hardpoints {
        self.hardpoints
    }

    pub fn total(&self) -> u32 {
        self.total
    }

    /// Id of this mech on the detail page.
    pub fn detail_id(&self) -> String {
        crate::normalizer::detail_id(&self.name, self.model.as_deref())
    }
}

/// Per-class counters shown above the table.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClassStats {
    pub total: usize,
    pub light: usize,
    pub medium: usize,
    pub heavy: usize,
    pub assault: usize,
}

/// A dataset document: a bare array, or an object wrapping one in `mechs`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum DatasetDocument<T> {
    Wrapped { mechs: Vec<T> },
    Bare(Vec<T>),
}

impl<T> DatasetDocument<T> {
    pub fn into_records(self) -> Vec<T> {
        match self {
            DatasetDocument::Wrapped { mechs } => mechs,
            DatasetDocument::Bare(mechs) => mechs,
        }
    }
}

// Detail page records, as found in the enhanced dataset. Numbers load as
// leniently as they do in the normalizer.

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct MechDetail {
    pub id: Option<String>,
    pub name: String,
    pub model: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    pub weight: Option<u32>,
    pub weight_class: Option<String>,
    #[serde(deserialize_with = "lenient_u32")]
    pub battle_value: Option<u32>,
    #[serde(deserialize_with = "lenient_u32")]
    pub year: Option<u32>,
    #[serde(deserialize_with = "lenient_u64")]
    pub cost: Option<u64>,
    pub manufacturer: Option<String>,
    pub source: Option<String>,
    pub hardpoints: Option<DetailHardpoints>,
    pub tech_specs: Option<TechSpecs>,
    pub locations: Option<Locations>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "PascalCase", default)]
pub struct DetailHardpoints {
    #[serde(deserialize_with = "lenient_u32_or_zero")]
    pub ballistic: u32,
    #[serde(deserialize_with = "lenient_u32_or_zero")]
    pub energy: u32,
    #[serde(deserialize_with = "lenient_u32_or_zero")]
    pub missile: u32,
    #[serde(deserialize_with = "lenient_u32_or_zero")]
    pub anti_personnel: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct TechSpecs {
    pub movement: Option<Movement>,
    pub armor: Option<ArmorSpec>,
    pub structure: Option<String>,
    pub engine: Option<EngineSpec>,
    #[serde(deserialize_with = "lenient_u32")]
    pub heat_sinks: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
#[serde(default)]
pub struct Movement {
    #[serde(deserialize_with = "lenient_u32_or_zero")]
    pub walk: u32,
    #[serde(deserialize_with = "lenient_u32_or_zero")]
    pub run: u32,
    #[serde(deserialize_with = "lenient_u32_or_zero")]
    pub jump: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct ArmorSpec {
    #[serde(deserialize_with = "lenient_u32_or_zero")]
    pub max: u32,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct EngineSpec {
    #[serde(deserialize_with = "lenient_u32_or_zero")]
    pub rating: u32,
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

/// Armor per body location; each location is optional in the source data.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Locations {
    pub head: Option<LocationArmor>,
    pub leftarm: Option<LocationArmor>,
    pub rightarm: Option<LocationArmor>,
    pub lefttorso: Option<LocationArmor>,
    pub righttorso: Option<LocationArmor>,
    pub centertorso: Option<LocationArmor>,
    pub leftleg: Option<LocationArmor>,
    pub rightleg: Option<LocationArmor>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct LocationArmor {
    #[serde(deserialize_with = "lenient_u32_or_zero")]
    pub armor: u32,
    #[serde(deserialize_with = "lenient_u32")]
    pub rear_armor: Option<u32>,
}
