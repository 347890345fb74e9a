//! Record normalizer - turns one raw mech JSON value into a canonical [`Mech`].
//!
//! Source documents come in two families: the raw game export (a chassis id
//! plus a `Description` object, optionally an inventory and tags) and the
//! already-canonical form written by exports and the enhanced dataset. The
//! shape is resolved once, into [`RawMech`], and every later step works on
//! the typed variant.

use serde::Deserialize;
use serde_json::Value;

use crate::error::CatalogError;
use crate::models::{lenient_number, to_count, Hardpoints, Mech, Source, WeightClass};

const UNKNOWN_NAME: &str = "Unknown Mech";
const DEFAULT_TONNAGE: u32 = 50;
const TONNAGE_TAG: &str = "unit_tonnage_";

const ENERGY_KEYWORDS: &[&str] = &["laser", "ppc", "flamer", "plasma", "pulse"];
const BALLISTIC_KEYWORDS: &[&str] = &["ac", "gauss", "machinegun", "lbx", "ultra"];
const MISSILE_KEYWORDS: &[&str] = &["lrm", "srm", "mr", "narc", "streak", "atm"];
/// Upgrades that never occupy a support hardpoint. Matched case-sensitively.
const NON_HARDPOINT_UPGRADES: &[&str] = &["CASE", "Artemis", "HeatSink", "Engine"];

/// A raw record after shape detection.
#[derive(Debug)]
pub enum RawMech {
    Legacy(LegacyRecord),
    Canonical(CanonicalRecord),
}

/// Raw game-export shape.
#[derive(Debug, Deserialize)]
pub struct LegacyRecord {
    #[serde(rename = "ChassisID")]
    chassis_id: String,
    #[serde(rename = "Description")]
    description: LegacyDescription,
    #[serde(rename = "HardpointUsage", default)]
    hardpoint_usage: Option<HardpointBlock>,
    #[serde(default)]
    inventory: Vec<InventoryItem>,
    #[serde(rename = "MechTags", default)]
    mech_tags: Option<TagSet>,
    #[serde(rename = "WeightClass", default)]
    weight_class: Option<String>,
    #[serde(rename = "Tonnage", default, deserialize_with = "lenient_number")]
    tonnage: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LegacyDescription {
    #[serde(rename = "UIName", default)]
    ui_name: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    cost: Option<f64>,
    #[serde(default)]
    details: Option<String>,
}

/// Canonical shape: exports, the enhanced dataset and partially enhanced data.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalRecord {
    name: String,
    #[serde(default)]
    model: Option<String>,
    #[serde(default, alias = "chassis")]
    chassis_id: Option<String>,
    #[serde(default, alias = "class")]
    weight_class: Option<String>,
    #[serde(default, alias = "weight", deserialize_with = "lenient_number")]
    tonnage: Option<f64>,
    #[serde(default)]
    hardpoints: Option<HardpointBlock>,
    #[serde(default)]
    inventory: Vec<InventoryItem>,
    #[serde(rename = "MechTags", default)]
    mech_tags: Option<TagSet>,
    #[serde(default, deserialize_with = "lenient_number")]
    cost: Option<f64>,
    #[serde(default)]
    details: Option<String>,
}

/// Pre-computed hardpoint counts, in either lower-case or enhanced spelling.
#[derive(Debug, Default, Deserialize)]
struct HardpointBlock {
    #[serde(default, alias = "Energy", deserialize_with = "lenient_number")]
    energy: Option<f64>,
    #[serde(default, alias = "Ballistic", deserialize_with = "lenient_number")]
    ballistic: Option<f64>,
    #[serde(default, alias = "Missile", deserialize_with = "lenient_number")]
    missile: Option<f64>,
    #[serde(
        default,
        alias = "Support",
        alias = "AntiPersonnel",
        deserialize_with = "lenient_number"
    )]
    support: Option<f64>,
}

impl HardpointBlock {
    fn counts(&self) -> Hardpoints {
        Hardpoints {
            energy: to_count(self.energy),
            ballistic: to_count(self.ballistic),
            missile: to_count(self.missile),
            support: to_count(self.support),
        }
    }
}

#[derive(Debug, Deserialize)]
struct InventoryItem {
    #[serde(rename = "ComponentDefType", default)]
    def_type: String,
    #[serde(rename = "ComponentDefID", default)]
    def_id: String,
}

#[derive(Debug, Default, Deserialize)]
struct TagSet {
    #[serde(default)]
    items: Vec<String>,
}

fn to_cost(value: Option<f64>) -> u64 {
    value.map_or(0, |v| v.max(0.0) as u64)
}

const LEGACY_REQUIRED: &[&str] = &["ChassisID", "Description"];
const CANONICAL_REQUIRED: &[&str] = &["name", "weightClass", "hardpoints"];

impl RawMech {
    /// Detects the shape of `value`.
    ///
    /// Fails with [`CatalogError::InvalidFormat`] naming the first missing
    /// field of whichever shape the object most resembles.
    pub fn classify(value: &Value) -> Result<Self, CatalogError> {
        let object = value.as_object().ok_or_else(|| CatalogError::InvalidFormat {
            field: None,
            reason: "expected a JSON object".to_string(),
        })?;

        let has_legacy = object.contains_key("ChassisID")
            && object.get("Description").is_some_and(Value::is_object);
        if has_legacy {
            return decode(value).map(RawMech::Legacy);
        }

        let has_class = object.contains_key("weightClass") || object.contains_key("class");
        let has_canonical =
            object.contains_key("name") && has_class && object.contains_key("hardpoints");
        if has_canonical {
            return decode(value).map(RawMech::Canonical);
        }

        let looks_canonical = ["name", "weightClass", "class", "hardpoints"]
            .iter()
            .any(|key| object.contains_key(*key));
        let missing = if looks_canonical {
            CANONICAL_REQUIRED.iter().find(|key| match **key {
                "weightClass" => !has_class,
                other => !object.contains_key(other),
            })
        } else {
            LEGACY_REQUIRED.iter().find(|key| match **key {
                "Description" => !object.get("Description").is_some_and(Value::is_object),
                other => !object.contains_key(other),
            })
        };
        Err(CatalogError::missing_field(missing.copied().unwrap_or("ChassisID")))
    }
}

fn decode<T: serde::de::DeserializeOwned>(value: &Value) -> Result<T, CatalogError> {
    T::deserialize(value).map_err(|e| CatalogError::InvalidFormat {
        field: None,
        reason: e.to_string(),
    })
}

/// Normalizes one raw JSON value into a canonical record tagged with `source`.
pub fn normalize(value: &Value, source: Source) -> Result<Mech, CatalogError> {
    Ok(RawMech::classify(value)?.into_mech(source))
}

impl RawMech {
    pub fn into_mech(self, source: Source) -> Mech {
        match self {
            RawMech::Legacy(raw) => {
                let hardpoints = derive_hardpoints(raw.hardpoint_usage.as_ref(), &raw.inventory);
                let (weight_class, tonnage) = derive_weight(
                    raw.weight_class.as_deref(),
                    raw.tonnage,
                    raw.mech_tags.as_ref(),
                );
                let description = raw.description;
                let name = description
                    .ui_name
                    .filter(|n| !n.is_empty())
                    .or(description.name.filter(|n| !n.is_empty()))
                    .unwrap_or_else(|| UNKNOWN_NAME.to_string());

                let mut mech = Mech::new(
                    name,
                    raw.chassis_id,
                    weight_class,
                    tonnage,
                    hardpoints,
                    source,
                );
                mech.cost = to_cost(description.cost);
                mech.details = description.details.filter(|d| !d.is_empty());
                mech
            }
            RawMech::Canonical(raw) => {
                let hardpoints = derive_hardpoints(raw.hardpoints.as_ref(), &raw.inventory);
                let (weight_class, tonnage) = derive_weight(
                    raw.weight_class.as_deref(),
                    raw.tonnage,
                    raw.mech_tags.as_ref(),
                );

                let mut mech = Mech::new(
                    raw.name,
                    raw.chassis_id.unwrap_or_default(),
                    weight_class,
                    tonnage,
                    hardpoints,
                    source,
                );
                mech.model = raw.model.filter(|m| !m.is_empty());
                mech.cost = to_cost(raw.cost);
                mech.details = raw.details.filter(|d| !d.is_empty());
                mech
            }
        }
    }
}

fn derive_hardpoints(block: Option<&HardpointBlock>, inventory: &[InventoryItem]) -> Hardpoints {
    if let Some(block) = block {
        return block.counts();
    }

    let mut counts = Hardpoints::default();
    for item in inventory {
        match item.def_type.as_str() {
            "Weapon" => {
                let id = item.def_id.to_lowercase();
                let has_any = |keywords: &[&str]| keywords.iter().any(|k| id.contains(k));
                if has_any(ENERGY_KEYWORDS) {
                    counts.energy += 1;
                } else if has_any(BALLISTIC_KEYWORDS) {
                    counts.ballistic += 1;
                } else if has_any(MISSILE_KEYWORDS) {
                    counts.missile += 1;
                }
            }
            "Upgrade" => {
                if !NON_HARDPOINT_UPGRADES
                    .iter()
                    .any(|k| item.def_id.contains(k))
                {
                    counts.support += 1;
                }
            }
            _ => {}
        }
    }
    counts
}

fn derive_weight(
    explicit_class: Option<&str>,
    explicit_tonnage: Option<f64>,
    tags: Option<&TagSet>,
) -> (WeightClass, u32) {
    let tonnage = explicit_tonnage
        .map(|t| to_count(Some(t)))
        .or_else(|| tags.and_then(tonnage_from_tags));

    if let Some(class) = explicit_class.and_then(|c| c.parse::<WeightClass>().ok()) {
        return (class, tonnage.unwrap_or(DEFAULT_TONNAGE));
    }
    match tonnage {
        Some(tons) => (WeightClass::from_tonnage(tons), tons),
        None => (WeightClass::Medium, DEFAULT_TONNAGE),
    }
}

/// Reads the tonnage from the first `unit_tonnage_` tag.
///
/// The number after the last `_` is read up to its first non-digit, so
/// `unit_tonnage_80t` is 80. A negative number clamps to 0 tons (Light);
/// a tag with no leading digits yields `None`.
fn tonnage_from_tags(tags: &TagSet) -> Option<u32> {
    let tag = tags.items.iter().find(|tag| tag.contains(TONNAGE_TAG))?;
    let number = tag.rsplit('_').next()?.trim();
    let (negative, digits) = match number.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, number.strip_prefix('+').unwrap_or(number)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: u64 = digits[..end].parse().ok()?;
    if negative {
        Some(0)
    } else {
        Some(u32::try_from(value).unwrap_or(u32::MAX))
    }
}

/// Derives the detail-page id from a name and optional model designation.
///
/// `("Atlas", Some("AS7-D"))` becomes `atlas-as7-d`.
pub fn detail_id(name: &str, model: Option<&str>) -> String {
    let full = match model {
        Some(model) if !model.is_empty() => format!("{} {}", name, model),
        _ => name.to_string(),
    };
    full.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
